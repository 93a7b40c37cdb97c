use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tera::{Context, Tera};
use tracing::{debug, error};

use abi::config::MailConfig;
use abi::errors::{Error, Result};
use abi::types::{EventKind, EventPayload, User};

use crate::mailer::{Mail, Mailer};
use crate::Channel;

const REQUEST_SENT: &str = "request_sent.txt";
const REQUEST_ACCEPTED: &str = "request_accepted.txt";

/// Mails the party that has to react: the recipient of a new request and the
/// requester once it is accepted. Rejections go out silently.
#[derive(Debug)]
pub struct EmailChannel {
    mailer: Arc<dyn Mailer>,
    tera: Tera,
    from: String,
    timeout: Duration,
}

impl EmailChannel {
    pub fn new(mailer: Arc<dyn Mailer>, from: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (REQUEST_SENT, include_str!("../templates/request_sent.txt")),
            (
                REQUEST_ACCEPTED,
                include_str!("../templates/request_accepted.txt"),
            ),
        ])?;
        Ok(Self {
            mailer,
            tera,
            from: from.into(),
            timeout,
        })
    }

    pub fn from_config(config: &MailConfig, mailer: Arc<dyn Mailer>) -> Result<Self> {
        Self::new(
            mailer,
            &config.from,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// `None` when the event does not warrant a mail
    pub fn compose(&self, kind: EventKind, payload: &EventPayload) -> Result<Option<Mail>> {
        let (template, to, subject): (&str, &User, String) = match kind {
            EventKind::RequestSent => (
                REQUEST_SENT,
                &payload.recipient,
                format!("{} wants to be your friend", payload.requester.full_name()),
            ),
            EventKind::RequestAccepted => (
                REQUEST_ACCEPTED,
                &payload.requester,
                format!("{} accepted your friend request", payload.recipient.full_name()),
            ),
            EventKind::RequestRejected => return Ok(None),
        };

        let context = Context::from_serialize(payload)?;
        let body = self.tera.render(template, &context)?;
        Ok(Some(Mail {
            from: self.from.clone(),
            to: to.email.clone(),
            subject,
            body,
        }))
    }

    async fn deliver(&self, mail: Mail) -> Result<()> {
        let to = mail.to.clone();
        match tokio::time::timeout(self.timeout, self.mailer.send(mail)).await {
            Ok(result) => result,
            Err(_) => Err(Error::notification_delivery(format!(
                "mail to {to} timed out after {:?}",
                self.timeout
            ))),
        }
    }
}

#[async_trait]
impl Channel for EmailChannel {
    async fn notify(&self, kind: EventKind, payload: &EventPayload) {
        let mail = match self.compose(kind, payload) {
            Ok(Some(mail)) => mail,
            Ok(None) => {
                debug!("no mail for {kind} on relationship {}", payload.relationship.id);
                return;
            }
            Err(e) => {
                error!("compose {kind} mail failed: {e}");
                return;
            }
        };

        let to = mail.to.clone();
        if let Err(e) = self.deliver(mail).await {
            let e = Error::notification_delivery(format!("{kind} mail to {to}: {e}"));
            error!("{e}");
        }
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
