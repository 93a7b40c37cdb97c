use std::fmt::Debug;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use abi::config::MailConfig;
use abi::errors::Result;

/// A rendered plain-text mail, ready to hand to a [`Mailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync + Debug {
    async fn send(&self, mail: Mail) -> Result<()>;
}

/// SMTP relay with credentials, one connection pool per process.
#[derive(Debug)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        let creds = Credentials::new(config.account.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.server)?
            .credentials(creds)
            .build();
        Ok(Self { transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: Mail) -> Result<()> {
        let from: Mailbox = mail.from.parse()?;
        let to: Mailbox = mail.to.parse()?;
        let msg = Message::builder()
            .from(from)
            .to(to)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)?;

        let response = self.transport.send(msg).await?;
        debug!("mail to {} accepted: {:?}", mail.to, response.code());
        Ok(())
    }
}
