//! Notification channels for friend-request events.
//!
//! A [`Channel`] receives every lifecycle event the friendship coordinator
//! emits. Channels never report failure: whatever goes wrong inside
//! `notify` is logged and dropped there, so a broken channel cannot fail the
//! transition that triggered it.

mod console;
mod email;
mod mailer;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use abi::config::{ChannelKind, Config};
use abi::errors::Result;
use abi::types::{EventKind, EventPayload};

pub use console::ConsoleChannel;
pub use email::EmailChannel;
pub use mailer::{Mail, Mailer, SmtpMailer};

#[async_trait]
pub trait Channel: Send + Sync + Debug {
    /// deliver one event; must handle its own errors
    async fn notify(&self, kind: EventKind, payload: &EventPayload);

    /// short name used in logs
    fn name(&self) -> &'static str;
}

/// build the channels listed in `notification.channels`, in that order
pub fn channels(config: &Config) -> Result<Vec<Arc<dyn Channel>>> {
    let mut channels: Vec<Arc<dyn Channel>> = Vec::with_capacity(config.notification.channels.len());
    for kind in &config.notification.channels {
        let channel: Arc<dyn Channel> = match kind {
            ChannelKind::Console => Arc::new(ConsoleChannel::new()),
            ChannelKind::Email => {
                let mailer = Arc::new(SmtpMailer::from_config(&config.mail)?);
                Arc::new(EmailChannel::from_config(&config.mail, mailer)?)
            }
        };
        info!("notification channel <{}> configured", channel.name());
        channels.push(channel);
    }
    Ok(channels)
}
