use async_trait::async_trait;

use abi::types::{EventKind, EventPayload};

use crate::Channel;

/// Prints one line per event to stdout. Handy in development.
#[derive(Debug, Default)]
pub struct ConsoleChannel;

impl ConsoleChannel {
    pub fn new() -> Self {
        Self
    }

    pub fn render(kind: EventKind, payload: &EventPayload) -> String {
        let requester = &payload.requester.first_name;
        let recipient = &payload.recipient.first_name;
        match kind {
            EventKind::RequestSent => {
                format!("[{kind}] new friend request from {requester} to {recipient}")
            }
            EventKind::RequestAccepted => {
                format!("[{kind}] {recipient} accepted the friend request from {requester}")
            }
            EventKind::RequestRejected => {
                format!("[{kind}] {recipient} rejected the friend request from {requester}")
            }
        }
    }
}

#[async_trait]
impl Channel for ConsoleChannel {
    async fn notify(&self, kind: EventKind, payload: &EventPayload) {
        println!("{}", Self::render(kind, payload));
    }

    fn name(&self) -> &'static str {
        "console"
    }
}
