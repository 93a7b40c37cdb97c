use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::types::{Relationship, User};

/// Lifecycle step of a friend request that channels get notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    RequestSent,
    RequestAccepted,
    RequestRejected,
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::RequestSent => f.write_str("request_sent"),
            EventKind::RequestAccepted => f.write_str("request_accepted"),
            EventKind::RequestRejected => f.write_str("request_rejected"),
        }
    }
}

/// Who did what to whom; built by the coordinator, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct EventPayload {
    pub requester: User,
    pub recipient: User,
    pub relationship: Relationship,
}
