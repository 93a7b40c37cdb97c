use std::sync::Arc;

use tracing::debug;

use abi::errors::{Error, Result};
use abi::types::{Message, RelationshipStatus};
use db::{MessageRepo, RelationshipRepo, UserRepo};

/// Direct messages, allowed only between users whose request was accepted.
#[derive(Debug, Clone)]
pub struct Messenger {
    relationships: Arc<dyn RelationshipRepo>,
    users: Arc<dyn UserRepo>,
    messages: Arc<dyn MessageRepo>,
}

impl Messenger {
    pub fn new(
        relationships: Arc<dyn RelationshipRepo>,
        users: Arc<dyn UserRepo>,
        messages: Arc<dyn MessageRepo>,
    ) -> Self {
        Self {
            relationships,
            users,
            messages,
        }
    }

    pub async fn send(&self, sender: &str, recipient: &str, content: &str) -> Result<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::bad_request("message is empty"));
        }
        self.ensure_friends(sender, recipient).await?;
        let message = self.messages.save(sender, recipient, content).await?;
        debug!("message {} from {sender} to {recipient}", message.id);
        Ok(message)
    }

    /// messages exchanged with `other`, oldest first
    pub async fn conversation(&self, viewer: &str, other: &str) -> Result<Vec<Message>> {
        self.ensure_friends(viewer, other).await?;
        self.messages.list_between(viewer, other).await
    }

    /// `NotFound` for an unknown `other`, `Forbidden` unless the two are friends
    async fn ensure_friends(&self, user_id: &str, other: &str) -> Result<()> {
        if self.users.get_user_by_id(other).await?.is_none() {
            return Err(Error::not_found_with_details(format!("user {other}")));
        }
        match self.relationships.find_between(user_id, other).await? {
            Some(rel) if rel.status == RelationshipStatus::Accepted => Ok(()),
            _ => Err(Error::forbidden(format!(
                "{user_id} and {other} are not friends"
            ))),
        }
    }
}
