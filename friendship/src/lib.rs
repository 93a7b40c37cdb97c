//! Friend request lifecycle.
//!
//! [`FriendshipCoordinator`] is the only place relationship status changes.
//! Every transition is persisted first and then announced to the attached
//! [`Channel`]s one after another, in the order they were attached. A call
//! returns once every channel has seen the event.

mod messenger;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error};

use abi::errors::{Error, Result};
use abi::types::{EventKind, EventPayload, Relationship, RelationshipStanding, RelationshipStatus, User};
use db::{RelationshipRepo, UserRepo};
use pusher::Channel;

pub use messenger::Messenger;

#[derive(Debug)]
pub struct FriendshipCoordinator {
    relationships: Arc<dyn RelationshipRepo>,
    users: Arc<dyn UserRepo>,
    channels: Vec<Arc<dyn Channel>>,
}

impl FriendshipCoordinator {
    pub fn new(relationships: Arc<dyn RelationshipRepo>, users: Arc<dyn UserRepo>) -> Self {
        Self {
            relationships,
            users,
            channels: Vec::new(),
        }
    }

    /// register a channel; attaching the same instance twice is a no-op
    pub fn attach(&mut self, channel: Arc<dyn Channel>) {
        if self.position(&channel).is_some() {
            return;
        }
        debug!("attach channel <{}>", channel.name());
        self.channels.push(channel);
    }

    pub fn detach(&mut self, channel: &Arc<dyn Channel>) {
        if let Some(idx) = self.position(channel) {
            debug!("detach channel <{}>", channel.name());
            self.channels.remove(idx);
        }
    }

    pub fn channels(&self) -> &[Arc<dyn Channel>] {
        &self.channels
    }

    fn position(&self, channel: &Arc<dyn Channel>) -> Option<usize> {
        self.channels
            .iter()
            .position(|c| std::ptr::addr_eq(Arc::as_ptr(c), Arc::as_ptr(channel)))
    }

    pub async fn send_request(&self, requester: &User, recipient: &User) -> Result<Relationship> {
        if self
            .relationships
            .find_between(&requester.id, &recipient.id)
            .await?
            .is_some()
        {
            return Err(Error::duplicate_relationship(&requester.id, &recipient.id));
        }

        let relationship = self.relationships.create(&requester.id, &recipient.id).await?;
        debug!(
            "friend request {} from {} to {}",
            relationship.id, requester.id, recipient.id
        );

        let payload = EventPayload {
            requester: requester.clone(),
            recipient: recipient.clone(),
            relationship: relationship.clone(),
        };
        self.emit(EventKind::RequestSent, &payload).await;
        Ok(relationship)
    }

    /// no check on the current status: callers decide which records may move
    pub async fn accept(&self, relationship: Relationship) -> Result<Relationship> {
        self.transition(relationship, RelationshipStatus::Accepted, EventKind::RequestAccepted)
            .await
    }

    pub async fn reject(&self, relationship: Relationship) -> Result<Relationship> {
        self.transition(relationship, RelationshipStatus::Rejected, EventKind::RequestRejected)
            .await
    }

    async fn transition(
        &self,
        relationship: Relationship,
        status: RelationshipStatus,
        kind: EventKind,
    ) -> Result<Relationship> {
        let requester = self.load_user(&relationship.requester).await?;
        let recipient = self.load_user(&relationship.recipient).await?;

        let relationship = self
            .relationships
            .update_status(&relationship.id, status)
            .await?;
        debug!("relationship {} is now {}", relationship.id, relationship.status);

        let payload = EventPayload {
            requester,
            recipient,
            relationship: relationship.clone(),
        };
        self.emit(kind, &payload).await;
        Ok(relationship)
    }

    /// drop whatever links the pair; nobody is notified
    pub async fn unfriend(&self, a: &str, b: &str) -> Result<()> {
        let removed = self.relationships.delete_between(a, b).await?;
        if removed == 0 {
            return Err(Error::not_found_with_details(format!(
                "no relationship between {a} and {b}"
            )));
        }
        debug!("relationship between {a} and {b} removed");
        Ok(())
    }

    pub async fn pending_requests(&self, user_id: &str) -> Result<Vec<Relationship>> {
        self.relationships
            .list_by_recipient(user_id, RelationshipStatus::Pending)
            .await
    }

    pub async fn pending_count(&self, user_id: &str) -> Result<i64> {
        self.relationships
            .count_by_recipient(user_id, RelationshipStatus::Pending)
            .await
    }

    pub async fn friends_of(&self, user_id: &str) -> Result<Vec<User>> {
        let ids: Vec<String> = self
            .relationships
            .list_for_user(user_id, RelationshipStatus::Accepted)
            .await?
            .iter()
            .map(|rel| rel.counterpart(user_id).to_string())
            .collect();
        self.users.get_users_by_ids(&ids).await
    }

    pub async fn standing(&self, viewer: &str, other: &str) -> Result<RelationshipStanding> {
        let relationship = self.relationships.find_between(viewer, other).await?;
        Ok(RelationshipStanding::from_relationship(viewer, relationship))
    }

    async fn load_user(&self, id: &str) -> Result<User> {
        self.users
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found_with_details(format!("user {id}")))
    }

    async fn emit(&self, kind: EventKind, payload: &EventPayload) {
        for channel in &self.channels {
            let fut = channel.notify(kind, payload);
            if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                error!("channel <{}> panicked on {kind}: {reason}", channel.name());
            }
        }
    }
}
