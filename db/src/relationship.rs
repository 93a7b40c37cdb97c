use std::fmt::Debug;

use async_trait::async_trait;

use abi::errors::Result;
use abi::types::{Relationship, RelationshipStatus};

#[async_trait]
pub trait RelationshipRepo: Send + Sync + Debug {
    /// create a pending request from `requester` to `recipient`.
    ///
    /// fails with `DuplicateRelationship` if the pair is already linked in
    /// either ordering, whatever the status of the existing record
    async fn create(&self, requester: &str, recipient: &str) -> Result<Relationship>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Relationship>>;

    /// the record linking `a` and `b`, in either ordering
    async fn find_between(&self, a: &str, b: &str) -> Result<Option<Relationship>>;

    /// persist a new status; `NotFound` if the record is gone
    async fn update_status(&self, id: &str, status: RelationshipStatus) -> Result<Relationship>;

    /// remove the record linking `a` and `b`; returns how many were removed
    async fn delete_between(&self, a: &str, b: &str) -> Result<u64>;

    /// records addressed to `recipient` with the given status, oldest first
    async fn list_by_recipient(
        &self,
        recipient: &str,
        status: RelationshipStatus,
    ) -> Result<Vec<Relationship>>;

    async fn count_by_recipient(&self, recipient: &str, status: RelationshipStatus)
        -> Result<i64>;

    /// records where `user_id` is on either side, oldest first
    async fn list_for_user(
        &self,
        user_id: &str,
        status: RelationshipStatus,
    ) -> Result<Vec<Relationship>>;
}
