use async_trait::async_trait;
use nanoid::nanoid;
use tokio::sync::RwLock;

use abi::errors::{Error, Result};
use abi::types::{Relationship, RelationshipStatus};

use crate::relationship::RelationshipRepo;

#[derive(Debug, Default)]
pub struct MemoryRelationship {
    records: RwLock<Vec<Relationship>>,
}

impl MemoryRelationship {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RelationshipRepo for MemoryRelationship {
    async fn create(&self, requester: &str, recipient: &str) -> Result<Relationship> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.links(requester, recipient)) {
            return Err(Error::duplicate_relationship(requester, recipient));
        }
        let now = chrono::Utc::now().timestamp_millis();
        let relationship = Relationship {
            id: nanoid!(),
            requester: requester.to_string(),
            recipient: recipient.to_string(),
            status: RelationshipStatus::Pending,
            create_time: now,
            update_time: now,
        };
        records.push(relationship.clone());
        Ok(relationship)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Relationship>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn find_between(&self, a: &str, b: &str) -> Result<Option<Relationship>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.links(a, b)).cloned())
    }

    async fn update_status(&self, id: &str, status: RelationshipStatus) -> Result<Relationship> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::not_found_with_details(format!("relationship {id}")))?;
        record.status = status;
        record.update_time = chrono::Utc::now().timestamp_millis();
        Ok(record.clone())
    }

    async fn delete_between(&self, a: &str, b: &str) -> Result<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| !r.links(a, b));
        Ok((before - records.len()) as u64)
    }

    async fn list_by_recipient(
        &self,
        recipient: &str,
        status: RelationshipStatus,
    ) -> Result<Vec<Relationship>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.recipient == recipient && r.status == status)
            .cloned()
            .collect())
    }

    async fn count_by_recipient(
        &self,
        recipient: &str,
        status: RelationshipStatus,
    ) -> Result<i64> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.recipient == recipient && r.status == status)
            .count() as i64)
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        status: RelationshipStatus,
    ) -> Result<Vec<Relationship>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.involves(user_id) && r.status == status)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_should_reject_either_ordering() {
        let repo = MemoryRelationship::new();
        let rel = repo.create("u1", "u2").await.unwrap();
        assert_eq!(rel.status, RelationshipStatus::Pending);

        let err = repo.create("u1", "u2").await.unwrap_err();
        assert!(err.is_duplicate_relationship());
        let err = repo.create("u2", "u1").await.unwrap_err();
        assert!(err.is_duplicate_relationship());

        // a rejected record still occupies the pair
        repo.update_status(&rel.id, RelationshipStatus::Rejected)
            .await
            .unwrap();
        assert!(repo.create("u2", "u1").await.is_err());
    }

    #[tokio::test]
    async fn update_missing_record_is_not_found() {
        let repo = MemoryRelationship::new();
        let err = repo
            .update_status("missing", RelationshipStatus::Accepted)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_between_matches_both_orderings() {
        let repo = MemoryRelationship::new();
        repo.create("u1", "u2").await.unwrap();
        repo.create("u1", "u3").await.unwrap();
        assert_eq!(repo.delete_between("u2", "u1").await.unwrap(), 1);
        assert_eq!(repo.delete_between("u2", "u1").await.unwrap(), 0);
        assert!(repo.find_between("u1", "u2").await.unwrap().is_none());
        assert!(repo.find_between("u3", "u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn listing_filters_by_side_and_status() {
        let repo = MemoryRelationship::new();
        let a = repo.create("u2", "u1").await.unwrap();
        let b = repo.create("u3", "u1").await.unwrap();
        let c = repo.create("u1", "u4").await.unwrap();
        repo.update_status(&b.id, RelationshipStatus::Accepted)
            .await
            .unwrap();
        repo.update_status(&c.id, RelationshipStatus::Accepted)
            .await
            .unwrap();

        let pending = repo
            .list_by_recipient("u1", RelationshipStatus::Pending)
            .await
            .unwrap();
        assert_eq!(pending, vec![a]);
        assert_eq!(
            repo.count_by_recipient("u1", RelationshipStatus::Pending)
                .await
                .unwrap(),
            1
        );

        let friends = repo
            .list_for_user("u1", RelationshipStatus::Accepted)
            .await
            .unwrap();
        let ids: Vec<_> = friends.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![b.id, c.id]);
    }
}
