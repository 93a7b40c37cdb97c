use async_trait::async_trait;
use nanoid::nanoid;
use sqlx::PgPool;
use tracing::debug;

use abi::errors::{Error, Result};
use abi::types::{Relationship, RelationshipStatus};

use crate::relationship::RelationshipRepo;

use super::is_unique_violation;

#[derive(Debug)]
pub struct PostgresRelationship {
    pool: PgPool,
}

impl PostgresRelationship {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RelationshipRepo for PostgresRelationship {
    /// the pair index turns a lost race into a duplicate error
    async fn create(&self, requester: &str, recipient: &str) -> Result<Relationship> {
        let now = chrono::Utc::now().timestamp_millis();
        let relationship = sqlx::query_as(
            "INSERT INTO relationships
            (id, requester, recipient, status, create_time, update_time)
            VALUES
            ($1, $2, $3, $4, $5, $5) RETURNING *",
        )
        .bind(nanoid!())
        .bind(requester)
        .bind(recipient)
        .bind(RelationshipStatus::Pending)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                debug!("relationship {requester} -> {recipient} lost the race");
                Error::duplicate_relationship(requester, recipient)
            } else {
                e.into()
            }
        })?;
        Ok(relationship)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Relationship>> {
        let relationship = sqlx::query_as("SELECT * FROM relationships WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(relationship)
    }

    async fn find_between(&self, a: &str, b: &str) -> Result<Option<Relationship>> {
        let relationship = sqlx::query_as(
            "SELECT * FROM relationships
             WHERE (requester = $1 AND recipient = $2) OR (requester = $2 AND recipient = $1)",
        )
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await?;
        Ok(relationship)
    }

    async fn update_status(&self, id: &str, status: RelationshipStatus) -> Result<Relationship> {
        let relationship = sqlx::query_as(
            "UPDATE relationships
            SET status = $1, update_time = $2
            WHERE id = $3
            RETURNING *",
        )
        .bind(status)
        .bind(chrono::Utc::now().timestamp_millis())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::not_found_with_details(format!("relationship {id}")))?;
        Ok(relationship)
    }

    async fn delete_between(&self, a: &str, b: &str) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM relationships
             WHERE (requester = $1 AND recipient = $2) OR (requester = $2 AND recipient = $1)",
        )
        .bind(a)
        .bind(b)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn list_by_recipient(
        &self,
        recipient: &str,
        status: RelationshipStatus,
    ) -> Result<Vec<Relationship>> {
        let list = sqlx::query_as(
            "SELECT * FROM relationships WHERE recipient = $1 AND status = $2
             ORDER BY create_time",
        )
        .bind(recipient)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(list)
    }

    async fn count_by_recipient(
        &self,
        recipient: &str,
        status: RelationshipStatus,
    ) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM relationships WHERE recipient = $1 AND status = $2",
        )
        .bind(recipient)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        status: RelationshipStatus,
    ) -> Result<Vec<Relationship>> {
        let list = sqlx::query_as(
            "SELECT * FROM relationships
             WHERE (requester = $1 OR recipient = $1) AND status = $2
             ORDER BY create_time",
        )
        .bind(user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use abi::types::User;

    use super::*;
    use crate::postgres::tests::test_db;
    use crate::postgres::PostgresUser;
    use crate::UserRepo;

    async fn seed_users(pool: &PgPool, ids: &[&str]) {
        let users = PostgresUser::new(pool.clone());
        for id in ids {
            users
                .create_user(User {
                    id: id.to_string(),
                    email: format!("{id}@campus.edu"),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    #[ignore = "needs a running postgres"]
    async fn create_should_reject_reverse_pair() {
        let tdb = test_db();
        let pool = tdb.pool().await;
        seed_users(&pool, &["u1", "u2"]).await;
        let repo = PostgresRelationship::new(pool);

        let rel = repo.create("u1", "u2").await.unwrap();
        assert_eq!(rel.status, RelationshipStatus::Pending);
        let err = repo.create("u2", "u1").await.unwrap_err();
        assert!(err.is_duplicate_relationship());
    }

    #[tokio::test]
    #[ignore = "needs a running postgres"]
    async fn status_update_and_delete_should_work() {
        let tdb = test_db();
        let pool = tdb.pool().await;
        seed_users(&pool, &["u1", "u2"]).await;
        let repo = PostgresRelationship::new(pool);

        let rel = repo.create("u1", "u2").await.unwrap();
        assert_eq!(
            repo.count_by_recipient("u2", RelationshipStatus::Pending)
                .await
                .unwrap(),
            1
        );
        let rel = repo
            .update_status(&rel.id, RelationshipStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(rel.status, RelationshipStatus::Accepted);
        assert_eq!(
            repo.list_for_user("u1", RelationshipStatus::Accepted)
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(repo.delete_between("u2", "u1").await.unwrap(), 1);
        assert!(repo.get_by_id(&rel.id).await.unwrap().is_none());
    }
}
