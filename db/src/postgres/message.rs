use async_trait::async_trait;
use nanoid::nanoid;
use sqlx::PgPool;

use abi::errors::Result;
use abi::types::Message;

use crate::message::MessageRepo;

#[derive(Debug)]
pub struct PostgresMessage {
    pool: PgPool,
}

impl PostgresMessage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepo for PostgresMessage {
    async fn save(&self, sender: &str, recipient: &str, content: &str) -> Result<Message> {
        let message = sqlx::query_as(
            "INSERT INTO messages (id, sender, recipient, content, send_time)
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(nanoid!())
        .bind(sender)
        .bind(recipient)
        .bind(content)
        .bind(chrono::Utc::now().timestamp_millis())
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    async fn list_between(&self, a: &str, b: &str) -> Result<Vec<Message>> {
        let messages = sqlx::query_as(
            "SELECT * FROM messages
             WHERE (sender = $1 AND recipient = $2) OR (sender = $2 AND recipient = $1)
             ORDER BY send_time, id",
        )
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }
}
