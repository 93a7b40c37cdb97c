use async_trait::async_trait;
use nanoid::nanoid;
use tokio::sync::RwLock;

use abi::errors::Result;
use abi::types::Message;

use crate::message::MessageRepo;

#[derive(Debug, Default)]
pub struct MemoryMessage {
    messages: RwLock<Vec<Message>>,
}

impl MemoryMessage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepo for MemoryMessage {
    async fn save(&self, sender: &str, recipient: &str, content: &str) -> Result<Message> {
        let message = Message {
            id: nanoid!(),
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            content: content.to_string(),
            send_time: chrono::Utc::now().timestamp_millis(),
        };
        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    async fn list_between(&self, a: &str, b: &str) -> Result<Vec<Message>> {
        let messages = self.messages.read().await;
        // appended in send order already
        Ok(messages.iter().filter(|m| m.between(a, b)).cloned().collect())
    }
}
