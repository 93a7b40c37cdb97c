use std::fmt::Debug;

use async_trait::async_trait;

use abi::errors::Result;
use abi::types::Message;

/// Direct messages. Whether two users may talk is decided by the caller.
#[async_trait]
pub trait MessageRepo: Send + Sync + Debug {
    async fn save(&self, sender: &str, recipient: &str, content: &str) -> Result<Message>;

    /// the conversation of `a` and `b`, oldest first
    async fn list_between(&self, a: &str, b: &str) -> Result<Vec<Message>>;
}
