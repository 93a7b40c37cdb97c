use std::fmt::Debug;

use async_trait::async_trait;

use abi::errors::{Error, Result};
use abi::types::{Comment, Post, PostFilter};

/// Forum posts, their comments and the canned filters the listing pages use.
///
/// Every post list is ordered newest first.
#[async_trait]
pub trait ForumRepo: Send + Sync + Debug {
    async fn create_post(&self, post: Post) -> Result<Post>;

    async fn get_post(&self, id: &str) -> Result<Option<Post>>;

    /// free-text and tag listing
    async fn list(&self, filter: &PostFilter) -> Result<Vec<Post>>;

    /// posts created within the last `days` days; `BadRequest` for a window
    /// that is negative or reaches past the representable range
    async fn recent(&self, days: i64) -> Result<Vec<Post>>;

    /// posts with at least `min_likes` likes
    async fn popular(&self, min_likes: i64) -> Result<Vec<Post>>;

    /// posts carrying `tag`, compared case-insensitively
    async fn by_tag(&self, tag: &str) -> Result<Vec<Post>>;

    /// like the post, or take the like back; returns whether the user likes it now
    async fn toggle_like(&self, post_id: &str, user_id: &str) -> Result<bool>;

    /// `NotFound` if the post is gone or the parent is not a comment of the same post
    async fn add_comment(&self, comment: Comment) -> Result<Comment>;

    /// every comment of the post, replies included, in no particular order
    async fn comments(&self, post_id: &str) -> Result<Vec<Comment>>;
}

/// unix millis of `now - days`
pub(crate) fn recent_cutoff(days: i64) -> Result<i64> {
    if days < 0 {
        return Err(Error::bad_request(format!(
            "days must not be negative, got {days}"
        )));
    }
    chrono::Duration::try_days(days)
        .and_then(|window| chrono::Utc::now().checked_sub_signed(window))
        .map(|cutoff| cutoff.timestamp_millis())
        .ok_or_else(|| Error::bad_request(format!("days out of range: {days}")))
}
