use async_trait::async_trait;
use nanoid::nanoid;
use tokio::sync::RwLock;

use abi::errors::{Error, Result};
use abi::types::{Comment, Post, PostFilter};

use crate::forum::{recent_cutoff, ForumRepo};

#[derive(Debug, Default)]
pub struct MemoryForum {
    posts: RwLock<Vec<Post>>,
    comments: RwLock<Vec<Comment>>,
}

impl MemoryForum {
    pub fn new() -> Self {
        Self::default()
    }

    async fn select(&self, predicate: impl Fn(&Post) -> bool) -> Vec<Post> {
        let posts = self.posts.read().await;
        let mut selected: Vec<Post> = posts.iter().filter(|p| predicate(p)).cloned().collect();
        selected.sort_by(|a, b| b.create_time.cmp(&a.create_time));
        selected
    }
}

#[async_trait]
impl ForumRepo for MemoryForum {
    async fn create_post(&self, mut post: Post) -> Result<Post> {
        if post.id.is_empty() {
            post.id = nanoid!();
        }
        if post.create_time == 0 {
            post.create_time = chrono::Utc::now().timestamp_millis();
        }
        self.posts.write().await.push(post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        Ok(self.select(|p| filter.matches(p)).await)
    }

    async fn recent(&self, days: i64) -> Result<Vec<Post>> {
        let cutoff = recent_cutoff(days)?;
        Ok(self.select(|p| p.create_time >= cutoff).await)
    }

    async fn popular(&self, min_likes: i64) -> Result<Vec<Post>> {
        Ok(self.select(|p| p.like_count() >= min_likes).await)
    }

    async fn by_tag(&self, tag: &str) -> Result<Vec<Post>> {
        Ok(self.select(|p| p.has_tag(tag)).await)
    }

    async fn toggle_like(&self, post_id: &str, user_id: &str) -> Result<bool> {
        let mut posts = self.posts.write().await;
        let post = posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| Error::not_found_with_details(format!("post {post_id}")))?;
        if let Some(pos) = post.likes.iter().position(|id| id == user_id) {
            post.likes.remove(pos);
            Ok(false)
        } else {
            post.likes.push(user_id.to_string());
            Ok(true)
        }
    }

    async fn add_comment(&self, mut comment: Comment) -> Result<Comment> {
        if self.get_post(&comment.post_id).await?.is_none() {
            return Err(Error::not_found_with_details(format!(
                "post {}",
                comment.post_id
            )));
        }
        let mut comments = self.comments.write().await;
        if let Some(parent) = &comment.parent {
            if !comments
                .iter()
                .any(|c| &c.id == parent && c.post_id == comment.post_id)
            {
                return Err(Error::not_found_with_details(format!(
                    "comment {parent} on post {}",
                    comment.post_id
                )));
            }
        }
        if comment.id.is_empty() {
            comment.id = nanoid!();
        }
        if comment.create_time == 0 {
            comment.create_time = chrono::Utc::now().timestamp_millis();
        }
        comments.push(comment.clone());
        Ok(comment)
    }

    async fn comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        let comments = self.comments.read().await;
        Ok(comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }
}
