use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{Error, FromRow, Row};

pub const DEFAULT_RECENT_DAYS: i64 = 7;
pub const DEFAULT_POPULAR_LIKES: i64 = 10;

/// Forum thread with its tag names and the ids of users who liked it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub body: String,
    pub creator_id: String,
    pub tags: Vec<String>,
    pub likes: Vec<String>,
    pub create_time: i64,
}

impl Post {
    pub fn has_tag(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.tags.iter().any(|tag| tag.to_lowercase() == name)
    }

    pub fn like_count(&self) -> i64 {
        self.likes.len() as i64
    }
}

impl FromRow<'_, PgRow> for Post {
    fn from_row(row: &'_ PgRow) -> Result<Self, Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            body: row.try_get("body")?,
            creator_id: row.try_get("creator_id")?,
            tags: row.try_get("tags")?,
            likes: row.try_get("likes")?,
            create_time: row.try_get("create_time")?,
        })
    }
}

/// Forum listing filter. Empty fields do not narrow anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    /// case-insensitive substring of the title
    pub text: Option<String>,
    /// authors whose name matched `text`; their posts match as well
    pub creator_ids: Vec<String>,
    /// a post matches when it carries any of these tags
    pub tags: Vec<String>,
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        let text_ok = match &self.text {
            Some(text) => {
                post.title.to_lowercase().contains(&text.to_lowercase())
                    || self.creator_ids.contains(&post.creator_id)
            }
            None => true,
        };
        let tags_ok = self.tags.is_empty() || self.tags.iter().any(|tag| post.has_tag(tag));
        text_ok && tags_ok
    }
}

/// Comment on a post; `parent` is set for replies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub body: String,
    pub parent: Option<String>,
    pub create_time: i64,
}

impl FromRow<'_, PgRow> for Comment {
    fn from_row(row: &'_ PgRow) -> Result<Self, Error> {
        Ok(Self {
            id: row.try_get("id")?,
            post_id: row.try_get("post_id")?,
            author_id: row.try_get("author_id")?,
            body: row.try_get("body")?,
            parent: row.try_get("parent")?,
            create_time: row.try_get("create_time")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentThread {
    pub comment: Comment,
    pub replies: Vec<CommentThread>,
}

impl CommentThread {
    /// nest the comments of one post: top level newest first, replies oldest first
    pub fn build(comments: Vec<Comment>) -> Vec<CommentThread> {
        let (mut roots, replies): (Vec<Comment>, Vec<Comment>) =
            comments.into_iter().partition(|c| c.parent.is_none());
        roots.sort_by(|a, b| b.create_time.cmp(&a.create_time));
        roots
            .into_iter()
            .map(|comment| Self::attach(comment, &replies))
            .collect()
    }

    fn attach(comment: Comment, replies: &[Comment]) -> CommentThread {
        let mut children: Vec<&Comment> = replies
            .iter()
            .filter(|r| r.parent.as_deref() == Some(comment.id.as_str()))
            .collect();
        children.sort_by_key(|c| c.create_time);
        CommentThread {
            replies: children
                .into_iter()
                .map(|child| Self::attach(child.clone(), replies))
                .collect(),
            comment,
        }
    }
}

/// A post as its detail page shows it.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<CommentThread>,
}
