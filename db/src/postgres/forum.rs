use async_trait::async_trait;
use nanoid::nanoid;
use sqlx::{PgPool, Postgres, QueryBuilder};

use abi::errors::{Error, Result};
use abi::types::{Comment, Post, PostFilter};

use crate::forum::{recent_cutoff, ForumRepo};

use super::is_foreign_key_violation;
use super::user::escape_like;

/// posts with their tags and likes folded into arrays
const POST_SELECT: &str = "SELECT p.id, p.title, p.body, p.creator_id, p.create_time,
    COALESCE((SELECT array_agg(t.tag ORDER BY t.tag) FROM post_tags t WHERE t.post_id = p.id), '{}') AS tags,
    COALESCE((SELECT array_agg(l.user_id ORDER BY l.user_id) FROM post_likes l WHERE l.post_id = p.id), '{}') AS likes
    FROM posts p";

#[derive(Debug)]
pub struct PostgresForum {
    pool: PgPool,
}

impl PostgresForum {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ForumRepo for PostgresForum {
    async fn create_post(&self, post: Post) -> Result<Post> {
        let id = if post.id.is_empty() { nanoid!() } else { post.id.clone() };
        let create_time = if post.create_time == 0 {
            chrono::Utc::now().timestamp_millis()
        } else {
            post.create_time
        };
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO posts (id, title, body, creator_id, create_time)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&id)
        .bind(&post.title)
        .bind(&post.body)
        .bind(&post.creator_id)
        .bind(create_time)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO post_tags (post_id, tag) SELECT $1, UNNEST($2::VARCHAR[]) ON CONFLICT DO NOTHING")
            .bind(&id)
            .bind(&post.tags)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO post_likes (post_id, user_id) SELECT $1, UNNEST($2::VARCHAR[]) ON CONFLICT DO NOTHING")
            .bind(&id)
            .bind(&post.likes)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.get_post(&id)
            .await?
            .ok_or_else(|| Error::internal_with_details(format!("post {id} vanished after insert")))
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>> {
        let post = sqlx::query_as(&format!("{POST_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn list(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let mut builder = QueryBuilder::<Postgres>::new(POST_SELECT);
        builder.push(" WHERE TRUE");
        if let Some(text) = &filter.text {
            builder
                .push(" AND (p.title ILIKE ")
                .push_bind(format!("%{}%", escape_like(text)))
                .push(" OR p.creator_id = ANY(")
                .push_bind(filter.creator_ids.clone())
                .push("))");
        }
        if !filter.tags.is_empty() {
            let tags: Vec<String> = filter.tags.iter().map(|t| t.to_lowercase()).collect();
            builder
                .push(" AND EXISTS (SELECT 1 FROM post_tags t WHERE t.post_id = p.id AND LOWER(t.tag) = ANY(")
                .push_bind(tags)
                .push("))");
        }
        builder.push(" ORDER BY p.create_time DESC");
        let posts = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(posts)
    }

    async fn recent(&self, days: i64) -> Result<Vec<Post>> {
        let cutoff = recent_cutoff(days)?;
        let posts = sqlx::query_as(&format!(
            "{POST_SELECT} WHERE p.create_time >= $1 ORDER BY p.create_time DESC"
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn popular(&self, min_likes: i64) -> Result<Vec<Post>> {
        let posts = sqlx::query_as(&format!(
            "{POST_SELECT}
             WHERE (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) >= $1
             ORDER BY p.create_time DESC"
        ))
        .bind(min_likes)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn by_tag(&self, tag: &str) -> Result<Vec<Post>> {
        let posts = sqlx::query_as(&format!(
            "{POST_SELECT}
             WHERE EXISTS (SELECT 1 FROM post_tags t WHERE t.post_id = p.id AND LOWER(t.tag) = LOWER($1))
             ORDER BY p.create_time DESC"
        ))
        .bind(tag)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn toggle_like(&self, post_id: &str, user_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(Error::not_found_with_details(format!("post {post_id}")));
        }

        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if removed == 0 {
            sqlx::query("INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2)")
                .bind(post_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(removed == 0)
    }

    async fn add_comment(&self, comment: Comment) -> Result<Comment> {
        if let Some(parent) = &comment.parent {
            let found: Option<(String,)> =
                sqlx::query_as("SELECT id FROM comments WHERE id = $1 AND post_id = $2")
                    .bind(parent)
                    .bind(&comment.post_id)
                    .fetch_optional(&self.pool)
                    .await?;
            if found.is_none() {
                return Err(Error::not_found_with_details(format!(
                    "comment {parent} on post {}",
                    comment.post_id
                )));
            }
        }
        let id = if comment.id.is_empty() { nanoid!() } else { comment.id.clone() };
        let create_time = if comment.create_time == 0 {
            chrono::Utc::now().timestamp_millis()
        } else {
            comment.create_time
        };
        let comment = sqlx::query_as(
            "INSERT INTO comments (id, post_id, author_id, body, parent, create_time)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(&id)
        .bind(&comment.post_id)
        .bind(&comment.author_id)
        .bind(&comment.body)
        .bind(&comment.parent)
        .bind(create_time)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                Error::not_found_with_details(format!("post {}", comment.post_id))
            } else {
                e.into()
            }
        })?;
        Ok(comment)
    }

    async fn comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as("SELECT * FROM comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(comments)
    }
}
