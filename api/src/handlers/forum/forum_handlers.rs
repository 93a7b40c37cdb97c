use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use abi::errors::Error;
use abi::types::{
    empty_as_none, Comment, CommentThread, Post, PostDetail, PostFilter, SearchCriteria,
    DEFAULT_POPULAR_LIKES, DEFAULT_RECENT_DAYS,
};

use crate::api_utils::custom_extract::{AuthUser, JsonExtractor, PathExtractor, QueryExtractor};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    /// comma separated; a post matches when it carries any of them
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PopularParams {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub min_likes: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NewPost {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewComment {
    pub body: String,
    pub parent: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LikeReply {
    pub liked: bool,
}

pub async fn list_posts(
    State(app_state): State<AppState>,
    AuthUser(_): AuthUser,
    QueryExtractor(params): QueryExtractor<ListParams>,
) -> Result<Json<Vec<Post>>, Error> {
    let mut filter = PostFilter {
        tags: params
            .tag
            .iter()
            .flat_map(|tags| tags.split(','))
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(String::from)
            .collect(),
        ..Default::default()
    };
    if let Some(q) = params.q.map(|q| q.trim().to_string()).filter(|q| !q.is_empty()) {
        let authors = app_state
            .search
            .search(&SearchCriteria::default().with_query(q.clone()))
            .fetch()
            .await?;
        filter.creator_ids = authors.into_iter().map(|user| user.id).collect();
        filter.text = Some(q);
    }
    Ok(Json(app_state.db.forum.list(&filter).await?))
}

pub async fn create_post(
    State(app_state): State<AppState>,
    AuthUser(user_id): AuthUser,
    JsonExtractor(new): JsonExtractor<NewPost>,
) -> Result<Json<Post>, Error> {
    let title = new.title.trim();
    if title.is_empty() {
        return Err(Error::bad_request("post title is empty"));
    }
    let post = Post {
        title: title.to_string(),
        body: new.body,
        creator_id: user_id,
        tags: new
            .tags
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect(),
        ..Default::default()
    };
    Ok(Json(app_state.db.forum.create_post(post).await?))
}

pub async fn get_post(
    State(app_state): State<AppState>,
    AuthUser(_): AuthUser,
    PathExtractor(post_id): PathExtractor<String>,
) -> Result<Json<PostDetail>, Error> {
    let post = app_state
        .db
        .forum
        .get_post(&post_id)
        .await?
        .ok_or_else(|| Error::not_found_with_details(format!("post {post_id}")))?;
    let comments = app_state.db.forum.comments(&post_id).await?;
    Ok(Json(PostDetail {
        post,
        comments: CommentThread::build(comments),
    }))
}

pub async fn add_comment(
    State(app_state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathExtractor(post_id): PathExtractor<String>,
    JsonExtractor(new): JsonExtractor<NewComment>,
) -> Result<Json<Comment>, Error> {
    let body = new.body.trim();
    if body.is_empty() {
        return Err(Error::bad_request("comment is empty"));
    }
    let comment = Comment {
        post_id,
        author_id: user_id,
        body: body.to_string(),
        parent: new.parent.filter(|parent| !parent.is_empty()),
        ..Default::default()
    };
    Ok(Json(app_state.db.forum.add_comment(comment).await?))
}

pub async fn recent_posts(
    State(app_state): State<AppState>,
    AuthUser(_): AuthUser,
    QueryExtractor(params): QueryExtractor<RecentParams>,
) -> Result<Json<Vec<Post>>, Error> {
    let days = params.days.unwrap_or(DEFAULT_RECENT_DAYS);
    Ok(Json(app_state.db.forum.recent(days).await?))
}

pub async fn popular_posts(
    State(app_state): State<AppState>,
    AuthUser(_): AuthUser,
    QueryExtractor(params): QueryExtractor<PopularParams>,
) -> Result<Json<Vec<Post>>, Error> {
    let min_likes = params.min_likes.unwrap_or(DEFAULT_POPULAR_LIKES);
    Ok(Json(app_state.db.forum.popular(min_likes).await?))
}

pub async fn posts_by_tag(
    State(app_state): State<AppState>,
    AuthUser(_): AuthUser,
    PathExtractor(name): PathExtractor<String>,
) -> Result<Json<Vec<Post>>, Error> {
    Ok(Json(app_state.db.forum.by_tag(&name).await?))
}

pub async fn toggle_like(
    State(app_state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathExtractor(post_id): PathExtractor<String>,
) -> Result<Json<LikeReply>, Error> {
    let liked = app_state.db.forum.toggle_like(&post_id, &user_id).await?;
    Ok(Json(LikeReply { liked }))
}
