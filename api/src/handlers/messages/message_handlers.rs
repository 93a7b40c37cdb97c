use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use abi::errors::Error;
use abi::types::Message;

use crate::api_utils::custom_extract::{AuthUser, JsonExtractor, PathExtractor};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NewMessage {
    pub content: String,
}

pub async fn send_message(
    State(app_state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathExtractor(friend_id): PathExtractor<String>,
    JsonExtractor(new): JsonExtractor<NewMessage>,
) -> Result<Json<Message>, Error> {
    let message = app_state
        .messenger
        .send(&user_id, &friend_id, &new.content)
        .await?;
    Ok(Json(message))
}

pub async fn get_conversation(
    State(app_state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathExtractor(friend_id): PathExtractor<String>,
) -> Result<Json<Vec<Message>>, Error> {
    let messages = app_state
        .messenger
        .conversation(&user_id, &friend_id)
        .await?;
    Ok(Json(messages))
}
