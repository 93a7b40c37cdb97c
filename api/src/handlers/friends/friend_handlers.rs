use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::debug;

use abi::errors::Error;
use abi::types::{Relationship, RelationshipStanding, RelationshipStatus, User};

use crate::api_utils::custom_extract::{AuthUser, PathExtractor};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PendingCount {
    pub count: i64,
}

async fn load_user(app_state: &AppState, id: &str) -> Result<User, Error> {
    app_state
        .db
        .user
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found_with_details(format!("user {id}")))
}

/// the pending request `id`, only if it is addressed to `user_id`
async fn incoming_request(
    app_state: &AppState,
    user_id: &str,
    id: &str,
) -> Result<Relationship, Error> {
    app_state
        .db
        .relationship
        .get_by_id(id)
        .await?
        .filter(|rel| rel.recipient == user_id && rel.status == RelationshipStatus::Pending)
        .ok_or_else(|| Error::not_found_with_details(format!("pending request {id}")))
}

pub async fn send_request(
    State(app_state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathExtractor(target): PathExtractor<String>,
) -> Result<Json<Relationship>, Error> {
    if user_id == target {
        return Err(Error::bad_request("cannot send a friend request to yourself"));
    }
    let requester = load_user(&app_state, &user_id).await?;
    let recipient = load_user(&app_state, &target).await?;
    let relationship = app_state
        .coordinator
        .send_request(&requester, &recipient)
        .await?;
    Ok(Json(relationship))
}

pub async fn accept_request(
    State(app_state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathExtractor(id): PathExtractor<String>,
) -> Result<Json<Relationship>, Error> {
    let relationship = incoming_request(&app_state, &user_id, &id).await?;
    let relationship = app_state.coordinator.accept(relationship).await?;
    Ok(Json(relationship))
}

pub async fn reject_request(
    State(app_state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathExtractor(id): PathExtractor<String>,
) -> Result<Json<Relationship>, Error> {
    let relationship = incoming_request(&app_state, &user_id, &id).await?;
    let relationship = app_state.coordinator.reject(relationship).await?;
    Ok(Json(relationship))
}

pub async fn unfriend(
    State(app_state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathExtractor(friend_id): PathExtractor<String>,
) -> Result<(), Error> {
    debug!("{user_id} unfriends {friend_id}");
    app_state.coordinator.unfriend(&user_id, &friend_id).await
}

pub async fn get_friends(
    State(app_state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<User>>, Error> {
    let friends = app_state.coordinator.friends_of(&user_id).await?;
    Ok(Json(friends))
}

pub async fn get_pending(
    State(app_state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Relationship>>, Error> {
    let list = app_state.coordinator.pending_requests(&user_id).await?;
    Ok(Json(list))
}

pub async fn get_pending_count(
    State(app_state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PendingCount>, Error> {
    let count = app_state.coordinator.pending_count(&user_id).await?;
    Ok(Json(PendingCount { count }))
}

pub async fn get_standing(
    State(app_state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathExtractor(other): PathExtractor<String>,
) -> Result<Json<RelationshipStanding>, Error> {
    load_user(&app_state, &other).await?;
    let standing = app_state.coordinator.standing(&user_id, &other).await?;
    Ok(Json(standing))
}
