use axum::extract::State;
use axum::Json;

use abi::errors::Error;
use abi::types::{SearchCriteria, User};

use crate::api_utils::custom_extract::{AuthUser, PathExtractor, QueryExtractor};
use crate::AppState;

pub async fn get_user_by_id(
    State(app_state): State<AppState>,
    AuthUser(_): AuthUser,
    PathExtractor(id): PathExtractor<String>,
) -> Result<Json<User>, Error> {
    let user = app_state
        .db
        .user
        .get_user_by_id(&id)
        .await?
        .ok_or_else(|| Error::not_found_with_details(format!("user {id}")))?;
    Ok(Json(user))
}

pub async fn search_user(
    State(app_state): State<AppState>,
    AuthUser(_): AuthUser,
    QueryExtractor(criteria): QueryExtractor<SearchCriteria>,
) -> Result<Json<Vec<User>>, Error> {
    let users = app_state.search.search(&criteria).fetch().await?;
    Ok(Json(users))
}
