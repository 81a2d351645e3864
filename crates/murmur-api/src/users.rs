use axum::{
    Json,
    extract::{Path, State},
};
use tracing::{info, warn};

use murmur_types::api::{MessageResponse, PopulatedUserResponse, UserFields, UserResponse};
use murmur_types::validate;

use crate::body::Body;
use crate::error::ApiError;
use crate::integrity::{self, UserRemoval};
use crate::{AppState, with_db};

const USER_NOT_FOUND: &str = "Could not find a User matching this ID, Try again.";

fn not_found() -> ApiError {
    ApiError::NotFound(USER_NOT_FOUND.into())
}

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<PopulatedUserResponse>>, ApiError> {
    let users = with_db(&state, |db| Ok(db.list_users()?)).await?;
    Ok(Json(users.into_iter().map(PopulatedUserResponse::from).collect()))
}

/// GET /api/users/{user_id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<PopulatedUserResponse>, ApiError> {
    let id = validate::id("userId", &user_id)?;

    let user = with_db(&state, move |db| Ok(db.get_user(id)?))
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(user.into()))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    Body(fields): Body<UserFields>,
) -> Result<Json<UserResponse>, ApiError> {
    let new = fields.into_new()?;

    let user = with_db(&state, move |db| Ok(db.create_user(&new)?)).await?;

    info!(user_id = %user.id, "user created");
    Ok(Json(user.into()))
}

/// PUT /api/users/{user_id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Body(fields): Body<UserFields>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = validate::id("userId", &user_id)?;
    let patch = fields.into_patch()?;

    let user = with_db(&state, move |db| Ok(db.update_user(id, &patch)?))
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(user.into()))
}

/// DELETE /api/users/{user_id}, cascading to the user's thoughts.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = validate::id("userId", &user_id)?;

    match with_db(&state, move |db| Ok(integrity::delete_user(db, id)?)).await? {
        UserRemoval::NotFound => Err(not_found()),
        UserRemoval::Removed {
            thoughts_deleted,
            thoughts_failed: 0,
            ..
        } => {
            info!(user_id = %id, thoughts_deleted, "user removed");
            Ok(Json(MessageResponse::new(
                "Successfully removed the User and all their associated data.",
            )))
        }
        UserRemoval::Removed {
            thoughts_deleted,
            thoughts_failed,
            ..
        } => {
            warn!(user_id = %id, thoughts_deleted, thoughts_failed, "user removed with leftover thoughts");
            Ok(Json(MessageResponse::new(format!(
                "Removed the User, but {} of their Thoughts could not be deleted.",
                thoughts_failed
            ))))
        }
    }
}

/// POST /api/users/{user_id}/friends/{friend_id}
pub async fn add_friend(
    State(state): State<AppState>,
    Path((user_id, friend_id)): Path<(String, String)>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = validate::id("userId", &user_id)?;
    let friend = validate::id("friendId", &friend_id)?;

    let user = with_db(&state, move |db| Ok(db.add_friend(id, friend)?))
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(user.into()))
}

/// DELETE /api/users/{user_id}/friends/{friend_id}
pub async fn remove_friend(
    State(state): State<AppState>,
    Path((user_id, friend_id)): Path<(String, String)>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = validate::id("userId", &user_id)?;
    let friend = validate::id("friendId", &friend_id)?;

    let user = with_db(&state, move |db| Ok(db.remove_friend(id, friend)?))
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(user.into()))
}
