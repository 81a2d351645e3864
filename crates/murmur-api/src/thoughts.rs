use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;

use murmur_types::api::{
    CreateThoughtRequest, MessageResponse, ReactionFields, ThoughtCreatedResponse, ThoughtFields,
    ThoughtResponse,
};
use murmur_types::validate;

use crate::body::Body;
use crate::error::ApiError;
use crate::integrity::{self, ThoughtRemoval};
use crate::{AppState, with_db};

const THOUGHT_NOT_FOUND: &str = "Could not find a Thought matching this ID, Try again.";

fn not_found() -> ApiError {
    ApiError::NotFound(THOUGHT_NOT_FOUND.into())
}

/// GET /api/thoughts, newest first.
pub async fn list_thoughts(
    State(state): State<AppState>,
) -> Result<Json<Vec<ThoughtResponse>>, ApiError> {
    let thoughts = with_db(&state, |db| Ok(db.list_thoughts()?)).await?;
    Ok(Json(thoughts.into_iter().map(ThoughtResponse::from).collect()))
}

/// GET /api/thoughts/{thought_id}
pub async fn get_thought(
    State(state): State<AppState>,
    Path(thought_id): Path<String>,
) -> Result<Json<ThoughtResponse>, ApiError> {
    let id = validate::id("thoughtId", &thought_id)?;

    let thought = with_db(&state, move |db| Ok(db.get_thought(id)?))
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(thought.into()))
}

/// POST /api/thoughts. Creates the thought and links it to `userId`. An
/// unknown user still leaves the thought in place; `userLinked` says which
/// happened.
pub async fn create_thought(
    State(state): State<AppState>,
    Body(req): Body<CreateThoughtRequest>,
) -> Result<Json<ThoughtCreatedResponse>, ApiError> {
    let (new, owner_id) = req.into_new()?;

    let created = with_db(&state, move |db| {
        Ok(integrity::create_thought(db, &new, owner_id)?)
    })
    .await?;

    let user_linked = created.owner.is_some();
    let message = if user_linked {
        "The Thought was created successfully and added to the User account"
    } else {
        "The Thought was created successfully, but no User matches the ID"
    };

    info!(thought_id = %created.thought.id, user_linked, "thought created");
    Ok(Json(ThoughtCreatedResponse {
        message: message.to_string(),
        thought: created.thought.into(),
        user_linked,
    }))
}

/// PUT /api/thoughts/{thought_id}
pub async fn update_thought(
    State(state): State<AppState>,
    Path(thought_id): Path<String>,
    Body(fields): Body<ThoughtFields>,
) -> Result<Json<ThoughtResponse>, ApiError> {
    let id = validate::id("thoughtId", &thought_id)?;
    let patch = fields.into_patch()?;

    let thought = with_db(&state, move |db| Ok(db.update_thought(id, &patch)?))
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(thought.into()))
}

/// DELETE /api/thoughts/{thought_id}, pulling the id from its owners.
pub async fn delete_thought(
    State(state): State<AppState>,
    Path(thought_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = validate::id("thoughtId", &thought_id)?;

    let message = match with_db(&state, move |db| Ok(integrity::delete_thought(db, id)?)).await? {
        ThoughtRemoval::NotFound => return Err(not_found()),
        ThoughtRemoval::Unlinked { .. } => {
            "The Thought has successfully been removed from the db and reference subdocuments."
        }
        ThoughtRemoval::Unreferenced => {
            "The Thought was removed, but no User referenced it."
        }
    };

    Ok(Json(MessageResponse::new(message)))
}

/// POST /api/thoughts/{thought_id}/reactions
pub async fn add_reaction(
    State(state): State<AppState>,
    Path(thought_id): Path<String>,
    Body(fields): Body<ReactionFields>,
) -> Result<Json<ThoughtResponse>, ApiError> {
    let id = validate::id("thoughtId", &thought_id)?;
    let reaction = fields.into_reaction()?;

    let thought = with_db(&state, move |db| Ok(db.add_reaction(id, &reaction)?))
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(thought.into()))
}

/// DELETE /api/thoughts/{thought_id}/reactions/{reaction_id}
pub async fn remove_reaction(
    State(state): State<AppState>,
    Path((thought_id, reaction_id)): Path<(String, String)>,
) -> Result<Json<ThoughtResponse>, ApiError> {
    let id = validate::id("thoughtId", &thought_id)?;
    let reaction = validate::id("reactionId", &reaction_id)?;

    let thought = with_db(&state, move |db| Ok(db.remove_reaction(id, reaction)?))
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(thought.into()))
}
