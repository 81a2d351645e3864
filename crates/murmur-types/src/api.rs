use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{PopulatedUser, Reaction, Thought, User};
use crate::time;

// -- Users --

/// Body of `POST /api/users` and `PUT /api/users/{id}`. Every field is
/// optional here; required-ness is decided by the validator for the operation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFields {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub thoughts: Vec<Uuid>,
    pub friends: Vec<Uuid>,
    pub friend_count: usize,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let friend_count = user.friend_count();
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            thoughts: user.thoughts,
            friends: user.friends,
            friend_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedUserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub thoughts: Vec<ThoughtResponse>,
    pub friends: Vec<UserResponse>,
    /// Counts stored friend ids, including ones that no longer resolve.
    pub friend_count: usize,
}

impl From<PopulatedUser> for PopulatedUserResponse {
    fn from(populated: PopulatedUser) -> Self {
        let PopulatedUser { user, thoughts, friends } = populated;
        Self {
            friend_count: user.friend_count(),
            id: user.id,
            username: user.username,
            email: user.email,
            thoughts: thoughts.into_iter().map(ThoughtResponse::from).collect(),
            friends: friends.into_iter().map(UserResponse::from).collect(),
        }
    }
}

// -- Thoughts --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThoughtFields {
    pub thought_text: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateThoughtRequest {
    pub thought_text: Option<String>,
    pub username: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThoughtResponse {
    pub id: Uuid,
    pub thought_text: String,
    pub username: String,
    pub created_at: String,
    pub reactions: Vec<ReactionResponse>,
    pub reaction_count: usize,
}

impl From<Thought> for ThoughtResponse {
    fn from(thought: Thought) -> Self {
        let reaction_count = thought.reaction_count();
        Self {
            id: thought.id,
            thought_text: thought.thought_text,
            username: thought.username,
            created_at: time::render(&thought.created_at),
            reactions: thought
                .reactions
                .into_iter()
                .map(ReactionResponse::from)
                .collect(),
            reaction_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThoughtCreatedResponse {
    pub message: String,
    pub thought: ThoughtResponse,
    /// False when the owning user could not be found; the thought still exists.
    pub user_linked: bool,
}

// -- Reactions --

/// Body of `POST /api/thoughts/{id}/reactions`. `reactionId` and `createdAt`
/// are generated when absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionFields {
    pub reaction_body: Option<String>,
    pub username: Option<String>,
    pub reaction_id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionResponse {
    pub reaction_id: Uuid,
    pub reaction_body: String,
    pub username: String,
    pub created_at: String,
}

impl From<Reaction> for ReactionResponse {
    fn from(reaction: Reaction) -> Self {
        Self {
            reaction_id: reaction.reaction_id,
            reaction_body: reaction.reaction_body,
            username: reaction.username,
            created_at: time::render(&reaction.created_at),
        }
    }
}

// -- Confirmations --

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
