//! Field-level validation.
//!
//! Each field has one rule, applied the same way on create and on every field
//! supplied to a partial update. Required-ness is checked by the caller, since
//! it depends on the operation rather than the field.

use std::fmt;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::api::{CreateThoughtRequest, ReactionFields, ThoughtFields, UserFields};
use crate::models::{NewThought, NewUser, Reaction, ThoughtPatch, UserPatch};

pub const MAX_TEXT_LEN: usize = 280;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z0-9_\.-]+)@([\da-z\.-]+)\.([a-z\.]{2,6})$").expect("valid email regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Email,
    ThoughtText,
    ThoughtAuthor,
    ReactionBody,
    ReactionAuthor,
}

impl Field {
    /// Name of the field as it appears in request bodies.
    pub fn name(self) -> &'static str {
        match self {
            Self::Username | Self::ThoughtAuthor | Self::ReactionAuthor => "username",
            Self::Email => "email",
            Self::ThoughtText => "thoughtText",
            Self::ReactionBody => "reactionBody",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for Violation {}

/// Normalizes and checks a single field value. Returns the value to store.
pub fn check(field: Field, value: &str) -> Result<String, Violation> {
    let value = match field {
        Field::Username => value.trim(),
        _ => value,
    };

    if value.is_empty() {
        return Err(Violation::new(field.name(), "is required"));
    }

    match field {
        Field::Email if !EMAIL.is_match(value) => {
            return Err(Violation::new(field.name(), "Please use a valid E-mail."));
        }
        Field::ThoughtText | Field::ReactionBody if value.chars().count() > MAX_TEXT_LEN => {
            return Err(Violation::new(
                field.name(),
                format!("must be at most {} characters", MAX_TEXT_LEN),
            ));
        }
        _ => {}
    }

    Ok(value.to_string())
}

fn required(field: Field, value: Option<String>) -> Result<String, Violation> {
    match value {
        Some(v) => check(field, &v),
        None => Err(Violation::new(field.name(), "is required")),
    }
}

fn optional(field: Field, value: Option<String>) -> Result<Option<String>, Violation> {
    value.map(|v| check(field, &v)).transpose()
}

/// Parses an id supplied by a client, naming the offending field on failure.
pub fn id(field: &'static str, raw: &str) -> Result<Uuid, Violation> {
    raw.parse()
        .map_err(|_| Violation::new(field, format!("'{}' is not a valid id", raw)))
}

impl UserFields {
    pub fn into_new(self) -> Result<NewUser, Violation> {
        Ok(NewUser {
            username: required(Field::Username, self.username)?,
            email: required(Field::Email, self.email)?,
        })
    }

    pub fn into_patch(self) -> Result<UserPatch, Violation> {
        Ok(UserPatch {
            username: optional(Field::Username, self.username)?,
            email: optional(Field::Email, self.email)?,
        })
    }
}

impl ThoughtFields {
    pub fn into_patch(self) -> Result<ThoughtPatch, Violation> {
        Ok(ThoughtPatch {
            thought_text: optional(Field::ThoughtText, self.thought_text)?,
            username: optional(Field::ThoughtAuthor, self.username)?,
        })
    }
}

impl CreateThoughtRequest {
    /// Returns the thought to create and the id of the user who should own it.
    pub fn into_new(self) -> Result<(NewThought, Uuid), Violation> {
        let thought = NewThought {
            thought_text: required(Field::ThoughtText, self.thought_text)?,
            username: required(Field::ThoughtAuthor, self.username)?,
        };
        let owner = match self.user_id {
            Some(raw) => id("userId", &raw)?,
            None => return Err(Violation::new("userId", "is required")),
        };
        Ok((thought, owner))
    }
}

impl ReactionFields {
    /// Builds the full reaction value, generating the id and timestamp when
    /// the client did not supply them.
    pub fn into_reaction(self) -> Result<Reaction, Violation> {
        Ok(Reaction {
            reaction_body: required(Field::ReactionBody, self.reaction_body)?,
            username: required(Field::ReactionAuthor, self.username)?,
            reaction_id: self.reaction_id.unwrap_or_else(Uuid::new_v4),
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }
}
