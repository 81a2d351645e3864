//! Keeps `User.thoughts` in step with the thoughts that exist.
//!
//! Every rule here is two or more separate store calls with nothing holding
//! them together. If a later step fails or races another request, the earlier
//! step stays done; callers get told what happened rather than a rollback.

use tracing::{debug, warn};
use uuid::Uuid;

use murmur_db::{Database, Result};
use murmur_types::models::{NewThought, Thought, User};

#[derive(Debug)]
pub struct ThoughtCreation {
    pub thought: Thought,
    /// The owner after the thought was appended, or `None` if no user has the
    /// requested id. The thought exists either way.
    pub owner: Option<User>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ThoughtRemoval {
    NotFound,
    /// Deleted, and its id pulled from this many users.
    Unlinked { users: usize },
    /// Deleted, but no user referenced it.
    Unreferenced,
}

#[derive(Debug, PartialEq)]
pub enum UserRemoval {
    NotFound,
    Removed {
        user: User,
        thoughts_deleted: usize,
        thoughts_failed: usize,
    },
}

/// Creates the thought, then appends it to `owner_id`'s thoughts.
pub fn create_thought(db: &Database, new: &NewThought, owner_id: Uuid) -> Result<ThoughtCreation> {
    let thought = db.create_thought(new)?;
    let owner = db.push_thought(owner_id, thought.id)?;

    if owner.is_none() {
        warn!(thought_id = %thought.id, owner_id = %owner_id, "thought created without an owner");
    }

    Ok(ThoughtCreation { thought, owner })
}

/// Deletes the thought, then pulls its id from every user listing it.
pub fn delete_thought(db: &Database, id: Uuid) -> Result<ThoughtRemoval> {
    if !db.delete_thought(id)? {
        return Ok(ThoughtRemoval::NotFound);
    }

    match db.pull_thought(id)? {
        0 => {
            warn!(thought_id = %id, "deleted thought was not referenced by any user");
            Ok(ThoughtRemoval::Unreferenced)
        }
        users => Ok(ThoughtRemoval::Unlinked { users }),
    }
}

/// Deletes the user, then every thought it listed. A thought that fails to
/// delete is logged and counted; the rest still go.
pub fn delete_user(db: &Database, id: Uuid) -> Result<UserRemoval> {
    let Some(user) = db.delete_user(id)? else {
        return Ok(UserRemoval::NotFound);
    };

    let mut thoughts_deleted = 0;
    let mut thoughts_failed = 0;
    for thought_id in &user.thoughts {
        match db.delete_thought(*thought_id) {
            Ok(true) => thoughts_deleted += 1,
            Ok(false) => debug!(thought_id = %thought_id, "listed thought was already gone"),
            Err(e) => {
                warn!(thought_id = %thought_id, "cascade delete failed: {}", e);
                thoughts_failed += 1;
            }
        }
    }

    Ok(UserRemoval::Removed {
        user,
        thoughts_deleted,
        thoughts_failed,
    })
}
