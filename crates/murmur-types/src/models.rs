use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A registered user. `thoughts` and `friends` hold ids only; the referenced
/// records may have been deleted since they were linked.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub thoughts: Vec<Uuid>,
    pub friends: Vec<Uuid>,
}

impl User {
    pub fn friend_count(&self) -> usize {
        self.friends.len()
    }
}

/// A user with its thought and friend references resolved one level deep.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulatedUser {
    pub user: User,
    pub thoughts: Vec<Thought>,
    pub friends: Vec<User>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Thought {
    pub id: Uuid,
    pub thought_text: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub reactions: Vec<Reaction>,
}

impl Thought {
    pub fn reaction_count(&self) -> usize {
        self.reactions.len()
    }
}

/// Embedded in a thought; never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub reaction_id: Uuid,
    pub reaction_body: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

// -- Validated inputs --

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewThought {
    pub thought_text: String,
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThoughtPatch {
    pub thought_text: Option<String>,
    pub username: Option<String>,
}
