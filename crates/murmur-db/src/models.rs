//! Database row types. These map directly to SQLite rows and are
//! converted into murmur-types models once ids and timestamps are parsed.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use murmur_types::models::{Reaction, Thought};

use crate::{Result, StoreError};

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
}

pub struct ThoughtRow {
    pub id: String,
    pub thought_text: String,
    pub username: String,
    pub created_at: String,
}

pub struct ReactionRow {
    pub thought_id: String,
    pub reaction_id: String,
    pub reaction_body: String,
    pub username: String,
    pub created_at: String,
}

impl ThoughtRow {
    pub fn into_thought(self, reactions: Vec<Reaction>) -> Result<Thought> {
        Ok(Thought {
            id: parse_id(&self.id)?,
            thought_text: self.thought_text,
            username: self.username,
            created_at: parse_timestamp(&self.created_at)?,
            reactions,
        })
    }
}

impl TryFrom<ReactionRow> for Reaction {
    type Error = StoreError;

    fn try_from(row: ReactionRow) -> Result<Self> {
        Ok(Reaction {
            reaction_id: parse_id(&row.reaction_id)?,
            reaction_body: row.reaction_body,
            username: row.username,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid> {
    raw.parse()
        .map_err(|e| StoreError::Corrupt(format!("id '{}': {}", raw, e)))
}

/// Fixed-width RFC 3339 so that ordering by the text column is ordering by time.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("timestamp '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stored_timestamps_sort_lexically() {
        let earlier = Utc.with_ymd_and_hms(2026, 1, 9, 23, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
        assert!(format_timestamp(&earlier) < format_timestamp(&later));
    }

    #[test]
    fn corrupt_values_are_reported() {
        assert!(matches!(parse_id("xyz"), Err(StoreError::Corrupt(_))));
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(StoreError::Corrupt(_))
        ));
    }
}
