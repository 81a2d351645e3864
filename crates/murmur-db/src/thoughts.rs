use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use tracing::debug;
use uuid::Uuid;

use murmur_types::models::{NewThought, Reaction, Thought, ThoughtPatch};

use crate::models::{ReactionRow, ThoughtRow, format_timestamp, parse_timestamp};
use crate::{Database, Result, in_batches, placeholders};

impl Database {
    // -- Thoughts --

    /// All thoughts, newest first.
    pub fn list_thoughts(&self) -> Result<Vec<Thought>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, thought_text, username, created_at
                 FROM thoughts
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([], thought_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut reactions = group_reactions(query_reactions(conn, None)?)?;
            rows.into_iter()
                .map(|row| {
                    let owned = reactions.remove(&row.id).unwrap_or_default();
                    row.into_thought(owned)
                })
                .collect()
        })
    }

    pub fn get_thought(&self, id: Uuid) -> Result<Option<Thought>> {
        self.with_conn(|conn| query_thought(conn, id))
    }

    pub fn create_thought(&self, new: &NewThought) -> Result<Thought> {
        let id = Uuid::new_v4();
        let created_at = format_timestamp(&Utc::now());

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO thoughts (id, thought_text, username, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![id.to_string(), new.thought_text, new.username, created_at],
            )?;
            debug!(thought_id = %id, "thought created");

            Ok(Thought {
                id,
                thought_text: new.thought_text.clone(),
                username: new.username.clone(),
                created_at: parse_timestamp(&created_at)?,
                reactions: vec![],
            })
        })
    }

    /// Applies only the fields present in `patch`. `None` when the thought
    /// does not exist.
    pub fn update_thought(&self, id: Uuid, patch: &ThoughtPatch) -> Result<Option<Thought>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE thoughts
                 SET thought_text = COALESCE(?2, thought_text),
                     username = COALESCE(?3, username)
                 WHERE id = ?1",
                params![id.to_string(), patch.thought_text, patch.username],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_thought(conn, id)
        })
    }

    /// Returns whether a thought was removed. Its reactions go with it.
    pub fn delete_thought(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM thoughts WHERE id = ?1", [id.to_string()])?;
            Ok(removed > 0)
        })
    }

    // -- Reactions --

    /// Appends `reaction` unless an identical value (every field equal) is
    /// already present.
    pub fn add_reaction(&self, thought_id: Uuid, reaction: &Reaction) -> Result<Option<Thought>> {
        self.with_conn(|conn| {
            if !thought_exists(conn, thought_id)? {
                return Ok(None);
            }

            let tid = thought_id.to_string();
            let rid = reaction.reaction_id.to_string();
            let created_at = format_timestamp(&reaction.created_at);

            let duplicate: bool = conn.query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM reactions
                    WHERE thought_id = ?1 AND reaction_id = ?2 AND reaction_body = ?3
                      AND username = ?4 AND created_at = ?5
                 )",
                params![tid, rid, reaction.reaction_body, reaction.username, created_at],
                |row| row.get(0),
            )?;

            if duplicate {
                debug!(thought_id = %thought_id, reaction_id = %rid, "identical reaction already present");
            } else {
                conn.execute(
                    "INSERT INTO reactions (thought_id, reaction_id, reaction_body, username, created_at, position)
                     VALUES (?1, ?2, ?3, ?4, ?5,
                             (SELECT COALESCE(MAX(position), -1) + 1 FROM reactions WHERE thought_id = ?1))",
                    params![tid, rid, reaction.reaction_body, reaction.username, created_at],
                )?;
            }

            query_thought(conn, thought_id)
        })
    }

    /// Removes every reaction carrying `reaction_id`. An unknown id leaves
    /// the thought untouched.
    pub fn remove_reaction(&self, thought_id: Uuid, reaction_id: Uuid) -> Result<Option<Thought>> {
        self.with_conn(|conn| {
            if !thought_exists(conn, thought_id)? {
                return Ok(None);
            }

            conn.execute(
                "DELETE FROM reactions WHERE thought_id = ?1 AND reaction_id = ?2",
                params![thought_id.to_string(), reaction_id.to_string()],
            )?;

            query_thought(conn, thought_id)
        })
    }
}

fn thought_row(row: &Row<'_>) -> rusqlite::Result<ThoughtRow> {
    Ok(ThoughtRow {
        id: row.get(0)?,
        thought_text: row.get(1)?,
        username: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn thought_exists(conn: &Connection, id: Uuid) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM thoughts WHERE id = ?1)",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub(crate) fn query_thought(conn: &Connection, id: Uuid) -> Result<Option<Thought>> {
    let tid = id.to_string();
    let row = conn
        .query_row(
            "SELECT id, thought_text, username, created_at FROM thoughts WHERE id = ?1",
            [&tid],
            thought_row,
        )
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };

    let reactions = query_reactions(conn, Some(std::slice::from_ref(&tid)))?
        .into_iter()
        .map(Reaction::try_from)
        .collect::<Result<Vec<_>>>()?;

    row.into_thought(reactions).map(Some)
}

/// Batch-fetch thoughts by id, keyed by id. Ids with no matching row are
/// simply absent from the map.
pub(crate) fn query_thoughts_by_ids(conn: &Connection, ids: &[String]) -> Result<HashMap<Uuid, Thought>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = in_batches(ids, |batch| {
        let sql = format!(
            "SELECT id, thought_text, username, created_at FROM thoughts WHERE id IN ({})",
            placeholders(batch.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(batch.iter()), thought_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })?;

    let found: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut reactions = group_reactions(query_reactions(conn, Some(found.as_slice()))?)?;

    rows.into_iter()
        .map(|row| {
            let owned = reactions.remove(&row.id).unwrap_or_default();
            let thought = row.into_thought(owned)?;
            Ok((thought.id, thought))
        })
        .collect()
}

/// Reactions in insertion order, for the given thoughts or for all of them.
fn query_reactions(conn: &Connection, thought_ids: Option<&[String]>) -> Result<Vec<ReactionRow>> {
    let rows = match thought_ids {
        Some([]) => vec![],
        // A thought's reactions all land in the same batch, so per-thought
        // order holds.
        Some(ids) => in_batches(ids, |batch| {
            let sql = format!(
                "SELECT thought_id, reaction_id, reaction_body, username, created_at
                 FROM reactions
                 WHERE thought_id IN ({})
                 ORDER BY thought_id, position",
                placeholders(batch.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(batch.iter()), reaction_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?,
        None => {
            let mut stmt = conn.prepare(
                "SELECT thought_id, reaction_id, reaction_body, username, created_at
                 FROM reactions
                 ORDER BY thought_id, position",
            )?;
            let rows = stmt
                .query_map([], reaction_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
    };

    Ok(rows)
}

fn reaction_row(row: &Row<'_>) -> rusqlite::Result<ReactionRow> {
    Ok(ReactionRow {
        thought_id: row.get(0)?,
        reaction_id: row.get(1)?,
        reaction_body: row.get(2)?,
        username: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn group_reactions(rows: Vec<ReactionRow>) -> Result<HashMap<String, Vec<Reaction>>> {
    let mut grouped: HashMap<String, Vec<Reaction>> = HashMap::new();
    for row in rows {
        let thought_id = row.thought_id.clone();
        grouped.entry(thought_id).or_default().push(Reaction::try_from(row)?);
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn new_thought(text: &str) -> NewThought {
        NewThought {
            thought_text: text.to_string(),
            username: "ann".to_string(),
        }
    }

    fn reaction(body: &str) -> Reaction {
        Reaction {
            reaction_id: Uuid::new_v4(),
            reaction_body: body.to_string(),
            username: "bob".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn list_is_newest_first() {
        let db = db();
        let first = db.create_thought(&new_thought("first")).unwrap();
        let second = db.create_thought(&new_thought("second")).unwrap();

        let ids: Vec<Uuid> = db.list_thoughts().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn get_returns_none_for_unknown_id() {
        assert_eq!(db().get_thought(Uuid::new_v4()).unwrap(), None);
    }

    #[test]
    fn update_touches_only_supplied_fields() {
        let db = db();
        let thought = db.create_thought(&new_thought("draft")).unwrap();

        let patch = ThoughtPatch {
            thought_text: Some("final".into()),
            username: None,
        };
        let updated = db.update_thought(thought.id, &patch).unwrap().unwrap();
        assert_eq!(updated.thought_text, "final");
        assert_eq!(updated.username, "ann");
        assert_eq!(updated.created_at, thought.created_at);

        assert_eq!(db.update_thought(Uuid::new_v4(), &patch).unwrap(), None);
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let db = db();
        let thought = db.create_thought(&new_thought("bye")).unwrap();
        db.add_reaction(thought.id, &reaction("ok")).unwrap();

        assert!(db.delete_thought(thought.id).unwrap());
        assert!(!db.delete_thought(thought.id).unwrap());
        assert!(db.list_thoughts().unwrap().is_empty());
    }

    #[test]
    fn identical_reaction_is_stored_once() {
        let db = db();
        let thought = db.create_thought(&new_thought("hello")).unwrap();
        let r = reaction("nice");

        db.add_reaction(thought.id, &r).unwrap();
        let after = db.add_reaction(thought.id, &r).unwrap().unwrap();
        assert_eq!(after.reaction_count(), 1);
        assert_eq!(after.reactions[0].reaction_id, r.reaction_id);
    }

    #[test]
    fn fresh_ids_make_same_body_a_new_reaction() {
        let db = db();
        let thought = db.create_thought(&new_thought("hello")).unwrap();

        db.add_reaction(thought.id, &reaction("nice")).unwrap();
        let after = db.add_reaction(thought.id, &reaction("nice")).unwrap().unwrap();
        assert_eq!(after.reaction_count(), 2);
    }

    #[test]
    fn reactions_keep_insertion_order() {
        let db = db();
        let thought = db.create_thought(&new_thought("hello")).unwrap();
        for body in ["a", "b", "c"] {
            db.add_reaction(thought.id, &reaction(body)).unwrap();
        }

        let bodies: Vec<String> = db
            .get_thought(thought.id)
            .unwrap()
            .unwrap()
            .reactions
            .into_iter()
            .map(|r| r.reaction_body)
            .collect();
        assert_eq!(bodies, vec!["a", "b", "c"]);
    }

    #[test]
    fn add_reaction_to_missing_thought() {
        assert_eq!(db().add_reaction(Uuid::new_v4(), &reaction("x")).unwrap(), None);
    }

    #[test]
    fn removing_unknown_reaction_is_a_no_op() {
        let db = db();
        let thought = db.create_thought(&new_thought("hello")).unwrap();
        db.add_reaction(thought.id, &reaction("keep")).unwrap();

        let after = db.remove_reaction(thought.id, Uuid::new_v4()).unwrap().unwrap();
        assert_eq!(after.reaction_count(), 1);

        assert_eq!(db.remove_reaction(Uuid::new_v4(), Uuid::new_v4()).unwrap(), None);
    }

    #[test]
    fn remove_reaction_drops_every_match() {
        let db = db();
        let thought = db.create_thought(&new_thought("hello")).unwrap();
        let target = reaction("dup");
        let mut twin = target.clone();
        twin.reaction_body = "same id, other body".into();

        db.add_reaction(thought.id, &target).unwrap();
        db.add_reaction(thought.id, &twin).unwrap();
        db.add_reaction(thought.id, &reaction("other")).unwrap();

        let after = db.remove_reaction(thought.id, target.reaction_id).unwrap().unwrap();
        assert_eq!(after.reaction_count(), 1);
        assert_eq!(after.reactions[0].reaction_body, "other");
    }
}
