use std::collections::{HashMap, HashSet};

use rusqlite::{Connection, Row, params, params_from_iter};
use tracing::debug;
use uuid::Uuid;

use murmur_types::models::{NewUser, PopulatedUser, User, UserPatch};

use crate::models::{UserRow, parse_id};
use crate::thoughts::query_thoughts_by_ids;
use crate::{Database, Result, in_batches, placeholders};

impl Database {
    // -- Users --

    /// All users with thoughts and friends resolved, in creation order.
    pub fn list_users(&self) -> Result<Vec<PopulatedUser>> {
        self.with_conn(|conn| {
            let users = query_users(conn, None)?;
            populate(conn, users)
        })
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<PopulatedUser>> {
        self.with_conn(|conn| match query_user(conn, id)? {
            Some(user) => Ok(populate(conn, vec![user])?.pop()),
            None => Ok(None),
        })
    }

    pub fn create_user(&self, new: &NewUser) -> Result<User> {
        let id = Uuid::new_v4();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email) VALUES (?1, ?2, ?3)",
                params![id.to_string(), new.username, new.email],
            )?;
            debug!(user_id = %id, username = %new.username, "user created");

            Ok(User {
                id,
                username: new.username.clone(),
                email: new.email.clone(),
                thoughts: vec![],
                friends: vec![],
            })
        })
    }

    /// Applies only the fields present in `patch`. `None` when the user does
    /// not exist.
    pub fn update_user(&self, id: Uuid, patch: &UserPatch) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users
                 SET username = COALESCE(?2, username),
                     email = COALESCE(?3, email)
                 WHERE id = ?1",
                params![id.to_string(), patch.username, patch.email],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_user(conn, id)
        })
    }

    /// Removes the user and its link rows, returning the user as it was.
    /// Referenced thoughts are left alone.
    pub fn delete_user(&self, id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let Some(user) = query_user(conn, id)? else {
                return Ok(None);
            };
            conn.execute("DELETE FROM users WHERE id = ?1", [id.to_string()])?;
            Ok(Some(user))
        })
    }

    // -- Friends --

    /// Adds `friend_id` unless already present. The friend does not have to
    /// exist, and nothing is added in the other direction.
    pub fn add_friend(&self, user_id: Uuid, friend_id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| {
            if !user_exists(conn, user_id)? {
                return Ok(None);
            }
            conn.execute(
                "INSERT OR IGNORE INTO user_friends (user_id, friend_id, position)
                 VALUES (?1, ?2,
                         (SELECT COALESCE(MAX(position), -1) + 1 FROM user_friends WHERE user_id = ?1))",
                params![user_id.to_string(), friend_id.to_string()],
            )?;
            query_user(conn, user_id)
        })
    }

    pub fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| {
            if !user_exists(conn, user_id)? {
                return Ok(None);
            }
            conn.execute(
                "DELETE FROM user_friends WHERE user_id = ?1 AND friend_id = ?2",
                params![user_id.to_string(), friend_id.to_string()],
            )?;
            query_user(conn, user_id)
        })
    }

    // -- Thought references --

    /// Appends `thought_id` to the user's thoughts. `None` when the user does
    /// not exist.
    pub fn push_thought(&self, user_id: Uuid, thought_id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| {
            if !user_exists(conn, user_id)? {
                return Ok(None);
            }
            conn.execute(
                "INSERT INTO user_thoughts (user_id, thought_id, position)
                 VALUES (?1, ?2,
                         (SELECT COALESCE(MAX(position), -1) + 1 FROM user_thoughts WHERE user_id = ?1))",
                params![user_id.to_string(), thought_id.to_string()],
            )?;
            query_user(conn, user_id)
        })
    }

    /// Drops `thought_id` from every user that lists it. Returns how many
    /// users were touched.
    pub fn pull_thought(&self, thought_id: Uuid) -> Result<usize> {
        self.with_conn(|conn| {
            let tid = thought_id.to_string();
            let owners: i64 = conn.query_row(
                "SELECT COUNT(DISTINCT user_id) FROM user_thoughts WHERE thought_id = ?1",
                [&tid],
                |row| row.get(0),
            )?;
            conn.execute("DELETE FROM user_thoughts WHERE thought_id = ?1", [&tid])?;
            Ok(owners as usize)
        })
    }
}

fn user_exists(conn: &Connection, id: Uuid) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn user_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
    })
}

fn query_user(conn: &Connection, id: Uuid) -> Result<Option<User>> {
    let uid = id.to_string();
    Ok(query_users(conn, Some(std::slice::from_ref(&uid)))?.pop())
}

/// Users with their id lists attached, for the given ids or for everyone.
/// Lookups by id are ordered by creation only within each batch.
fn query_users(conn: &Connection, ids: Option<&[String]>) -> Result<Vec<User>> {
    let rows = match ids {
        Some([]) => return Ok(vec![]),
        Some(ids) => in_batches(ids, |batch| {
            let sql = format!(
                "SELECT id, username, email FROM users WHERE id IN ({}) ORDER BY rowid",
                placeholders(batch.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(batch.iter()), user_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?,
        None => {
            let mut stmt = conn.prepare("SELECT id, username, email FROM users ORDER BY rowid")?;
            let rows = stmt
                .query_map([], user_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
    };

    let user_ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut thoughts = query_links(conn, "user_thoughts", "thought_id", &user_ids)?;
    let mut friends = query_links(conn, "user_friends", "friend_id", &user_ids)?;

    rows.into_iter()
        .map(|row| {
            Ok(User {
                id: parse_id(&row.id)?,
                thoughts: thoughts.remove(&row.id).unwrap_or_default(),
                friends: friends.remove(&row.id).unwrap_or_default(),
                username: row.username,
                email: row.email,
            })
        })
        .collect()
}

/// Ordered referenced ids per user from one of the link tables.
fn query_links(
    conn: &Connection,
    table: &str,
    column: &str,
    user_ids: &[String],
) -> Result<HashMap<String, Vec<Uuid>>> {
    let mut links: HashMap<String, Vec<Uuid>> = HashMap::new();
    if user_ids.is_empty() {
        return Ok(links);
    }

    let rows = in_batches(user_ids, |batch| {
        let sql = format!(
            "SELECT user_id, {column} FROM {table} WHERE user_id IN ({}) ORDER BY user_id, position",
            placeholders(batch.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(batch.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })?;

    for (user_id, target) in rows {
        links.entry(user_id).or_default().push(parse_id(&target)?);
    }
    Ok(links)
}

/// Resolves id lists one level deep. References that no longer resolve are
/// left out of the resolved lists.
fn populate(conn: &Connection, users: Vec<User>) -> Result<Vec<PopulatedUser>> {
    let thought_ids = distinct(users.iter().flat_map(|u| u.thoughts.iter()));
    let friend_ids = distinct(users.iter().flat_map(|u| u.friends.iter()));

    let thoughts = query_thoughts_by_ids(conn, &thought_ids)?;
    let friends: HashMap<Uuid, User> = query_users(conn, Some(friend_ids.as_slice()))?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    Ok(users
        .into_iter()
        .map(|user| PopulatedUser {
            thoughts: user
                .thoughts
                .iter()
                .filter_map(|id| thoughts.get(id).cloned())
                .collect(),
            friends: user
                .friends
                .iter()
                .filter_map(|id| friends.get(id).cloned())
                .collect(),
            user,
        })
        .collect())
}

/// Ids as strings, first occurrence kept.
fn distinct<'a>(ids: impl Iterator<Item = &'a Uuid>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(**id)).map(Uuid::to_string).collect()
}
