use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                email       TEXT NOT NULL UNIQUE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- thought_id and friend_id are plain references: the referenced
            -- rows may be gone, and nothing here is allowed to stop that.
            CREATE TABLE user_thoughts (
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                thought_id  TEXT NOT NULL,
                position    INTEGER NOT NULL
            );

            CREATE INDEX idx_user_thoughts_user
                ON user_thoughts(user_id, position);
            CREATE INDEX idx_user_thoughts_thought
                ON user_thoughts(thought_id);

            CREATE TABLE user_friends (
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                friend_id   TEXT NOT NULL,
                position    INTEGER NOT NULL,
                PRIMARY KEY (user_id, friend_id)
            );

            CREATE TABLE thoughts (
                id            TEXT PRIMARY KEY,
                thought_text  TEXT NOT NULL,
                username      TEXT NOT NULL,
                created_at    TEXT NOT NULL
            );

            CREATE INDEX idx_thoughts_created
                ON thoughts(created_at);

            CREATE TABLE reactions (
                thought_id     TEXT NOT NULL REFERENCES thoughts(id) ON DELETE CASCADE,
                reaction_id    TEXT NOT NULL,
                reaction_body  TEXT NOT NULL,
                username       TEXT NOT NULL,
                created_at     TEXT NOT NULL,
                position       INTEGER NOT NULL
            );

            CREATE INDEX idx_reactions_thought
                ON reactions(thought_id, position);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
