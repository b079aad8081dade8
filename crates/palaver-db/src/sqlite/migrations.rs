use chrono::Utc;
use rusqlite::{params, Connection};

use super::SqliteResultExt;
use crate::DbError;

pub(crate) const LATEST_VERSION: i64 = 1;

pub(crate) fn run(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )
    .to_db()?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .to_db()?;

    if current_version < 1 {
        // v1: read states, one row per (user, channel)
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS read_states (
                 id              TEXT PRIMARY KEY,
                 user_id         TEXT NOT NULL,
                 channel_id      TEXT NOT NULL,
                 last_message_id TEXT,
                 updated_at      TEXT NOT NULL
             );
             CREATE UNIQUE INDEX IF NOT EXISTS idx_read_states_user_channel
                 ON read_states(user_id, channel_id);",
        )
        .to_db()?;
        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
            params![1, Utc::now()],
        )
        .to_db()?;
        tracing::debug!("applied sqlite migration v1");
    }

    Ok(())
}
