use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use palaver_core::read_state::ReadState;

use super::super::{SqliteDatabase, SqliteResultExt};
use crate::DbError;

fn row_to_read_state(row: &Row) -> rusqlite::Result<ReadState> {
    Ok(ReadState {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        channel_id: row.get("channel_id")?,
        last_message_id: row.get("last_message_id")?,
        updated_at: row.get("updated_at")?,
    })
}

impl SqliteDatabase {
    pub fn get_read_state_sync(
        &self,
        user_id: &str,
        channel_id: &str,
    ) -> Result<Option<ReadState>, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM read_states WHERE user_id = ?1 AND channel_id = ?2",
                params![user_id, channel_id],
                row_to_read_state,
            )
            .optional()
            .to_db()
        })
    }

    pub fn upsert_read_state_sync(
        &self,
        user_id: &str,
        channel_id: &str,
        last_message_id: &str,
    ) -> Result<ReadState, DbError> {
        self.with_conn(|conn| {
            let id = uuid::Uuid::new_v4().to_string();
            let now = Utc::now();
            // The generated id only sticks on insert; an existing row keeps its own.
            conn.query_row(
                "INSERT INTO read_states (id, user_id, channel_id, last_message_id, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (user_id, channel_id) DO UPDATE SET
                     last_message_id = excluded.last_message_id,
                     updated_at      = excluded.updated_at
                 RETURNING *",
                params![id, user_id, channel_id, last_message_id, now],
                row_to_read_state,
            )
            .to_db()
        })
    }

    pub fn list_read_states_sync(&self, user_id: &str) -> Result<Vec<ReadState>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT * FROM read_states WHERE user_id = ?1 ORDER BY channel_id")
                .to_db()?;
            let states = stmt
                .query_map(params![user_id], row_to_read_state)
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            Ok(states)
        })
    }
}
