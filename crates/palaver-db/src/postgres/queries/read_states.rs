use chrono::{DateTime, Utc};

use palaver_core::read_state::ReadState;

use super::super::{pg_err, PostgresDatabase};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct ReadStateRow {
    id: String,
    user_id: String,
    channel_id: String,
    last_message_id: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<ReadStateRow> for ReadState {
    fn from(r: ReadStateRow) -> Self {
        ReadState {
            id: r.id,
            user_id: r.user_id,
            channel_id: r.channel_id,
            last_message_id: r.last_message_id,
            updated_at: r.updated_at,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_get_read_state(
        &self,
        user_id: &str,
        channel_id: &str,
    ) -> Result<Option<ReadState>, DbError> {
        let row = sqlx::query_as::<_, ReadStateRow>(
            "SELECT * FROM read_states WHERE user_id = $1 AND channel_id = $2",
        )
        .bind(user_id)
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.map(Into::into))
    }

    pub(crate) async fn pg_upsert_read_state(
        &self,
        user_id: &str,
        channel_id: &str,
        last_message_id: &str,
    ) -> Result<ReadState, DbError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        let row = sqlx::query_as::<_, ReadStateRow>(
            "INSERT INTO read_states (id, user_id, channel_id, last_message_id, updated_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id, channel_id) DO UPDATE SET
                 last_message_id = EXCLUDED.last_message_id,
                 updated_at      = EXCLUDED.updated_at
             RETURNING *",
        )
        .bind(&id)
        .bind(user_id)
        .bind(channel_id)
        .bind(last_message_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.into())
    }

    pub(crate) async fn pg_list_read_states(
        &self,
        user_id: &str,
    ) -> Result<Vec<ReadState>, DbError> {
        let rows = sqlx::query_as::<_, ReadStateRow>(
            "SELECT * FROM read_states WHERE user_id = $1 ORDER BY channel_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}
