pub(crate) mod migrations;
pub mod queries;

pub use migrations::MIGRATION_LOCK_KEY;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use palaver_core::read_state::ReadState;

use crate::{Database, DbError};

/// Map a sqlx::Error into a DbError::Internal.
pub(crate) fn pg_err(e: sqlx::Error) -> DbError {
    DbError::Internal(e.to_string())
}

#[derive(Clone)]
pub struct PostgresDatabase {
    pub(crate) pool: PgPool,
}

impl PostgresDatabase {
    /// Connect to a Postgres database and run migrations.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(pg_err)?;

        let db = Self { pool };
        migrations::run(&db.pool).await?;
        Ok(db)
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    async fn get_read_state(
        &self,
        user_id: &str,
        channel_id: &str,
    ) -> Result<Option<ReadState>, DbError> {
        self.pg_get_read_state(user_id, channel_id).await
    }
    async fn upsert_read_state(
        &self,
        user_id: &str,
        channel_id: &str,
        last_message_id: &str,
    ) -> Result<ReadState, DbError> {
        self.pg_upsert_read_state(user_id, channel_id, last_message_id)
            .await
    }
    async fn list_read_states(&self, user_id: &str) -> Result<Vec<ReadState>, DbError> {
        self.pg_list_read_states(user_id).await
    }
}
