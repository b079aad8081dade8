#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use palaver_core::read_state::ReadState;
use thiserror::Error;

#[cfg(feature = "postgres")]
pub use postgres::PostgresDatabase;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Internal(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistent read-state storage.
///
/// Both backends implement the same contract; `upsert_read_state` is a
/// single atomic statement so concurrent acks for the same
/// `(user_id, channel_id)` never produce duplicate rows.
#[async_trait]
pub trait Database: Send + Sync {
    /// Fetch the read state for one channel, if the user has ever acked it.
    async fn get_read_state(
        &self,
        user_id: &str,
        channel_id: &str,
    ) -> Result<Option<ReadState>, DbError>;

    /// Insert or update the read state for `(user_id, channel_id)`, setting
    /// `last_message_id` unconditionally. Returns the stored row.
    async fn upsert_read_state(
        &self,
        user_id: &str,
        channel_id: &str,
        last_message_id: &str,
    ) -> Result<ReadState, DbError>;

    /// All read states owned by a user, ordered by channel id.
    async fn list_read_states(&self, user_id: &str) -> Result<Vec<ReadState>, DbError>;
}

/// Which backend to open and where.
#[derive(Debug, Clone, Default)]
pub struct DbConfig {
    /// SQLite file path. Defaults to `<data dir>/palaver.db`.
    pub sqlite_path: Option<String>,
    /// Postgres connection URL. When set (and the `postgres` feature is
    /// enabled) it takes precedence over SQLite.
    pub database_url: Option<String>,
}

/// Open the configured backend.
pub async fn open_database(config: &DbConfig) -> Result<Arc<dyn Database>, DbError> {
    if let Some(url) = config.database_url.as_deref() {
        #[cfg(feature = "postgres")]
        {
            tracing::info!("using postgres read-state store");
            return Ok(Arc::new(PostgresDatabase::connect(url).await?));
        }
        #[cfg(not(feature = "postgres"))]
        {
            let _ = url;
            return Err(DbError::Internal(
                "DATABASE_URL is set but the 'postgres' feature is not enabled".into(),
            ));
        }
    }

    #[cfg(feature = "sqlite")]
    {
        let db = SqliteDatabase::open(config)?;
        tracing::info!("using sqlite read-state store");
        Ok(Arc::new(db))
    }
    #[cfg(not(feature = "sqlite"))]
    {
        Err(DbError::Internal("no database backend enabled".into()))
    }
}

/// `$XDG_DATA_HOME/palaver`, falling back to `~/.local/share/palaver`.
pub fn data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("palaver")
}
