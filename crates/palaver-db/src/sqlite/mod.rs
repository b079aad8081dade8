pub(crate) mod migrations;
pub mod queries;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;

use palaver_core::read_state::ReadState;

use crate::{Database, DbConfig, DbError};

/// Extension trait that converts `rusqlite::Result<T>` into `Result<T, DbError>`.
pub(crate) trait SqliteResultExt<T> {
    fn to_db(self) -> Result<T, DbError>;
}

impl<T> SqliteResultExt<T> for rusqlite::Result<T> {
    fn to_db(self) -> Result<T, DbError> {
        self.map_err(map_sqlite_err)
    }
}

#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    pub fn open(config: &DbConfig) -> Result<Self, DbError> {
        let path = config
            .sqlite_path
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| crate::data_dir().join("palaver.db"));
        std::fs::create_dir_all(path.parent().unwrap_or(Path::new(".")))?;
        Self::open_path(&path)
    }

    pub fn open_path(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path).to_db()?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )
        .to_db()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().to_db()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;").to_db()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DbError::Internal("lock poisoned".into()))?;
        f(&conn)
    }

    fn run_migrations(&self) -> Result<(), DbError> {
        self.with_conn(migrations::run)
    }
}

/// Map a `rusqlite::Error` into a `DbError::Internal`.
pub(crate) fn map_sqlite_err(e: rusqlite::Error) -> DbError {
    DbError::Internal(e.to_string())
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn get_read_state(
        &self,
        user_id: &str,
        channel_id: &str,
    ) -> Result<Option<ReadState>, DbError> {
        let db = self.clone();
        let user_id = user_id.to_string();
        let channel_id = channel_id.to_string();
        tokio::task::spawn_blocking(move || db.get_read_state_sync(&user_id, &channel_id))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }

    async fn upsert_read_state(
        &self,
        user_id: &str,
        channel_id: &str,
        last_message_id: &str,
    ) -> Result<ReadState, DbError> {
        let db = self.clone();
        let user_id = user_id.to_string();
        let channel_id = channel_id.to_string();
        let last_message_id = last_message_id.to_string();
        tokio::task::spawn_blocking(move || {
            db.upsert_read_state_sync(&user_id, &channel_id, &last_message_id)
        })
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?
    }

    async fn list_read_states(&self, user_id: &str) -> Result<Vec<ReadState>, DbError> {
        let db = self.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || db.list_read_states_sync(&user_id))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }
}
