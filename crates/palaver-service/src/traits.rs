use async_trait::async_trait;
use palaver_core::read_state::{AckEntry, ReadState};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Read-state operations for one user at a time.
///
/// `LocalService` writes straight to a `Database`.
/// `HttpService` talks to a running palaver-server.
#[async_trait]
pub trait ReadStateService: Send + Sync {
    /// Acknowledge several channels at once.
    ///
    /// Every entry is an independent write. All of them are attempted and
    /// awaited; if any fails the call fails, but entries that were already
    /// committed stay committed.
    async fn ack_bulk(&self, user_id: &str, entries: &[AckEntry]) -> Result<(), ServiceError>;

    async fn get_read_state(
        &self,
        user_id: &str,
        channel_id: &str,
    ) -> Result<Option<ReadState>, ServiceError>;

    async fn list_read_states(&self, user_id: &str) -> Result<Vec<ReadState>, ServiceError>;
}
