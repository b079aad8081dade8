use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use palaver_core::read_state::{AckEntry, ReadState};
use palaver_db::{Database, DbError};

use crate::{ReadStateService, ServiceError};

/// Local implementation backed by a `Database` handle.
#[derive(Clone)]
pub struct LocalService {
    db: Arc<dyn Database>,
}

impl LocalService {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(msg) => ServiceError::NotFound(msg),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

#[async_trait]
impl ReadStateService for LocalService {
    async fn ack_bulk(&self, user_id: &str, entries: &[AckEntry]) -> Result<(), ServiceError> {
        let writes = entries.iter().map(|entry| async move {
            self.db
                .upsert_read_state(user_id, &entry.channel_id, &entry.message_id)
                .await
                .map_err(|e| (entry, e))
        });
        let results = join_all(writes).await;

        let mut failed = 0usize;
        let mut first_failure = None;
        for result in results {
            if let Err((entry, e)) = result {
                tracing::warn!(
                    user_id,
                    channel_id = %entry.channel_id,
                    "read state ack failed: {e}"
                );
                failed += 1;
                first_failure.get_or_insert(format!("channel {}: {e}", entry.channel_id));
            }
        }

        match first_failure {
            None => {
                tracing::debug!(user_id, count = entries.len(), "acked read states");
                Ok(())
            }
            Some(first) => Err(ServiceError::Persistence(format!(
                "{failed} of {} read states not saved ({first})",
                entries.len()
            ))),
        }
    }

    async fn get_read_state(
        &self,
        user_id: &str,
        channel_id: &str,
    ) -> Result<Option<ReadState>, ServiceError> {
        Ok(self.db.get_read_state(user_id, channel_id).await?)
    }

    async fn list_read_states(&self, user_id: &str) -> Result<Vec<ReadState>, ServiceError> {
        Ok(self.db.list_read_states(user_id).await?)
    }
}
