use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use palaver_core::attachment::{Attachment, UploadFile};
use serde_json::json;

use crate::{CdnError, FileStorageBackend};

/// In-process storage backend. Holds uploaded files in a map keyed by path.
#[derive(Debug, Default)]
pub struct MemoryStorageBackend {
    files: Mutex<HashMap<String, UploadFile>>,
}

impl MemoryStorageBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the file stored at `path`, if any.
    pub fn get(&self, path: &str) -> Option<UploadFile> {
        self.lock().ok()?.get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|files| files.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, UploadFile>>, CdnError> {
        self.files
            .lock()
            .map_err(|_| CdnError::Transport("lock poisoned".into()))
    }
}

#[async_trait]
impl FileStorageBackend for MemoryStorageBackend {
    async fn upload(&self, path: &str, file: &UploadFile) -> Result<Attachment, CdnError> {
        if file.is_empty() {
            return Err(CdnError::MissingPayload);
        }
        self.lock()?.insert(path.to_string(), file.clone());
        Ok(Attachment {
            id: path.rsplit('/').find(|s| !s.is_empty()).map(String::from),
            path: Some(path.to_string()),
            size: Some(file.bytes.len() as u64),
            content_type: Some(file.mime_type.clone()),
            filename: Some(file.filename.clone()),
            ..Default::default()
        })
    }

    async fn delete(&self, path: &str) -> Result<serde_json::Value, CdnError> {
        match self.lock()?.remove(path) {
            Some(_) => Ok(json!({ "success": true })),
            None => Err(CdnError::Remote {
                status: 404,
                body: json!({ "message": "not found" }),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_then_get() {
        let backend = MemoryStorageBackend::new();
        let file = UploadFile::new("image/png", "a.png", vec![1u8, 2, 3]);
        let att = backend.upload("/avatars/u1/abc", &file).await.unwrap();

        assert_eq!(att.id.as_deref(), Some("abc"));
        assert_eq!(att.size, Some(3));
        assert_eq!(att.content_type.as_deref(), Some("image/png"));
        assert_eq!(backend.get("/avatars/u1/abc"), Some(file));
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn upload_empty_is_missing_payload() {
        let backend = MemoryStorageBackend::new();
        let file = UploadFile::new("image/png", "a.png", Vec::<u8>::new());
        let err = backend.upload("/avatars/u1", &file).await.unwrap_err();
        assert!(matches!(err, CdnError::MissingPayload));
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn delete_removes_and_reports_missing() {
        let backend = MemoryStorageBackend::new();
        let file = UploadFile::new("text/plain", "a.txt", "hi");
        backend.upload("/attachments/c/1/a.txt", &file).await.unwrap();

        backend.delete("/attachments/c/1/a.txt").await.unwrap();
        assert!(backend.get("/attachments/c/1/a.txt").is_none());

        match backend.delete("/attachments/c/1/a.txt").await.unwrap_err() {
            CdnError::Remote { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, json!({ "message": "not found" }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
