mod avatars;
mod http;
mod inline;
mod memory;

pub use avatars::{sniff_content_type, AvatarResolver, ResolvedAsset};
pub use http::HttpStorageBackend;
pub use inline::InlineStore;
pub use memory::MemoryStorageBackend;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use palaver_core::attachment::{Attachment, UploadFile};

pub const DEFAULT_ENDPOINT_PRIVATE: &str = "http://localhost:3001";
pub const DEFAULT_PUBLIC_ROOT: &str = "public";
pub const DEFAULT_ASSETS_ROOT: &str = "assets/public";

#[derive(Debug, thiserror::Error)]
pub enum CdnError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("missing file in body")]
    MissingPayload,

    #[error("invalid {0}")]
    InvalidPayload(String),

    /// Non-200 answer from the storage service; `body` is its decoded
    /// response, untouched.
    #[error("storage service returned {status}: {body}")]
    Remote {
        status: u16,
        body: serde_json::Value,
    },

    #[error("transport error: {0}")]
    Transport(String),
}

/// The remote storage service, as seen from the application side.
#[async_trait]
pub trait FileStorageBackend: Send + Sync {
    /// Store `file` under `path` and return the service's metadata for it.
    async fn upload(&self, path: &str, file: &UploadFile) -> Result<Attachment, CdnError>;

    /// Remove whatever is stored under `path`, returning the service's reply.
    async fn delete(&self, path: &str) -> Result<serde_json::Value, CdnError>;
}

// -- Configuration --

/// Where the storage service lives and how to talk to it.
#[derive(Debug, Clone, Default)]
pub struct CdnConfig {
    /// Private (service-to-service) endpoint of the storage service.
    pub endpoint_private: Option<String>,
    /// Shared secret sent as the `signature` header.
    pub request_signature: String,
    /// Root for inline uploads. Defaults to `public`.
    pub public_root: Option<String>,
    /// Root for built-in assets. Defaults to `assets/public`.
    pub assets_root: Option<String>,
}

impl CdnConfig {
    /// The configured endpoint, or `http://localhost:3001` when unset or empty.
    pub fn endpoint(&self) -> &str {
        match self.endpoint_private.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => DEFAULT_ENDPOINT_PRIVATE,
        }
    }

    pub fn public_root(&self) -> PathBuf {
        PathBuf::from(self.public_root.as_deref().unwrap_or(DEFAULT_PUBLIC_ROOT))
    }

    pub fn assets_root(&self) -> PathBuf {
        PathBuf::from(self.assets_root.as_deref().unwrap_or(DEFAULT_ASSETS_ROOT))
    }
}

// -- Factories --

/// Create the HTTP-backed storage client from configuration.
pub fn create_backend(config: &CdnConfig) -> Arc<dyn FileStorageBackend> {
    Arc::new(HttpStorageBackend::new(
        config.endpoint(),
        config.request_signature.clone(),
    ))
}

pub fn create_inline_store(config: &CdnConfig) -> InlineStore {
    InlineStore::new(config.public_root())
}

pub fn create_avatar_resolver(config: &CdnConfig) -> AvatarResolver {
    AvatarResolver::new(config.assets_root())
}
