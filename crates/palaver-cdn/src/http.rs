use async_trait::async_trait;
use palaver_core::attachment::{Attachment, UploadFile};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};

use crate::{CdnError, FileStorageBackend};

/// Header carrying the shared service-to-service secret.
pub const SIGNATURE_HEADER: &str = "signature";

/// Storage client that talks to the remote storage service over HTTP.
///
/// Every request carries the `signature` header. One request per call,
/// no retries.
pub struct HttpStorageBackend {
    endpoint: String,
    signature: String,
    client: Client,
}

impl std::fmt::Debug for HttpStorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStorageBackend")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HttpStorageBackend {
    pub fn new(endpoint: &str, signature: String) -> Self {
        Self::with_client(endpoint, signature, Client::new())
    }

    /// Reuse an existing client (and its connection pool).
    pub fn with_client(endpoint: &str, signature: String, client: Client) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            signature,
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.endpoint)
    }

    fn signed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(SIGNATURE_HEADER, self.signature.as_str())
    }
}

fn file_part(file: &UploadFile) -> Part {
    let part = Part::bytes(file.bytes.to_vec()).file_name(file.filename.clone());
    match part.mime_str(&file.mime_type) {
        Ok(part) => part,
        Err(e) => {
            tracing::warn!(mime = %file.mime_type, "unusable mime type, sending without one: {e}");
            Part::bytes(file.bytes.to_vec()).file_name(file.filename.clone())
        }
    }
}

/// Decode a response body as JSON. Bodies that are not JSON become a JSON
/// string so error payloads are never dropped.
async fn read_body(resp: reqwest::Response) -> Result<serde_json::Value, CdnError> {
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| CdnError::Transport(format!("read body: {e}")))?;
    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(value),
        Err(_) => Ok(serde_json::Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        )),
    }
}

async fn handle_response(resp: reqwest::Response) -> Result<serde_json::Value, CdnError> {
    let status = resp.status();
    let body = read_body(resp).await?;
    if status == StatusCode::OK {
        Ok(body)
    } else {
        Err(CdnError::Remote {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl FileStorageBackend for HttpStorageBackend {
    async fn upload(&self, path: &str, file: &UploadFile) -> Result<Attachment, CdnError> {
        if file.is_empty() {
            return Err(CdnError::MissingPayload);
        }

        let form = Form::new().part("file", file_part(file));
        let builder = self.client.post(self.url(path)).multipart(form);
        let resp = self
            .signed(builder)
            .send()
            .await
            .map_err(|e| CdnError::Transport(e.to_string()))?;

        let body = handle_response(resp).await.inspect_err(|e| {
            tracing::warn!(path, "upload rejected: {e}");
        })?;
        tracing::debug!(path, size = file.bytes.len(), "uploaded file");
        serde_json::from_value(body).map_err(|e| CdnError::Transport(format!("json decode: {e}")))
    }

    async fn delete(&self, path: &str) -> Result<serde_json::Value, CdnError> {
        let builder = self.client.delete(self.url(path));
        let resp = self
            .signed(builder)
            .send()
            .await
            .map_err(|e| CdnError::Transport(e.to_string()))?;

        let body = handle_response(resp).await.inspect_err(|e| {
            tracing::warn!(path, "delete rejected: {e}");
        })?;
        tracing::debug!(path, "deleted file");
        Ok(body)
    }
}
