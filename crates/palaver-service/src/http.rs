use async_trait::async_trait;
use palaver_core::read_state::{AckBulk, AckEntry, ReadState};
use reqwest::{Client, IntoUrl, RequestBuilder, StatusCode, Url};

use crate::{ReadStateService, ServiceError};

pub const USER_ID_HEADER: &str = "X-User-Id";

/// Async HTTP client implementation of ReadStateService.
/// Connects to a running palaver-server.
pub struct HttpService {
    base_url: String,
    client: Client,
}

impl HttpService {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
        }
    }

    fn as_user(&self, builder: RequestBuilder, user_id: &str) -> RequestBuilder {
        builder.header(USER_ID_HEADER, user_id)
    }

    /// Check if the server is reachable.
    pub async fn health_check(&self) -> Result<(), ServiceError> {
        let resp = self
            .client
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
            .map_err(|e| ServiceError::Internal(format!("connection failed: {e}")))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ServiceError::Internal(format!(
                "health check failed: {}",
                resp.status()
            )))
        }
    }

    /// `<base_url>/api/read-states/<channel_id>` with the id percent-encoded
    /// as a single path segment.
    fn read_state_url(&self, channel_id: &str) -> Result<Url, ServiceError> {
        let mut url = Url::parse(&format!("{}/api/read-states", self.base_url))
            .map_err(|e| ServiceError::Internal(format!("invalid base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ServiceError::Internal("base url cannot carry a path".into()))?
            .push(channel_id);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        user_id: &str,
        url: impl IntoUrl,
    ) -> Result<T, ServiceError> {
        let builder = self.client.get(url);
        let resp = self
            .as_user(builder, user_id)
            .send()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        handle_response(resp).await
    }

    async fn post_no_content<B: serde::Serialize>(
        &self,
        user_id: &str,
        path: &str,
        body: &B,
    ) -> Result<(), ServiceError> {
        let builder = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body);
        let resp = self
            .as_user(builder, user_id)
            .send()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(parse_error_with_status(status, resp).await)
        }
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        resp.json::<T>()
            .await
            .map_err(|e| ServiceError::Internal(format!("json decode: {e}")))
    } else {
        Err(parse_error_with_status(status, resp).await)
    }
}

async fn parse_error_with_status(status: StatusCode, resp: reqwest::Response) -> ServiceError {
    let body = resp.text().await.unwrap_or_default();
    let msg = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"].as_str().map(String::from))
        .unwrap_or(body);

    match status {
        StatusCode::NOT_FOUND => ServiceError::NotFound(msg),
        StatusCode::BAD_REQUEST => ServiceError::InvalidInput(msg),
        StatusCode::INTERNAL_SERVER_ERROR => ServiceError::Persistence(msg),
        _ => ServiceError::Internal(msg),
    }
}

#[async_trait]
impl ReadStateService for HttpService {
    async fn ack_bulk(&self, user_id: &str, entries: &[AckEntry]) -> Result<(), ServiceError> {
        let body = AckBulk {
            read_states: entries.to_vec(),
        };
        self.post_no_content(user_id, "/api/read-states/ack-bulk", &body)
            .await
    }

    async fn get_read_state(
        &self,
        user_id: &str,
        channel_id: &str,
    ) -> Result<Option<ReadState>, ServiceError> {
        match self
            .get_json(user_id, self.read_state_url(channel_id)?)
            .await
        {
            Ok(rs) => Ok(Some(rs)),
            Err(ServiceError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_read_states(&self, user_id: &str) -> Result<Vec<ReadState>, ServiceError> {
        self.get_json(user_id, format!("{}/api/read-states", self.base_url))
            .await
    }
}
