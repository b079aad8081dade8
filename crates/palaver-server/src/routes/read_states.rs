use axum::{
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    routing::{get, post},
    Json, Router,
};
use palaver_core::read_state::AckBulk;
use serde_json::{json, Value};

use super::{to_error, ApiError, AppState};

pub const USER_ID_HEADER: &str = "x-user-id";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/read-states", get(list_read_states))
        .route("/api/read-states/ack-bulk", post(ack_bulk))
        .route("/api/read-states/{channel_id}", get(get_read_state))
}

/// Caller identity, as set by the authenticating gateway in front of us.
pub struct UserId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| UserId(v.to_string()))
            .ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "missing X-User-Id header" })),
                )
            })
    }
}

async fn ack_bulk(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(input): Json<AckBulk>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .ack_bulk(&user_id, &input.read_states)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

async fn list_read_states(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .list_read_states(&user_id)
        .await
        .map(|rs| Json(json!(rs)))
        .map_err(to_error)
}

async fn get_read_state(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(channel_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.service.get_read_state(&user_id, &channel_id).await {
        Ok(Some(rs)) => Ok(Json(json!(rs))),
        Ok(None) => Err((StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))),
        Err(e) => Err(to_error(e)),
    }
}
