pub mod avatars;
pub mod health;
pub mod read_states;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::{Json, Router};
use palaver_cdn::{AvatarResolver, CdnError};
use palaver_service::{ReadStateService, ServiceError};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

pub struct InnerAppState {
    pub service: Arc<dyn ReadStateService>,
    pub avatars: AvatarResolver,
}

pub type AppState = Arc<InnerAppState>;

pub type ApiError = (StatusCode, Json<Value>);

pub fn build_router(service: Arc<dyn ReadStateService>, avatars: AvatarResolver) -> Router {
    let state = Arc::new(InnerAppState { service, avatars });

    Router::new()
        .merge(health::routes())
        .merge(read_states::routes())
        .merge(avatars::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub(crate) fn to_error(e: ServiceError) -> ApiError {
    let status = match &e {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ServiceError::Persistence(_) | ServiceError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": e.to_string() })))
}

pub(crate) fn cdn_error(e: CdnError) -> ApiError {
    match e {
        CdnError::NotFound(_) => (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))),
        CdnError::MissingPayload | CdnError::InvalidPayload(_) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
        }
        CdnError::Remote { status, body } => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            Json(body),
        ),
        CdnError::Transport(_) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}
