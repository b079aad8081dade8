use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};

use super::{cdn_error, ApiError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/avatars/{id}", get(default_avatar))
}

async fn default_avatar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let asset = state.avatars.resolve(&id).await.map_err(cdn_error)?;
    Ok((
        [
            (header::CONTENT_TYPE, asset.content_type),
            (header::CACHE_CONTROL, asset.cache_control.to_string()),
        ],
        asset.bytes,
    ))
}
