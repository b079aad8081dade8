use std::path::Path;
use std::sync::Arc;

use axum::Router;
use palaver_cdn::AvatarResolver;
use palaver_service::LocalService;
use tokio::net::TcpListener;

/// Build a test router with in-memory SQLite and an empty assets root.
pub async fn test_router() -> Router {
    let assets = tempfile::tempdir().unwrap().keep();
    test_router_with_assets(&assets).await
}

/// Build a test router with in-memory SQLite, serving default avatars from
/// `assets_root`.
pub async fn test_router_with_assets(assets_root: &Path) -> Router {
    let db = Arc::new(palaver_db::SqliteDatabase::open_in_memory().unwrap());
    let service = Arc::new(LocalService::new(db));
    crate::routes::build_router(service, AvatarResolver::new(assets_root))
}

/// A running test server with base_url and background task handle.
pub struct TestServer {
    pub base_url: String,
    _handle: tokio::task::JoinHandle<()>,
}

/// Spawn an axum test server on a random port. Returns the TestServer
/// with the `base_url` (e.g. "http://127.0.0.1:12345").
pub async fn spawn_test_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let app = test_router().await;
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url,
        _handle: handle,
    }
}
