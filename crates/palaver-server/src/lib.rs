pub mod config;
mod routes;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

use std::sync::Arc;

use anyhow::Result;
use palaver_cdn::AvatarResolver;
use palaver_db::Database;
use palaver_service::LocalService;
use tokio::net::TcpListener;

pub use config::ServerConfig;
pub use routes::read_states::USER_ID_HEADER;

pub async fn serve(
    listener: TcpListener,
    db: Arc<dyn Database>,
    avatars: AvatarResolver,
) -> Result<()> {
    let service = Arc::new(LocalService::new(db));
    let app = routes::build_router(service, avatars);
    axum::serve(listener, app).await?;
    Ok(())
}
