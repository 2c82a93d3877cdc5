//! HTTP transport for the prompt catalog.

mod error;
mod routes;

pub use error::HttpError;
pub use routes::router;

use prompthub_api::PromptHub;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Bind `addr` and serve until `cancel_token` is cancelled.
pub async fn serve(
    hub: Arc<dyn PromptHub>,
    addr: SocketAddr,
    allowed_origins: &[String],
    cancel_token: CancellationToken,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_listener(listener, hub, allowed_origins, cancel_token).await
}

/// Serve on an already bound listener.
pub async fn serve_listener(
    listener: TcpListener,
    hub: Arc<dyn PromptHub>,
    allowed_origins: &[String],
    cancel_token: CancellationToken,
) -> std::io::Result<()> {
    let app = router(hub, allowed_origins);
    info!("PromptHub listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
        })
        .await?;
    info!("PromptHub server stopped");
    Ok(())
}
