//! HTTP gateway.
//!
//! | Method | Path      | Purpose                        |
//! |--------|-----------|--------------------------------|
//! | GET    | `/health` | session status                 |
//! | GET    | `/qr`     | current pairing code           |
//! | POST   | `/send`   | send `{phone, message}`        |
//! | POST   | `/logout` | unlink the device              |

mod error;
mod handlers;
pub mod phone;

pub use error::ApiError;
pub use handlers::{HealthResponse, QrResponse, SendRequest};

use crate::session::SessionManager;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Create the gateway router.
pub fn create_router(session: Arc<SessionManager>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/qr", get(handlers::qr_handler))
        .route("/send", post(handlers::send_handler))
        .route("/logout", post(handlers::logout_handler))
        .layer(CorsLayer::permissive())
        .with_state(session)
}

/// Serve the gateway on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    session: Arc<SessionManager>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let port = listener.local_addr()?.port();
    info!("WhatsApp gateway listening on port {}", port);
    info!("  GET  http://localhost:{}/health - check status", port);
    info!("  GET  http://localhost:{}/qr     - get pairing QR", port);
    info!("  POST http://localhost:{}/send   - send message", port);
    info!("  POST http://localhost:{}/logout - reset session", port);

    axum::serve(listener, create_router(session))
        .with_graceful_shutdown(shutdown)
        .await
}

/// [`serve`], then release the messaging client once in-flight requests
/// have drained.
pub async fn run<F>(
    listener: TcpListener,
    session: Arc<SessionManager>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    serve(listener, Arc::clone(&session), shutdown).await?;

    if let Err(e) = session.shutdown().await {
        warn!("failed to release messaging client: {}", e);
    }
    Ok(())
}
