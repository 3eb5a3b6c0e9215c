//! HTTP API surface for Maeum.
//!
//! Chat routes live under `/api/chat`, transcript history under
//! `/api/history`. Every handler shares one immutable [`AppContext`].

pub mod error;
mod routes;
pub mod schema;

pub use error::ApiError;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use log::{info, warn};
use maeum_rs_config::ServerConfig;
use maeum_rs_core::AppContext;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Room for base64 expansion and the JSON envelope around voice uploads.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared request state.
pub type SharedContext = Arc<AppContext>;

/// Build the full router with CORS, tracing and body limits applied.
pub fn router(context: SharedContext) -> Router {
    let server = &context.config().server;
    let body_limit = server.max_audio_bytes.saturating_mul(4) / 3 + BODY_OVERHEAD_BYTES;
    let cors = cors_layer(server);
    Router::new()
        .merge(routes::root())
        .nest("/api/chat", routes::chat::router())
        .nest("/api/history", routes::history::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("ignoring invalid cors origin (origin={}, err={})", origin, err);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(context: SharedContext, addr: SocketAddr, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("http server listening (addr={})", listener.local_addr()?);
    axum::serve(listener, router(context))
        .with_graceful_shutdown(shutdown)
        .await
}
