//! mobius-assign server.
//!
//! Run with: cargo run
//! Then open: http://localhost:7860

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};

use mobius_assign::api;
use mobius_assign::config::Config;
use mobius_assign::telemetry;

#[tokio::main]
async fn main() {
    telemetry::init();

    let config = Config::load("mobius-assign.toml").unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using tier defaults");
        Config::default()
    });

    let state = Arc::new(api::AppState::new(config));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router(state).layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], 7860));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    tracing::info!(%addr, "mobius-assign listening");
    axum::serve(listener, app).await.unwrap();
}
