//! HTTP surface for scal: the reshaped ICS feed plus a few management pages.

mod error;
mod pages;
pub mod routes;
mod state;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use scal_core::ScalConfig;

pub use state::AppState;

const DEFAULT_LOG_FILTER: &str =
    "scal=info,scal_core=info,scal_schoology=info,scal_server=info,tower_http=info";

/// Console logging, overridable with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::home::router())
        .merge(routes::feed::router())
        .merge(routes::marks::router())
        .merge(routes::custom::router())
        .merge(routes::settings::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Bind `server.host:server.port` and serve until the process exits.
pub async fn serve(config: ScalConfig) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let public_url = config.public_url();
    let data_dir = config.data_dir();

    let state = AppState::from_config(config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(%addr, %public_url, data_dir = %data_dir.display(), "scal-server listening");
    info!("Subscribe to {public_url}/fetch");

    axum::serve(listener, app).await?;

    Ok(())
}
