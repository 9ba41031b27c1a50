use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::settings::ExporterConfig;
use crate::observability::metrics::Metrics;
use crate::observability::routes::MetricsState;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
}

impl AppState {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics),
        }
    }
}

/// `:8080` listens on every interface.
pub fn normalize_listen_address(address: &str) -> String {
    if address.starts_with(':') {
        format!("0.0.0.0{}", address)
    } else {
        address.to_owned()
    }
}

pub fn router(metrics: Arc<Metrics>, metrics_path: &str) -> Router {
    let state = AppState::new(metrics);
    Router::new()
        .merge(state.metrics_state.router(metrics_path))
        .with_state(state)
}

pub async fn bind(config: &ExporterConfig) -> Result<TcpListener> {
    let bind_addr = normalize_listen_address(&config.address);
    TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("cannot listen on '{}'", bind_addr))
}

/// Serve the scrape endpoint until the listener fails.
pub async fn start(listener: TcpListener, metrics: Arc<Metrics>, metrics_path: String) -> Result<()> {
    let app = router(metrics.clone(), &metrics_path);

    info!(
        address = %listener.local_addr()?,
        path = %metrics_path,
        "serving metrics"
    );
    metrics.up.set(1);
    axum::serve(listener, app).await?;

    Ok(())
}
