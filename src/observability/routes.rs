use std::sync::Arc;

use crate::observability::metrics::Metrics;
use crate::server::server::AppState;
use crate::utils::constants::HEALTH_PATH;
use axum::response::Response;
use axum::routing::get;
use axum::{extract::State, response::IntoResponse, Router};
use http::{header::CONTENT_TYPE, StatusCode};
use prometheus::{Encoder, TextEncoder, TEXT_FORMAT};
use tracing::error;

#[derive(Clone)]
pub struct MetricsState {
    pub metrics: Arc<Metrics>,
}

impl MetricsState {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}

impl MetricsState {
    pub fn router(&self, metrics_path: &str) -> Router<AppState> {
        Router::new()
            .route(metrics_path, get(get_metrics))
            .route(HEALTH_PATH, get(get_health))
    }
}

async fn get_metrics(State(state): State<AppState>) -> Response {
    let metrics = &state.metrics_state.metrics;
    let metric_families = {
        // a snapshot commit holds the write side until the whole cycle is in
        let _guard = metrics.publish_lock.read().await;
        metrics.registry.gather()
    };

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response();
    }

    (
        StatusCode::OK,
        [(CONTENT_TYPE, TEXT_FORMAT)],
        buffer,
    )
        .into_response()
}

async fn get_health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
