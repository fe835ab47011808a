use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use scale_metrics::exporters::{MarkdownExporter, PrometheusExporter};
use scale_metrics::{CatalogSnapshot, MetricProvider};
use serde::Serialize;
use std::time::Instant;
use tracing::warn;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

#[derive(Clone)]
pub struct AppState {
    pub start_time: Instant,
    pub provider: MetricProvider,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    uptime_seconds: u64,
    metrics: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(prometheus_metrics))
        .route("/metrics.json", get(json_metrics))
        .route("/report", get(markdown_report))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        metrics: state.provider.metric_set().len(),
    })
}

async fn prometheus_metrics(State(state): State<AppState>) -> Response {
    match PrometheusExporter::format(&state.provider.snapshot()) {
        Ok(body) => ([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            warn!("Prometheus export failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn json_metrics(State(state): State<AppState>) -> Json<CatalogSnapshot> {
    Json(state.provider.snapshot())
}

async fn markdown_report(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        MarkdownExporter::format(&state.provider.snapshot()),
    )
}
