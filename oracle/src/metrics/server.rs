//! Read-only HTTP surface: `GET /metrics` and `GET /healthz`.
//!
//! Handlers only ever take snapshots through a [`TelemetryReader`]; nothing
//! here can mutate oracle state.

use std::net::SocketAddr;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use tracing::info;

use crate::metrics::counters::TelemetryReader;
use crate::metrics::prometheus::render_prometheus;

pub fn build_router(reader: TelemetryReader) -> Router {
    Router::new()
        .route("/metrics", get(prometheus_metrics))
        .route("/healthz", get(healthz))
        .with_state(reader)
}

/// Binds `addr` and serves until the process exits.
pub async fn serve_metrics(addr: SocketAddr, reader: TelemetryReader) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "metrics server listening");

    axum::serve(listener, build_router(reader)).await?;
    Ok(())
}

/// GET /metrics
pub async fn prometheus_metrics(State(reader): State<TelemetryReader>) -> impl IntoResponse {
    let body = render_prometheus(&reader.snapshot());
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
