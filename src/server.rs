//! HTTP endpoint serving the dashboard feed as JSON.
//!
//! ```text
//! GET /api/dashboard?period=today|week|month
//! GET /healthz
//! ```

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{error, info};
use serde::Deserialize;

use crate::feed::Period;
use crate::providers::WorkflowSource;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    period: Option<String>,
}

pub fn build_router<S: WorkflowSource + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/api/dashboard", get(dashboard::<S>))
        .route("/healthz", get(health))
        .with_state(state)
}

/// Runs one fetch cycle per request. Unknown or missing periods mean `week`.
async fn dashboard<S: WorkflowSource + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let period = Period::from_keyword(query.period.as_deref().unwrap_or_default());
    info!("Dashboard API request (period: {})", period.as_str());

    let started = Instant::now();
    let result = state.build(period).await;
    let elapsed = started.elapsed();

    match result {
        Ok(report) => {
            let skipped = report.skipped().count();
            info!(
                "Served {} jobs ({} units skipped, took {:?})",
                report.response.stats.total, skipped, elapsed
            );
            (
                [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
                Json(report.response),
            )
                .into_response()
        }
        Err(e) => {
            error!("Error fetching workflow runs: {e} (took {elapsed:?})");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
                format!("Error fetching workflow runs: {e}"),
            )
                .into_response()
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Bind `host:port` and serve until the process is stopped.
pub async fn serve<S: WorkflowSource + 'static>(
    state: Arc<AppState<S>>,
    host: &str,
    port: u16,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {host}:{port}"))?;

    info!(
        "Server listening on {} for organizations: {}",
        listener.local_addr()?,
        state.organizations().join(", ")
    );

    axum::serve(listener, build_router(state))
        .await
        .context("HTTP server failed")
}
