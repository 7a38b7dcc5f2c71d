// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP ingestion router.
//!
//! | Method | Path       | Purpose                                    |
//! |--------|------------|--------------------------------------------|
//! | GET    | `/health`  | liveness                                   |
//! | GET    | `/metrics` | Prometheus text exposition                 |
//! | POST   | `/v1/jobs` | enqueue a [`DomainJob`] for the worker     |

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::constants::{HEALTH_PATH, JOBS_PATH, METRICS_PATH};
use crate::jobs::DomainJob;
use crate::metrics;
use crate::queue::JobQueue;

/// Shared state for the job routes.
#[derive(Clone)]
pub struct RouterState {
    queue: Arc<dyn JobQueue>,
}

impl RouterState {
    #[must_use]
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self { queue }
    }
}

/// Build the ingestion router.
pub fn build_router(queue: Arc<dyn JobQueue>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(METRICS_PATH, get(metrics_text))
        .route(JOBS_PATH, post(create_job))
        .with_state(RouterState::new(queue))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn metrics_text() -> Response {
    match metrics::gather_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

// The body is parsed by hand so malformed input gets the JSON error shape instead of
// axum's plain-text rejection.
async fn create_job(State(state): State<RouterState>, body: Bytes) -> Response {
    let job: DomainJob = match serde_json::from_slice(&body) {
        Ok(job) => job,
        Err(e) => {
            warn!(error = %e, "Rejected job with invalid body");
            return error_response(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    if job.reference_id.trim().is_empty() {
        warn!(hostname = %job.domain.vanity_domain, "Rejected job without a reference id");
        return error_response(StatusCode::BAD_REQUEST, "referenceId is required");
    }

    if let Err(e) = state.queue.add_domain_job(&job).await {
        error!(reference_id = %job.reference_id, error = %e, "Failed to add job to queue");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to add job to queue");
    }

    info!(
        reference_id = %job.reference_id,
        hostname = %job.domain.vanity_domain,
        kind = %job.kind,
        "Job queued"
    );

    (
        StatusCode::ACCEPTED,
        Json(json!({ "status": "queued", "referenceId": job.reference_id })),
    )
        .into_response()
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod router_tests;
