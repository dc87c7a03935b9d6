//! Liveness and readiness probes. Unauthenticated.

use crate::{db, AppState};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
}

/// Process is up
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is live", body = HealthStatus))
)]
pub async fn liveness() -> impl IntoResponse {
    Json(HealthStatus {
        status: "ok",
        database: "unchecked",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Process can reach its database
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready", body = HealthStatus),
        (status = 503, description = "Database unreachable")
    )
)]
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match db::check_connection(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthStatus {
                status: "ok",
                database: "reachable",
                version: env!("CARGO_PKG_VERSION"),
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthStatus {
                status: "degraded",
                database: "unreachable",
                version: env!("CARGO_PKG_VERSION"),
            }),
        ),
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(liveness))
        .route("/health/ready", get(readiness))
}
