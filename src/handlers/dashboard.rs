use crate::{errors::ServiceError, ApiResponse, AppState};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct WindowQuery {
    /// Window start; defaults to 30 days ago.
    pub from: Option<DateTime<Utc>>,
    /// Window end; defaults to now.
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl WindowQuery {
    fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let to = self.to.unwrap_or_else(Utc::now);
        let from = self.from.unwrap_or_else(|| to - Duration::days(30));
        (from, to)
    }
}

/// Inventory and sales summary for the dashboard
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/summary",
    responses((status = 200, description = "Dashboard summary")),
    security(("bearer_auth" = []))
)]
pub async fn summary(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let summary = state.services.analytics.dashboard_summary().await?;
    Ok(Json(ApiResponse::new(summary)))
}

/// Sales bucketed per day over a window
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/sales-by-day",
    params(WindowQuery),
    responses((status = 200, description = "Daily sales buckets")),
    security(("bearer_auth" = []))
)]
pub async fn sales_by_day(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (from, to) = query.window();
    let buckets = state.services.analytics.sales_by_day(from, to).await?;
    Ok(Json(ApiResponse::new(buckets)))
}

/// Ledger activity grouped by reason over a window
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/movements",
    params(WindowQuery),
    responses((status = 200, description = "Per-reason movement totals")),
    security(("bearer_auth" = []))
)]
pub async fn movement_breakdown(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (from, to) = query.window();
    let breakdown = state
        .services
        .analytics
        .movement_breakdown(from, to)
        .await?;
    Ok(Json(ApiResponse::new(breakdown)))
}

/// Best-selling items over a window
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/top-items",
    params(WindowQuery),
    responses((status = 200, description = "Best sellers by quantity")),
    security(("bearer_auth" = []))
)]
pub async fn top_items(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (from, to) = query.window();
    let limit = query.limit.unwrap_or(10).clamp(1, 50);
    let ranked = state.services.analytics.top_items(from, to, limit).await?;
    Ok(Json(ApiResponse::new(ranked)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(summary))
        .route("/sales-by-day", get(sales_by_day))
        .route("/movements", get(movement_breakdown))
        .route("/top-items", get(top_items))
}
