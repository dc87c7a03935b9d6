use crate::{
    entities::stock_movement::MovementReason,
    errors::ServiceError,
    services::stock::MovementFilter,
    ApiResponse, AppState, PaginatedResponse,
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::str::FromStr;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct MovementListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Restrict to a single item by name.
    pub item: Option<String>,
    /// Restrict to a movement reason, e.g. `sale` or `restock`.
    pub reason: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// List movement ledger entries, newest first
#[utoipa::path(
    get,
    path = "/api/v1/movements",
    params(MovementListQuery),
    responses(
        (status = 200, description = "Paginated ledger entries"),
        (status = 404, description = "Unknown item filter")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_movements(
    State(state): State<AppState>,
    Query(query): Query<MovementListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let reason = query
        .reason
        .map(|r| {
            MovementReason::from_str(&r)
                .map_err(|_| ServiceError::InvalidInput(format!("Unknown reason '{}'", r)))
        })
        .transpose()?;

    let filter = MovementFilter {
        item_name: query.item,
        reason,
        from: query.from,
        to: query.to,
    };
    let (movements, total) = state
        .services
        .stock
        .list_movements(filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::new(PaginatedResponse {
        items: movements,
        total,
        page,
        limit,
    })))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_movements))
}
