use crate::{
    auth::AuthUser,
    entities::sale::PaymentMethod,
    errors::ServiceError,
    services::sales::{NewSale, SaleFilter},
    ApiResponse, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordSaleRequest {
    #[validate(length(min = 1, max = 200))]
    pub item: String,
    pub quantity: i32,
    /// Overrides the item's list price when present.
    pub unit_price: Option<Decimal>,
    /// `cash`, `card` or `transfer`.
    pub payment_method: String,
    #[validate(length(max = 200))]
    pub customer_name: Option<String>,
    #[validate(length(max = 50))]
    pub customer_phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReturnSaleRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReturnSaleResponse {
    pub sale_id: Uuid,
    pub returned_quantity: i32,
    pub full_return: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SaleListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub item: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Record a sale
#[utoipa::path(
    post,
    path = "/api/v1/sales",
    request_body = RecordSaleRequest,
    responses(
        (status = 201, description = "Sale recorded"),
        (status = 404, description = "Unknown item or payment method"),
        (status = 422, description = "Insufficient stock")
    ),
    security(("bearer_auth" = []))
)]
pub async fn record_sale(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RecordSaleRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let payment_method = PaymentMethod::from_str(&payload.payment_method).map_err(|_| {
        ServiceError::NotFound(format!(
            "Unknown payment method '{}'",
            payload.payment_method
        ))
    })?;

    let recorded = state
        .services
        .sales
        .record_sale(
            NewSale {
                item_name: payload.item,
                quantity: payload.quantity,
                unit_price: payload.unit_price,
                payment_method,
                customer_name: payload.customer_name,
                customer_phone: payload.customer_phone,
            },
            user.user_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(recorded))))
}

/// Return part or all of a sale
#[utoipa::path(
    post,
    path = "/api/v1/sales/{id}/return",
    params(("id" = Uuid, Path, description = "Sale id")),
    request_body = ReturnSaleRequest,
    responses(
        (status = 200, description = "Return processed", body = ReturnSaleResponse),
        (status = 400, description = "Return exceeds sold quantity"),
        (status = 404, description = "Unknown sale")
    ),
    security(("bearer_auth" = []))
)]
pub async fn return_sale(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(sale_id): Path<Uuid>,
    Json(payload): Json<ReturnSaleRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state
        .services
        .sales
        .return_sale(sale_id, payload.quantity, user.user_id)
        .await?;
    Ok(Json(ApiResponse::new(ReturnSaleResponse {
        sale_id: outcome.sale_id,
        returned_quantity: outcome.returned_quantity,
        full_return: outcome.full_return,
    })))
}

/// List sales, newest first
#[utoipa::path(
    get,
    path = "/api/v1/sales",
    params(SaleListQuery),
    responses((status = 200, description = "Paginated sales")),
    security(("bearer_auth" = []))
)]
pub async fn list_sales(
    State(state): State<AppState>,
    Query(query): Query<SaleListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let filter = SaleFilter {
        item_name: query.item,
        from: query.from,
        to: query.to,
    };
    let (sales, total) = state.services.sales.list_sales(filter, page, limit).await?;
    Ok(Json(ApiResponse::new(PaginatedResponse {
        items: sales,
        total,
        page,
        limit,
    })))
}

/// Fetch a single sale
#[utoipa::path(
    get,
    path = "/api/v1/sales/{id}",
    params(("id" = Uuid, Path, description = "Sale id")),
    responses(
        (status = 200, description = "Sale"),
        (status = 404, description = "Unknown sale")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let found = state.services.sales.get_sale(sale_id).await?;
    Ok(Json(ApiResponse::new(found)))
}

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sales))
        .route("/:id", get(get_sale))
}

pub fn create_routes() -> Router<AppState> {
    Router::new().route("/", post(record_sale))
}

pub fn return_routes() -> Router<AppState> {
    Router::new().route("/:id/return", post(return_sale))
}
