use crate::{
    auth::{consts, AuthUser},
    entities::stock_movement::MovementReason,
    errors::ServiceError,
    services::items::{ItemFilter, ItemUpdate, NewItem},
    services::stock::StockAdjustment,
    ApiResponse, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub initial_quantity: i32,
    pub category_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub unit_cost: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub restock_level: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    // Absent field = keep, explicit null = clear.
    #[serde(default)]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub branch_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub unit_cost: Option<Option<Decimal>>,
    #[serde(default)]
    pub unit_price: Option<Option<Decimal>>,
    pub restock_level: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdjustStockRequest {
    /// Signed quantity change; zero is rejected.
    pub delta: i32,
    /// `restock` or `manual-adjustment`. Other reasons are reserved for
    /// their own flows.
    pub reason: String,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdjustmentResponse {
    pub item_id: Uuid,
    pub new_quantity: i32,
    pub movement_id: Uuid,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ItemListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Substring match on the item name.
    pub name: Option<String>,
    pub category_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    #[serde(default)]
    pub low_stock: bool,
}

/// Create an inventory item
#[utoipa::path(
    post,
    path = "/api/v1/items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created"),
        (status = 409, description = "Item name already exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let created = state
        .services
        .items
        .create_item(
            NewItem {
                name: payload.name,
                initial_quantity: payload.initial_quantity,
                category_id: payload.category_id,
                branch_id: payload.branch_id,
                unit_cost: payload.unit_cost,
                unit_price: payload.unit_price,
                restock_level: payload.restock_level,
            },
            user.user_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(created))))
}

/// List inventory items
#[utoipa::path(
    get,
    path = "/api/v1/items",
    params(ItemListQuery),
    responses((status = 200, description = "Paginated item list")),
    security(("bearer_auth" = []))
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let filter = ItemFilter {
        name_contains: query.name,
        category_id: query.category_id,
        branch_id: query.branch_id,
        low_stock_only: query.low_stock,
    };
    let (items, total) = state.services.items.list_items(filter, page, limit).await?;
    Ok(Json(ApiResponse::new(PaginatedResponse {
        items,
        total,
        page,
        limit,
    })))
}

/// Fetch a single item by name
#[utoipa::path(
    get,
    path = "/api/v1/items/{name}",
    params(("name" = String, Path, description = "Item name")),
    responses(
        (status = 200, description = "Item"),
        (status = 404, description = "Unknown item")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let found = state.services.items.get_item(&name).await?;
    Ok(Json(ApiResponse::new(found)))
}

/// Update an item's descriptive fields
#[utoipa::path(
    put,
    path = "/api/v1/items/{name}",
    params(("name" = String, Path, description = "Item name")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Updated item"),
        (status = 404, description = "Unknown item")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let updated = state
        .services
        .items
        .update_item(
            &name,
            ItemUpdate {
                name: payload.name,
                category_id: payload.category_id,
                branch_id: payload.branch_id,
                unit_cost: payload.unit_cost,
                unit_price: payload.unit_price,
                restock_level: payload.restock_level,
            },
        )
        .await?;
    Ok(Json(ApiResponse::new(updated)))
}

/// Delete an item without recorded history
#[utoipa::path(
    delete,
    path = "/api/v1/items/{name}",
    params(("name" = String, Path, description = "Item name")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 409, description = "Item has recorded history")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.items.delete_item(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Manually adjust an item's stock level
#[utoipa::path(
    post,
    path = "/api/v1/items/{name}/adjust",
    params(("name" = String, Path, description = "Item name")),
    request_body = AdjustStockRequest,
    responses(
        (status = 200, description = "Adjustment applied", body = AdjustmentResponse),
        (status = 404, description = "Unknown item"),
        (status = 409, description = "Concurrent adjustment, retry"),
        (status = 422, description = "Insufficient stock")
    ),
    security(("bearer_auth" = []))
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(name): Path<String>,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let reason = MovementReason::from_str(&payload.reason)
        .map_err(|_| ServiceError::InvalidInput(format!("Unknown reason '{}'", payload.reason)))?;
    if !matches!(
        reason,
        MovementReason::Restock | MovementReason::ManualAdjustment
    ) {
        return Err(ServiceError::InvalidInput(format!(
            "Reason '{}' is reserved for its own flow",
            payload.reason
        )));
    }
    if payload.delta < 0 && !user.has_permission(consts::STOCK_ADJUST_NEGATIVE) {
        return Err(ServiceError::Forbidden(
            "Negative adjustments require manager access".into(),
        ));
    }

    let outcome = state
        .services
        .stock
        .adjust(StockAdjustment {
            item_name: name,
            delta: payload.delta,
            reason,
            actor_id: user.user_id,
            note: payload.note,
            sale_id: None,
        })
        .await?;
    Ok(Json(ApiResponse::new(AdjustmentResponse {
        item_id: outcome.item_id,
        new_quantity: outcome.new_quantity,
        movement_id: outcome.movement_id,
    })))
}

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items))
        .route("/:name", get(get_item))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_item))
        .route("/:name", axum::routing::put(update_item).delete(delete_item))
}

pub fn adjust_routes() -> Router<AppState> {
    Router::new().route("/:name/adjust", post(adjust_stock))
}
