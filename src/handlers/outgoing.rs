use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::outgoing::{NewOutgoing, OutgoingFilter},
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
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordOutgoingRequest {
    #[validate(length(min = 1, max = 200))]
    pub item: String,
    pub quantity: i32,
    #[validate(length(min = 1, max = 200))]
    pub destination: String,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OutgoingListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub item: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Record an outgoing shipment
#[utoipa::path(
    post,
    path = "/api/v1/outgoing",
    request_body = RecordOutgoingRequest,
    responses(
        (status = 201, description = "Outgoing stock recorded"),
        (status = 404, description = "Unknown item"),
        (status = 422, description = "Insufficient stock")
    ),
    security(("bearer_auth" = []))
)]
pub async fn record_outgoing(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RecordOutgoingRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let recorded = state
        .services
        .outgoing
        .record_outgoing(
            NewOutgoing {
                item_name: payload.item,
                quantity: payload.quantity,
                destination: payload.destination,
                note: payload.note,
            },
            user.user_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(recorded))))
}

/// List outgoing records, newest first
#[utoipa::path(
    get,
    path = "/api/v1/outgoing",
    params(OutgoingListQuery),
    responses((status = 200, description = "Paginated outgoing records")),
    security(("bearer_auth" = []))
)]
pub async fn list_outgoing(
    State(state): State<AppState>,
    Query(query): Query<OutgoingListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let filter = OutgoingFilter {
        item_name: query.item,
        from: query.from,
        to: query.to,
    };
    let (records, total) = state
        .services
        .outgoing
        .list_records(filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::new(PaginatedResponse {
        items: records,
        total,
        page,
        limit,
    })))
}

/// Fetch a single outgoing record
#[utoipa::path(
    get,
    path = "/api/v1/outgoing/{id}",
    params(("id" = Uuid, Path, description = "Record id")),
    responses(
        (status = 200, description = "Outgoing record"),
        (status = 404, description = "Unknown record")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_outgoing(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let found = state.services.outgoing.get_record(record_id).await?;
    Ok(Json(ApiResponse::new(found)))
}

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_outgoing))
        .route("/:id", get(get_outgoing))
}

pub fn create_routes() -> Router<AppState> {
    Router::new().route("/", post(record_outgoing))
}
