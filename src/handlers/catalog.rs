use crate::{errors::ServiceError, ApiResponse, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBranchRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 300))]
    pub address: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBranchRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<Option<String>>,
    #[serde(default)]
    pub phone: Option<Option<String>>,
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created"),
        (status = 409, description = "Name already exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let created = state
        .services
        .catalog
        .create_category(payload.name, payload.description)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(created))))
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(Json(ApiResponse::new(categories)))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let found = state.services.catalog.get_category(category_id).await?;
    Ok(Json(ApiResponse::new(found)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let updated = state
        .services
        .catalog
        .update_category(category_id, payload.name, payload.description)
        .await?;
    Ok(Json(ApiResponse::new(updated)))
}

/// Delete an unreferenced category
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 409, description = "Items still reference the category")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.catalog.delete_category(category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create a branch
#[utoipa::path(
    post,
    path = "/api/v1/branches",
    request_body = CreateBranchRequest,
    responses(
        (status = 201, description = "Branch created"),
        (status = 409, description = "Name already exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_branch(
    State(state): State<AppState>,
    Json(payload): Json<CreateBranchRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let created = state
        .services
        .catalog
        .create_branch(payload.name, payload.address, payload.phone)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(created))))
}

pub async fn list_branches(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let branches = state.services.catalog.list_branches().await?;
    Ok(Json(ApiResponse::new(branches)))
}

pub async fn get_branch(
    State(state): State<AppState>,
    Path(branch_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let found = state.services.catalog.get_branch(branch_id).await?;
    Ok(Json(ApiResponse::new(found)))
}

pub async fn update_branch(
    State(state): State<AppState>,
    Path(branch_id): Path<Uuid>,
    Json(payload): Json<UpdateBranchRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let updated = state
        .services
        .catalog
        .update_branch(branch_id, payload.name, payload.address, payload.phone)
        .await?;
    Ok(Json(ApiResponse::new(updated)))
}

/// Delete an unreferenced branch
#[utoipa::path(
    delete,
    path = "/api/v1/branches/{id}",
    params(("id" = Uuid, Path, description = "Branch id")),
    responses(
        (status = 204, description = "Branch deleted"),
        (status = 409, description = "Items still reference the branch")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_branch(
    State(state): State<AppState>,
    Path(branch_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.catalog.delete_branch(branch_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn category_read_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories))
        .route("/:id", get(get_category))
}

pub fn category_write_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_category))
        .route("/:id", put(update_category).delete(delete_category))
}

pub fn branch_read_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_branches))
        .route("/:id", get(get_branch))
}

pub fn branch_write_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_branch))
        .route("/:id", put(update_branch).delete(delete_branch))
}
