use crate::{
    auth::{AuthUser, RegisterRequest},
    errors::ServiceError,
    events::Event,
    ApiResponse, AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    #[validate(length(min = 1, max = 200))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 200))]
    pub password: String,
    /// `admin`, `manager` or `staff`.
    pub role: String,
}

/// Authenticate and obtain an access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token issued"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let response = state.auth.login(&payload.username, &payload.password).await?;
    Ok(Json(ApiResponse::new(response)))
}

/// Register a new user (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User registered"),
        (status = 409, description = "Username already taken")
    ),
    security(("bearer_auth" = []))
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let created = state
        .auth
        .register(RegisterRequest {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            role: payload.role,
        })
        .await?;
    state
        .event_sender
        .send(Event::UserRegistered {
            user_id: created.id,
            username: created.username.clone(),
        })
        .await;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(created))))
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses((status = 200, description = "Authenticated user")),
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ServiceError> {
    let profile = state.auth.get_user(user.user_id).await?;
    Ok(Json(ApiResponse::new(profile)))
}

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/register", post(register))
}
