//! Authentication and authorization.
//!
//! JWT access tokens with argon2 password hashing, a closed role model, and
//! axum middleware that turns a bearer token into an [`AuthUser`] request
//! extension. Route groups declare required permissions via
//! [`AuthRouterExt::with_permission`]; everything below the handler layer is
//! authorization-agnostic.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
    Router,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::entities::user;
use crate::errors::ServiceError;

mod permissions;

pub use permissions::{consts, Role};

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub role: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Authenticated user data extracted from a validated token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.role.permissions().contains(&permission)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        issuer: String,
        audience: String,
        access_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            issuer,
            audience,
            access_token_expiration,
        }
    }
}

/// Issues and validates tokens, registers users, checks credentials.
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DatabaseConnection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Registers a new user with a hashed password.
    pub async fn register(&self, request: RegisterRequest) -> Result<user::Model, ServiceError> {
        let role = Role::from_str(&request.role)
            .map_err(|_| ServiceError::InvalidInput(format!("Unknown role: {}", request.role)))?;

        if request.password.len() < 8 {
            return Err(ServiceError::ValidationError(
                "Password must be at least 8 characters".into(),
            ));
        }

        let existing = user::Entity::find()
            .filter(user::Column::Username.eq(request.username.clone()))
            .one(self.db.as_ref())
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Username '{}' is already taken",
                request.username
            )));
        }

        let password_hash = hash_password(&request.password)?;
        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(request.username),
            email: Set(request.email),
            password_hash: Set(password_hash),
            role: Set(role.to_string()),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(None),
        };
        let created = model.insert(self.db.as_ref()).await?;
        debug!(user_id = %created.id, "Registered user");
        Ok(created)
    }

    /// Verifies credentials and issues an access token.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, ServiceError> {
        let found = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid credentials".into()))?;

        if !found.active {
            return Err(ServiceError::Unauthorized("Account is disabled".into()));
        }
        if !verify_password(&found.password_hash, password) {
            return Err(ServiceError::Unauthorized("Invalid credentials".into()));
        }

        let token = self.issue_token(&found)?;
        Ok(LoginResponse {
            access_token: token,
            token_type: "Bearer".into(),
            expires_in: self.config.access_token_expiration.as_secs(),
            user_id: found.id,
            username: found.username,
            role: found.role,
        })
    }

    /// Looks up a user by id; used by the `me` endpoint.
    pub async fn get_user(&self, user_id: Uuid) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(user_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))
    }

    fn issue_token(&self, user: &user::Model) -> Result<String, ServiceError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.config.access_token_expiration.as_secs() as i64,
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("Token encoding failed: {}", e)))
    }

    /// Validates a token and extracts the authenticated user.
    pub fn validate_token(&self, token: &str) -> Result<AuthUser, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.audience.clone()]);
        validation.set_issuer(&[self.config.issuer.clone()]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| ServiceError::Unauthorized(format!("Invalid token: {}", e)))?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Invalid subject claim".into()))?;
        let role = Role::from_str(&data.claims.role)
            .map_err(|_| ServiceError::Unauthorized("Unknown role claim".into()))?;

        Ok(AuthUser {
            user_id,
            username: data.claims.username,
            role,
        })
    }
}

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ServiceError::InternalError(format!("Password hashing failed: {}", e)))
}

fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Axum middleware: require a valid bearer token and stash the resulting
/// [`AuthUser`] in request extensions for downstream permission checks.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let token = match token {
        Some(t) => t,
        None => {
            return ServiceError::Unauthorized("Missing bearer token".into()).into_response();
        }
    };

    match auth.validate_token(token) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Router extension for permission-gated route groups.
pub trait AuthRouterExt {
    fn with_permission(self, permission: &'static str) -> Self;
}

impl<S> AuthRouterExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_permission(self, permission: &'static str) -> Self {
        self.layer(axum::middleware::from_fn(
            move |request: Request, next: Next| async move {
                match request.extensions().get::<AuthUser>() {
                    None => ServiceError::Unauthorized("Missing bearer token".into())
                        .into_response(),
                    Some(user) if !user.has_permission(permission) => ServiceError::Forbidden(
                        format!("Missing permission: {}", permission),
                    )
                    .into_response(),
                    Some(_) => next.run(request).await,
                }
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password(&hash, "correct horse battery"));
        assert!(!verify_password(&hash, "wrong password"));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("not-a-phc-string", "anything"));
    }
}
