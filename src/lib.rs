//! Stockroom API: stock management backend for small businesses.
//!
//! Inventory quantities and the movement ledger are kept consistent by a
//! single transactional adjustment path (`services::stock`); everything else
//! (sales, returns, outgoing stock, item creation) goes through it.

use axum::{middleware, Json, Router};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod migrator;
pub mod openapi;
pub mod request_id;
pub mod services;

use auth::{consts, AuthRouterExt, AuthService};
use config::AppConfig;
use events::EventSender;
use handlers::AppServices;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub services: AppServices,
    pub auth: Arc<AuthService>,
    pub event_sender: EventSender,
}

/// Standard success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn json(data: T) -> Json<Self> {
        Json(Self::new(data))
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// All `/api/v1` routes. Authenticated routes carry the bearer-token
/// middleware; each group additionally declares the permission it requires.
pub fn api_v1_routes(auth: Arc<AuthService>) -> Router<AppState> {
    let items = handlers::items::read_routes()
        .with_permission(consts::ITEMS_READ)
        .merge(handlers::items::write_routes().with_permission(consts::ITEMS_WRITE))
        .merge(handlers::items::adjust_routes().with_permission(consts::STOCK_ADJUST));

    let movements = handlers::movements::routes().with_permission(consts::MOVEMENTS_READ);

    let sales = handlers::sales::read_routes()
        .with_permission(consts::SALES_READ)
        .merge(handlers::sales::create_routes().with_permission(consts::SALES_CREATE))
        .merge(handlers::sales::return_routes().with_permission(consts::SALES_RETURN));

    let outgoing = handlers::outgoing::read_routes()
        .with_permission(consts::OUTGOING_READ)
        .merge(handlers::outgoing::create_routes().with_permission(consts::OUTGOING_CREATE));

    let categories = handlers::catalog::category_read_routes()
        .with_permission(consts::CATALOG_READ)
        .merge(handlers::catalog::category_write_routes().with_permission(consts::CATALOG_WRITE));

    let branches = handlers::catalog::branch_read_routes()
        .with_permission(consts::CATALOG_READ)
        .merge(handlers::catalog::branch_write_routes().with_permission(consts::CATALOG_WRITE));

    let dashboard = handlers::dashboard::routes().with_permission(consts::DASHBOARD_READ);

    let account = handlers::auth::me_routes()
        .merge(handlers::auth::admin_routes().with_permission(consts::USERS_MANAGE));

    let protected = Router::new()
        .nest("/items", items)
        .nest("/movements", movements)
        .nest("/sales", sales)
        .nest("/outgoing", outgoing)
        .nest("/categories", categories)
        .nest("/branches", branches)
        .nest("/dashboard", dashboard)
        .nest("/auth", account)
        .layer(middleware::from_fn_with_state(auth, auth::auth_middleware));

    let public = Router::new().nest("/auth", handlers::auth::public_routes());

    protected.merge(public)
}
