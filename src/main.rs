use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use stockroom_api::auth::{AuthConfig, AuthService};
use stockroom_api::config::{init_tracing, load_config};
use stockroom_api::events::{process_events, EventSender};
use stockroom_api::handlers::AppServices;
use stockroom_api::services::{
    AnalyticsService, CatalogService, ItemService, OutgoingService, SalesService, StockService,
};
use stockroom_api::{api_v1_routes, db, health, openapi, request_id, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config().context("Failed to load configuration")?;
    init_tracing(config.log_level(), config.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "Starting stockroom-api"
    );

    let pool = db::establish_connection_from_app_config(&config)
        .await
        .context("Failed to connect to database")?;
    if config.auto_migrate {
        db::run_migrations(&pool)
            .await
            .context("Failed to run migrations")?;
    }
    let db = Arc::new(pool);

    let (event_tx, event_rx) = mpsc::channel(config.event_channel_capacity);
    let event_sender = EventSender::new(event_tx);
    let event_processor = tokio::spawn(process_events(event_rx));

    let auth = Arc::new(AuthService::new(
        AuthConfig::new(
            config.jwt_secret.clone(),
            config.auth_issuer.clone(),
            config.auth_audience.clone(),
            Duration::from_secs(config.jwt_expiration),
        ),
        db.clone(),
    ));

    let services = AppServices {
        items: Arc::new(ItemService::new(db.clone(), event_sender.clone())),
        stock: Arc::new(StockService::new(db.clone(), event_sender.clone())),
        sales: Arc::new(SalesService::new(db.clone(), event_sender.clone())),
        outgoing: Arc::new(OutgoingService::new(db.clone(), event_sender.clone())),
        catalog: Arc::new(CatalogService::new(db.clone())),
        analytics: Arc::new(AnalyticsService::new(db.clone())),
    };

    let config = Arc::new(config);
    let state = AppState {
        db: db.clone(),
        config: config.clone(),
        services,
        auth: auth.clone(),
        event_sender,
    };

    let cors = build_cors_layer(&config);

    let app = Router::new()
        .merge(health::routes())
        .merge(openapi::swagger_routes())
        .nest("/api/v1", api_v1_routes(auth))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid host/port configuration")?;
    info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind listener")?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped; shutting down");
    event_processor.abort();
    if let Err(e) = db::close_pool((*db).clone()).await {
        error!("Error closing database pool: {}", e);
    }
    Ok(())
}

fn build_cors_layer(config: &stockroom_api::config::AppConfig) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if let Some(origins) = &config.cors_allowed_origins {
        let parsed: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|o| o.trim().parse().ok())
            .collect();
        if !parsed.is_empty() {
            return CorsLayer::new()
                .allow_origin(parsed)
                .allow_methods(methods)
                .allow_headers(Any);
        }
        warn!("No valid CORS origins parsed; falling back to defaults");
    }

    if config.should_allow_permissive_cors() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
