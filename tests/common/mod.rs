#![allow(dead_code)]

use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

use stockroom_api::auth::{AuthConfig, AuthService};
use stockroom_api::db::{establish_connection_with_config, run_migrations, DbConfig};
use stockroom_api::entities::stock_movement::MovementReason;
use stockroom_api::events::{process_events, EventSender};
use stockroom_api::services::items::NewItem;
use stockroom_api::services::{
    AnalyticsService, CatalogService, ItemService, OutgoingService, SalesService, StockService,
};

pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub items: ItemService,
    pub stock: StockService,
    pub sales: SalesService,
    pub outgoing: OutgoingService,
    pub catalog: CatalogService,
    pub analytics: AnalyticsService,
    pub auth: AuthService,
    pub actor: Uuid,
}

/// Spins up an in-memory SQLite database with migrations applied and the
/// full service stack wired to it.
///
/// `max_connections` is pinned to 1: with a pooled `sqlite::memory:` URL
/// every pooled connection would get its own empty database.
pub async fn setup() -> TestApp {
    let config = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        connect_timeout: Duration::from_secs(5),
        idle_timeout: Duration::from_secs(600),
        acquire_timeout: Duration::from_secs(5),
    };
    let db = establish_connection_with_config(&config)
        .await
        .expect("connect to in-memory sqlite");
    run_migrations(&db).await.expect("run migrations");
    let db = Arc::new(db);

    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(process_events(rx));
    let events = EventSender::new(tx);

    let auth = AuthService::new(
        AuthConfig::new(
            "test_secret_key_for_testing_purposes_only".to_string(),
            "stockroom-api".to_string(),
            "stockroom-clients".to_string(),
            Duration::from_secs(3600),
        ),
        db.clone(),
    );

    TestApp {
        items: ItemService::new(db.clone(), events.clone()),
        stock: StockService::new(db.clone(), events.clone()),
        sales: SalesService::new(db.clone(), events.clone()),
        outgoing: OutgoingService::new(db.clone(), events.clone()),
        catalog: CatalogService::new(db.clone()),
        analytics: AnalyticsService::new(db.clone()),
        auth,
        actor: Uuid::new_v4(),
        db,
    }
}

impl TestApp {
    /// Creates an item with the given opening quantity and no pricing.
    pub async fn seed_item(&self, name: &str, quantity: i32) -> Uuid {
        let created = self
            .items
            .create_item(
                NewItem {
                    name: name.to_string(),
                    initial_quantity: quantity,
                    category_id: None,
                    branch_id: None,
                    unit_cost: None,
                    unit_price: None,
                    restock_level: 0,
                },
                self.actor,
            )
            .await
            .expect("seed item");
        created.id
    }

    /// Applies a manual restock/adjustment through the stock service.
    pub async fn adjust(
        &self,
        name: &str,
        delta: i32,
    ) -> Result<stockroom_api::services::stock::AdjustmentOutcome, stockroom_api::errors::ServiceError>
    {
        let reason = if delta >= 0 {
            MovementReason::Restock
        } else {
            MovementReason::ManualAdjustment
        };
        self.stock
            .adjust(stockroom_api::services::stock::StockAdjustment {
                item_name: name.to_string(),
                delta,
                reason,
                actor_id: self.actor,
                note: None,
                sale_id: None,
            })
            .await
    }
}
