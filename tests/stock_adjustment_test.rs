mod common;

use assert_matches::assert_matches;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use stockroom_api::entities::stock_movement::{self, Entity as StockMovement, MovementReason};
use stockroom_api::errors::ServiceError;
use stockroom_api::events::EventSender;
use stockroom_api::services::stock::{MovementFilter, StockAdjustment};
use stockroom_api::services::StockService;
use tokio::sync::mpsc;

#[tokio::test]
async fn restock_increases_quantity_and_appends_ledger_entry() {
    let app = common::setup().await;
    let item_id = app.seed_item("Coffee Beans 1kg", 10).await;

    let outcome = app.adjust("Coffee Beans 1kg", 5).await.unwrap();
    assert_eq!(outcome.new_quantity, 15);

    let item = app.items.get_item("Coffee Beans 1kg").await.unwrap();
    assert_eq!(item.quantity, 15);

    let movements = StockMovement::find()
        .filter(stock_movement::Column::ItemId.eq(item_id))
        .all(app.db.as_ref())
        .await
        .unwrap();
    // opening entry + restock
    assert_eq!(movements.len(), 2);
    let restock = movements
        .iter()
        .find(|m| m.reason == MovementReason::Restock.as_str())
        .expect("restock entry");
    assert_eq!(restock.delta, 5);
    assert_eq!(restock.quantity_after, 15);
}

#[tokio::test]
async fn decrement_below_zero_reports_available_quantity() {
    let app = common::setup().await;
    app.seed_item("Notebook", 3).await;

    let err = app.adjust("Notebook", -5).await.unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(3));

    // quantity untouched, no ledger entry written
    let item = app.items.get_item("Notebook").await.unwrap();
    assert_eq!(item.quantity, 3);
    let (movements, total) = app
        .stock
        .list_movements(
            MovementFilter {
                item_name: Some("Notebook".to_string()),
                ..Default::default()
            },
            1,
            50,
        )
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(movements[0].reason, MovementReason::InitialStock.as_str());
}

#[tokio::test]
async fn zero_delta_is_rejected() {
    let app = common::setup().await;
    app.seed_item("Pencil", 1).await;

    let err = app
        .stock
        .adjust(StockAdjustment {
            item_name: "Pencil".to_string(),
            delta: 0,
            reason: MovementReason::ManualAdjustment,
            actor_id: app.actor,
            note: None,
            sale_id: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));
}

#[tokio::test]
async fn unknown_item_is_not_found() {
    let app = common::setup().await;
    let err = app.adjust("Ghost Item", 1).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn quantity_always_equals_ledger_sum() {
    let app = common::setup().await;
    let item_id = app.seed_item("Flour 2kg", 20).await;

    app.adjust("Flour 2kg", 30).await.unwrap();
    app.adjust("Flour 2kg", -12).await.unwrap();
    app.adjust("Flour 2kg", 7).await.unwrap();
    // this one must fail and leave no trace
    app.adjust("Flour 2kg", -1000).await.unwrap_err();

    let item = app.items.get_item("Flour 2kg").await.unwrap();
    let movements = StockMovement::find()
        .filter(stock_movement::Column::ItemId.eq(item_id))
        .all(app.db.as_ref())
        .await
        .unwrap();
    let ledger_sum: i32 = movements.iter().map(|m| m.delta).sum();
    assert_eq!(item.quantity, ledger_sum);
    assert_eq!(item.quantity, 45);
}

#[tokio::test]
async fn movement_listing_filters_by_reason() {
    let app = common::setup().await;
    app.seed_item("Sugar", 10).await;
    app.adjust("Sugar", 5).await.unwrap();
    app.adjust("Sugar", -2).await.unwrap();

    let (restocks, total) = app
        .stock
        .list_movements(
            MovementFilter {
                item_name: Some("Sugar".to_string()),
                reason: Some(MovementReason::Restock),
                ..Default::default()
            },
            1,
            50,
        )
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(restocks[0].delta, 5);
}

#[tokio::test]
async fn opening_quantity_is_recorded_as_initial_stock() {
    let app = common::setup().await;
    let item_id = app.seed_item("Tea Box", 25).await;

    let movements = StockMovement::find()
        .filter(stock_movement::Column::ItemId.eq(item_id))
        .all(app.db.as_ref())
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].reason, MovementReason::InitialStock.as_str());
    assert_eq!(movements[0].delta, 25);
    assert_eq!(movements[0].quantity_after, 25);
}

#[tokio::test]
async fn committed_adjustment_survives_a_closed_event_channel() {
    let app = common::setup().await;
    let item_id = app.seed_item("Crate of Bolts", 10).await;

    // nobody listening: event publication must stay best-effort
    let (tx, rx) = mpsc::channel(1);
    drop(rx);
    let stock = StockService::new(app.db.clone(), EventSender::new(tx));

    let outcome = stock
        .adjust(StockAdjustment {
            item_name: "Crate of Bolts".to_string(),
            delta: 5,
            reason: MovementReason::Restock,
            actor_id: app.actor,
            note: None,
            sale_id: None,
        })
        .await
        .unwrap();
    assert_eq!(outcome.new_quantity, 15);

    let item = app.items.get_item("Crate of Bolts").await.unwrap();
    assert_eq!(item.quantity, 15);
    let movements = StockMovement::find()
        .filter(stock_movement::Column::ItemId.eq(item_id))
        .all(app.db.as_ref())
        .await
        .unwrap();
    assert_eq!(movements.len(), 2);
}

#[tokio::test]
async fn item_with_history_cannot_be_deleted() {
    let app = common::setup().await;
    app.seed_item("Broom", 4).await;

    let err = app.items.delete_item("Broom").await.unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    // an item created with zero stock has no history and can go
    app.seed_item("Empty Shelf", 0).await;
    app.items.delete_item("Empty Shelf").await.unwrap();
}
