mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use stockroom_api::entities::sale::PaymentMethod;
use stockroom_api::entities::stock_movement::{self, Entity as StockMovement, MovementReason};
use stockroom_api::errors::ServiceError;
use stockroom_api::services::outgoing::NewOutgoing;
use stockroom_api::services::sales::NewSale;

fn sale_of(item: &str, quantity: i32) -> NewSale {
    NewSale {
        item_name: item.to_string(),
        quantity,
        unit_price: Some(dec!(4.50)),
        payment_method: PaymentMethod::Cash,
        customer_name: None,
        customer_phone: None,
    }
}

#[tokio::test]
async fn sale_decrements_stock_and_links_ledger_entry() {
    let app = common::setup().await;
    let item_id = app.seed_item("Olive Oil 1L", 10).await;

    let sale = app.sales.record_sale(sale_of("Olive Oil 1L", 3), app.actor).await.unwrap();
    assert_eq!(sale.quantity, 3);
    assert_eq!(sale.total_price, dec!(13.50));

    let item = app.items.get_item("Olive Oil 1L").await.unwrap();
    assert_eq!(item.quantity, 7);

    let movement = StockMovement::find()
        .filter(stock_movement::Column::ItemId.eq(item_id))
        .filter(stock_movement::Column::Reason.eq(MovementReason::Sale.as_str()))
        .one(app.db.as_ref())
        .await
        .unwrap()
        .expect("sale movement");
    assert_eq!(movement.delta, -3);
    assert_eq!(movement.sale_id, Some(sale.id));
}

#[tokio::test]
async fn oversell_fails_atomically() {
    let app = common::setup().await;
    app.seed_item("Honey Jar", 2).await;

    let err = app
        .sales
        .record_sale(sale_of("Honey Jar", 5), app.actor)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(2));

    // no sale row, no sale movement, quantity untouched
    let item = app.items.get_item("Honey Jar").await.unwrap();
    assert_eq!(item.quantity, 2);
    let (sales, total) = app
        .sales
        .list_sales(Default::default(), 1, 50)
        .await
        .unwrap();
    assert!(sales.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn sale_uses_list_price_when_no_override_given() {
    let app = common::setup().await;
    app.seed_item("Juice", 8).await;
    app.items
        .update_item(
            "Juice",
            stockroom_api::services::items::ItemUpdate {
                unit_price: Some(Some(dec!(2.00))),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let sale = app
        .sales
        .record_sale(
            NewSale {
                item_name: "Juice".to_string(),
                quantity: 4,
                unit_price: None,
                payment_method: PaymentMethod::Card,
                customer_name: None,
                customer_phone: None,
            },
            app.actor,
        )
        .await
        .unwrap();
    assert_eq!(sale.unit_price, dec!(2.00));
    assert_eq!(sale.total_price, dec!(8.00));
}

#[tokio::test]
async fn unpriced_item_without_override_is_invalid() {
    let app = common::setup().await;
    app.seed_item("Mystery Box", 5).await;

    let err = app
        .sales
        .record_sale(
            NewSale {
                item_name: "Mystery Box".to_string(),
                quantity: 1,
                unit_price: None,
                payment_method: PaymentMethod::Cash,
                customer_name: None,
                customer_phone: None,
            },
            app.actor,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));

    // the stock decrement rolled back with the failed sale
    let item = app.items.get_item("Mystery Box").await.unwrap();
    assert_eq!(item.quantity, 5);
}

#[tokio::test]
async fn partial_return_rescales_total_and_restores_stock() {
    let app = common::setup().await;
    app.seed_item("Soap Bar", 10).await;

    let sale = app.sales.record_sale(sale_of("Soap Bar", 4), app.actor).await.unwrap();
    assert_eq!(sale.total_price, dec!(18.00));

    let outcome = app.sales.return_sale(sale.id, 1, app.actor).await.unwrap();
    assert!(!outcome.full_return);
    let remaining = outcome.remaining.expect("sale still present");
    assert_eq!(remaining.quantity, 3);
    assert_eq!(remaining.total_price, dec!(13.50));
    assert_eq!(remaining.unit_price, dec!(4.50));

    let item = app.items.get_item("Soap Bar").await.unwrap();
    assert_eq!(item.quantity, 7);
}

#[tokio::test]
async fn full_return_removes_the_sale() {
    let app = common::setup().await;
    app.seed_item("Candle", 6).await;

    let sale = app.sales.record_sale(sale_of("Candle", 2), app.actor).await.unwrap();
    let outcome = app.sales.return_sale(sale.id, 2, app.actor).await.unwrap();
    assert!(outcome.full_return);
    assert!(outcome.remaining.is_none());

    let err = app.sales.get_sale(sale.id).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let item = app.items.get_item("Candle").await.unwrap();
    assert_eq!(item.quantity, 6);

    // both the sale and the return left ledger entries
    let (movements, _) = app
        .stock
        .list_movements(
            stockroom_api::services::stock::MovementFilter {
                item_name: Some("Candle".to_string()),
                ..Default::default()
            },
            1,
            50,
        )
        .await
        .unwrap();
    let reasons: Vec<&str> = movements.iter().map(|m| m.reason.as_str()).collect();
    assert!(reasons.contains(&MovementReason::Sale.as_str()));
    assert!(reasons.contains(&MovementReason::Return.as_str()));
}

#[tokio::test]
async fn return_cannot_exceed_sold_quantity() {
    let app = common::setup().await;
    app.seed_item("Lamp", 5).await;

    let sale = app.sales.record_sale(sale_of("Lamp", 2), app.actor).await.unwrap();
    let err = app.sales.return_sale(sale.id, 3, app.actor).await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));

    let item = app.items.get_item("Lamp").await.unwrap();
    assert_eq!(item.quantity, 3);
}

#[tokio::test]
async fn outgoing_stock_decrements_with_its_own_reason() {
    let app = common::setup().await;
    let item_id = app.seed_item("Rice 5kg", 30).await;

    let record = app
        .outgoing
        .record_outgoing(
            NewOutgoing {
                item_name: "Rice 5kg".to_string(),
                quantity: 10,
                destination: "Main Street branch".to_string(),
                note: Some("weekly transfer".to_string()),
            },
            app.actor,
        )
        .await
        .unwrap();
    assert_eq!(record.quantity, 10);

    let item = app.items.get_item("Rice 5kg").await.unwrap();
    assert_eq!(item.quantity, 20);

    let movement = StockMovement::find()
        .filter(stock_movement::Column::ItemId.eq(item_id))
        .filter(stock_movement::Column::Reason.eq(MovementReason::Outgoing.as_str()))
        .one(app.db.as_ref())
        .await
        .unwrap()
        .expect("outgoing movement");
    assert_eq!(movement.delta, -10);
}

#[tokio::test]
async fn outgoing_beyond_stock_is_refused() {
    let app = common::setup().await;
    app.seed_item("Paint Can", 1).await;

    let err = app
        .outgoing
        .record_outgoing(
            NewOutgoing {
                item_name: "Paint Can".to_string(),
                quantity: 2,
                destination: "Disposal".to_string(),
                note: None,
            },
            app.actor,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(1));
}
