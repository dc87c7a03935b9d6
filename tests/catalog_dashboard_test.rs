mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use stockroom_api::entities::sale::PaymentMethod;
use stockroom_api::entities::stock_movement::MovementReason;
use stockroom_api::errors::ServiceError;
use stockroom_api::services::items::{ItemFilter, ItemUpdate, NewItem};
use stockroom_api::services::sales::NewSale;

#[tokio::test]
async fn referenced_category_cannot_be_deleted() {
    let app = common::setup().await;
    let category = app
        .catalog
        .create_category("Beverages".to_string(), None)
        .await
        .unwrap();

    app.items
        .create_item(
            NewItem {
                name: "Cola".to_string(),
                initial_quantity: 0,
                category_id: Some(category.id),
                branch_id: None,
                unit_cost: None,
                unit_price: None,
                restock_level: 0,
            },
            app.actor,
        )
        .await
        .unwrap();

    let err = app.catalog.delete_category(category.id).await.unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    // unassign the item, then deletion goes through
    app.items
        .update_item(
            "Cola",
            ItemUpdate {
                category_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    app.catalog.delete_category(category.id).await.unwrap();
}

#[tokio::test]
async fn duplicate_catalog_names_conflict() {
    let app = common::setup().await;
    app.catalog
        .create_branch("Downtown".to_string(), None, None)
        .await
        .unwrap();
    let err = app
        .catalog
        .create_branch("Downtown".to_string(), None, None)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn dashboard_summary_reflects_inventory_and_sales() {
    let app = common::setup().await;
    app.items
        .create_item(
            NewItem {
                name: "Widget".to_string(),
                initial_quantity: 10,
                category_id: None,
                branch_id: None,
                unit_cost: Some(dec!(1.50)),
                unit_price: Some(dec!(3.00)),
                restock_level: 2,
            },
            app.actor,
        )
        .await
        .unwrap();

    app.sales
        .record_sale(
            NewSale {
                item_name: "Widget".to_string(),
                quantity: 4,
                unit_price: None,
                payment_method: PaymentMethod::Cash,
                customer_name: None,
                customer_phone: None,
            },
            app.actor,
        )
        .await
        .unwrap();

    let summary = app.analytics.dashboard_summary().await.unwrap();
    assert_eq!(summary.total_items, 1);
    assert_eq!(summary.total_quantity, 6);
    assert_eq!(summary.inventory_value, dec!(9.00));
    assert_eq!(summary.sales_today, 1);
    assert_eq!(summary.revenue_today, dec!(12.00));
    assert_eq!(summary.low_stock_count, 0);
}

#[tokio::test]
async fn movement_breakdown_separates_in_and_out() {
    let app = common::setup().await;
    app.seed_item("Gadget", 20).await;
    app.adjust("Gadget", 5).await.unwrap();
    app.adjust("Gadget", -3).await.unwrap();

    let from = Utc::now() - Duration::hours(1);
    let to = Utc::now() + Duration::hours(1);
    let breakdown = app.analytics.movement_breakdown(from, to).await.unwrap();

    let initial = breakdown
        .iter()
        .find(|b| b.reason == MovementReason::InitialStock.as_str())
        .expect("initial-stock bucket");
    assert_eq!(initial.quantity_in, 20);
    assert_eq!(initial.quantity_out, 0);

    let manual = breakdown
        .iter()
        .find(|b| b.reason == MovementReason::ManualAdjustment.as_str())
        .expect("manual-adjustment bucket");
    assert_eq!(manual.quantity_out, 3);
}

#[tokio::test]
async fn low_stock_listing_returns_only_items_at_or_below_threshold() {
    let app = common::setup().await;
    for (name, quantity, restock_level) in [
        ("Matches", 2, 5),
        ("Candles", 5, 5),
        ("Lanterns", 10, 5),
    ] {
        app.items
            .create_item(
                NewItem {
                    name: name.to_string(),
                    initial_quantity: quantity,
                    category_id: None,
                    branch_id: None,
                    unit_cost: None,
                    unit_price: None,
                    restock_level,
                },
                app.actor,
            )
            .await
            .unwrap();
    }

    let (low, total) = app
        .items
        .list_items(
            ItemFilter {
                low_stock_only: true,
                ..Default::default()
            },
            1,
            50,
        )
        .await
        .unwrap();
    assert_eq!(total, 2);
    let names: Vec<&str> = low.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Candles", "Matches"]);
}

#[tokio::test]
async fn top_items_ranks_by_quantity_sold() {
    let app = common::setup().await;
    app.seed_item("Apples", 50).await;
    app.seed_item("Oranges", 50).await;

    for (item, quantity) in [("Apples", 5), ("Oranges", 12), ("Apples", 3)] {
        app.sales
            .record_sale(
                NewSale {
                    item_name: item.to_string(),
                    quantity,
                    unit_price: Some(dec!(1.00)),
                    payment_method: PaymentMethod::Cash,
                    customer_name: None,
                    customer_phone: None,
                },
                app.actor,
            )
            .await
            .unwrap();
    }

    let from = Utc::now() - Duration::hours(1);
    let to = Utc::now() + Duration::hours(1);
    let ranked = app.analytics.top_items(from, to, 10).await.unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].name, "Oranges");
    assert_eq!(ranked[0].quantity_sold, 12);
    assert_eq!(ranked[1].name, "Apples");
    assert_eq!(ranked[1].quantity_sold, 8);

    let daily = app.analytics.sales_by_day(from, to).await.unwrap();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].sales, 3);
    assert_eq!(daily[0].quantity, 20);
}
