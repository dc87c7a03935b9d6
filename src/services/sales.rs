use crate::{
    entities::{
        item::{self, Entity as Item},
        sale::{self, Entity as Sale, PaymentMethod},
        stock_movement::MovementReason,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock::{apply_adjustment, emit_low_stock, AdjustmentOutcome, StockAdjustment},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewSale {
    pub item_name: String,
    pub quantity: i32,
    /// Price per unit for this sale; defaults to the item's list price.
    pub unit_price: Option<Decimal>,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub item_name: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ReturnOutcome {
    pub sale_id: Uuid,
    pub item_id: Uuid,
    pub returned_quantity: i32,
    pub full_return: bool,
    /// Sale row after the return; `None` when the whole sale was undone.
    pub remaining: Option<sale::Model>,
}

/// Sales recording and returns. Both flows ride on the shared adjustment
/// core so the sale row and the stock effect commit atomically.
#[derive(Clone)]
pub struct SalesService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl SalesService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Records a sale: decrements stock with a `sale` ledger entry and
    /// inserts the sale row in one transaction.
    #[instrument(skip(self), fields(item = %new_sale.item_name, quantity = new_sale.quantity))]
    pub async fn record_sale(
        &self,
        new_sale: NewSale,
        sold_by: Uuid,
    ) -> Result<sale::Model, ServiceError> {
        if new_sale.quantity <= 0 {
            return Err(ServiceError::InvalidInput(
                "Sale quantity must be positive".into(),
            ));
        }
        if let Some(price) = new_sale.unit_price {
            if price < Decimal::ZERO {
                return Err(ServiceError::InvalidInput(
                    "Unit price must not be negative".into(),
                ));
            }
        }

        let (recorded, adjustment) = self
            .db
            .transaction::<_, (sale::Model, AdjustmentOutcome), ServiceError>(move |txn| {
                Box::pin(async move {
                    let sale_id = Uuid::new_v4();
                    let outcome = apply_adjustment(
                        txn,
                        &StockAdjustment {
                            item_name: new_sale.item_name.clone(),
                            delta: -new_sale.quantity,
                            reason: MovementReason::Sale,
                            actor_id: sold_by,
                            note: None,
                            sale_id: Some(sale_id),
                        },
                    )
                    .await?;

                    let unit_price = match new_sale.unit_price {
                        Some(price) => price,
                        None => Item::find_by_id(outcome.item_id)
                            .one(txn)
                            .await?
                            .and_then(|i| i.unit_price)
                            .ok_or_else(|| {
                                ServiceError::InvalidInput(format!(
                                    "Item '{}' has no list price; provide a unit price",
                                    new_sale.item_name
                                ))
                            })?,
                    };

                    let model = sale::ActiveModel {
                        id: Set(sale_id),
                        item_id: Set(outcome.item_id),
                        quantity: Set(new_sale.quantity),
                        unit_price: Set(unit_price),
                        total_price: Set(unit_price * Decimal::from(new_sale.quantity)),
                        payment_method: Set(new_sale.payment_method.as_str().to_string()),
                        customer_name: Set(new_sale.customer_name.clone()),
                        customer_phone: Set(new_sale.customer_phone.clone()),
                        sold_by: Set(sold_by),
                        sold_at: Set(Utc::now()),
                    };
                    let inserted = model.insert(txn).await?;
                    Ok((inserted, outcome))
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(sale_id = %recorded.id, item_id = %recorded.item_id, "Recorded sale");
        self.event_sender
            .send(Event::SaleRecorded {
                sale_id: recorded.id,
                item_id: recorded.item_id,
                quantity: recorded.quantity,
            })
            .await;
        emit_low_stock(&self.event_sender, &adjustment).await;
        Ok(recorded)
    }

    /// Returns part or all of a sale. Stock is restored with a `return`
    /// ledger entry; a partial return rescales the sale's total price to the
    /// remaining quantity, a full return removes the sale row.
    #[instrument(skip(self))]
    pub async fn return_sale(
        &self,
        sale_id: Uuid,
        quantity: i32,
        actor_id: Uuid,
    ) -> Result<ReturnOutcome, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::InvalidInput(
                "Return quantity must be positive".into(),
            ));
        }

        let outcome = self
            .db
            .transaction::<_, ReturnOutcome, ServiceError>(move |txn| {
                Box::pin(async move {
                    let found = Sale::find_by_id(sale_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Sale {} not found", sale_id))
                        })?;
                    if quantity > found.quantity {
                        return Err(ServiceError::InvalidInput(format!(
                            "Cannot return {} units of a {}-unit sale",
                            quantity, found.quantity
                        )));
                    }

                    let sold_item = Item::find_by_id(found.item_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Item {} not found", found.item_id))
                        })?;

                    apply_adjustment(
                        txn,
                        &StockAdjustment {
                            item_name: sold_item.name,
                            delta: quantity,
                            reason: MovementReason::Return,
                            actor_id,
                            note: None,
                            sale_id: Some(found.id),
                        },
                    )
                    .await?;

                    let full_return = quantity == found.quantity;
                    let remaining = if full_return {
                        found.clone().delete(txn).await?;
                        None
                    } else {
                        let remaining_quantity = found.quantity - quantity;
                        let rescaled_total = found.total_price
                            * Decimal::from(remaining_quantity)
                            / Decimal::from(found.quantity);
                        let mut active: sale::ActiveModel = found.clone().into();
                        active.quantity = Set(remaining_quantity);
                        active.total_price = Set(rescaled_total);
                        Some(active.update(txn).await?)
                    };

                    Ok(ReturnOutcome {
                        sale_id: found.id,
                        item_id: found.item_id,
                        returned_quantity: quantity,
                        full_return,
                        remaining,
                    })
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(
            sale_id = %outcome.sale_id,
            returned = outcome.returned_quantity,
            full_return = outcome.full_return,
            "Processed return"
        );
        self.event_sender
            .send(Event::SaleReturned {
                sale_id: outcome.sale_id,
                item_id: outcome.item_id,
                quantity: outcome.returned_quantity,
                full_return: outcome.full_return,
            })
            .await;
        Ok(outcome)
    }

    pub async fn get_sale(&self, sale_id: Uuid) -> Result<sale::Model, ServiceError> {
        Sale::find_by_id(sale_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {} not found", sale_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_sales(
        &self,
        filter: SaleFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<sale::Model>, u64), ServiceError> {
        let db = self.db.as_ref();

        let mut query = Sale::find();
        if let Some(name) = &filter.item_name {
            let found = Item::find()
                .filter(item::Column::Name.eq(name.clone()))
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Item '{}' not found", name)))?;
            query = query.filter(sale::Column::ItemId.eq(found.id));
        }
        if let Some(from) = filter.from {
            query = query.filter(sale::Column::SoldAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(sale::Column::SoldAt.lte(to));
        }

        let paginator = query.order_by_desc(sale::Column::SoldAt).paginate(db, limit);
        let total = paginator.num_items().await?;
        let sales = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((sales, total))
    }
}
