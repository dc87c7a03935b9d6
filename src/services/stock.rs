use crate::{
    entities::{
        item::{self, Entity as Item},
        stock_movement::{self, Entity as StockMovement, MovementReason},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// A requested change to an item's on-hand quantity.
#[derive(Debug, Clone)]
pub struct StockAdjustment {
    pub item_name: String,
    /// Positive = increase, negative = decrease. Zero is rejected.
    pub delta: i32,
    pub reason: MovementReason,
    pub actor_id: Uuid,
    pub note: Option<String>,
    /// Back-reference for sale/return movements.
    pub sale_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct AdjustmentOutcome {
    pub item_id: Uuid,
    pub item_name: String,
    pub new_quantity: i32,
    pub movement_id: Uuid,
    pub restock_level: i32,
}

/// Filter for the read-only ledger scan.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub item_name: Option<String>,
    pub reason: Option<MovementReason>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// The single authorized path for changing an item's on-hand quantity.
///
/// Every mutation commits the quantity update and the ledger append in one
/// transaction; the ledger and the stored quantity never diverge.
#[derive(Clone)]
pub struct StockService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl StockService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Applies a signed quantity delta and records the paired ledger entry.
    ///
    /// Fails with `NotFound` when the item does not exist, `InvalidInput`
    /// when the delta is zero, `InsufficientStock` when the result would be
    /// negative (the available quantity is carried in the error), and
    /// `Conflict` when a concurrent adjustment won the race (retryable).
    #[instrument(skip(self), fields(item = %adjustment.item_name, delta = adjustment.delta))]
    pub async fn adjust(
        &self,
        adjustment: StockAdjustment,
    ) -> Result<AdjustmentOutcome, ServiceError> {
        let delta = adjustment.delta;
        let reason = adjustment.reason;
        let outcome = self
            .db
            .transaction::<_, AdjustmentOutcome, ServiceError>(move |txn| {
                Box::pin(async move { apply_adjustment(txn, &adjustment).await })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(
            item_id = %outcome.item_id,
            new_quantity = outcome.new_quantity,
            "Stock adjusted"
        );
        self.event_sender
            .send(Event::StockAdjusted {
                item_id: outcome.item_id,
                movement_id: outcome.movement_id,
                delta,
                new_quantity: outcome.new_quantity,
                reason: reason.as_str().to_string(),
            })
            .await;
        emit_low_stock(&self.event_sender, &outcome).await;
        Ok(outcome)
    }

    /// Time-ordered, filterable scan over the movement ledger.
    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        filter: MovementFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_movement::Model>, u64), ServiceError> {
        let db = self.db.as_ref();

        let mut query = StockMovement::find();
        if let Some(name) = &filter.item_name {
            let found = Item::find()
                .filter(item::Column::Name.eq(name.clone()))
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Item '{}' not found", name)))?;
            query = query.filter(stock_movement::Column::ItemId.eq(found.id));
        }
        if let Some(reason) = filter.reason {
            query = query.filter(stock_movement::Column::Reason.eq(reason.as_str()));
        }
        if let Some(from) = filter.from {
            query = query.filter(stock_movement::Column::RecordedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(stock_movement::Column::RecordedAt.lte(to));
        }

        let paginator = query
            .order_by_desc(stock_movement::Column::RecordedAt)
            .paginate(db, limit);
        let total = paginator.num_items().await?;
        let movements = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((movements, total))
    }
}

/// Fires the low-stock alert when an adjustment left the item at or below
/// its restock level. Called by every flow that decrements stock.
pub(crate) async fn emit_low_stock(events: &EventSender, outcome: &AdjustmentOutcome) {
    if outcome.new_quantity <= outcome.restock_level {
        events
            .send(Event::LowStock {
                item_id: outcome.item_id,
                name: outcome.item_name.clone(),
                quantity: outcome.new_quantity,
                restock_level: outcome.restock_level,
            })
            .await;
    }
}

/// Core of the adjustment operation, shared with the sale/outgoing flows so
/// they can fold the stock effect into their own transactions.
///
/// The quantity `UPDATE` is conditioned on the quantity observed at the start
/// of the transaction (compare-and-swap); losing the race maps to `Conflict`
/// and rolls the whole unit of work back.
pub(crate) async fn apply_adjustment<C: ConnectionTrait>(
    conn: &C,
    adjustment: &StockAdjustment,
) -> Result<AdjustmentOutcome, ServiceError> {
    if adjustment.delta == 0 {
        return Err(ServiceError::InvalidInput(
            "Adjustment delta must be non-zero".into(),
        ));
    }

    let found = Item::find()
        .filter(item::Column::Name.eq(adjustment.item_name.clone()))
        .one(conn)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Item '{}' not found", adjustment.item_name))
        })?;

    let new_quantity = found
        .quantity
        .checked_add(adjustment.delta)
        .ok_or_else(|| ServiceError::InvalidInput("Quantity overflow".into()))?;
    if new_quantity < 0 {
        return Err(ServiceError::InsufficientStock(found.quantity));
    }

    let update = Item::update_many()
        .col_expr(item::Column::Quantity, Expr::value(new_quantity))
        .col_expr(item::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(item::Column::Id.eq(found.id))
        .filter(item::Column::Quantity.eq(found.quantity))
        .exec(conn)
        .await?;
    if update.rows_affected == 0 {
        return Err(ServiceError::Conflict(format!(
            "Concurrent adjustment on item '{}'; retry",
            adjustment.item_name
        )));
    }

    let movement = stock_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        item_id: Set(found.id),
        delta: Set(adjustment.delta),
        quantity_after: Set(new_quantity),
        reason: Set(adjustment.reason.as_str().to_string()),
        note: Set(adjustment.note.clone()),
        sale_id: Set(adjustment.sale_id),
        actor_id: Set(adjustment.actor_id),
        recorded_at: Set(Utc::now()),
    };
    let movement = movement.insert(conn).await?;

    Ok(AdjustmentOutcome {
        item_id: found.id,
        item_name: found.name,
        new_quantity,
        movement_id: movement.id,
        restock_level: found.restock_level,
    })
}
