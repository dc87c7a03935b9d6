use crate::{
    entities::{
        item::{self, Entity as Item},
        sale::{self, Entity as Sale},
        stock_movement::{self, Entity as StockMovement, MovementReason},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock::{apply_adjustment, StockAdjustment},
};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub initial_quantity: i32,
    pub category_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub unit_cost: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub restock_level: i32,
}

/// Partial update of an item's descriptive fields. Quantity is deliberately
/// absent; it only moves through the stock adjustment path.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub category_id: Option<Option<Uuid>>,
    pub branch_id: Option<Option<Uuid>>,
    pub unit_cost: Option<Option<Decimal>>,
    pub unit_price: Option<Option<Decimal>>,
    pub restock_level: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub name_contains: Option<String>,
    pub category_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub low_stock_only: bool,
}

#[derive(Clone)]
pub struct ItemService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl ItemService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates an item. A non-zero initial quantity is applied through the
    /// adjustment path inside the same transaction, so the item row and its
    /// opening ledger entry commit together.
    #[instrument(skip(self), fields(name = %new_item.name))]
    pub async fn create_item(
        &self,
        new_item: NewItem,
        actor_id: Uuid,
    ) -> Result<item::Model, ServiceError> {
        if new_item.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Item name must not be empty".into(),
            ));
        }
        if new_item.initial_quantity < 0 {
            return Err(ServiceError::InvalidInput(
                "Initial quantity must not be negative".into(),
            ));
        }
        if new_item.restock_level < 0 {
            return Err(ServiceError::InvalidInput(
                "Restock level must not be negative".into(),
            ));
        }

        let created = self
            .db
            .transaction::<_, item::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = Item::find()
                        .filter(item::Column::Name.eq(new_item.name.clone()))
                        .one(txn)
                        .await?;
                    if existing.is_some() {
                        return Err(ServiceError::Conflict(format!(
                            "Item '{}' already exists",
                            new_item.name
                        )));
                    }

                    let model = item::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        name: Set(new_item.name.clone()),
                        quantity: Set(0),
                        category_id: Set(new_item.category_id),
                        branch_id: Set(new_item.branch_id),
                        unit_cost: Set(new_item.unit_cost),
                        unit_price: Set(new_item.unit_price),
                        restock_level: Set(new_item.restock_level),
                        created_at: Set(chrono::Utc::now()),
                        updated_at: Set(None),
                    };
                    let mut created = model.insert(txn).await?;

                    if new_item.initial_quantity > 0 {
                        let outcome = apply_adjustment(
                            txn,
                            &StockAdjustment {
                                item_name: created.name.clone(),
                                delta: new_item.initial_quantity,
                                reason: MovementReason::InitialStock,
                                actor_id,
                                note: None,
                                sale_id: None,
                            },
                        )
                        .await?;
                        created.quantity = outcome.new_quantity;
                    }

                    Ok(created)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(item_id = %created.id, "Created item");
        self.event_sender
            .send(Event::ItemCreated {
                item_id: created.id,
                name: created.name.clone(),
            })
            .await;
        if created.is_low_stock() {
            self.event_sender
                .send(Event::LowStock {
                    item_id: created.id,
                    name: created.name.clone(),
                    quantity: created.quantity,
                    restock_level: created.restock_level,
                })
                .await;
        }
        Ok(created)
    }

    pub async fn get_item(&self, name: &str) -> Result<item::Model, ServiceError> {
        Item::find()
            .filter(item::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Item '{}' not found", name)))
    }

    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        filter: ItemFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<item::Model>, u64), ServiceError> {
        let mut query = Item::find();
        if let Some(fragment) = &filter.name_contains {
            query = query.filter(item::Column::Name.contains(fragment.as_str()));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(item::Column::CategoryId.eq(category_id));
        }
        if let Some(branch_id) = filter.branch_id {
            query = query.filter(item::Column::BranchId.eq(branch_id));
        }

        if filter.low_stock_only {
            query = query.filter(
                Expr::col(item::Column::Quantity).lte(Expr::col(item::Column::RestockLevel)),
            );
        }

        let paginator = query.order_by_asc(item::Column::Name).paginate(self.db.as_ref(), limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Updates descriptive fields; renames are rejected when the new name is
    /// already taken.
    #[instrument(skip(self, update))]
    pub async fn update_item(
        &self,
        name: &str,
        update: ItemUpdate,
    ) -> Result<item::Model, ServiceError> {
        let found = self.get_item(name).await?;

        if let Some(new_name) = &update.name {
            if new_name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Item name must not be empty".into(),
                ));
            }
            if new_name != &found.name {
                let taken = Item::find()
                    .filter(item::Column::Name.eq(new_name.clone()))
                    .one(self.db.as_ref())
                    .await?;
                if taken.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "Item '{}' already exists",
                        new_name
                    )));
                }
            }
        }
        if let Some(level) = update.restock_level {
            if level < 0 {
                return Err(ServiceError::InvalidInput(
                    "Restock level must not be negative".into(),
                ));
            }
        }

        let mut active: item::ActiveModel = found.into();
        if let Some(new_name) = update.name {
            active.name = Set(new_name);
        }
        if let Some(category_id) = update.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(branch_id) = update.branch_id {
            active.branch_id = Set(branch_id);
        }
        if let Some(unit_cost) = update.unit_cost {
            active.unit_cost = Set(unit_cost);
        }
        if let Some(unit_price) = update.unit_price {
            active.unit_price = Set(unit_price);
        }
        if let Some(level) = update.restock_level {
            active.restock_level = Set(level);
        }
        active.updated_at = Set(Some(chrono::Utc::now()));

        Ok(active.update(self.db.as_ref()).await?)
    }

    /// Deletes an item. Refused while ledger entries or sales reference it,
    /// so history is never orphaned.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, name: &str) -> Result<(), ServiceError> {
        let found = self.get_item(name).await?;

        let movement_count = StockMovement::find()
            .filter(stock_movement::Column::ItemId.eq(found.id))
            .count(self.db.as_ref())
            .await?;
        let sale_count = Sale::find()
            .filter(sale::Column::ItemId.eq(found.id))
            .count(self.db.as_ref())
            .await?;
        if movement_count > 0 || sale_count > 0 {
            return Err(ServiceError::Conflict(format!(
                "Item '{}' has recorded history and cannot be deleted",
                name
            )));
        }

        let item_id = found.id;
        found.delete(self.db.as_ref()).await?;
        info!(item_id = %item_id, "Deleted item");
        self.event_sender.send(Event::ItemDeleted { item_id }).await;
        Ok(())
    }
}
