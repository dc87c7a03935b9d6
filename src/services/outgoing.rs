use crate::{
    entities::{
        item::{self, Entity as Item},
        outgoing_record::{self, Entity as OutgoingRecord},
        stock_movement::MovementReason,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock::{apply_adjustment, emit_low_stock, AdjustmentOutcome, StockAdjustment},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewOutgoing {
    pub item_name: String,
    pub quantity: i32,
    pub destination: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OutgoingFilter {
    pub item_name: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Non-sale stock departures: branch transfers, supplier returns, disposal.
#[derive(Clone)]
pub struct OutgoingService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl OutgoingService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Records an outgoing shipment: decrements stock with an `outgoing`
    /// ledger entry and inserts the record in one transaction.
    #[instrument(skip(self), fields(item = %new_outgoing.item_name, quantity = new_outgoing.quantity))]
    pub async fn record_outgoing(
        &self,
        new_outgoing: NewOutgoing,
        recorded_by: Uuid,
    ) -> Result<outgoing_record::Model, ServiceError> {
        if new_outgoing.quantity <= 0 {
            return Err(ServiceError::InvalidInput(
                "Outgoing quantity must be positive".into(),
            ));
        }
        if new_outgoing.destination.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Destination must not be empty".into(),
            ));
        }

        let (recorded, adjustment) = self
            .db
            .transaction::<_, (outgoing_record::Model, AdjustmentOutcome), ServiceError>(move |txn| {
                Box::pin(async move {
                    let outcome = apply_adjustment(
                        txn,
                        &StockAdjustment {
                            item_name: new_outgoing.item_name.clone(),
                            delta: -new_outgoing.quantity,
                            reason: MovementReason::Outgoing,
                            actor_id: recorded_by,
                            note: new_outgoing.note.clone(),
                            sale_id: None,
                        },
                    )
                    .await?;

                    let model = outgoing_record::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        item_id: Set(outcome.item_id),
                        quantity: Set(new_outgoing.quantity),
                        destination: Set(new_outgoing.destination.clone()),
                        note: Set(new_outgoing.note.clone()),
                        recorded_by: Set(recorded_by),
                        recorded_at: Set(Utc::now()),
                    };
                    let inserted = model.insert(txn).await?;
                    Ok((inserted, outcome))
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(record_id = %recorded.id, item_id = %recorded.item_id, "Recorded outgoing stock");
        self.event_sender
            .send(Event::OutgoingRecorded {
                record_id: recorded.id,
                item_id: recorded.item_id,
                quantity: recorded.quantity,
            })
            .await;
        emit_low_stock(&self.event_sender, &adjustment).await;
        Ok(recorded)
    }

    pub async fn get_record(&self, record_id: Uuid) -> Result<outgoing_record::Model, ServiceError> {
        OutgoingRecord::find_by_id(record_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Outgoing record {} not found", record_id))
            })
    }

    #[instrument(skip(self))]
    pub async fn list_records(
        &self,
        filter: OutgoingFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<outgoing_record::Model>, u64), ServiceError> {
        let db = self.db.as_ref();

        let mut query = OutgoingRecord::find();
        if let Some(name) = &filter.item_name {
            let found = Item::find()
                .filter(item::Column::Name.eq(name.clone()))
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Item '{}' not found", name)))?;
            query = query.filter(outgoing_record::Column::ItemId.eq(found.id));
        }
        if let Some(from) = filter.from {
            query = query.filter(outgoing_record::Column::RecordedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(outgoing_record::Column::RecordedAt.lte(to));
        }

        let paginator = query
            .order_by_desc(outgoing_record::Column::RecordedAt)
            .paginate(db, limit);
        let total = paginator.num_items().await?;
        let records = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((records, total))
    }
}
