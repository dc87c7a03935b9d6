use crate::{
    entities::{
        item::{self, Entity as Item},
        sale::{self, Entity as Sale},
        stock_movement::{self, Entity as StockMovement},
    },
    errors::ServiceError,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardSummary {
    pub total_items: u64,
    pub total_quantity: i64,
    /// Sum of quantity x unit cost over items that have a cost.
    pub inventory_value: Decimal,
    pub low_stock_count: u64,
    pub sales_today: u64,
    pub revenue_today: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DailySales {
    pub date: NaiveDate,
    pub sales: u64,
    pub quantity: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReasonBreakdown {
    pub reason: String,
    pub entries: u64,
    pub quantity_in: i64,
    pub quantity_out: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TopItem {
    pub item_id: Uuid,
    pub name: String,
    pub quantity_sold: i64,
    pub revenue: Decimal,
}

/// Read-only dashboard queries. Rows are fetched and folded in memory; the
/// grouping stays portable across Postgres and SQLite and the data volume of
/// a single shop keeps this cheap.
#[derive(Clone)]
pub struct AnalyticsService {
    db: Arc<DatabaseConnection>,
}

impl AnalyticsService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn dashboard_summary(&self) -> Result<DashboardSummary, ServiceError> {
        let items = Item::find().all(self.db.as_ref()).await?;

        let total_items = items.len() as u64;
        let total_quantity: i64 = items.iter().map(|i| i.quantity as i64).sum();
        let inventory_value: Decimal = items
            .iter()
            .filter_map(|i| i.unit_cost.map(|c| c * Decimal::from(i.quantity)))
            .sum();
        let low_stock_count = items.iter().filter(|i| i.is_low_stock()).count() as u64;

        let start_of_day = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc();
        let today = Sale::find()
            .filter(sale::Column::SoldAt.gte(start_of_day))
            .all(self.db.as_ref())
            .await?;
        let sales_today = today.len() as u64;
        let revenue_today: Decimal = today.iter().map(|s| s.total_price).sum();

        Ok(DashboardSummary {
            total_items,
            total_quantity,
            inventory_value,
            low_stock_count,
            sales_today,
            revenue_today,
        })
    }

    /// Sales bucketed per calendar day (UTC) over the given window.
    #[instrument(skip(self))]
    pub async fn sales_by_day(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DailySales>, ServiceError> {
        let sales = Sale::find()
            .filter(sale::Column::SoldAt.gte(from))
            .filter(sale::Column::SoldAt.lte(to))
            .order_by_asc(sale::Column::SoldAt)
            .all(self.db.as_ref())
            .await?;

        let mut buckets: BTreeMap<NaiveDate, DailySales> = BTreeMap::new();
        for s in sales {
            let date = s.sold_at.date_naive();
            let bucket = buckets.entry(date).or_insert_with(|| DailySales {
                date,
                sales: 0,
                quantity: 0,
                revenue: Decimal::ZERO,
            });
            bucket.sales += 1;
            bucket.quantity += s.quantity as i64;
            bucket.revenue += s.total_price;
        }
        Ok(buckets.into_values().collect())
    }

    /// Ledger activity grouped by movement reason over the given window.
    #[instrument(skip(self))]
    pub async fn movement_breakdown(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ReasonBreakdown>, ServiceError> {
        let movements = StockMovement::find()
            .filter(stock_movement::Column::RecordedAt.gte(from))
            .filter(stock_movement::Column::RecordedAt.lte(to))
            .all(self.db.as_ref())
            .await?;

        let mut buckets: BTreeMap<String, ReasonBreakdown> = BTreeMap::new();
        for m in movements {
            let bucket = buckets
                .entry(m.reason.clone())
                .or_insert_with(|| ReasonBreakdown {
                    reason: m.reason.clone(),
                    entries: 0,
                    quantity_in: 0,
                    quantity_out: 0,
                });
            bucket.entries += 1;
            if m.delta >= 0 {
                bucket.quantity_in += m.delta as i64;
            } else {
                bucket.quantity_out += (-m.delta) as i64;
            }
        }
        Ok(buckets.into_values().collect())
    }

    /// Best sellers by quantity over the given window.
    #[instrument(skip(self))]
    pub async fn top_items(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<TopItem>, ServiceError> {
        let sales = Sale::find()
            .filter(sale::Column::SoldAt.gte(from))
            .filter(sale::Column::SoldAt.lte(to))
            .all(self.db.as_ref())
            .await?;

        let mut by_item: BTreeMap<Uuid, (i64, Decimal)> = BTreeMap::new();
        for s in sales {
            let entry = by_item.entry(s.item_id).or_insert((0, Decimal::ZERO));
            entry.0 += s.quantity as i64;
            entry.1 += s.total_price;
        }

        let ids: Vec<Uuid> = by_item.keys().copied().collect();
        let names: BTreeMap<Uuid, String> = Item::find()
            .filter(item::Column::Id.is_in(ids))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(|i| (i.id, i.name))
            .collect();

        let mut ranked: Vec<TopItem> = by_item
            .into_iter()
            .map(|(item_id, (quantity_sold, revenue))| TopItem {
                item_id,
                name: names.get(&item_id).cloned().unwrap_or_default(),
                quantity_sold,
                revenue,
            })
            .collect();
        ranked.sort_by(|a, b| b.quantity_sold.cmp(&a.quantity_sold));
        ranked.truncate(limit);
        Ok(ranked)
    }
}
