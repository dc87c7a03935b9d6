use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter as StrumEnumIter, EnumString};
use uuid::Uuid;

/// Why a quantity changed. The tag set is closed; free text goes in `note`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, StrumEnumIter,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum MovementReason {
    InitialStock,
    Restock,
    ManualAdjustment,
    Sale,
    Return,
    Outgoing,
}

impl MovementReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementReason::InitialStock => "initial-stock",
            MovementReason::Restock => "restock",
            MovementReason::ManualAdjustment => "manual-adjustment",
            MovementReason::Sale => "sale",
            MovementReason::Return => "return",
            MovementReason::Outgoing => "outgoing",
        }
    }
}

/// One row of the movement ledger: a signed quantity delta with reason,
/// actor and timestamp. Append-only; never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub item_id: Uuid,
    pub delta: i32,
    pub quantity_after: i32,
    pub reason: String, // stored as string, converted via MovementReason
    pub note: Option<String>,
    pub sale_id: Option<Uuid>,
    pub actor_id: Uuid,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ItemId",
        to = "super::item::Column::Id"
    )]
    Item,
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr> {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.recorded_at {
            active_model.recorded_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn reason_round_trips_through_strings() {
        for reason in [
            MovementReason::InitialStock,
            MovementReason::Restock,
            MovementReason::ManualAdjustment,
            MovementReason::Sale,
            MovementReason::Return,
            MovementReason::Outgoing,
        ] {
            assert_eq!(
                MovementReason::from_str(reason.as_str()).unwrap(),
                reason
            );
        }
    }

    #[test]
    fn unknown_reason_is_rejected() {
        assert!(MovementReason::from_str("teleport").is_err());
    }
}
