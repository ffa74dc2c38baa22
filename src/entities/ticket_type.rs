use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ticket tier for an event. `sold_count` is the capacity counter guarded by
/// the finalization transaction; `0 <= sold_count <= limit` holds at every
/// commit point. Only the inventory ledger writes `sold_count`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ticket_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub event_id: Uuid,
    pub name: String,

    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,

    pub limit: i32,
    pub sold_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id"
    )]
    Event,
    #[sea_orm(has_many = "super::ticket::Entity")]
    Tickets,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Remaining capacity for display purposes. Authoritative checks happen
    /// under the row lock in the ledger, not here.
    pub fn remaining(&self) -> i32 {
        (self.limit - self.sold_count).max(0)
    }
}
