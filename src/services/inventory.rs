use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QuerySelect, Set};
use tracing::debug;
use uuid::Uuid;

use crate::{entities::ticket_type, errors::ServiceError};

/// Outcome of a capacity check. `Denied` leaves the counter untouched and is
/// the deterministic losing side of a capacity race, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerDecision {
    Granted,
    Denied,
}

/// Sole authority over `ticket_types.sold_count`.
///
/// Every call runs inside the caller's open transaction and takes an
/// exclusive lock on the ticket-type row, so concurrent finalizations for
/// the same type serialize on the database lock.
pub struct InventoryLedger;

impl InventoryLedger {
    /// Attempts to consume `quantity` units of capacity.
    ///
    /// Grants increment `sold_count` in place within the caller's
    /// transaction; denial happens exactly when
    /// `sold_count + quantity > limit`.
    pub async fn try_reserve<C: ConnectionTrait>(
        txn: &C,
        ticket_type_id: Uuid,
        quantity: i32,
    ) -> Result<LedgerDecision, ServiceError> {
        let ticket_type = ticket_type::Entity::find_by_id(ticket_type_id)
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Ticket type {} not found", ticket_type_id))
            })?;

        if ticket_type.sold_count + quantity > ticket_type.limit {
            debug!(
                ticket_type_id = %ticket_type_id,
                sold_count = ticket_type.sold_count,
                limit = ticket_type.limit,
                requested = quantity,
                "Capacity check denied"
            );
            return Ok(LedgerDecision::Denied);
        }

        let new_count = ticket_type.sold_count + quantity;
        let mut update: ticket_type::ActiveModel = ticket_type.into();
        update.sold_count = Set(new_count);
        update.update(txn).await?;

        Ok(LedgerDecision::Granted)
    }
}
