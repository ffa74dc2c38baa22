use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{
        check_in,
        ticket::{self, TicketStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Writer of the `paid -> checked_in` transition. The scanning UI lives
/// elsewhere; this service only enforces the paid precondition and records
/// the audit row.
#[derive(Clone)]
pub struct CheckInService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl CheckInService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn check_in(
        &self,
        ticket_id: Uuid,
        checked_in_by: String,
    ) -> Result<(check_in::Model, ticket::Model), ServiceError> {
        let txn = self.db.begin().await?;

        // Lock the ticket so two scanners cannot both admit it.
        let ticket = ticket::Entity::find_by_id(ticket_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Ticket not found".to_string()))?;

        match ticket.status {
            TicketStatus::CheckedIn => {
                return Err(ServiceError::InvalidOperation(
                    "Already checked in".to_string(),
                ))
            }
            TicketStatus::Paid => {}
            TicketStatus::Pending | TicketStatus::Cancelled => {
                return Err(ServiceError::InvalidOperation("Ticket not paid".to_string()))
            }
        }

        let record = check_in::ActiveModel {
            id: Set(Uuid::new_v4()),
            ticket_id: Set(ticket.id),
            checked_in_by: Set(checked_in_by),
            checked_in_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        let mut update: ticket::ActiveModel = ticket.into();
        update.status = Set(TicketStatus::CheckedIn);
        let ticket = update.update(&txn).await?;

        txn.commit().await?;

        if let Err(e) = self.event_sender.send(Event::TicketCheckedIn(ticket.id)).await {
            warn!(ticket_id = %ticket.id, error = %e, "Failed to emit TicketCheckedIn event");
        }

        Ok((record, ticket))
    }
}
