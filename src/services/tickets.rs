use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    entities::{
        attendee,
        ticket::{self, TicketStatus},
        ticket_type,
    },
    errors::ServiceError,
};

/// A reservation batch joined with its shared attendee and ticket type,
/// loaded for response building.
#[derive(Debug, Clone)]
pub struct BatchDetails {
    pub tickets: Vec<ticket::Model>,
    pub attendee: attendee::Model,
    pub ticket_type: ticket_type::Model,
}

/// Lock-free ticket reads: admin listing, gate lookups, batch loading.
/// These may trail an in-flight finalization by one commit; that is fine.
#[derive(Clone)]
pub struct TicketQueryService {
    db: Arc<DatabaseConnection>,
}

impl TicketQueryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Loads a batch with its attendee and ticket type. `None` when the
    /// reference is unknown.
    #[instrument(skip(self))]
    pub async fn batch(&self, reference: &str) -> Result<Option<BatchDetails>, ServiceError> {
        let tickets = ticket::Entity::find()
            .filter(ticket::Column::PaymentRef.eq(reference))
            .all(&*self.db)
            .await?;

        let Some(first) = tickets.first() else {
            return Ok(None);
        };

        let attendee = attendee::Entity::find_by_id(first.attendee_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "Attendee {} missing for batch {}",
                    first.attendee_id, reference
                ))
            })?;

        let ticket_type = ticket_type::Entity::find_by_id(first.ticket_type_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "Ticket type {} missing for batch {}",
                    first.ticket_type_id, reference
                ))
            })?;

        Ok(Some(BatchDetails {
            tickets,
            attendee,
            ticket_type,
        }))
    }

    /// Newest-first listing with optional event and status filters.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        event_id: Option<Uuid>,
        status: Option<TicketStatus>,
    ) -> Result<Vec<ticket::Model>, ServiceError> {
        let mut query = ticket::Entity::find().order_by_desc(ticket::Column::CreatedAt);
        if let Some(event_id) = event_id {
            query = query.filter(ticket::Column::EventId.eq(event_id));
        }
        if let Some(status) = status {
            query = query.filter(ticket::Column::Status.eq(status));
        }
        Ok(query.all(&*self.db).await?)
    }

    /// Gate lookup by admission code. Only paid or checked-in tickets
    /// resolve; pending and cancelled tickets are rejected explicitly.
    #[instrument(skip(self))]
    pub async fn find_by_code(
        &self,
        code: &str,
        event_id: Uuid,
    ) -> Result<(ticket::Model, attendee::Model, ticket_type::Model), ServiceError> {
        let ticket = ticket::Entity::find()
            .filter(ticket::Column::Code.eq(code))
            .filter(ticket::Column::EventId.eq(event_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Ticket not found".to_string()))?;

        match ticket.status {
            TicketStatus::Pending => {
                return Err(ServiceError::InvalidOperation("Ticket not paid".to_string()))
            }
            TicketStatus::Cancelled => {
                return Err(ServiceError::InvalidOperation("Ticket cancelled".to_string()))
            }
            TicketStatus::Paid | TicketStatus::CheckedIn => {}
        }

        let attendee = attendee::Entity::find_by_id(ticket.attendee_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "Attendee {} missing for ticket {}",
                    ticket.attendee_id, ticket.id
                ))
            })?;

        let ticket_type = ticket_type::Entity::find_by_id(ticket.ticket_type_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "Ticket type {} missing for ticket {}",
                    ticket.ticket_type_id, ticket.id
                ))
            })?;

        Ok((ticket, attendee, ticket_type))
    }
}
