use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{
        attendee, event,
        ticket::{self, TicketStatus},
        ticket_type,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        finalization::{FinalizationService, FinalizeOutcome},
        gateway::PaymentGateway,
    },
};

/// Buyer-submitted reservation request, already shape-validated by the
/// handler.
#[derive(Debug, Clone)]
pub struct CreateBatchRequest {
    pub event: Uuid,
    pub ticket_type: Uuid,
    pub full_name: String,
    pub email: String,
    pub age: i32,
    pub phone: String,
    pub quantity: u32,
}

/// What the buyer gets back from a reservation attempt.
#[derive(Debug, Clone)]
pub enum ReservationOutcome {
    /// Zero-price fast path: the batch is already finalized
    Paid { tickets: Vec<ticket::Model> },
    /// Paid path: the buyer completes payment at the authorization URL
    Pending {
        authorization_url: String,
        reference: String,
    },
}

/// Creates pending ticket batches and hands them to the payment gateway.
///
/// The ledger is deliberately not touched here: capacity is consumed at
/// finalization, when the payment is actually confirmed. Any number of
/// pending batches may coexist speculatively; the finalization lock decides
/// who wins the last tickets.
#[derive(Clone)]
pub struct ReservationService {
    db: Arc<DatabaseConnection>,
    gateway: Arc<dyn PaymentGateway>,
    finalizer: Arc<FinalizationService>,
    event_sender: EventSender,
    max_quantity: u32,
}

impl ReservationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        gateway: Arc<dyn PaymentGateway>,
        finalizer: Arc<FinalizationService>,
        event_sender: EventSender,
        max_quantity: u32,
    ) -> Self {
        Self {
            db,
            gateway,
            finalizer,
            event_sender,
            max_quantity,
        }
    }

    #[instrument(skip(self, request), fields(event = %request.event, quantity = request.quantity))]
    pub async fn create_batch(
        &self,
        request: CreateBatchRequest,
    ) -> Result<ReservationOutcome, ServiceError> {
        if request.quantity == 0 || request.quantity > self.max_quantity {
            return Err(ServiceError::ValidationError(format!(
                "Quantity must be between 1 and {}",
                self.max_quantity
            )));
        }

        let event = event::Entity::find_by_id(request.event)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Event not found".to_string()))?;

        let ticket_type = ticket_type::Entity::find_by_id(request.ticket_type)
            .filter(ticket_type::Column::EventId.eq(event.id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Ticket type not found".to_string()))?;

        // Advisory availability check for fast rejection. The authoritative
        // check runs under the row lock at finalization.
        if ticket_type.sold_count + request.quantity as i32 > ticket_type.limit {
            return Err(ServiceError::CapacityExceeded(
                "Not enough tickets available".to_string(),
            ));
        }

        let reference = generate_reference();

        // Attendee and tickets are created as one unit; a failure between
        // the inserts must not leave an orphan attendee row behind.
        let txn = self.db.begin().await?;

        let attendee = attendee::ActiveModel {
            id: Set(Uuid::new_v4()),
            full_name: Set(request.full_name.clone()),
            email: Set(request.email.clone()),
            age: Set(request.age),
            phone: Set(request.phone.clone()),
        }
        .insert(&txn)
        .await?;

        let now = Utc::now();
        let pending: Vec<ticket::ActiveModel> = (0..request.quantity)
            .map(|_| ticket::ActiveModel {
                id: Set(Uuid::new_v4()),
                event_id: Set(event.id),
                ticket_type_id: Set(ticket_type.id),
                attendee_id: Set(attendee.id),
                code: Set(None),
                payment_ref: Set(Some(reference.clone())),
                qr_value: Set(None),
                status: Set(TicketStatus::Pending),
                created_at: Set(now),
            })
            .collect();
        ticket::Entity::insert_many(pending).exec(&txn).await?;

        txn.commit().await?;

        if let Err(e) = self
            .event_sender
            .send(Event::BatchReserved {
                reference: reference.clone(),
                event_id: event.id,
                ticket_type_id: ticket_type.id,
                quantity: request.quantity,
            })
            .await
        {
            warn!(reference = %reference, error = %e, "Failed to emit BatchReserved event");
        }

        // Free tickets skip the gateway entirely and finalize synchronously.
        if ticket_type.price <= Decimal::ZERO {
            return match self.finalizer.finalize(&reference, true).await? {
                FinalizeOutcome::Paid(tickets) | FinalizeOutcome::AlreadyPaid(tickets) => {
                    Ok(ReservationOutcome::Paid { tickets })
                }
                FinalizeOutcome::Cancelled(_) | FinalizeOutcome::AlreadyCancelled(_) => Err(
                    ServiceError::CapacityExceeded("Not enough tickets available".to_string()),
                ),
                FinalizeOutcome::NotFound => Err(ServiceError::InternalError(format!(
                    "Batch {} vanished before finalization",
                    reference
                ))),
            };
        }

        let amount_minor = (ticket_type.price
            * Decimal::from(request.quantity)
            * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or_else(|| {
            ServiceError::ValidationError("Order total exceeds representable amount".to_string())
        })?;

        match self
            .gateway
            .initialize(&request.email, amount_minor, &reference)
            .await
        {
            Ok(authorization) => Ok(ReservationOutcome::Pending {
                authorization_url: authorization.authorization_url,
                reference,
            }),
            Err(gateway_err) => {
                // Compensating rollback: no pending garbage survives a
                // failed gateway call. The gateway error is what the buyer
                // sees, even when the rollback itself fails.
                warn!(
                    reference = %reference,
                    error = %gateway_err,
                    "Gateway initialization failed; rolling back reservation"
                );
                if let Err(rollback_err) = self.rollback_batch(&reference, attendee.id).await {
                    warn!(
                        reference = %reference,
                        error = %rollback_err,
                        "Reservation rollback failed; rows left behind"
                    );
                }
                Err(gateway_err)
            }
        }
    }

    async fn rollback_batch(
        &self,
        reference: &str,
        attendee_id: Uuid,
    ) -> Result<(), ServiceError> {
        ticket::Entity::delete_many()
            .filter(ticket::Column::PaymentRef.eq(reference))
            .exec(&*self.db)
            .await?;
        attendee::Entity::delete_by_id(attendee_id)
            .exec(&*self.db)
            .await?;
        Ok(())
    }
}

/// Payment reference shared by every ticket in a batch. Uniqueness across
/// reservations comes from the 48 bits of randomness; collisions are
/// negligible.
fn generate_reference() -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("PSK-{}", token[..12].to_uppercase())
}
