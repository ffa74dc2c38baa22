use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{
        attendee, event,
        ticket::{self, TicketStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        inventory::{InventoryLedger, LedgerDecision},
        notifications::NotificationDispatcher,
    },
};

/// Terminal result of a finalization attempt.
#[derive(Debug, Clone)]
pub enum FinalizeOutcome {
    /// The batch won its capacity check and is now paid
    Paid(Vec<ticket::Model>),
    /// A previous call already paid the batch; nothing was mutated
    AlreadyPaid(Vec<ticket::Model>),
    /// The batch lost its capacity check and is now cancelled
    Cancelled(Vec<ticket::Model>),
    /// A previous call already cancelled the batch; nothing was mutated
    AlreadyCancelled(Vec<ticket::Model>),
    /// No tickets carry this reference
    NotFound,
}

/// Converts a pending batch to its terminal paid/cancelled state, exactly
/// once per payment reference.
///
/// The webhook path and the buyer poll path both funnel into
/// [`FinalizationService::finalize`], concurrently or repeatedly; only the
/// first call to commit performs the mutation. Everyone else observes the
/// already-final state and returns without side effects.
#[derive(Clone)]
pub struct FinalizationService {
    db: Arc<DatabaseConnection>,
    notifier: Arc<dyn NotificationDispatcher>,
    event_sender: EventSender,
}

impl FinalizationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        notifier: Arc<dyn NotificationDispatcher>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            notifier,
            event_sender,
        }
    }

    /// Finalizes the batch identified by `reference`.
    ///
    /// Locks the batch rows and the governing ticket-type row in one
    /// transaction, so the read of `sold_count` and its increment cannot be
    /// interleaved with another finalization of the same type. Lock
    /// acquisition order decides capacity races; losers get a deterministic
    /// `Cancelled` outcome.
    #[instrument(skip(self))]
    pub async fn finalize(
        &self,
        reference: &str,
        notify: bool,
    ) -> Result<FinalizeOutcome, ServiceError> {
        let txn = self.db.begin().await?;

        let tickets = ticket::Entity::find()
            .filter(ticket::Column::PaymentRef.eq(reference))
            .lock_exclusive()
            .all(&txn)
            .await?;

        let Some(first) = tickets.first() else {
            txn.commit().await?;
            return Ok(FinalizeOutcome::NotFound);
        };

        // Idempotent no-op paths. A batch is finalized as a unit, so a mixed
        // batch means the engine's own invariant was violated elsewhere;
        // surface that instead of absorbing it.
        match first.status {
            TicketStatus::Paid | TicketStatus::CheckedIn => {
                assert_batch_uniform(&tickets, |s| {
                    matches!(s, TicketStatus::Paid | TicketStatus::CheckedIn)
                })?;
                txn.commit().await?;
                return Ok(FinalizeOutcome::AlreadyPaid(tickets));
            }
            TicketStatus::Cancelled => {
                assert_batch_uniform(&tickets, |s| matches!(s, TicketStatus::Cancelled))?;
                txn.commit().await?;
                return Ok(FinalizeOutcome::AlreadyCancelled(tickets));
            }
            TicketStatus::Pending => {
                assert_batch_uniform(&tickets, |s| matches!(s, TicketStatus::Pending))?;
            }
        }

        let ticket_type_id = first.ticket_type_id;
        let quantity = tickets.len() as i32;

        let decision = InventoryLedger::try_reserve(&txn, ticket_type_id, quantity).await?;

        match decision {
            LedgerDecision::Granted => {
                let mut paid = Vec::with_capacity(tickets.len());
                for t in tickets {
                    let code = generate_code();
                    let mut update: ticket::ActiveModel = t.into();
                    update.status = Set(TicketStatus::Paid);
                    update.code = Set(Some(code.clone()));
                    update.qr_value = Set(Some(code));
                    paid.push(update.update(&txn).await?);
                }
                txn.commit().await?;

                if let Err(e) = self
                    .event_sender
                    .send(Event::BatchPaid {
                        reference: reference.to_string(),
                        ticket_type_id,
                        quantity: quantity as u32,
                    })
                    .await
                {
                    warn!(reference = %reference, error = %e, "Failed to emit BatchPaid event");
                }

                if notify {
                    self.dispatch_confirmation(&paid).await;
                }

                Ok(FinalizeOutcome::Paid(paid))
            }
            LedgerDecision::Denied => {
                let mut cancelled = Vec::with_capacity(tickets.len());
                for t in tickets {
                    let mut update: ticket::ActiveModel = t.into();
                    update.status = Set(TicketStatus::Cancelled);
                    cancelled.push(update.update(&txn).await?);
                }
                txn.commit().await?;

                if let Err(e) = self
                    .event_sender
                    .send(Event::BatchCancelled {
                        reference: reference.to_string(),
                        ticket_type_id,
                        quantity: quantity as u32,
                    })
                    .await
                {
                    warn!(reference = %reference, error = %e, "Failed to emit BatchCancelled event");
                }

                Ok(FinalizeOutcome::Cancelled(cancelled))
            }
        }
    }

    /// Re-sends the confirmation for an already-finalized batch. Support
    /// flow for buyers whose original notification went missing; unlike the
    /// post-commit dispatch, a delivery failure is surfaced to the caller.
    #[instrument(skip(self))]
    pub async fn resend_confirmation(&self, reference: &str) -> Result<(), ServiceError> {
        let tickets = ticket::Entity::find()
            .filter(ticket::Column::PaymentRef.eq(reference))
            .all(&*self.db)
            .await?;

        let Some(first) = tickets.first() else {
            return Err(ServiceError::NotFound(
                "Payment reference not found".to_string(),
            ));
        };

        match first.status {
            TicketStatus::Pending => {
                return Err(ServiceError::InvalidOperation("Ticket not paid".to_string()))
            }
            TicketStatus::Cancelled => {
                return Err(ServiceError::InvalidOperation(
                    "Ticket cancelled".to_string(),
                ))
            }
            TicketStatus::Paid | TicketStatus::CheckedIn => {}
        }

        let event = event::Entity::find_by_id(first.event_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!("Event missing for batch {}", reference))
            })?;
        let attendee = attendee::Entity::find_by_id(first.attendee_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!("Attendee missing for batch {}", reference))
            })?;

        self.notifier
            .ticket_confirmed(&event, &attendee, &tickets)
            .await
    }

    /// Best-effort confirmation dispatch after the transaction has
    /// committed. Failures are logged and never unwind the finalization.
    async fn dispatch_confirmation(&self, tickets: &[ticket::Model]) {
        let Some(first) = tickets.first() else {
            return;
        };

        let context = async {
            let event = event::Entity::find_by_id(first.event_id)
                .one(&*self.db)
                .await?;
            let attendee = attendee::Entity::find_by_id(first.attendee_id)
                .one(&*self.db)
                .await?;
            Ok::<_, ServiceError>(event.zip(attendee))
        };

        match context.await {
            Ok(Some((event, attendee))) => {
                if let Err(e) = self
                    .notifier
                    .ticket_confirmed(&event, &attendee, tickets)
                    .await
                {
                    warn!(
                        ticket_id = %first.id,
                        error = %e,
                        "Ticket confirmation notification failed"
                    );
                }
            }
            Ok(None) => {
                warn!(ticket_id = %first.id, "Missing event or attendee for confirmation");
            }
            Err(e) => {
                warn!(ticket_id = %first.id, error = %e, "Failed to load confirmation context");
            }
        }
    }
}

fn assert_batch_uniform(
    tickets: &[ticket::Model],
    expected: impl Fn(TicketStatus) -> bool,
) -> Result<(), ServiceError> {
    if tickets.iter().all(|t| expected(t.status)) {
        Ok(())
    } else {
        Err(ServiceError::InternalError(format!(
            "Batch {} has mixed ticket statuses",
            tickets[0].payment_ref.as_deref().unwrap_or("<none>")
        )))
    }
}

/// Opaque admission code, assigned once at the pending -> paid transition.
fn generate_code() -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("TKT-{}", token[..8].to_uppercase())
}
