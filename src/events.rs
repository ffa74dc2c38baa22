use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Domain events emitted by the ticketing services. Consumers are
/// best-effort; a failed send never changes a request outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// A pending batch was created and handed to the payment gateway
    BatchReserved {
        reference: String,
        event_id: Uuid,
        ticket_type_id: Uuid,
        quantity: u32,
    },
    /// A batch won its capacity check and became paid
    BatchPaid {
        reference: String,
        ticket_type_id: Uuid,
        quantity: u32,
    },
    /// A batch lost its capacity check and was cancelled
    BatchCancelled {
        reference: String,
        ticket_type_id: Uuid,
        quantity: u32,
    },
    /// A paid ticket was scanned at the gate
    TicketCheckedIn(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel and logs each event. External integrations hook
/// in here.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::BatchReserved {
                reference,
                quantity,
                ..
            } => {
                info!(reference = %reference, quantity = %quantity, "Batch reserved");
            }
            Event::BatchPaid {
                reference,
                quantity,
                ..
            } => {
                info!(reference = %reference, quantity = %quantity, "Batch paid");
            }
            Event::BatchCancelled {
                reference,
                quantity,
                ..
            } => {
                info!(reference = %reference, quantity = %quantity, "Batch cancelled");
            }
            Event::TicketCheckedIn(ticket_id) => {
                info!(ticket_id = %ticket_id, "Ticket checked in");
            }
        }
    }
}
