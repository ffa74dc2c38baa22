pub mod check_ins;
pub mod events;
pub mod tickets;
pub mod webhooks;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::{
    config::AppConfig,
    events::EventSender,
    services::{
        catalog::CatalogService, check_ins::CheckInService, finalization::FinalizationService,
        gateway::PaymentGateway, notifications::NotificationDispatcher,
        reservations::ReservationService, tickets::TicketQueryService, webhook::WebhookVerifier,
    },
};

/// Aggregated services used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub reservations: Arc<ReservationService>,
    pub finalization: Arc<FinalizationService>,
    pub tickets: Arc<TicketQueryService>,
    pub check_ins: Arc<CheckInService>,
    pub catalog: Arc<CatalogService>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub webhook_verifier: Arc<WebhookVerifier>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn NotificationDispatcher>,
        config: &AppConfig,
    ) -> Self {
        let finalization = Arc::new(FinalizationService::new(
            db.clone(),
            notifier,
            event_sender.clone(),
        ));
        let reservations = Arc::new(ReservationService::new(
            db.clone(),
            gateway.clone(),
            finalization.clone(),
            event_sender.clone(),
            config.max_tickets_per_order,
        ));

        Self {
            reservations,
            finalization,
            tickets: Arc::new(TicketQueryService::new(db.clone())),
            check_ins: Arc::new(CheckInService::new(db.clone(), event_sender)),
            catalog: Arc::new(CatalogService::new(db)),
            gateway,
            webhook_verifier: Arc::new(WebhookVerifier::new(config.webhook_secret())),
        }
    }
}
