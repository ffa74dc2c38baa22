use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    entities::ticket::TicketStatus,
    handlers::{check_ins, events, tickets, webhooks},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        events::list_events,
        events::get_event,
        tickets::initialize_payment,
        tickets::verify_payment,
        tickets::resend_code,
        tickets::verify_ticket,
        tickets::list_tickets,
        check_ins::create_check_in,
        webhooks::paystack_webhook,
    ),
    components(schemas(
        TicketStatus,
        events::EventResponse,
        events::TicketTypeResponse,
        tickets::InitializePaymentRequest,
        tickets::InitializePaymentResponse,
        tickets::VerifyPaymentRequest,
        tickets::VerifyPaymentResponse,
        tickets::ResendCodeRequest,
        tickets::VerifyTicketResponse,
        tickets::TicketResponse,
        tickets::AttendeeResponse,
        check_ins::CreateCheckInRequest,
        check_ins::CheckInResponse,
    )),
    tags(
        (name = "events", description = "Event catalog"),
        (name = "tickets", description = "Reservations, payment and gate verification"),
        (name = "check-ins", description = "Gate check-in"),
        (name = "webhooks", description = "Payment gateway callbacks")
    ),
    info(
        title = "Ticketing API",
        description = "Bounded-inventory event ticketing with idempotent payment finalization"
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
