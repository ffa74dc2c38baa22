use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        attendee,
        ticket::{self, TicketStatus},
    },
    errors::ServiceError,
    services::{
        finalization::FinalizeOutcome,
        reservations::{CreateBatchRequest, ReservationOutcome},
    },
    AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct InitializePaymentRequest {
    pub event: Uuid,
    pub ticket_type: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(range(min = 1, max = 120))]
    pub age: i32,
    #[validate(length(min = 3, max = 32))]
    pub phone: String,
    #[validate(range(min = 1))]
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyPaymentRequest {
    #[validate(length(min = 1))]
    pub reference: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResendCodeRequest {
    #[validate(length(min = 1))]
    pub reference: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TicketResponse {
    pub id: Uuid,
    pub event_id: Uuid,
    pub ticket_type_id: Uuid,
    pub code: Option<String>,
    pub qr_value: Option<String>,
    pub payment_ref: Option<String>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

impl From<ticket::Model> for TicketResponse {
    fn from(model: ticket::Model) -> Self {
        Self {
            id: model.id,
            event_id: model.event_id,
            ticket_type_id: model.ticket_type_id,
            code: model.code,
            qr_value: model.qr_value,
            payment_ref: model.payment_ref,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendeeResponse {
    pub full_name: String,
    pub email: String,
    pub age: i32,
    pub phone: String,
}

impl From<attendee::Model> for AttendeeResponse {
    fn from(model: attendee::Model) -> Self {
        Self {
            full_name: model.full_name,
            email: model.email,
            age: model.age,
            phone: model.phone,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InitializePaymentResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickets: Option<Vec<TicketResponse>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyPaymentResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickets: Option<Vec<TicketResponse>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyTicketResponse {
    pub ticket: TicketResponse,
    pub attendee: AttendeeResponse,
    pub ticket_type_name: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyTicketQuery {
    pub code: String,
    pub event: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ListTicketsQuery {
    pub event: Option<Uuid>,
    pub status: Option<String>,
}

/// Reserve a ticket batch and initialize payment
///
/// Free ticket types are finalized immediately; priced ones return the
/// gateway authorization URL the buyer completes payment at.
#[utoipa::path(
    post,
    path = "/api/v1/tickets/initialize-payment",
    request_body = InitializePaymentRequest,
    responses(
        (status = 200, description = "Reservation created", body = InitializePaymentResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Event or ticket type not found"),
        (status = 422, description = "Not enough tickets available"),
        (status = 502, description = "Payment gateway unavailable")
    ),
    tag = "tickets"
)]
#[instrument(skip(state, payload))]
pub async fn initialize_payment(
    State(state): State<AppState>,
    Json(payload): Json<InitializePaymentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let outcome = state
        .services
        .reservations
        .create_batch(CreateBatchRequest {
            event: payload.event,
            ticket_type: payload.ticket_type,
            full_name: payload.full_name,
            email: payload.email,
            age: payload.age,
            phone: payload.phone,
            quantity: payload.quantity,
        })
        .await?;

    let body = match outcome {
        ReservationOutcome::Paid { tickets } => InitializePaymentResponse {
            status: "paid".to_string(),
            authorization_url: None,
            reference: None,
            tickets: Some(tickets.into_iter().map(TicketResponse::from).collect()),
        },
        ReservationOutcome::Pending {
            authorization_url,
            reference,
        } => InitializePaymentResponse {
            status: "pending".to_string(),
            authorization_url: Some(authorization_url),
            reference: Some(reference),
            tickets: None,
        },
    };

    Ok((StatusCode::OK, Json(body)))
}

/// Verify a payment by reference and finalize its batch
///
/// The buyer-poll counterpart of the webhook. Safe to call any number of
/// times; an already-finalized batch is returned as-is.
#[utoipa::path(
    post,
    path = "/api/v1/tickets/verify-payment",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Batch finalized or already final", body = VerifyPaymentResponse),
        (status = 402, description = "Gateway does not confirm the payment"),
        (status = 404, description = "Unknown payment reference"),
        (status = 502, description = "Payment gateway unavailable")
    ),
    tag = "tickets"
)]
#[instrument(skip(state, payload))]
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    state.services.gateway.verify(&payload.reference).await?;

    let body = match state
        .services
        .finalization
        .finalize(&payload.reference, true)
        .await?
    {
        FinalizeOutcome::Paid(tickets) | FinalizeOutcome::AlreadyPaid(tickets) => {
            VerifyPaymentResponse {
                status: "paid".to_string(),
                tickets: Some(tickets.into_iter().map(TicketResponse::from).collect()),
            }
        }
        FinalizeOutcome::Cancelled(_) | FinalizeOutcome::AlreadyCancelled(_) => {
            VerifyPaymentResponse {
                status: "cancelled".to_string(),
                tickets: None,
            }
        }
        FinalizeOutcome::NotFound => {
            return Err(ServiceError::NotFound(
                "Payment reference not found".to_string(),
            ))
        }
    };

    Ok((StatusCode::OK, Json(body)))
}

/// Re-send the admission codes for a finalized batch
#[utoipa::path(
    post,
    path = "/api/v1/tickets/resend-code",
    request_body = ResendCodeRequest,
    responses(
        (status = 200, description = "Confirmation queued again"),
        (status = 400, description = "Batch is pending or cancelled"),
        (status = 404, description = "Unknown payment reference")
    ),
    tag = "tickets"
)]
#[instrument(skip(state, payload))]
pub async fn resend_code(
    State(state): State<AppState>,
    Json(payload): Json<ResendCodeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    state
        .services
        .finalization
        .resend_confirmation(&payload.reference)
        .await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "status": "ok" })),
    ))
}

/// Look up a ticket by admission code for gate verification
#[utoipa::path(
    get,
    path = "/api/v1/tickets/verify",
    params(
        ("code" = String, Query, description = "Admission code printed on the ticket"),
        ("event" = Uuid, Query, description = "Event the ticket must belong to")
    ),
    responses(
        (status = 200, description = "Ticket is valid for admission", body = VerifyTicketResponse),
        (status = 400, description = "Ticket is pending or cancelled"),
        (status = 404, description = "No such ticket for this event")
    ),
    tag = "tickets"
)]
#[instrument(skip(state))]
pub async fn verify_ticket(
    State(state): State<AppState>,
    Query(query): Query<VerifyTicketQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (ticket, attendee, ticket_type) = state
        .services
        .tickets
        .find_by_code(&query.code, query.event)
        .await?;

    Ok((
        StatusCode::OK,
        Json(VerifyTicketResponse {
            ticket: ticket.into(),
            attendee: attendee.into(),
            ticket_type_name: ticket_type.name,
        }),
    ))
}

/// List tickets, newest first, with optional event and status filters
#[utoipa::path(
    get,
    path = "/api/v1/tickets",
    params(
        ("event" = Option<Uuid>, Query, description = "Filter by event"),
        ("status" = Option<String>, Query, description = "Filter by ticket status")
    ),
    responses(
        (status = 200, description = "Tickets matching the filters", body = [TicketResponse]),
        (status = 400, description = "Unknown status filter")
    ),
    tag = "tickets"
)]
#[instrument(skip(state))]
pub async fn list_tickets(
    State(state): State<AppState>,
    Query(query): Query<ListTicketsQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;

    let tickets = state.services.tickets.list(query.event, status).await?;
    let body: Vec<TicketResponse> = tickets.into_iter().map(TicketResponse::from).collect();

    Ok((StatusCode::OK, Json(body)))
}

fn parse_status(raw: &str) -> Result<TicketStatus, ServiceError> {
    match raw {
        "pending" => Ok(TicketStatus::Pending),
        "paid" => Ok(TicketStatus::Paid),
        "checked_in" => Ok(TicketStatus::CheckedIn),
        "cancelled" => Ok(TicketStatus::Cancelled),
        other => Err(ServiceError::ValidationError(format!(
            "Unknown ticket status: {}",
            other
        ))),
    }
}
