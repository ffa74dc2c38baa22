use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{errors::ServiceError, handlers::tickets::TicketResponse, AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCheckInRequest {
    pub ticket: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub checked_in_by: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckInResponse {
    pub id: Uuid,
    pub ticket: TicketResponse,
    pub ticket_code: Option<String>,
    pub checked_in_by: String,
    pub checked_in_at: DateTime<Utc>,
}

/// Check a paid ticket in at the gate
#[utoipa::path(
    post,
    path = "/api/v1/check-ins",
    request_body = CreateCheckInRequest,
    responses(
        (status = 201, description = "Ticket checked in", body = CheckInResponse),
        (status = 400, description = "Ticket is not paid or already checked in"),
        (status = 404, description = "Ticket not found")
    ),
    tag = "check-ins"
)]
#[instrument(skip(state, payload))]
pub async fn create_check_in(
    State(state): State<AppState>,
    Json(payload): Json<CreateCheckInRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let (record, ticket) = state
        .services
        .check_ins
        .check_in(payload.ticket, payload.checked_in_by)
        .await?;

    let ticket_code = ticket.code.clone();
    Ok((
        StatusCode::CREATED,
        Json(CheckInResponse {
            id: record.id,
            ticket: ticket.into(),
            ticket_code,
            checked_in_by: record.checked_in_by,
            checked_in_at: record.checked_in_at,
        }),
    ))
}
