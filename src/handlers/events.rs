use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{event, ticket_type},
    errors::ServiceError,
    AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct TicketTypeResponse {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub limit: i32,
    pub sold_count: i32,
    pub remaining: i32,
}

impl From<ticket_type::Model> for TicketTypeResponse {
    fn from(model: ticket_type::Model) -> Self {
        let remaining = model.remaining();
        Self {
            id: model.id,
            name: model.name,
            price: model.price,
            limit: model.limit,
            sold_count: model.sold_count,
            remaining,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EventResponse {
    pub id: Uuid,
    pub title: String,
    pub date_time: String,
    pub venue: String,
    pub description: String,
    pub status: String,
    pub ticket_types: Vec<TicketTypeResponse>,
}

impl EventResponse {
    fn build(event: event::Model, ticket_types: Vec<ticket_type::Model>) -> Self {
        Self {
            id: event.id,
            title: event.title,
            date_time: event.date_time,
            venue: event.venue,
            description: event.description,
            status: event.status,
            ticket_types: ticket_types
                .into_iter()
                .map(TicketTypeResponse::from)
                .collect(),
        }
    }
}

/// List events with their ticket types
#[utoipa::path(
    get,
    path = "/api/v1/events",
    responses(
        (status = 200, description = "All events", body = [EventResponse])
    ),
    tag = "events"
)]
#[instrument(skip(state))]
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let events = state.services.catalog.list_events().await?;
    let body: Vec<EventResponse> = events
        .into_iter()
        .map(|(event, ticket_types)| EventResponse::build(event, ticket_types))
        .collect();

    Ok((StatusCode::OK, Json(body)))
}

/// Get a single event with its ticket types
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    params(
        ("id" = Uuid, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "The event", body = EventResponse),
        (status = 404, description = "Event not found")
    ),
    tag = "events"
)]
#[instrument(skip(state))]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let (event, ticket_types) = state.services.catalog.get_event(id).await?;
    Ok((StatusCode::OK, Json(EventResponse::build(event, ticket_types))))
}
