pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;

use crate::{config::AppConfig, events::EventSender, handlers::AppServices};

/// Shared state for the HTTP layer.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub event_sender: EventSender,
    pub services: AppServices,
}

/// All versioned API routes. Swagger UI and the listener are wired up in
/// `main`; tests mount this router directly.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/status", get(api_status))
        .route("/api/v1/health", get(health_check))
        .route("/api/v1/events", get(handlers::events::list_events))
        .route("/api/v1/events/:id", get(handlers::events::get_event))
        .route("/api/v1/tickets", get(handlers::tickets::list_tickets))
        .route(
            "/api/v1/tickets/initialize-payment",
            post(handlers::tickets::initialize_payment),
        )
        .route(
            "/api/v1/tickets/verify-payment",
            post(handlers::tickets::verify_payment),
        )
        .route(
            "/api/v1/tickets/resend-code",
            post(handlers::tickets::resend_code),
        )
        .route("/api/v1/tickets/verify", get(handlers::tickets::verify_ticket))
        .route("/api/v1/check-ins", post(handlers::check_ins::create_check_in))
        .route(
            "/api/v1/webhooks/paystack",
            post(handlers::webhooks::paystack_webhook),
        )
}

async fn api_status() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
