mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use common::{
    build_state, seed_attendee, seed_event, seed_ticket_type, setup_db, test_config,
    UnreachableGateway,
};
use ticketing_api::entities::ticket::{self, TicketStatus};

fn app(db: Arc<sea_orm::DatabaseConnection>) -> axum::Router {
    let state = build_state(db, Arc::new(UnreachableGateway), test_config(None));
    ticketing_api::api_routes().with_state(state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn seed_ticket(
    db: &sea_orm::DatabaseConnection,
    event_id: Uuid,
    ticket_type_id: Uuid,
    attendee_id: Uuid,
    status: TicketStatus,
    code: Option<&str>,
) -> ticket::Model {
    ticket::ActiveModel {
        id: Set(Uuid::new_v4()),
        event_id: Set(event_id),
        ticket_type_id: Set(ticket_type_id),
        attendee_id: Set(attendee_id),
        code: Set(code.map(str::to_string)),
        payment_ref: Set(Some("PSK-API000000001".to_string())),
        qr_value: Set(code.map(str::to_string)),
        status: Set(status),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap()
}

#[tokio::test]
async fn health_and_status_respond() {
    let db = setup_db().await;
    let app = app(db);

    let response = app.clone().oneshot(get("/api/v1/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/v1/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn events_are_listed_with_remaining_capacity() {
    let db = setup_db().await;
    let event = seed_event(&db).await;
    seed_ticket_type(&db, event.id, dec!(5000.00), 100, 40).await;

    let response = app(db).oneshot(get("/api/v1/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Lagos Tech Fest");
    assert_eq!(body[0]["ticket_types"][0]["remaining"], 60);
}

#[tokio::test]
async fn unknown_event_is_a_404() {
    let db = setup_db().await;
    let response = app(db)
        .oneshot(get(&format!("/api/v1/events/{}", Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn verify_ticket_resolves_paid_codes_only() {
    let db = setup_db().await;
    let event = seed_event(&db).await;
    let tt = seed_ticket_type(&db, event.id, dec!(5000.00), 100, 2).await;
    let attendee = seed_attendee(&db).await;
    seed_ticket(&db, event.id, tt.id, attendee.id, TicketStatus::Paid, Some("TKT-AAAA1111")).await;

    let app = app(db);

    let response = app
        .clone()
        .oneshot(get(&format!(
            "/api/v1/tickets/verify?code=TKT-AAAA1111&event={}",
            event.id
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["attendee"]["full_name"], "Ada Obi");
    assert_eq!(body["ticket_type_name"], "Regular");
    assert_eq!(body["ticket"]["status"], "paid");

    // Same code against a different event does not resolve.
    let response = app
        .clone()
        .oneshot(get(&format!(
            "/api/v1/tickets/verify?code=TKT-AAAA1111&event={}",
            Uuid::new_v4()
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(get(&format!(
            "/api/v1/tickets/verify?code=TKT-NOPE0000&event={}",
            event.id
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn verify_ticket_rejects_pending_and_cancelled() {
    let db = setup_db().await;
    let event = seed_event(&db).await;
    let tt = seed_ticket_type(&db, event.id, dec!(5000.00), 100, 0).await;
    let attendee = seed_attendee(&db).await;
    seed_ticket(
        &db,
        event.id,
        tt.id,
        attendee.id,
        TicketStatus::Cancelled,
        Some("TKT-CANC0000"),
    )
    .await;

    let response = app(db)
        .oneshot(get(&format!(
            "/api/v1/tickets/verify?code=TKT-CANC0000&event={}",
            event.id
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tickets_can_be_filtered_by_status() {
    let db = setup_db().await;
    let event = seed_event(&db).await;
    let tt = seed_ticket_type(&db, event.id, dec!(5000.00), 100, 1).await;
    let attendee = seed_attendee(&db).await;
    seed_ticket(&db, event.id, tt.id, attendee.id, TicketStatus::Paid, Some("TKT-BBBB2222")).await;

    let app = app(db);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/tickets?event={}&status=paid", event.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(get(&format!(
            "/api/v1/tickets?event={}&status=cancelled",
            event.id
        )))
        .await
        .unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 0);

    let response = app
        .oneshot(get("/api/v1/tickets?status=refunded"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn initialize_payment_rejects_malformed_requests() {
    let db = setup_db().await;
    let event = seed_event(&db).await;
    let tt = seed_ticket_type(&db, event.id, dec!(5000.00), 100, 0).await;

    let response = app(db)
        .oneshot(post_json(
            "/api/v1/tickets/initialize-payment",
            json!({
                "event": event.id,
                "ticket_type": tt.id,
                "full_name": "Ada Obi",
                "email": "not-an-email",
                "age": 28,
                "phone": "+2348012345678",
                "quantity": 1
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn resend_code_endpoint_validates_the_reference() {
    let db = setup_db().await;
    let response = app(db)
        .oneshot(post_json(
            "/api/v1/tickets/resend-code",
            json!({ "reference": "PSK-NOSUCHREF000" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn check_in_endpoint_creates_a_record() {
    let db = setup_db().await;
    let event = seed_event(&db).await;
    let tt = seed_ticket_type(&db, event.id, dec!(5000.00), 100, 1).await;
    let attendee = seed_attendee(&db).await;
    let ticket = seed_ticket(
        &db,
        event.id,
        tt.id,
        attendee.id,
        TicketStatus::Paid,
        Some("TKT-CCCC3333"),
    )
    .await;

    let response = app(db)
        .oneshot(post_json(
            "/api/v1/check-ins",
            json!({ "ticket": ticket.id, "checked_in_by": "gate-staff-1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["ticket_code"], "TKT-CCCC3333");
    assert_eq!(body["checked_in_by"], "gate-staff-1");
    assert_eq!(body["ticket"]["status"], "checked_in");
}
