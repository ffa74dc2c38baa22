mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

use common::{event_sender, seed_attendee, seed_event, seed_ticket_type, setup_db};
use ticketing_api::{
    entities::ticket::{self, TicketStatus},
    errors::ServiceError,
    services::check_ins::CheckInService,
};

async fn seed_ticket(
    db: &sea_orm::DatabaseConnection,
    status: TicketStatus,
) -> ticket::Model {
    let event = seed_event(db).await;
    let tt = seed_ticket_type(db, event.id, dec!(5000.00), 100, 1).await;
    let attendee = seed_attendee(db).await;
    ticket::ActiveModel {
        id: Set(Uuid::new_v4()),
        event_id: Set(event.id),
        ticket_type_id: Set(tt.id),
        attendee_id: Set(attendee.id),
        code: Set(Some("TKT-DEADBEEF".to_string())),
        payment_ref: Set(Some("PSK-CHKN00000001".to_string())),
        qr_value: Set(Some("TKT-DEADBEEF".to_string())),
        status: Set(status),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap()
}

#[tokio::test]
async fn paid_ticket_checks_in_once() {
    let db = setup_db().await;
    let ticket = seed_ticket(&db, TicketStatus::Paid).await;
    let service = CheckInService::new(db.clone(), event_sender());

    let (record, updated) = service
        .check_in(ticket.id, "gate-staff-1".to_string())
        .await
        .unwrap();

    assert_eq!(record.ticket_id, ticket.id);
    assert_eq!(record.checked_in_by, "gate-staff-1");
    assert_eq!(updated.status, TicketStatus::CheckedIn);

    let err = service
        .check_in(ticket.id, "gate-staff-2".to_string())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(msg) => {
        assert_eq!(msg, "Already checked in");
    });
}

#[tokio::test]
async fn pending_ticket_cannot_check_in() {
    let db = setup_db().await;
    let ticket = seed_ticket(&db, TicketStatus::Pending).await;
    let service = CheckInService::new(db, event_sender());

    let err = service
        .check_in(ticket.id, "gate-staff-1".to_string())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn cancelled_ticket_cannot_check_in() {
    let db = setup_db().await;
    let ticket = seed_ticket(&db, TicketStatus::Cancelled).await;
    let service = CheckInService::new(db, event_sender());

    let err = service
        .check_in(ticket.id, "gate-staff-1".to_string())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn unknown_ticket_is_not_found() {
    let db = setup_db().await;
    let service = CheckInService::new(db, event_sender());

    let err = service
        .check_in(Uuid::new_v4(), "gate-staff-1".to_string())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}
