#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, EntityTrait, Set};
use sea_orm_migration::MigratorTrait;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use uuid::Uuid;

use ticketing_api::{
    config::AppConfig,
    entities::{
        attendee, event,
        ticket::{self, TicketStatus},
        ticket_type,
    },
    errors::ServiceError,
    events::{process_events, EventSender},
    handlers::AppServices,
    migrator::Migrator,
    services::{gateway::PaymentGateway, notifications::NotificationDispatcher},
    AppState,
};

/// Fresh database with the full schema applied. Defaults to in-memory
/// sqlite; set TEST_DATABASE_URL to run against Postgres instead, which the
/// `--ignored` lock-contention tests need to observe real row locking.
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| "sqlite::memory:".to_string());
    let db = Database::connect(&url)
        .await
        .expect("connect to test database");
    Migrator::up(&db, None).await.expect("run migrations");
    Arc::new(db)
}

/// Event sender backed by a drained channel, so emits never block or fail.
pub fn event_sender() -> EventSender {
    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(process_events(rx));
    EventSender::new(tx)
}

pub async fn seed_event(db: &DatabaseConnection) -> event::Model {
    event::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set("Lagos Tech Fest".to_string()),
        date_time: Set("Mar 14, 2026 6:00 PM".to_string()),
        venue: Set("Landmark Centre".to_string()),
        description: Set("Annual developer conference".to_string()),
        status: Set("published".to_string()),
    }
    .insert(db)
    .await
    .expect("insert event")
}

pub async fn seed_ticket_type(
    db: &DatabaseConnection,
    event_id: Uuid,
    price: Decimal,
    limit: i32,
    sold_count: i32,
) -> ticket_type::Model {
    ticket_type::ActiveModel {
        id: Set(Uuid::new_v4()),
        event_id: Set(event_id),
        name: Set("Regular".to_string()),
        price: Set(price),
        limit: Set(limit),
        sold_count: Set(sold_count),
    }
    .insert(db)
    .await
    .expect("insert ticket type")
}

pub async fn seed_attendee(db: &DatabaseConnection) -> attendee::Model {
    attendee::ActiveModel {
        id: Set(Uuid::new_v4()),
        full_name: Set("Ada Obi".to_string()),
        email: Set("ada@example.com".to_string()),
        age: Set(28),
        phone: Set("+2348012345678".to_string()),
    }
    .insert(db)
    .await
    .expect("insert attendee")
}

/// Inserts a pending batch of `quantity` tickets sharing `reference`, the
/// shape the reservation service produces before finalization.
pub async fn seed_pending_batch(
    db: &DatabaseConnection,
    event_id: Uuid,
    ticket_type_id: Uuid,
    attendee_id: Uuid,
    reference: &str,
    quantity: u32,
) -> Vec<ticket::Model> {
    let now = Utc::now();
    let rows: Vec<ticket::ActiveModel> = (0..quantity)
        .map(|_| ticket::ActiveModel {
            id: Set(Uuid::new_v4()),
            event_id: Set(event_id),
            ticket_type_id: Set(ticket_type_id),
            attendee_id: Set(attendee_id),
            code: Set(None),
            payment_ref: Set(Some(reference.to_string())),
            qr_value: Set(None),
            status: Set(TicketStatus::Pending),
            created_at: Set(now),
        })
        .collect();
    ticket::Entity::insert_many(rows)
        .exec(db)
        .await
        .expect("insert pending batch");

    load_batch(db, reference).await
}

pub async fn load_batch(db: &DatabaseConnection, reference: &str) -> Vec<ticket::Model> {
    use sea_orm::{ColumnTrait, QueryFilter};
    ticket::Entity::find()
        .filter(ticket::Column::PaymentRef.eq(reference))
        .all(db)
        .await
        .expect("load batch")
}

pub async fn load_ticket_type(
    db: &DatabaseConnection,
    ticket_type_id: Uuid,
) -> ticket_type::Model {
    ticket_type::Entity::find_by_id(ticket_type_id)
        .one(db)
        .await
        .expect("query ticket type")
        .expect("ticket type exists")
}

/// Test configuration with gateway secrets injected directly.
pub fn test_config(webhook_secret: Option<&str>) -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        log_level: "debug".to_string(),
        log_json: false,
        auto_migrate: true,
        cors_allowed_origins: None,
        db_max_connections: 5,
        db_min_connections: 1,
        db_connect_timeout_secs: 5,
        db_idle_timeout_secs: 60,
        db_acquire_timeout_secs: 5,
        paystack_secret_key: None,
        paystack_webhook_secret: webhook_secret.map(str::to_string),
        paystack_base_url: "http://127.0.0.1:0".to_string(),
        paystack_callback_url: None,
        gateway_timeout_secs: 5,
        max_tickets_per_order: 10,
        notification_from_email: None,
    }
}

/// Full application state over the given database and gateway, ready to
/// mount on the router.
pub fn build_state(
    db: Arc<DatabaseConnection>,
    gateway: Arc<dyn PaymentGateway>,
    config: AppConfig,
) -> AppState {
    let config = Arc::new(config);
    let sender = event_sender();
    let services = AppServices::new(
        db.clone(),
        sender.clone(),
        gateway,
        Arc::new(RecordingNotifier::default()),
        &config,
    );
    AppState {
        db,
        config,
        event_sender: sender,
        services,
    }
}

/// Gateway stub for routes that must never reach the gateway.
pub struct UnreachableGateway;

#[async_trait]
impl PaymentGateway for UnreachableGateway {
    async fn initialize(
        &self,
        _email: &str,
        _amount_minor: i64,
        _reference: &str,
    ) -> Result<ticketing_api::services::gateway::GatewayAuthorization, ServiceError> {
        Err(ServiceError::ExternalServiceError(
            "gateway not available in this test".to_string(),
        ))
    }

    async fn verify(&self, _reference: &str) -> Result<(), ServiceError> {
        Err(ServiceError::ExternalServiceError(
            "gateway not available in this test".to_string(),
        ))
    }
}

/// Counts dispatched confirmations instead of sending them.
#[derive(Default)]
pub struct RecordingNotifier {
    count: AtomicUsize,
}

impl RecordingNotifier {
    pub fn dispatched(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotifier {
    async fn ticket_confirmed(
        &self,
        _event: &event::Model,
        _attendee: &attendee::Model,
        _tickets: &[ticket::Model],
    ) -> Result<(), ServiceError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
