use anyhow::Context;
use axum::http::{HeaderValue, Method};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use ticketing_api::{
    config::{init_tracing, load_config},
    db::{establish_connection_from_app_config, run_migrations},
    events::{process_events, EventSender},
    handlers::AppServices,
    openapi::swagger_ui,
    services::{gateway::PaystackGateway, notifications::EmailNotifier},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(load_config().context("Failed to load configuration")?);
    init_tracing(config.log_level(), config.log_json);

    info!(
        environment = %config.environment,
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let db = Arc::new(
        establish_connection_from_app_config(&config)
            .await
            .context("Failed to connect to database")?,
    );

    if config.auto_migrate {
        run_migrations(&db)
            .await
            .context("Failed to run migrations")?;
    }

    let (tx, rx) = mpsc::channel(1024);
    let event_sender = EventSender::new(tx);
    tokio::spawn(process_events(rx));

    let gateway = Arc::new(PaystackGateway::new(&config)?);
    let notifier = Arc::new(EmailNotifier::new(config.notification_from_email.clone()));

    let services = AppServices::new(
        db.clone(),
        event_sender.clone(),
        gateway,
        notifier,
        &config,
    );

    let state = AppState {
        db,
        config: config.clone(),
        event_sender,
        services,
    };

    let cors = build_cors_layer(&config);

    let app = ticketing_api::api_routes()
        .merge(swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

fn build_cors_layer(config: &ticketing_api::config::AppConfig) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    match config.cors_allowed_origins.as_deref() {
        Some(origins) => {
            let parsed: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|origin| {
                    let origin = origin.trim();
                    match origin.parse::<HeaderValue>() {
                        Ok(value) => Some(value),
                        Err(_) => {
                            warn!(origin = %origin, "Skipping unparseable CORS origin");
                            None
                        }
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parsed))
                .allow_methods(methods)
                .allow_headers(Any)
        }
        None if config.is_development() => CorsLayer::permissive(),
        None => CorsLayer::new().allow_methods(methods),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => warn!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
