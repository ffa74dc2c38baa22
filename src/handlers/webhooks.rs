use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::{errors::ServiceError, AppState};

const SIGNATURE_HEADER: &str = "x-paystack-signature";

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    event: String,
    #[serde(default)]
    data: Option<WebhookData>,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    reference: Option<String>,
}

/// Paystack webhook receiver
///
/// The signature is checked over the raw request body before anything is
/// parsed. Events other than `charge.success` are acknowledged and ignored.
/// Finalization failures are logged but still acknowledged, so the gateway
/// retries deliver into an idempotent path instead of an error loop.
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/paystack",
    request_body(content = String, content_type = "application/json"),
    responses(
        (status = 200, description = "Event acknowledged"),
        (status = 401, description = "Missing or invalid signature")
    ),
    tag = "webhooks"
)]
#[instrument(skip(state, headers, body))]
pub async fn paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    if !state.services.webhook_verifier.verify(&body, signature) {
        return Err(ServiceError::InvalidSignature);
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Webhook body is not valid JSON; acknowledging anyway");
            return Ok((StatusCode::OK, Json(json!({ "status": "ok" }))));
        }
    };

    if payload.event != "charge.success" {
        info!(event = %payload.event, "Ignoring webhook event");
        return Ok((StatusCode::OK, Json(json!({ "status": "ok" }))));
    }

    let Some(reference) = payload.data.and_then(|d| d.reference) else {
        warn!("charge.success webhook without a reference");
        return Ok((StatusCode::OK, Json(json!({ "status": "ok" }))));
    };

    if let Err(e) = state.services.finalization.finalize(&reference, true).await {
        error!(reference = %reference, error = %e, "Webhook finalization failed");
    }

    Ok((StatusCode::OK, Json(json!({ "status": "ok" }))))
}
