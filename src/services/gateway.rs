use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{instrument, warn};

use crate::{config::AppConfig, errors::ServiceError};

/// Successful gateway initialization: the buyer finishes payment at this URL.
#[derive(Debug, Clone)]
pub struct GatewayAuthorization {
    pub authorization_url: String,
}

/// External payment gateway collaborator.
///
/// Both calls are synchronous with a bounded timeout. A timeout, transport
/// error, or malformed response is always a failure, never a success
/// (fail-closed).
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Registers a pending transaction with the gateway and returns the
    /// buyer-facing authorization URL. `amount_minor` is in minor currency
    /// units (e.g. kobo, cents).
    async fn initialize(
        &self,
        email: &str,
        amount_minor: i64,
        reference: &str,
    ) -> Result<GatewayAuthorization, ServiceError>;

    /// Succeeds only if the gateway reports that a transaction with this
    /// exact reference exists and is marked successful.
    async fn verify(&self, reference: &str) -> Result<(), ServiceError>;
}

#[derive(Debug, Deserialize)]
struct PaystackEnvelope<T> {
    status: bool,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
}

/// Paystack implementation of the gateway collaborator. The base URL is
/// configurable so tests can stand up a local mock server.
pub struct PaystackGateway {
    http: reqwest::Client,
    base_url: String,
    secret_key: Option<String>,
    callback_url: Option<String>,
}

impl PaystackGateway {
    pub fn new(cfg: &AppConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.gateway_timeout_secs))
            .build()
            .map_err(|e| {
                ServiceError::InternalError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            base_url: cfg.paystack_base_url.trim_end_matches('/').to_string(),
            secret_key: cfg.paystack_secret_key.clone(),
            callback_url: cfg.paystack_callback_url.clone(),
        })
    }

    fn secret_key(&self) -> Result<&str, ServiceError> {
        self.secret_key.as_deref().ok_or_else(|| {
            ServiceError::ExternalServiceError("Payment gateway secret not configured".to_string())
        })
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    #[instrument(skip(self))]
    async fn initialize(
        &self,
        email: &str,
        amount_minor: i64,
        reference: &str,
    ) -> Result<GatewayAuthorization, ServiceError> {
        let secret = self.secret_key()?;

        let mut payload = json!({
            "email": email,
            "amount": amount_minor,
            "reference": reference,
        });
        if let Some(callback_url) = &self.callback_url {
            payload["callback_url"] = json!(callback_url);
        }

        let response = self
            .http
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(secret)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                warn!(reference = %reference, error = %e, "Gateway initialize transport failure");
                ServiceError::ExternalServiceError(format!("Payment gateway unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "Payment gateway returned status {}",
                response.status()
            )));
        }

        let body: PaystackEnvelope<InitializeData> = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("Malformed gateway response: {}", e))
        })?;

        match body {
            PaystackEnvelope {
                status: true,
                data: Some(data),
            } => Ok(GatewayAuthorization {
                authorization_url: data.authorization_url,
            }),
            _ => Err(ServiceError::ExternalServiceError(
                "Payment initialization rejected by gateway".to_string(),
            )),
        }
    }

    #[instrument(skip(self))]
    async fn verify(&self, reference: &str) -> Result<(), ServiceError> {
        let secret = self.secret_key()?;

        let response = self
            .http
            .get(format!("{}/transaction/verify/{}", self.base_url, reference))
            .bearer_auth(secret)
            .send()
            .await
            .map_err(|e| {
                warn!(reference = %reference, error = %e, "Gateway verify transport failure");
                ServiceError::ExternalServiceError(format!("Payment gateway unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(ServiceError::PaymentFailed(
                "Payment verification failed".to_string(),
            ));
        }

        let body: PaystackEnvelope<VerifyData> = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("Malformed gateway response: {}", e))
        })?;

        match body {
            PaystackEnvelope {
                status: true,
                data: Some(data),
            } if data.status == "success" => Ok(()),
            _ => Err(ServiceError::PaymentFailed(
                "Payment verification failed".to_string(),
            )),
        }
    }
}
