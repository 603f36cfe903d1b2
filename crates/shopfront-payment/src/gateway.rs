//! Payment gateway abstraction and the Razorpay-compatible HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::error::PaymentError;

/// Parameters for creating a gateway payment order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrderRequest {
    /// Amount in minor units (paise, cents).
    pub amount: u64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,
}

/// A payment order as created by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: u64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// Hosted-checkout payment gateway.
///
/// Object safe so that a single client can be shared as
/// `Arc<dyn PaymentGateway>`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder, PaymentError>;

    /// Public key id for the client widget.
    fn key_id(&self) -> &str;

    /// Merchant secret used to sign callbacks.
    fn key_secret(&self) -> &str;
}

/// Convert a decimal amount into minor units (`round(amount × 100)`).
pub fn to_minor_units(amount: f64) -> Result<u64, PaymentError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(PaymentError::InvalidParameters(
            "Amount must be a positive number".into(),
        ));
    }
    let minor = (amount * 100.0).round();
    if minor < 1.0 || minor > u64::MAX as f64 {
        return Err(PaymentError::InvalidParameters("Amount is out of range".into()));
    }
    Ok(minor as u64)
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Razorpay-compatible REST client (`POST /v1/orders`, HTTP basic auth).
pub struct RazorpayGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl RazorpayGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn orders_url(&self) -> String {
        format!("{}/v1/orders", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder, PaymentError> {
        debug!(amount = request.amount, currency = %request.currency, "Creating gateway order");

        let response = self
            .client
            .post(self.orders_url())
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|env| match (env.error.code, env.error.description) {
                    (_, Some(description)) => Some(description),
                    (Some(code), None) => Some(code),
                    (None, None) => None,
                })
                .unwrap_or_else(|| format!("HTTP {status}"));
            warn!(%status, reason = %reason, "Gateway order creation failed");
            return Err(PaymentError::Gateway(reason));
        }

        Ok(response.json::<GatewayOrder>().await?)
    }

    fn key_id(&self) -> &str {
        &self.config.key_id
    }

    fn key_secret(&self) -> &str {
        &self.config.key_secret
    }
}
