//! Gateway credentials and endpoint.

/// Configuration for the hosted-checkout gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Public key id, handed to the client widget.
    pub key_id: String,
    /// Merchant secret. Used for API basic auth and callback signatures.
    pub key_secret: String,
    /// API base URL without trailing slash.
    pub base_url: String,
    /// ISO currency code for created orders.
    pub currency: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            key_id: String::new(),
            key_secret: String::new(),
            base_url: "https://api.razorpay.com".into(),
            currency: "INR".into(),
            timeout_secs: 15,
        }
    }
}
