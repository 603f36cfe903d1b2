//! Error types for payment operations.

use shopfront_core::error::ShopError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// The gateway answered with an error status.
    #[error("Gateway rejected the request: {0}")]
    Gateway(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid secret key")]
    InvalidKey,
}

impl From<PaymentError> for ShopError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidParameters(msg) => ShopError::validation(msg),
            PaymentError::InvalidKey => ShopError::Crypto(err.to_string()),
            other => ShopError::PaymentGateway(other.to_string()),
        }
    }
}
