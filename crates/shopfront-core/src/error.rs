//! Error types for the Shopfront system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShopError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("{entity} already exists")]
    AlreadyExists { entity: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Access denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("Not enough stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: u32,
        available: u32,
    },

    #[error("Order status cannot be updated from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Payment gateway error: {0}")]
    PaymentGateway(String),

    #[error("Upload rejected: {0}")]
    Upload(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShopError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        ShopError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ShopError::Validation {
            message: message.into(),
        }
    }
}

pub type ShopResult<T> = Result<T, ShopError>;
