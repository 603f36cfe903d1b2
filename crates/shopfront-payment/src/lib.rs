//! Shopfront Payment: hosted-checkout gateway adapter.
//!
//! The gateway creates a payment order for an amount in minor currency
//! units; the customer pays on the gateway's widget; the gateway then
//! calls back with `(order id, payment id, signature)` where the
//! signature is an HMAC-SHA256 over `order_id|payment_id` keyed with the
//! merchant secret.

pub mod config;
pub mod error;
pub mod gateway;
pub mod mock;
pub mod signature;

pub use config::GatewayConfig;
pub use error::PaymentError;
pub use gateway::{GatewayOrder, GatewayOrderRequest, PaymentGateway, RazorpayGateway, to_minor_units};
pub use mock::MockGateway;
pub use signature::{compute_signature, verify_signature};
