//! In-memory gateway for tests and local development.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use crate::error::PaymentError;
use crate::gateway::{GatewayOrder, GatewayOrderRequest, PaymentGateway};

/// Gateway that never leaves the process.
///
/// Orders get sequential ids (`order_mock_1`, `order_mock_2`, ...) and are
/// recorded so tests can inspect what was requested. It can be told to fail
/// the next call to exercise error paths.
pub struct MockGateway {
    key_id: String,
    key_secret: String,
    counter: AtomicU64,
    fail_next: AtomicBool,
    created: Mutex<Vec<GatewayOrder>>,
}

impl MockGateway {
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: key_secret.into(),
            counter: AtomicU64::new(0),
            fail_next: AtomicBool::new(false),
            created: Mutex::new(Vec::new()),
        }
    }

    /// Make the next `create_order` call fail with a gateway error.
    pub fn set_fail_next(&self, fail: bool) {
        self.fail_next.store(fail, Ordering::SeqCst);
    }

    /// Orders created so far, oldest first.
    pub fn created_orders(&self) -> Vec<GatewayOrder> {
        self.created
            .lock()
            .map(|orders| orders.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder, PaymentError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PaymentError::Gateway("mock failure".into()));
        }
        if request.amount == 0 {
            return Err(PaymentError::InvalidParameters(
                "Amount must be a positive number".into(),
            ));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let order = GatewayOrder {
            id: format!("order_mock_{n}"),
            amount: request.amount,
            currency: request.currency,
            receipt: request.receipt,
            status: "created".into(),
            created_at: None,
        };
        if let Ok(mut created) = self.created.lock() {
            created.push(order.clone());
        }
        Ok(order)
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }

    fn key_secret(&self) -> &str {
        &self.key_secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(amount: u64) -> GatewayOrderRequest {
        GatewayOrderRequest {
            amount,
            currency: "INR".into(),
            receipt: None,
        }
    }

    #[tokio::test]
    async fn ids_are_sequential() {
        let gateway = MockGateway::new("rzp_test_key", "secret");
        let first = gateway.create_order(request(100)).await.unwrap();
        let second = gateway.create_order(request(250)).await.unwrap();
        assert_eq!(first.id, "order_mock_1");
        assert_eq!(second.id, "order_mock_2");
        assert_eq!(second.amount, 250);
        assert_eq!(gateway.created_orders().len(), 2);
        assert_eq!(gateway.key_id(), "rzp_test_key");
    }

    #[tokio::test]
    async fn fail_next_applies_once() {
        let gateway = MockGateway::new("k", "s");
        gateway.set_fail_next(true);
        assert!(matches!(
            gateway.create_order(request(100)).await,
            Err(PaymentError::Gateway(_))
        ));
        assert!(gateway.create_order(request(100)).await.is_ok());
    }
}
