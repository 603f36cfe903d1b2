//! Hosted-checkout payment: gateway order creation and callback
//! verification.

use std::sync::Arc;

use serde::Deserialize;
use shopfront_core::error::{ShopError, ShopResult};
use shopfront_core::models::order::Order;
use shopfront_core::repository::{OrderRepository, ProductRepository};
use shopfront_payment::{
    GatewayOrder, GatewayOrderRequest, PaymentGateway, to_minor_units, verify_signature,
};
use tracing::{info, warn};
use uuid::Uuid;

/// Fields the gateway posts back after the customer pays.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCallback {
    #[serde(rename = "razorpay_order_id", alias = "gatewayOrderId", default)]
    pub gateway_order_id: String,
    #[serde(rename = "razorpay_payment_id", alias = "gatewayPaymentId", default)]
    pub gateway_payment_id: String,
    #[serde(rename = "razorpay_signature", alias = "signature", default)]
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Paid { payment_id: String },
    Failed,
}

pub struct CheckoutService<O: OrderRepository, P: ProductRepository> {
    orders: O,
    products: P,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl<O: OrderRepository, P: ProductRepository> CheckoutService<O, P> {
    pub fn new(
        orders: O,
        products: P,
        gateway: Arc<dyn PaymentGateway>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            orders,
            products,
            gateway,
            currency: currency.into(),
        }
    }

    /// Create a gateway order for `amount` in major currency units.
    pub async fn create_payment_order(&self, amount: Option<f64>) -> ShopResult<GatewayOrder> {
        let amount = amount.ok_or_else(|| ShopError::validation("Amount is required"))?;
        let request = GatewayOrderRequest {
            amount: to_minor_units(amount)?,
            currency: self.currency.clone(),
            receipt: None,
        };
        let order = self.gateway.create_order(request).await?;
        info!(gateway_order_id = %order.id, amount = order.amount, "Payment order created");
        Ok(order)
    }

    /// Public key id for the client-side checkout widget.
    pub fn api_key(&self) -> &str {
        self.gateway.key_id()
    }

    /// Verify a payment callback for the order identified by `order_id`.
    ///
    /// A bad signature marks an unpaid order as failed. A good one marks
    /// the order paid and decrements stock atomically; replaying the same
    /// payment is a no-op. Delivered, cancelled and refunded orders are
    /// never reopened by a payment.
    pub async fn verify_payment(
        &self,
        order_id: &str,
        callback: &PaymentCallback,
    ) -> ShopResult<VerificationOutcome> {
        let Ok(order_id) = Uuid::parse_str(order_id.trim()) else {
            warn!(order_id = %order_id, "Payment callback for malformed order id");
            return Ok(VerificationOutcome::Failed);
        };
        let order = match self.orders.get_by_id(order_id).await {
            Ok(order) => order,
            Err(ShopError::NotFound { .. }) => {
                warn!(order_id = %order_id, "Payment callback for unknown order");
                return Ok(VerificationOutcome::Failed);
            }
            Err(e) => return Err(e),
        };

        let authentic = verify_signature(
            &callback.gateway_order_id,
            &callback.gateway_payment_id,
            &callback.signature,
            self.gateway.key_secret(),
        )?;
        if !authentic {
            warn!(order_id = %order_id, "Payment signature mismatch");
            if !order.is_paid {
                self.orders.mark_payment_failed(order_id).await?;
            }
            return Ok(VerificationOutcome::Failed);
        }

        let payment_id = callback.gateway_payment_id.clone();
        if order.is_paid {
            return Ok(self.replayed(order_id, order.payment_info.id.as_deref(), payment_id));
        }
        if order.order_status.is_terminal() {
            warn!(
                order_id = %order_id,
                status = %order.order_status,
                payment_id = %payment_id,
                "Payment callback for a closed order"
            );
            return Ok(VerificationOutcome::Failed);
        }

        self.warn_on_oversell(&order).await?;

        match self.orders.confirm_payment(order_id, &payment_id).await {
            Ok(_) => {
                info!(order_id = %order_id, payment_id = %payment_id, "Payment verified");
                Ok(VerificationOutcome::Paid { payment_id })
            }
            // Another callback confirmed the order in the meantime.
            Err(ShopError::Conflict { .. }) => {
                let order = self.orders.get_by_id(order_id).await?;
                Ok(self.replayed(order_id, order.payment_info.id.as_deref(), payment_id))
            }
            // Closed by an administrator in the meantime.
            Err(ShopError::InvalidTransition { .. }) => {
                warn!(order_id = %order_id, payment_id = %payment_id, "Payment callback for a closed order");
                Ok(VerificationOutcome::Failed)
            }
            Err(e) => Err(e),
        }
    }

    fn replayed(
        &self,
        order_id: Uuid,
        stored: Option<&str>,
        payment_id: String,
    ) -> VerificationOutcome {
        if stored == Some(payment_id.as_str()) {
            info!(order_id = %order_id, payment_id = %payment_id, "Payment callback replayed");
            VerificationOutcome::Paid { payment_id }
        } else {
            warn!(
                order_id = %order_id,
                payment_id = %payment_id,
                "Order already paid with a different payment"
            );
            VerificationOutcome::Failed
        }
    }

    /// Stock is only checked at order creation, so it may have run out
    /// since. Confirmation floors stock at zero; this records the shortfall.
    async fn warn_on_oversell(&self, order: &Order) -> ShopResult<()> {
        let ids: Vec<Uuid> = order.items.iter().map(|i| i.product_id).collect();
        let products = self.products.get_many(&ids).await?;
        for item in &order.items {
            if let Some(product) = products.iter().find(|p| p.id == item.product_id) {
                if product.stock < item.quantity {
                    warn!(
                        order_id = %order.id,
                        product_id = %product.id,
                        ordered = item.quantity,
                        in_stock = product.stock,
                        "Oversold product; stock floored at zero"
                    );
                }
            }
        }
        Ok(())
    }
}
