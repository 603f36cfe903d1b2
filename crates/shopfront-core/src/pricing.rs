//! Order price computation.

use serde::{Deserialize, Serialize};

use crate::models::order::{OrderItem, PriceBreakdown};

/// Tax and shipping rules applied at order creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Fraction of the items subtotal charged as tax (0.06 = 6%).
    pub tax_rate: f64,
    /// Subtotals strictly above this ship for free.
    pub free_shipping_threshold: f64,
    pub flat_shipping_fee: f64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: 0.06,
            free_shipping_threshold: 500.0,
            flat_shipping_fee: 60.0,
        }
    }
}

impl PricingPolicy {
    /// Price a set of line items using the unit prices they carry.
    pub fn quote(&self, items: &[OrderItem]) -> PriceBreakdown {
        let items_price = round2(
            items
                .iter()
                .map(|item| item.price * f64::from(item.quantity))
                .sum(),
        );
        let tax_price = round2(items_price * self.tax_rate);
        let shipping_price = if items_price > self.free_shipping_threshold {
            0.0
        } else {
            self.flat_shipping_fee
        };

        PriceBreakdown {
            items_price,
            tax_price,
            shipping_price,
            total_price: round2(items_price + tax_price + shipping_price),
        }
    }
}

/// Round to two decimal places (currency precision).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn item(price: f64, quantity: u32) -> OrderItem {
        OrderItem {
            product_id: Uuid::new_v4(),
            name: "Widget".into(),
            price,
            image: None,
            quantity,
        }
    }

    #[test]
    fn two_units_at_500_ship_free() {
        let quote = PricingPolicy::default().quote(&[item(500.0, 2)]);
        assert_eq!(quote.items_price, 1000.0);
        assert_eq!(quote.tax_price, 60.0);
        assert_eq!(quote.shipping_price, 0.0);
        assert_eq!(quote.total_price, 1060.0);
    }

    #[test]
    fn subtotal_at_threshold_pays_flat_fee() {
        let quote = PricingPolicy::default().quote(&[item(250.0, 2)]);
        assert_eq!(quote.items_price, 500.0);
        assert_eq!(quote.shipping_price, 60.0);
        assert_eq!(quote.total_price, 590.0);
    }

    #[test]
    fn tax_is_rounded_to_cents() {
        let quote = PricingPolicy::default().quote(&[item(19.99, 3)]);
        assert_eq!(quote.items_price, 59.97);
        // 59.97 * 0.06 = 3.5982
        assert_eq!(quote.tax_price, 3.6);
        assert_eq!(quote.total_price, 123.57);
    }

    #[test]
    fn sums_across_lines() {
        let quote = PricingPolicy::default().quote(&[item(100.0, 1), item(45.5, 2)]);
        assert_eq!(quote.items_price, 191.0);
        assert_eq!(quote.tax_price, 11.46);
    }
}
