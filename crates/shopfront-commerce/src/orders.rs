//! Order placement and the administrator's status lifecycle.

use std::collections::HashMap;

use shopfront_core::error::{ShopError, ShopResult};
use shopfront_core::models::order::{
    CreateOrder, Order, OrderItem, OrderLine, OrderStatus, ShippingAddress,
};
use shopfront_core::models::user::{Role, User};
use shopfront_core::pricing::PricingPolicy;
use shopfront_core::repository::{OrderRepository, PaginatedResult, Pagination, ProductRepository};
use tracing::info;
use uuid::Uuid;

/// Merge repeated product ids by summing their quantities, keeping the
/// order in which products first appear.
fn merge_lines(lines: &[OrderLine]) -> ShopResult<Vec<OrderLine>> {
    let mut merged: Vec<OrderLine> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity == 0 {
            return Err(ShopError::validation("Quantity must be at least 1"));
        }
        match merged.iter_mut().find(|m| m.product == line.product) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(line.quantity)
                    .ok_or_else(|| ShopError::validation("Quantity is too large"))?;
            }
            None => merged.push(*line),
        }
    }
    Ok(merged)
}

pub struct OrderService<O: OrderRepository, P: ProductRepository> {
    orders: O,
    products: P,
    pricing: PricingPolicy,
}

impl<O: OrderRepository, P: ProductRepository> OrderService<O, P> {
    pub fn new(orders: O, products: P, pricing: PricingPolicy) -> Self {
        Self {
            orders,
            products,
            pricing,
        }
    }

    /// Place a pending, unpaid order priced from the current catalog.
    ///
    /// Stock is checked but not reserved; it is decremented when the
    /// payment is confirmed.
    pub async fn create_order(
        &self,
        user_id: Uuid,
        shipping_address: ShippingAddress,
        lines: Vec<OrderLine>,
    ) -> ShopResult<Order> {
        if lines.is_empty() {
            return Err(ShopError::validation("No order items provided"));
        }
        let missing = shipping_address.missing_fields();
        if !missing.is_empty() {
            return Err(ShopError::validation(format!(
                "Please provide shipping address: {}",
                missing.join(", ")
            )));
        }
        let lines = merge_lines(&lines)?;

        let ids: Vec<Uuid> = lines.iter().map(|l| l.product).collect();
        let products: HashMap<Uuid, _> = self
            .products
            .get_many(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = products
                .get(&line.product)
                .ok_or_else(|| ShopError::not_found("Product", line.product))?;
            if line.quantity > product.stock {
                return Err(ShopError::InsufficientStock {
                    product: product.name.clone(),
                    requested: line.quantity,
                    available: product.stock,
                });
            }
            items.push(OrderItem {
                product_id: product.id,
                name: product.name.clone(),
                price: product.price,
                image: product.thumbnail().map(str::to_string),
                quantity: line.quantity,
            });
        }

        let prices = self.pricing.quote(&items);
        let order = self
            .orders
            .create(CreateOrder {
                user_id,
                shipping_address,
                items,
                prices,
            })
            .await?;

        info!(
            order_id = %order.id,
            user_id = %user_id,
            total = order.prices.total_price,
            "Order created"
        );
        Ok(order)
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> ShopResult<PaginatedResult<Order>> {
        self.orders.list_by_user(user_id, pagination).await
    }

    pub async fn list_all(&self, pagination: Pagination) -> ShopResult<PaginatedResult<Order>> {
        self.orders.list(pagination).await
    }

    /// Fetch an order on behalf of `viewer`, who must own it or be an
    /// administrator.
    pub async fn get_order(&self, order_id: Uuid, viewer: &User) -> ShopResult<Order> {
        let order = self.orders.get_by_id(order_id).await?;
        if viewer.role != Role::Admin && order.user_id != viewer.id {
            return Err(ShopError::AuthorizationDenied {
                reason: "You are not allowed to view this order".into(),
            });
        }
        Ok(order)
    }

    /// Move an order to the requested status. Cancelling or refunding
    /// returns the ordered quantities to stock.
    pub async fn update_status(&self, order_id: Uuid, requested: Option<&str>) -> ShopResult<Order> {
        let current = self.orders.get_by_id(order_id).await?;
        let to: OrderStatus = requested
            .ok_or_else(|| ShopError::validation("Invalid order status"))?
            .parse()?;
        current.order_status.check_transition(to)?;

        let restock = to.restores_stock();
        let order = self.orders.transition_status(order_id, to, restock).await?;

        info!(
            order_id = %order_id,
            from = %current.order_status,
            to = %to,
            restocked = restock,
            "Order status updated"
        );
        Ok(order)
    }

    pub async fn delete_order(&self, order_id: Uuid) -> ShopResult<()> {
        let order = self.orders.get_by_id(order_id).await?;
        if !order.order_status.is_deletable() {
            return Err(ShopError::validation(
                "Only pending, delivered, cancelled, or refunded orders can be deleted",
            ));
        }
        self.orders.delete(order_id).await?;
        info!(order_id = %order_id, status = %order.order_status, "Order deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product: Uuid, quantity: u32) -> OrderLine {
        OrderLine { product, quantity }
    }

    #[test]
    fn duplicate_lines_are_summed_in_first_seen_order() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let merged = merge_lines(&[line(a, 1), line(b, 2), line(a, 3)]).unwrap();
        assert_eq!(merged, vec![line(a, 4), line(b, 2)]);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let err = merge_lines(&[line(Uuid::new_v4(), 0)]).unwrap_err();
        assert!(matches!(err, ShopError::Validation { .. }));
    }
}
