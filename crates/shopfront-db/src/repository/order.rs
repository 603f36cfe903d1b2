//! SurrealDB implementation of [`OrderRepository`].
//!
//! Payment confirmation and status transitions touch the order and the
//! stock of every product it references. Both run inside a single
//! SurrealDB transaction that re-reads the order and aborts with THROW
//! when its stored state no longer allows the change.

use chrono::{DateTime, Utc};
use shopfront_core::error::{ShopError, ShopResult};
use shopfront_core::models::order::{
    CreateOrder, Order, OrderItem, OrderStatus, PaymentInfo, PaymentStatus, PriceBreakdown,
    ShippingAddress,
};
use shopfront_core::repository::{OrderRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::{CountRow, from_document, parse_uuid, to_document};
use crate::error::DbError;

const SELECT_ORDER: &str = "SELECT meta::id(id) AS record_id, * FROM";

const CONFIRM_PAYMENT_TX: &str = "\
BEGIN TRANSACTION;
LET $order = (SELECT * FROM ONLY type::record('customer_order', $id));
IF $order = NONE { THROW 'order not found' };
IF $order.is_paid { THROW 'order is already paid' };
IF $order.order_status IN ['delivered', 'cancelled', 'refunded'] {
    THROW 'order is in a terminal state'
};
FOR $item IN $order.items {
    UPDATE type::record('product', $item.productId) SET
        stock = math::max([0, stock - $item.quantity]),
        updated_at = time::now()
    WHERE id != NONE;
};
UPDATE type::record('customer_order', $id) SET
    is_paid = true,
    paid_at = time::now(),
    payment_id = $payment_id,
    payment_status = 'paid',
    order_status = 'processing',
    updated_at = time::now();
COMMIT TRANSACTION;
";

const RESTOCK_LOOP: &str = "\
FOR $item IN $order.items {
    UPDATE type::record('product', $item.productId) SET
        stock += $item.quantity,
        updated_at = time::now()
    WHERE id != NONE;
};
";

#[derive(Debug, SurrealValue)]
struct OrderRow {
    record_id: String,
    user_id: String,
    shipping_address: serde_json::Value,
    items: serde_json::Value,
    prices: serde_json::Value,
    order_status: String,
    payment_id: Option<String>,
    payment_status: String,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_payment_status(s: &str) -> Result<PaymentStatus, DbError> {
    match s {
        "created" => Ok(PaymentStatus::Created),
        "paid" => Ok(PaymentStatus::Paid),
        "failed" => Ok(PaymentStatus::Failed),
        other => Err(DbError::Decode(format!("unknown payment status: {other}"))),
    }
}

impl OrderRow {
    fn try_into_order(self) -> Result<Order, DbError> {
        let order_status = self
            .order_status
            .parse::<OrderStatus>()
            .map_err(|_| DbError::Decode(format!("unknown order status: {}", self.order_status)))?;
        Ok(Order {
            id: parse_uuid("order", &self.record_id)?,
            user_id: parse_uuid("user", &self.user_id)?,
            shipping_address: from_document::<ShippingAddress>(
                "shipping_address",
                self.shipping_address,
            )?,
            items: from_document::<Vec<OrderItem>>("items", self.items)?,
            prices: from_document::<PriceBreakdown>("prices", self.prices)?,
            order_status,
            payment_info: PaymentInfo {
                id: self.payment_id,
                status: parse_payment_status(&self.payment_status)?,
            },
            is_paid: self.is_paid,
            paid_at: self.paid_at,
            delivered_at: self.delivered_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn collect_orders(rows: Vec<OrderRow>) -> Result<Vec<Order>, DbError> {
    rows.into_iter().map(OrderRow::try_into_order).collect()
}

/// Map a failed transaction to a domain error.
///
/// SurrealDB reports an aborted transaction with a generic message, so the
/// stored state is checked before the transaction runs and an abort here
/// means the order changed concurrently.
fn transaction_error(id: Uuid, err: surrealdb::Error) -> DbError {
    let msg = err.to_string();
    debug!(order_id = %id, error = %msg, "Order transaction aborted");
    DbError::Aborted(msg)
}

/// Refuse changes to an order that is delivered, cancelled or refunded.
fn ensure_open(order: &Order, to: OrderStatus) -> ShopResult<()> {
    if order.order_status.is_terminal() {
        return Err(ShopError::InvalidTransition {
            from: order.order_status.to_string(),
            to: to.to_string(),
        });
    }
    Ok(())
}

/// SurrealDB implementation of the Order repository.
#[derive(Clone)]
pub struct SurrealOrderRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrderRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn page(
        &self,
        user_id: Option<Uuid>,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Order>, DbError> {
        let where_clause = if user_id.is_some() {
            "WHERE user_id = $user_id"
        } else {
            ""
        };

        let mut builder = self
            .db
            .query(format!(
                "SELECT count() AS total FROM customer_order {where_clause} GROUP ALL; \
                 {SELECT_ORDER} customer_order {where_clause} \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset;"
            ))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(user_id) = user_id {
            builder = builder.bind(("user_id", user_id.to_string()));
        }

        let mut result = builder.await?;
        let count_rows: Vec<CountRow> = result.take(0)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);
        let rows: Vec<OrderRow> = result.take(1)?;

        Ok(PaginatedResult {
            items: collect_orders(rows)?,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

impl<C: Connection> OrderRepository for SurrealOrderRepository<C> {
    async fn create(&self, input: CreateOrder) -> ShopResult<Order> {
        if input.items.is_empty() {
            return Err(ShopError::validation("An order needs at least one item"));
        }
        let id_str = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(format!(
                "CREATE type::record('customer_order', $id) SET \
                 user_id = $user_id, \
                 shipping_address = $shipping_address, \
                 items = $items, prices = $prices, \
                 order_status = 'pending', \
                 payment_status = 'created', \
                 is_paid = false; \
                 {SELECT_ORDER} type::record('customer_order', $id);"
            ))
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("shipping_address", to_document(&input.shipping_address)?))
            .bind(("items", to_document(&input.items)?))
            .bind(("prices", to_document(&input.prices)?))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("order", e))?;

        let rows: Vec<OrderRow> = result.take(1).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("order", &id_str))?;
        Ok(row.try_into_order()?)
    }

    async fn get_by_id(&self, id: Uuid) -> ShopResult<Order> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(format!("{SELECT_ORDER} type::record('customer_order', $id)"))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrderRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("order", id_str))?;
        Ok(row.try_into_order()?)
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> ShopResult<PaginatedResult<Order>> {
        Ok(self.page(Some(user_id), pagination).await?)
    }

    async fn list(&self, pagination: Pagination) -> ShopResult<PaginatedResult<Order>> {
        Ok(self.page(None, pagination).await?)
    }

    async fn delete(&self, id: Uuid) -> ShopResult<()> {
        self.db
            .query("DELETE type::record('customer_order', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_check("order", e))?;

        Ok(())
    }

    async fn confirm_payment(&self, id: Uuid, payment_id: &str) -> ShopResult<Order> {
        let current = self.get_by_id(id).await?;
        if current.is_paid {
            return Err(ShopError::Conflict {
                reason: format!("order {id} is already paid"),
            });
        }
        ensure_open(&current, OrderStatus::Processing)?;

        self.db
            .query(CONFIRM_PAYMENT_TX)
            .bind(("id", id.to_string()))
            .bind(("payment_id", payment_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| transaction_error(id, e))?;

        self.get_by_id(id).await
    }

    async fn mark_payment_failed(&self, id: Uuid) -> ShopResult<Order> {
        self.db
            .query(
                "UPDATE type::record('customer_order', $id) SET \
                 payment_status = 'failed', updated_at = time::now() \
                 WHERE is_paid = false",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_check("order", e))?;

        self.get_by_id(id).await
    }

    async fn transition_status(
        &self,
        id: Uuid,
        to: OrderStatus,
        restock: bool,
    ) -> ShopResult<Order> {
        let current = self.get_by_id(id).await?;
        ensure_open(&current, to)?;

        let delivered = if to == OrderStatus::Delivered {
            "delivered_at = time::now(),"
        } else {
            ""
        };
        let restock_loop = if restock { RESTOCK_LOOP } else { "" };

        let query = format!(
            "BEGIN TRANSACTION;
LET $order = (SELECT * FROM ONLY type::record('customer_order', $id));
IF $order = NONE {{ THROW 'order not found' }};
IF $order.order_status IN ['delivered', 'cancelled', 'refunded'] {{
    THROW 'order is in a terminal state'
}};
{restock_loop}UPDATE type::record('customer_order', $id) SET
    order_status = $status,
    {delivered}
    updated_at = time::now();
COMMIT TRANSACTION;"
        );

        self.db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("status", to.as_str().to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| transaction_error(id, e))?;

        self.get_by_id(id).await
    }
}
