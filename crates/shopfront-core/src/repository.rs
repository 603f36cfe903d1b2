//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations live in
//! `shopfront-db`; services are generic over these traits.

use serde::Serialize;
use uuid::Uuid;

use crate::error::ShopResult;
use crate::models::{
    order::{CreateOrder, Order, OrderStatus},
    product::{CreateProduct, Product, ProductFilter, RatingSummary, UpdateProduct},
    review::{CreateReview, Review},
    user::{CreateUser, UpdateUser, User},
};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;
/// Largest offset a query may carry; SurrealDB binds integers as `i64`.
pub const MAX_OFFSET: u64 = i64::MAX as u64;

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Build from a 1-based page number. Page 0 is treated as page 1, the
    /// limit is clamped to `1..=MAX_PAGE_SIZE` and the offset saturates at
    /// [`MAX_OFFSET`].
    pub fn page(page: u64, limit: u64) -> Self {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let page = page.max(1);
        Self {
            offset: (page - 1).saturating_mul(limit).min(MAX_OFFSET),
            limit,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

impl<T> PaginatedResult<T> {
    /// 1-based page number of this result.
    pub fn page(&self) -> u64 {
        self.offset / self.limit.max(1) + 1
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.limit.max(1))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            limit: self.limit,
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = ShopResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ShopResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = ShopResult<User>> + Send;
    /// Find the user holding an unexpired password-reset token hash.
    fn get_by_reset_token(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = ShopResult<User>> + Send;
    fn update(&self, id: Uuid, input: UpdateUser) -> impl Future<Output = ShopResult<User>> + Send;
    /// Replace the password (raw value, hashed before storage) and clear
    /// any pending reset token.
    fn set_password(&self, id: Uuid, password: &str)
    -> impl Future<Output = ShopResult<User>> + Send;
    /// Hard delete; returns the removed user.
    fn delete(&self, id: Uuid) -> impl Future<Output = ShopResult<User>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = ShopResult<PaginatedResult<User>>> + Send;
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

pub trait ProductRepository: Send + Sync {
    /// Create a product, deriving a unique slug from its name.
    fn create(&self, input: CreateProduct) -> impl Future<Output = ShopResult<Product>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ShopResult<Product>> + Send;
    /// Fetch every existing product among `ids`. Unknown ids are omitted.
    fn get_many(&self, ids: &[Uuid]) -> impl Future<Output = ShopResult<Vec<Product>>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateProduct,
    ) -> impl Future<Output = ShopResult<Product>> + Send;
    /// Hard delete; returns the removed product.
    fn delete(&self, id: Uuid) -> impl Future<Output = ShopResult<Product>> + Send;
    /// Filtered listing, newest first.
    fn list(
        &self,
        filter: ProductFilter,
        pagination: Pagination,
    ) -> impl Future<Output = ShopResult<PaginatedResult<Product>>> + Send;
    /// Write the denormalized rating fields without touching anything else.
    fn set_rating_summary(
        &self,
        id: Uuid,
        summary: RatingSummary,
    ) -> impl Future<Output = ShopResult<()>> + Send;
}

pub trait ReviewRepository: Send + Sync {
    fn create(&self, input: CreateReview) -> impl Future<Output = ShopResult<Review>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ShopResult<Review>> + Send;
    fn find_by_product_and_user(
        &self,
        product_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = ShopResult<Option<Review>>> + Send;
    fn update(
        &self,
        id: Uuid,
        rating: u8,
        comment: String,
    ) -> impl Future<Output = ShopResult<Review>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = ShopResult<()>> + Send;
    /// All ratings currently stored for a product.
    fn ratings_for_product(
        &self,
        product_id: Uuid,
    ) -> impl Future<Output = ShopResult<Vec<u8>>> + Send;
    /// Reviews of a product, newest first.
    fn list_for_product(
        &self,
        product_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = ShopResult<PaginatedResult<Review>>> + Send;
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

pub trait OrderRepository: Send + Sync {
    fn create(&self, input: CreateOrder) -> impl Future<Output = ShopResult<Order>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ShopResult<Order>> + Send;
    /// Orders placed by one user, newest first.
    fn list_by_user(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = ShopResult<PaginatedResult<Order>>> + Send;
    /// All orders, newest first.
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = ShopResult<PaginatedResult<Order>>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = ShopResult<()>> + Send;

    /// Mark an unpaid order as paid and move it to `processing`, and
    /// decrement stock for every line item, as one atomic unit.
    ///
    /// Products that no longer exist are skipped; stock is floored at
    /// zero. Fails with `Conflict` if the order is already paid.
    fn confirm_payment(
        &self,
        id: Uuid,
        payment_id: &str,
    ) -> impl Future<Output = ShopResult<Order>> + Send;

    /// Record a failed payment attempt on an unpaid order.
    fn mark_payment_failed(&self, id: Uuid) -> impl Future<Output = ShopResult<Order>> + Send;

    /// Move a non-terminal order to `to` as one atomic unit, stamping
    /// `delivered_at` on delivery and, when `restock` is set, returning
    /// every line item's quantity to its product (missing products are
    /// skipped). Fails with `Conflict` if the stored status is terminal.
    fn transition_status(
        &self,
        id: Uuid,
        to: OrderStatus,
        restock: bool,
    ) -> impl Future<Output = ShopResult<Order>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_converts_to_offset() {
        assert_eq!(
            Pagination::page(3, 5),
            Pagination {
                offset: 10,
                limit: 5
            }
        );
        assert_eq!(Pagination::page(0, 5).offset, 0);
        assert_eq!(Pagination::page(1, 1000).limit, MAX_PAGE_SIZE);
        assert_eq!(Pagination::page(1, 0).limit, 1);
    }

    #[test]
    fn huge_page_numbers_saturate() {
        let p = Pagination::page(u64::MAX, 100);
        assert_eq!(p.offset, MAX_OFFSET);
        assert_eq!(p.limit, 100);
        assert!(i64::try_from(Pagination::page(u64::MAX / 2, 3).offset).is_ok());
    }

    #[test]
    fn paginated_result_page_math() {
        let result = PaginatedResult {
            items: vec![1, 2],
            total: 12,
            offset: 10,
            limit: 5,
        };
        assert_eq!(result.page(), 3);
        assert_eq!(result.total_pages(), 3);
        assert_eq!(result.map(|n| n * 2).items, vec![2, 4]);
    }
}
