//! Shopfront Commerce: catalog, review, order and checkout workflows.
//!
//! Services are generic over the repository traits in `shopfront-core`
//! and never talk to the database directly.

pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod reviews;

pub use catalog::{CatalogService, ProductDraft};
pub use checkout::{CheckoutService, PaymentCallback, VerificationOutcome};
pub use orders::OrderService;
pub use reviews::{ReviewOutcome, ReviewService};
