//! Shopfront Core: domain models, repository traits, pricing rules and
//! the shared error type.

pub mod error;
pub mod models;
pub mod pricing;
pub mod repository;
pub mod slug;

pub use error::{ShopError, ShopResult};
