//! Domain models for Shopfront.
//!
//! These are the core types shared across all crates.

pub mod media;
pub mod order;
pub mod product;
pub mod review;
pub mod user;
