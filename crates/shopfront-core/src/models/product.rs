//! Product domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::media::ImageRef;

pub const MAX_PRICE: f64 = 9_999_999.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    Electronics,
    Clothes,
    Shoes,
    Sports,
    Vehicle,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Electronics,
        Category::Clothes,
        Category::Shoes,
        Category::Sports,
        Category::Vehicle,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Clothes => "Clothes",
            Category::Shoes => "Shoes",
            Category::Sports => "Sports",
            Category::Vehicle => "Vehicle",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Invalid category: {s}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub brand: String,
    pub price: f64,
    pub images: Vec<ImageRef>,
    pub category: Category,
    pub tags: Vec<String>,
    pub stock: u32,
    /// Denormalized mean of all review ratings (0 when unreviewed).
    pub average_rating: f64,
    pub reviews_count: u64,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// URL of the first image, used as the line-item thumbnail.
    pub fn thumbnail(&self) -> Option<&str> {
        self.images.first().map(|img| img.url.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub description: String,
    pub brand: Option<String>,
    pub price: f64,
    pub category: Category,
    pub tags: Vec<String>,
    pub stock: u32,
    pub images: Vec<ImageRef>,
    pub owner_id: Uuid,
}

/// Whitelisted product fields an administrator may change.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<Category>,
    pub stock: Option<u32>,
    pub images: Option<Vec<ImageRef>>,
}

impl UpdateProduct {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.stock.is_none()
            && self.images.is_none()
    }
}

/// Catalog listing filters. All present filters must match.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring match on the product name.
    pub keyword: Option<String>,
    pub category: Option<Category>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// Aggregate of a product's reviews, written back onto the product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub average_rating: f64,
    pub reviews_count: u64,
}

impl RatingSummary {
    pub fn from_ratings(ratings: &[u8]) -> Self {
        if ratings.is_empty() {
            return Self {
                average_rating: 0.0,
                reviews_count: 0,
            };
        }
        let sum: u64 = ratings.iter().map(|&r| u64::from(r)).sum();
        Self {
            average_rating: sum as f64 / ratings.len() as f64,
            reviews_count: ratings.len() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!("shoes".parse::<Category>().unwrap(), Category::Shoes);
        assert_eq!("Vehicle".parse::<Category>().unwrap(), Category::Vehicle);
        assert!("Food".parse::<Category>().is_err());
    }

    #[test]
    fn rating_summary_is_arithmetic_mean() {
        let summary = RatingSummary::from_ratings(&[5, 4, 3]);
        assert_eq!(summary.reviews_count, 3);
        assert!((summary.average_rating - 4.0).abs() < f64::EPSILON);

        let summary = RatingSummary::from_ratings(&[5, 4]);
        assert!((summary.average_rating - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_rating_summary_is_zero() {
        let summary = RatingSummary::from_ratings(&[]);
        assert_eq!(summary.reviews_count, 0);
        assert_eq!(summary.average_rating, 0.0);
    }
}
