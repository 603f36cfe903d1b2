//! Product reviews and the denormalized rating summary.

use std::collections::HashMap;

use shopfront_core::error::{ShopError, ShopResult};
use shopfront_core::models::product::RatingSummary;
use shopfront_core::models::review::{
    CreateReview, MAX_RATING, MIN_RATING, Review, ReviewAuthor, ReviewWithAuthor,
};
use shopfront_core::repository::{
    PaginatedResult, Pagination, ProductRepository, ReviewRepository, UserRepository,
};
use tracing::{debug, info};
use uuid::Uuid;

/// Whether a submission created a new review or replaced the caller's
/// existing one.
#[derive(Debug)]
pub enum ReviewOutcome {
    Created(Review),
    Updated(Review),
}

impl ReviewOutcome {
    pub fn review(&self) -> &Review {
        match self {
            ReviewOutcome::Created(r) | ReviewOutcome::Updated(r) => r,
        }
    }
}

pub struct ReviewService<R, P, U>
where
    R: ReviewRepository,
    P: ProductRepository,
    U: UserRepository,
{
    reviews: R,
    products: P,
    users: U,
}

impl<R, P, U> ReviewService<R, P, U>
where
    R: ReviewRepository,
    P: ProductRepository,
    U: UserRepository,
{
    pub fn new(reviews: R, products: P, users: U) -> Self {
        Self {
            reviews,
            products,
            users,
        }
    }

    /// Create the caller's review of a product, or overwrite the rating and
    /// comment of the one they already left.
    pub async fn submit_review(
        &self,
        product_id: Uuid,
        user_id: Uuid,
        rating: Option<i64>,
        comment: Option<String>,
    ) -> ShopResult<ReviewOutcome> {
        let (rating, comment) = match (rating, comment.map(|c| c.trim().to_string())) {
            (Some(r), Some(c)) if !c.is_empty() => (r, c),
            _ => return Err(ShopError::validation("Rating and comment required")),
        };
        let rating = u8::try_from(rating)
            .ok()
            .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
            .ok_or_else(|| {
                ShopError::validation(format!(
                    "Rating must be between {MIN_RATING} and {MAX_RATING}"
                ))
            })?;

        self.products.get_by_id(product_id).await?;

        let outcome = match self
            .reviews
            .find_by_product_and_user(product_id, user_id)
            .await?
        {
            Some(existing) => {
                ReviewOutcome::Updated(self.reviews.update(existing.id, rating, comment).await?)
            }
            None => {
                let created = self
                    .reviews
                    .create(CreateReview {
                        product_id,
                        user_id,
                        rating,
                        comment: comment.clone(),
                    })
                    .await;
                match created {
                    Ok(review) => ReviewOutcome::Created(review),
                    // A concurrent submission won the unique index.
                    Err(ShopError::AlreadyExists { .. }) => {
                        let existing = self
                            .reviews
                            .find_by_product_and_user(product_id, user_id)
                            .await?
                            .ok_or_else(|| ShopError::not_found("Review", product_id))?;
                        ReviewOutcome::Updated(
                            self.reviews.update(existing.id, rating, comment).await?,
                        )
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        self.refresh_summary(product_id).await?;
        info!(
            product_id = %product_id,
            user_id = %user_id,
            rating,
            replaced = matches!(outcome, ReviewOutcome::Updated(_)),
            "Review saved"
        );
        Ok(outcome)
    }

    /// Reviews of a product, newest first, each with a public summary of
    /// its author.
    pub async fn list_for_product(
        &self,
        product_id: Uuid,
        pagination: Pagination,
    ) -> ShopResult<PaginatedResult<ReviewWithAuthor>> {
        self.products.get_by_id(product_id).await?;
        let page = self.reviews.list_for_product(product_id, pagination).await?;

        let mut authors: HashMap<Uuid, Option<ReviewAuthor>> = HashMap::new();
        for review in &page.items {
            if authors.contains_key(&review.user_id) {
                continue;
            }
            let author = match self.users.get_by_id(review.user_id).await {
                Ok(user) => Some(ReviewAuthor {
                    id: user.id,
                    full_name: user.full_name,
                    avatar: user.avatar,
                }),
                Err(ShopError::NotFound { .. }) => None,
                Err(e) => return Err(e),
            };
            authors.insert(review.user_id, author);
        }

        Ok(page.map(|review| ReviewWithAuthor {
            author: authors.get(&review.user_id).cloned().flatten(),
            id: review.id,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        }))
    }

    /// Delete the caller's own review of a product.
    pub async fn delete_own_review(&self, product_id: Uuid, user_id: Uuid) -> ShopResult<()> {
        self.products.get_by_id(product_id).await?;
        let review = self
            .reviews
            .find_by_product_and_user(product_id, user_id)
            .await?
            .ok_or_else(|| ShopError::not_found("Review", product_id))?;

        self.reviews.delete(review.id).await?;
        self.refresh_summary(product_id).await?;
        info!(review_id = %review.id, user_id = %user_id, "Review deleted by author");
        Ok(())
    }

    /// Delete any review by id. Returns the removed review.
    pub async fn admin_delete_review(&self, review_id: Uuid) -> ShopResult<Review> {
        let review = self.reviews.get_by_id(review_id).await?;
        self.reviews.delete(review_id).await?;
        self.refresh_summary(review.product_id).await?;
        info!(review_id = %review_id, "Review deleted by administrator");
        Ok(review)
    }

    /// Recompute the product's average rating and review count from the
    /// stored reviews.
    async fn refresh_summary(&self, product_id: Uuid) -> ShopResult<()> {
        let ratings = self.reviews.ratings_for_product(product_id).await?;
        let summary = RatingSummary::from_ratings(&ratings);
        match self.products.set_rating_summary(product_id, summary).await {
            Ok(()) => Ok(()),
            // Reviews can outlive their product.
            Err(ShopError::NotFound { .. }) => {
                debug!(product_id = %product_id, "Rating summary skipped for missing product");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
