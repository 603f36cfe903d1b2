//! SurrealDB implementation of [`ReviewRepository`].

use chrono::{DateTime, Utc};
use shopfront_core::error::ShopResult;
use shopfront_core::models::review::{CreateReview, Review};
use shopfront_core::repository::{PaginatedResult, Pagination, ReviewRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid};
use crate::error::DbError;

const SELECT_REVIEW: &str = "SELECT meta::id(id) AS record_id, * FROM";

#[derive(Debug, SurrealValue)]
struct ReviewRow {
    record_id: String,
    product_id: String,
    user_id: String,
    rating: u32,
    comment: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct RatingRow {
    rating: u32,
}

fn narrow_rating(rating: u32) -> Result<u8, DbError> {
    u8::try_from(rating).map_err(|_| DbError::Decode(format!("rating out of range: {rating}")))
}

impl ReviewRow {
    fn try_into_review(self) -> Result<Review, DbError> {
        Ok(Review {
            id: parse_uuid("review", &self.record_id)?,
            product_id: parse_uuid("product", &self.product_id)?,
            user_id: parse_uuid("user", &self.user_id)?,
            rating: narrow_rating(self.rating)?,
            comment: self.comment,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn first_review(rows: Vec<ReviewRow>, id: impl ToString) -> Result<Review, DbError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| DbError::not_found("review", id))?
        .try_into_review()
}

/// SurrealDB implementation of the Review repository.
#[derive(Clone)]
pub struct SurrealReviewRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealReviewRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ReviewRepository for SurrealReviewRepository<C> {
    async fn create(&self, input: CreateReview) -> ShopResult<Review> {
        let id_str = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(format!(
                "CREATE type::record('review', $id) SET \
                 product_id = $product_id, user_id = $user_id, \
                 rating = $rating, comment = $comment; \
                 {SELECT_REVIEW} type::record('review', $id);"
            ))
            .bind(("id", id_str.clone()))
            .bind(("product_id", input.product_id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("rating", u32::from(input.rating)))
            .bind(("comment", input.comment))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("review", e))?;

        let rows: Vec<ReviewRow> = result.take(1).map_err(DbError::from)?;
        Ok(first_review(rows, id_str)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ShopResult<Review> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(format!("{SELECT_REVIEW} type::record('review', $id)"))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReviewRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_review(rows, id_str)?)
    }

    async fn find_by_product_and_user(
        &self,
        product_id: Uuid,
        user_id: Uuid,
    ) -> ShopResult<Option<Review>> {
        let mut result = self
            .db
            .query(format!(
                "{SELECT_REVIEW} review \
                 WHERE product_id = $product_id AND user_id = $user_id \
                 LIMIT 1"
            ))
            .bind(("product_id", product_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReviewRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(ReviewRow::try_into_review)
            .transpose()?)
    }

    async fn update(&self, id: Uuid, rating: u8, comment: String) -> ShopResult<Review> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(format!(
                "UPDATE type::record('review', $id) SET \
                 rating = $rating, comment = $comment, \
                 updated_at = time::now() WHERE id != NONE; \
                 {SELECT_REVIEW} type::record('review', $id);"
            ))
            .bind(("id", id_str.clone()))
            .bind(("rating", u32::from(rating)))
            .bind(("comment", comment))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("review", e))?;

        let rows: Vec<ReviewRow> = result.take(1).map_err(DbError::from)?;
        Ok(first_review(rows, id_str)?)
    }

    async fn delete(&self, id: Uuid) -> ShopResult<()> {
        self.db
            .query("DELETE type::record('review', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_check("review", e))?;

        Ok(())
    }

    async fn ratings_for_product(&self, product_id: Uuid) -> ShopResult<Vec<u8>> {
        let mut result = self
            .db
            .query("SELECT rating FROM review WHERE product_id = $product_id")
            .bind(("product_id", product_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RatingRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|r| narrow_rating(r.rating))
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn list_for_product(
        &self,
        product_id: Uuid,
        pagination: Pagination,
    ) -> ShopResult<PaginatedResult<Review>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM review \
                 WHERE product_id = $product_id GROUP ALL; \
                 {SELECT_REVIEW} review WHERE product_id = $product_id \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset;"
            ))
            .bind(("product_id", product_id.to_string()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);
        let rows: Vec<ReviewRow> = result.take(1).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(ReviewRow::try_into_review)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
