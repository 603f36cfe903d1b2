//! Review routes.

use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{delete, post};
use serde::Deserialize;
use shopfront_commerce::ReviewOutcome;
use uuid::Uuid;

use super::number;
use crate::error::ApiError;
use crate::extract::{AdminUser, ApiJson, ApiPath, ApiQuery, CurrentUser, PageQuery};
use crate::response::{Envelope, Page};
use crate::state::AppState;

const REVIEWS_PAGE_SIZE: u64 = 5;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{product_id}",
            post(submit_review).get(list_reviews).delete(delete_own_review),
        )
        .route("/admin/{review_id}", delete(admin_delete_review))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReviewRequest {
    rating: Option<serde_json::Value>,
    comment: Option<String>,
}

impl ReviewRequest {
    /// The rating as a whole number, if one was sent.
    fn rating(&self) -> Result<Option<i64>, ApiError> {
        match &self.rating {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => number(value)
                .filter(|n| n.fract() == 0.0)
                .map(|n| Some(n as i64))
                .ok_or_else(|| ApiError::bad_request("Rating must be a whole number")),
        }
    }
}

async fn submit_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(product_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<ReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rating = body.rating()?;
    let outcome = state
        .reviews
        .submit_review(product_id, user.id, rating, body.comment)
        .await?;
    let message = match &outcome {
        ReviewOutcome::Created(_) => "Review created successfully",
        ReviewOutcome::Updated(_) => "Review updated successfully",
    };
    Ok(Envelope::created(outcome.review().clone(), message))
}

async fn list_reviews(
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let reviews = state
        .reviews
        .list_for_product(product_id, query.pagination(REVIEWS_PAGE_SIZE))
        .await?;
    let message = if reviews.items.is_empty() {
        "No review yet"
    } else {
        "Product reviews fetched successfully"
    };
    Ok(Envelope::ok(Page::from(reviews), message))
}

async fn delete_own_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(product_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.reviews.delete_own_review(product_id, user.id).await?;
    Ok(Envelope::empty("Review deleted successfully"))
}

async fn admin_delete_review(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(review_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let review = state.reviews.admin_delete_review(review_id).await?;
    Ok(Envelope::ok(review, "Review deleted successfully"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rating_accepts_numbers_and_numeric_strings() {
        let body: ReviewRequest = serde_json::from_value(json!({"rating": "4"})).unwrap();
        assert_eq!(body.rating().unwrap(), Some(4));
        let body: ReviewRequest = serde_json::from_value(json!({"rating": 5})).unwrap();
        assert_eq!(body.rating().unwrap(), Some(5));
        let body: ReviewRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(body.rating().unwrap(), None);
        let body: ReviewRequest = serde_json::from_value(json!({"rating": 4.5})).unwrap();
        assert!(body.rating().is_err());
    }
}
