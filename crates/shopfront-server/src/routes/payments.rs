//! Payment routes. The verification endpoint is called by the gateway's
//! widget and answers with a redirect back to the storefront.

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use shopfront_commerce::{PaymentCallback, VerificationOutcome};

use super::number;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, CurrentUser, JsonOrForm};
use crate::response::Envelope;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/order", post(create_payment_order))
        .route("/getKey", get(api_key))
        .route("/verification", post(verify_payment))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PaymentOrderRequest {
    amount: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct VerificationQuery {
    order_id: String,
}

/// Keep a value safe to embed in a redirect query string.
fn url_safe(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

async fn create_payment_order(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiJson(body): ApiJson<PaymentOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let amount = match &body.amount {
        None | Some(serde_json::Value::Null) => None,
        Some(value) => Some(
            number(value).ok_or_else(|| ApiError::bad_request("Amount must be a number"))?,
        ),
    };
    let order = state.checkout.create_payment_order(amount).await?;
    Ok(Envelope::ok(order, "Payment order created successfully"))
}

async fn api_key(State(state): State<AppState>, _user: CurrentUser) -> impl IntoResponse {
    Envelope::ok(state.checkout.api_key().to_string(), "Key fetched successfully")
}

async fn verify_payment(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<VerificationQuery>,
    JsonOrForm(callback): JsonOrForm<PaymentCallback>,
) -> Result<Response, ApiError> {
    let frontend = state.web.frontend_url.trim_end_matches('/');
    let outcome = state
        .checkout
        .verify_payment(&query.order_id, &callback)
        .await?;

    Ok(match outcome {
        VerificationOutcome::Paid { payment_id } => {
            found(format!(
                "{frontend}/payment-success?reference={}",
                url_safe(&payment_id)
            ))
        }
        VerificationOutcome::Failed => found(format!(
            "{frontend}/order/payment?status=failed&orderId={}",
            url_safe(&query.order_id)
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_values_are_sanitized() {
        assert_eq!(url_safe("pay_ABC123"), "pay_ABC123");
        assert_eq!(url_safe("x&status=ok\r\nSet-Cookie: a"), "xstatusokSet-Cookiea");
    }
}
