//! `/api/v1` route tree.

use axum::Router;

use crate::state::AppState;

pub mod orders;
pub mod payments;
pub mod products;
pub mod reviews;
pub mod users;

pub fn api() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/users", users::router())
        .nest("/reviews", reviews::router())
        .nest("/orders", orders::router())
        .nest("/payments", payments::router())
}

/// Read a JSON number or numeric string.
pub(crate) fn number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n: &f64| n.is_finite())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::number;

    #[test]
    fn numbers_and_numeric_strings() {
        assert_eq!(number(&json!(4)), Some(4.0));
        assert_eq!(number(&json!("12.5")), Some(12.5));
        assert_eq!(number(&json!("abc")), None);
        assert_eq!(number(&json!(null)), None);
    }
}
