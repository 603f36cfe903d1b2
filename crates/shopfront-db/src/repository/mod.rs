//! SurrealDB repository implementations.

mod order;
mod product;
mod review;
mod user;

pub use order::SurrealOrderRepository;
pub use product::SurrealProductRepository;
pub use review::SurrealReviewRepository;
pub use user::{SurrealUserRepository, hash_password, verify_password};

use serde::Serialize;
use serde::de::DeserializeOwned;
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
}

/// Serialize an embedded document for storage.
///
/// `null` members are dropped so that `option<..>` fields receive NONE.
fn to_document<T: Serialize>(value: &T) -> Result<serde_json::Value, DbError> {
    let mut doc = serde_json::to_value(value).map_err(|e| DbError::Decode(e.to_string()))?;
    strip_nulls(&mut doc);
    Ok(doc)
}

fn strip_nulls(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

fn from_document<T: DeserializeOwned>(field: &str, value: serde_json::Value) -> Result<T, DbError> {
    serde_json::from_value(value).map_err(|e| DbError::Decode(format!("invalid {field}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nulls_are_removed_recursively() {
        let mut doc = json!({
            "a": null,
            "b": [{ "image": null, "name": "x" }],
            "c": { "d": null, "e": 1 }
        });
        strip_nulls(&mut doc);
        assert_eq!(doc, json!({ "b": [{ "name": "x" }], "c": { "e": 1 } }));
    }

    #[test]
    fn bad_uuid_is_a_decode_error() {
        assert!(matches!(
            parse_uuid("product", "nope"),
            Err(DbError::Decode(_))
        ));
    }
}
