//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. Embedded documents (addresses,
//! line items, prices) keep the camelCase keys of their API form and
//! have every nested field declared.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD full_name ON TABLE user TYPE string \
    ASSERT string::len($value) > 0;
DEFINE FIELD email ON TABLE user TYPE string \
    ASSERT string::is_email($value);
DEFINE FIELD phone ON TABLE user TYPE option<string>;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD avatar_public_id ON TABLE user TYPE option<string>;
DEFINE FIELD avatar_url ON TABLE user TYPE option<string>;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['user', 'admin'];
DEFINE FIELD refresh_token ON TABLE user TYPE option<string>;
DEFINE FIELD reset_password_token ON TABLE user TYPE option<string>;
DEFINE FIELD reset_password_expires_at ON TABLE user \
    TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;
DEFINE INDEX idx_user_reset_token ON TABLE user \
    COLUMNS reset_password_token;

-- =======================================================================
-- Products
-- =======================================================================
DEFINE TABLE product SCHEMAFULL;
DEFINE FIELD name ON TABLE product TYPE string \
    ASSERT string::len($value) > 0;
DEFINE FIELD slug ON TABLE product TYPE string;
DEFINE FIELD description ON TABLE product TYPE string;
DEFINE FIELD brand ON TABLE product TYPE string DEFAULT 'Generic';
DEFINE FIELD price ON TABLE product TYPE float \
    ASSERT $value >= 0 AND $value <= 9999999;
DEFINE FIELD images ON TABLE product TYPE array DEFAULT [];
DEFINE FIELD images.* ON TABLE product TYPE object;
DEFINE FIELD images.*.public_id ON TABLE product TYPE string;
DEFINE FIELD images.*.url ON TABLE product TYPE string;
DEFINE FIELD images.*.kind ON TABLE product TYPE string \
    ASSERT $value IN ['image', 'video'];
DEFINE FIELD category ON TABLE product TYPE string \
    ASSERT $value IN ['Electronics', 'Clothes', 'Shoes', 'Sports', \
    'Vehicle', 'Other'];
DEFINE FIELD tags ON TABLE product TYPE array DEFAULT [];
DEFINE FIELD tags.* ON TABLE product TYPE string;
DEFINE FIELD stock ON TABLE product TYPE int DEFAULT 1 \
    ASSERT $value >= 0;
DEFINE FIELD average_rating ON TABLE product TYPE float DEFAULT 0.0 \
    ASSERT $value >= 0 AND $value <= 5;
DEFINE FIELD reviews_count ON TABLE product TYPE int DEFAULT 0;
DEFINE FIELD owner_id ON TABLE product TYPE string;
DEFINE FIELD created_at ON TABLE product TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE product TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_product_slug ON TABLE product COLUMNS slug UNIQUE;
DEFINE INDEX idx_product_category ON TABLE product COLUMNS category;
DEFINE INDEX idx_product_price ON TABLE product COLUMNS price;

-- =======================================================================
-- Reviews
-- =======================================================================
DEFINE TABLE review SCHEMAFULL;
DEFINE FIELD product_id ON TABLE review TYPE string;
DEFINE FIELD user_id ON TABLE review TYPE string;
DEFINE FIELD rating ON TABLE review TYPE int \
    ASSERT $value >= 1 AND $value <= 5;
DEFINE FIELD comment ON TABLE review TYPE string;
DEFINE FIELD created_at ON TABLE review TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE review TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_review_product_user ON TABLE review \
    COLUMNS product_id, user_id UNIQUE;

-- =======================================================================
-- Orders
-- =======================================================================
DEFINE TABLE customer_order SCHEMAFULL;
DEFINE FIELD user_id ON TABLE customer_order TYPE string;
DEFINE FIELD shipping_address ON TABLE customer_order TYPE object;
DEFINE FIELD shipping_address.fullName ON TABLE customer_order \
    TYPE string;
DEFINE FIELD shipping_address.phone ON TABLE customer_order TYPE string;
DEFINE FIELD shipping_address.street ON TABLE customer_order TYPE string;
DEFINE FIELD shipping_address.city ON TABLE customer_order TYPE string;
DEFINE FIELD shipping_address.state ON TABLE customer_order TYPE string;
DEFINE FIELD shipping_address.country ON TABLE customer_order \
    TYPE string;
DEFINE FIELD shipping_address.postalCode ON TABLE customer_order \
    TYPE string;
DEFINE FIELD items ON TABLE customer_order TYPE array \
    ASSERT array::len($value) > 0;
DEFINE FIELD items.* ON TABLE customer_order TYPE object;
DEFINE FIELD items.*.productId ON TABLE customer_order TYPE string;
DEFINE FIELD items.*.name ON TABLE customer_order TYPE string;
DEFINE FIELD items.*.price ON TABLE customer_order TYPE number;
DEFINE FIELD items.*.image ON TABLE customer_order TYPE option<string>;
DEFINE FIELD items.*.quantity ON TABLE customer_order TYPE int \
    ASSERT $value >= 1;
DEFINE FIELD prices ON TABLE customer_order TYPE object;
DEFINE FIELD prices.itemsPrice ON TABLE customer_order TYPE number;
DEFINE FIELD prices.taxPrice ON TABLE customer_order TYPE number;
DEFINE FIELD prices.shippingPrice ON TABLE customer_order TYPE number;
DEFINE FIELD prices.totalPrice ON TABLE customer_order TYPE number;
DEFINE FIELD order_status ON TABLE customer_order TYPE string \
    ASSERT $value IN ['pending', 'processing', 'packed', 'shipped', \
    'delivered', 'cancelled', 'refunded'];
DEFINE FIELD payment_id ON TABLE customer_order TYPE option<string>;
DEFINE FIELD payment_status ON TABLE customer_order TYPE string \
    ASSERT $value IN ['created', 'paid', 'failed'];
DEFINE FIELD is_paid ON TABLE customer_order TYPE bool DEFAULT false;
DEFINE FIELD paid_at ON TABLE customer_order TYPE option<datetime>;
DEFINE FIELD delivered_at ON TABLE customer_order \
    TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE customer_order TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE customer_order TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_order_user ON TABLE customer_order COLUMNS user_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
