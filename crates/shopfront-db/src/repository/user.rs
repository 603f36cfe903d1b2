//! SurrealDB implementation of [`UserRepository`].
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1). Salt is randomly
//! generated per hash. An optional pepper (server-side secret) can be
//! provided at construction time.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use shopfront_core::error::ShopResult;
use shopfront_core::models::media::{ImageRef, MediaKind};
use shopfront_core::models::user::{CreateUser, Role, UpdateUser, User, normalize_email};
use shopfront_core::repository::{PaginatedResult, Pagination, UserRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid};
use crate::error::DbError;

const SELECT_USER: &str = "SELECT meta::id(id) AS record_id, * FROM";

#[derive(Debug, SurrealValue)]
struct UserRow {
    record_id: String,
    full_name: String,
    email: String,
    phone: Option<String>,
    password_hash: String,
    avatar_public_id: Option<String>,
    avatar_url: Option<String>,
    role: String,
    refresh_token: Option<String>,
    reset_password_token: Option<String>,
    reset_password_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, DbError> {
        let avatar = match (self.avatar_public_id, self.avatar_url) {
            (Some(public_id), Some(url)) => Some(ImageRef {
                public_id,
                url,
                kind: MediaKind::Image,
            }),
            _ => None,
        };
        Ok(User {
            id: parse_uuid("user", &self.record_id)?,
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            password_hash: self.password_hash,
            avatar,
            role: self.role.parse::<Role>().map_err(DbError::Decode)?,
            refresh_token: self.refresh_token,
            reset_password_token: self.reset_password_token,
            reset_password_expires_at: self.reset_password_expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn first_user(rows: Vec<UserRow>, id: impl ToString) -> Result<User, DbError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| DbError::not_found("user", id))?
        .try_into_user()
}

/// Hash a password with Argon2id using OWASP-recommended parameters.
///
/// If a pepper is provided, it is prepended to the password before
/// hashing. The salt is randomly generated for each call.
pub fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Hash(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| DbError::Hash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a password against an Argon2id hash.
///
/// Public for use by the auth layer.
pub fn verify_password(password: &str, hash: &str, pepper: Option<&str>) -> Result<bool, DbError> {
    use argon2::PasswordVerifier;

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let parsed_hash =
        argon2::PasswordHash::new(hash).map_err(|e| DbError::Hash(format!("invalid hash: {e}")))?;

    match Argon2::default().verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(DbError::Hash(format!("verify error: {e}"))),
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: Option<String>) -> Self {
        Self { db, pepper }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> ShopResult<User> {
        let id_str = Uuid::new_v4().to_string();
        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;
        let (avatar_public_id, avatar_url) = match input.avatar {
            Some(img) => (Some(img.public_id), Some(img.url)),
            None => (None, None),
        };

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 full_name = $full_name, email = $email, \
                 phone = $phone, password_hash = $password_hash, \
                 avatar_public_id = $avatar_public_id, \
                 avatar_url = $avatar_url, role = $role; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('user', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("full_name", input.full_name.trim().to_string()))
            .bind(("email", normalize_email(&input.email)))
            .bind(("phone", input.phone))
            .bind(("password_hash", password_hash))
            .bind(("avatar_public_id", avatar_public_id))
            .bind(("avatar_url", avatar_url))
            .bind(("role", input.role.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("user", e))?;

        let rows: Vec<UserRow> = result.take(1).map_err(DbError::from)?;
        Ok(first_user(rows, id_str)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ShopResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(format!("{SELECT_USER} type::record('user', $id)"))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_user(rows, id_str)?)
    }

    async fn get_by_email(&self, email: &str) -> ShopResult<User> {
        let email = normalize_email(email);

        let mut result = self
            .db
            .query(format!("{SELECT_USER} user WHERE email = $email"))
            .bind(("email", email.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_user(rows, format!("email={email}"))?)
    }

    async fn get_by_reset_token(&self, token_hash: &str) -> ShopResult<User> {
        let mut result = self
            .db
            .query(format!(
                "{SELECT_USER} user WHERE reset_password_token = $reset_hash \
                 AND reset_password_expires_at > time::now()"
            ))
            .bind(("reset_hash", token_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_user(rows, "reset-token")?)
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> ShopResult<User> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.full_name.is_some() {
            sets.push("full_name = $full_name");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.avatar.is_some() {
            sets.push("avatar_public_id = $avatar_public_id");
            sets.push("avatar_url = $avatar_url");
        }
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if input.refresh_token.is_some() {
            sets.push("refresh_token = $refresh_token");
        }
        if input.reset_password_token.is_some() {
            sets.push("reset_password_token = $reset_password_token");
        }
        if input.reset_password_expires_at.is_some() {
            sets.push("reset_password_expires_at = $reset_password_expires_at");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('user', $id) SET {}; \
             {SELECT_USER} type::record('user', $id);",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(full_name) = input.full_name {
            builder = builder.bind(("full_name", full_name.trim().to_string()));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", normalize_email(&email)));
        }
        if let Some(phone) = input.phone {
            builder = builder.bind(("phone", phone));
        }
        if let Some(avatar) = input.avatar {
            builder = builder
                .bind(("avatar_public_id", avatar.public_id))
                .bind(("avatar_url", avatar.url));
        }
        if let Some(role) = input.role {
            builder = builder.bind(("role", role.as_str().to_string()));
        }
        if let Some(refresh_token) = input.refresh_token {
            // Some(None) clears the stored token
            builder = builder.bind(("refresh_token", refresh_token));
        }
        if let Some(token) = input.reset_password_token {
            builder = builder.bind(("reset_password_token", token));
        }
        if let Some(expires_at) = input.reset_password_expires_at {
            builder = builder.bind(("reset_password_expires_at", expires_at));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("user", e))?;

        let rows: Vec<UserRow> = result.take(1).map_err(DbError::from)?;
        Ok(first_user(rows, id_str)?)
    }

    async fn set_password(&self, id: Uuid, password: &str) -> ShopResult<User> {
        let id_str = id.to_string();
        let password_hash = hash_password(password, self.pepper.as_deref())?;

        let result = self
            .db
            .query(format!(
                "UPDATE type::record('user', $id) SET \
                 password_hash = $password_hash, \
                 reset_password_token = NONE, \
                 reset_password_expires_at = NONE, \
                 updated_at = time::now(); \
                 {SELECT_USER} type::record('user', $id);"
            ))
            .bind(("id", id_str.clone()))
            .bind(("password_hash", password_hash))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("user", e))?;

        let rows: Vec<UserRow> = result.take(1).map_err(DbError::from)?;
        Ok(first_user(rows, id_str)?)
    }

    async fn delete(&self, id: Uuid) -> ShopResult<User> {
        let user = self.get_by_id(id).await?;

        self.db
            .query("DELETE type::record('user', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_check("user", e))?;

        Ok(user)
    }

    async fn list(&self, pagination: Pagination) -> ShopResult<PaginatedResult<User>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM user GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "{SELECT_USER} user \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset"
            ))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(UserRow::try_into_user)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_with_pepper() {
        let hash = hash_password("s3cret!", Some("pepper")).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("s3cret!", &hash, Some("pepper")).unwrap());
        assert!(!verify_password("s3cret!", &hash, None).unwrap());
        assert!(!verify_password("wrong", &hash, Some("pepper")).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("x", "not-a-hash", None).is_err());
    }
}
