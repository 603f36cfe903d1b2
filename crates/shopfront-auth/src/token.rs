//! JWT access/refresh token issuance and verification, and opaque
//! password-reset tokens.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use shopfront_core::models::user::{Role, User};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// JWT claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject: the user ID (UUID string).
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID (UUID string).
    pub jti: String,
}

/// JWT claims embedded in every refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl AccessTokenClaims {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|e| AuthError::TokenInvalid(format!("bad subject: {e}")))
    }
}

impl RefreshTokenClaims {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|e| AuthError::TokenInvalid(format!("bad subject: {e}")))
    }
}

fn encode<T: Serialize>(claims: &T, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::Crypto("token secret is not configured".into()));
    }
    let key = EncodingKey::from_secret(secret.as_bytes());
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

fn decode<T: DeserializeOwned>(token: &str, secret: &str, issuer: &str) -> Result<T, AuthError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

    jsonwebtoken::decode::<T>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })
}

/// Issue a signed HS256 access token for `user`.
pub fn issue_access_token(user: &User, config: &AuthConfig) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = AccessTokenClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role,
        iss: config.jwt_issuer.clone(),
        iat: now,
        exp: now + config.access_token_lifetime_secs as i64,
        jti: Uuid::new_v4().to_string(),
    };
    encode(&claims, &config.access_token_secret)
}

/// Issue a signed HS256 refresh token for the user with `user_id`.
pub fn issue_refresh_token(user_id: Uuid, config: &AuthConfig) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = RefreshTokenClaims {
        sub: user_id.to_string(),
        iss: config.jwt_issuer.clone(),
        iat: now,
        exp: now + config.refresh_token_lifetime_secs as i64,
        jti: Uuid::new_v4().to_string(),
    };
    encode(&claims, &config.refresh_token_secret)
}

/// Decode and verify an access token (signature, expiry, issuer).
///
/// Purely stateless; the caller resolves the subject.
pub fn decode_access_token(
    token: &str,
    config: &AuthConfig,
) -> Result<AccessTokenClaims, AuthError> {
    decode(token, &config.access_token_secret, &config.jwt_issuer)
}

pub fn decode_refresh_token(
    token: &str,
    config: &AuthConfig,
) -> Result<RefreshTokenClaims, AuthError> {
    decode(token, &config.refresh_token_secret, &config.jwt_issuer)
}

/// Generate a password-reset token: 20 random bytes, hex-encoded.
///
/// Returns `(raw, hash)`. The raw token goes into the reset link, only
/// the hash is stored.
pub fn generate_reset_token() -> (String, String) {
    let mut rng = rand::rng();
    let bytes: [u8; 20] = rand::Rng::random(&mut rng);
    let raw = hex::encode(bytes);
    let hash = hash_reset_token(&raw);
    (raw, hash)
}

/// SHA-256 hash of a raw reset token, hex-encoded.
pub fn hash_reset_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            access_token_secret: "access-secret".into(),
            refresh_token_secret: "refresh-secret".into(),
            jwt_issuer: "shopfront-test".into(),
            ..Default::default()
        }
    }

    fn test_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            full_name: "Asha".into(),
            email: "asha@example.com".into(),
            phone: None,
            password_hash: String::new(),
            avatar: None,
            role: Role::Admin,
            refresh_token: None,
            reset_password_token: None,
            reset_password_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn access_token_carries_identity() {
        let config = test_config();
        let user = test_user();

        let token = issue_access_token(&user, &config).unwrap();
        let claims = decode_access_token(&token, &config).unwrap();

        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.email, "asha@example.com");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.iss, "shopfront-test");
        assert_eq!(claims.exp - claims.iat, 1800);
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let config = test_config();
        let user = test_user();

        let access = issue_access_token(&user, &config).unwrap();
        let refresh = issue_refresh_token(user.id, &config).unwrap();

        assert!(decode_refresh_token(&access, &config).is_err());
        assert!(decode_access_token(&refresh, &config).is_err());
        assert_eq!(
            decode_refresh_token(&refresh, &config).unwrap().user_id().unwrap(),
            user.id
        );
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let config = test_config();
        let token = issue_access_token(&test_user(), &config).unwrap();

        let other = AuthConfig {
            jwt_issuer: "someone-else".into(),
            ..test_config()
        };
        assert!(matches!(
            decode_access_token(&token, &other),
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let config = test_config();
        let now = Utc::now().timestamp();
        let claims = RefreshTokenClaims {
            sub: Uuid::new_v4().to_string(),
            iss: config.jwt_issuer.clone(),
            iat: now - 7200,
            exp: now - 3600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(&claims, &config.refresh_token_secret).unwrap();
        assert!(matches!(
            decode_refresh_token(&token, &config),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn missing_secret_is_a_crypto_error() {
        let config = AuthConfig::default();
        assert!(matches!(
            issue_access_token(&test_user(), &config),
            Err(AuthError::Crypto(_))
        ));
    }

    #[test]
    fn jti_is_unique() {
        let config = test_config();
        let user = test_user();
        let c1 = decode_access_token(&issue_access_token(&user, &config).unwrap(), &config).unwrap();
        let c2 = decode_access_token(&issue_access_token(&user, &config).unwrap(), &config).unwrap();
        assert_ne!(c1.jti, c2.jti);
    }

    #[test]
    fn reset_token_shape_and_hash() {
        let (raw, hash) = generate_reset_token();
        assert_eq!(raw.len(), 40);
        assert!(raw.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, hash_reset_token(&raw));
        assert_eq!(hash.len(), 64);
        assert_ne!(generate_reset_token().0, raw);
    }
}
