//! Authentication configuration.

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for signing access tokens (HS256).
    pub access_token_secret: String,
    /// HMAC secret for signing refresh tokens. Must differ from the
    /// access secret so one token kind can never pass as the other.
    pub refresh_token_secret: String,
    /// Access token lifetime in seconds (default: 1800 = 30 minutes).
    pub access_token_lifetime_secs: u64,
    /// Refresh token lifetime in seconds (default: 864_000 = 10 days).
    pub refresh_token_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Optional pepper prepended to passwords before Argon2id verification.
    pub pepper: Option<String>,
    /// Minimum password length for policy enforcement.
    pub min_password_length: usize,
    /// Password-reset token lifetime in seconds (default: 1800).
    pub reset_token_lifetime_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: String::new(),
            refresh_token_secret: String::new(),
            access_token_lifetime_secs: 1800,
            refresh_token_lifetime_secs: 864_000,
            jwt_issuer: "shopfront".into(),
            pepper: None,
            min_password_length: 6,
            reset_token_lifetime_secs: 1800,
        }
    }
}
