//! Authentication error types.

use shopfront_core::error::ShopError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("unauthorized request")]
    MissingToken,

    #[error("password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("confirm password does not match")]
    ConfirmationMismatch,

    #[error("old password is incorrect")]
    WrongOldPassword,

    #[error("new password must differ from the old password")]
    PasswordReused,

    #[error("password reset token is invalid or has expired")]
    ResetTokenInvalid,

    #[error("role '{0}' is not allowed to access this resource")]
    Forbidden(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for ShopError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_)
            | AuthError::MissingToken => ShopError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::WeakPassword(_)
            | AuthError::ConfirmationMismatch
            | AuthError::WrongOldPassword
            | AuthError::PasswordReused
            | AuthError::ResetTokenInvalid => ShopError::validation(err.to_string()),
            AuthError::Forbidden(_) => ShopError::AuthorizationDenied {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => ShopError::Crypto(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_domain_kinds() {
        assert!(matches!(
            ShopError::from(AuthError::TokenExpired),
            ShopError::AuthenticationFailed { .. }
        ));
        assert!(matches!(
            ShopError::from(AuthError::WeakPassword(6)),
            ShopError::Validation { .. }
        ));
        assert!(matches!(
            ShopError::from(AuthError::Forbidden("user".into())),
            ShopError::AuthorizationDenied { .. }
        ));
    }
}
