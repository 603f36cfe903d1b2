//! Shopfront Auth: password verification, JWT access and refresh
//! tokens, password-reset tokens, role checks and account management.

pub mod access;
pub mod accounts;
pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use access::authorize;
pub use accounts::{AccountService, ProfileUpdate};
pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, LoginOutput, PasswordReset, RegisterInput};
pub use token::{AccessTokenClaims, RefreshTokenClaims};
