//! Outbound mail.

use async_trait::async_trait;
use shopfront_core::error::ShopResult;
use shopfront_core::models::user::User;
use tracing::info;

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send the password-reset link to `user`.
    async fn send_password_reset(&self, user: &User, reset_url: &str) -> ShopResult<()>;
}

/// Writes messages to the log instead of delivering them.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, user: &User, reset_url: &str) -> ShopResult<()> {
        info!(
            user_id = %user.id,
            to = %user.email,
            reset_url = %reset_url,
            "Password reset email"
        );
        Ok(())
    }
}
