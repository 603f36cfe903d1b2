//! Authentication service: registration, login, token rotation and
//! password recovery.

use chrono::{DateTime, Duration, Utc};
use shopfront_core::error::{ShopError, ShopResult};
use shopfront_core::models::media::ImageRef;
use shopfront_core::models::user::{CreateUser, Role, UpdateUser, User, normalize_email};
use shopfront_core::repository::UserRepository;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Input for self-service registration. The role is always `user`.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub avatar: Option<ImageRef>,
}

/// Successful login or refresh result.
#[derive(Debug)]
pub struct LoginOutput {
    pub user: User,
    /// Signed JWT access token.
    pub access_token: String,
    /// Signed JWT refresh token; the same value is stored on the user.
    pub refresh_token: String,
}

/// A freshly issued password-reset token.
#[derive(Debug)]
pub struct PasswordReset {
    pub user: User,
    /// Raw token for the reset link. Never stored.
    pub raw_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Authentication service.
///
/// Generic over the user repository so that the auth layer has no
/// dependency on the database crate.
pub struct AuthService<U: UserRepository> {
    user_repo: U,
    config: AuthConfig,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(user_repo: U, config: AuthConfig) -> Self {
        Self { user_repo, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Create a `user`-role account.
    pub async fn register(&self, input: RegisterInput) -> ShopResult<User> {
        if input.full_name.trim().is_empty() {
            return Err(ShopError::validation("Please provide fullName"));
        }
        let email = normalize_email(&input.email);
        if !email.contains('@') {
            return Err(ShopError::validation("Please provide a valid email"));
        }
        password::check_policy(&input.password, self.config.min_password_length)?;

        let user = self
            .user_repo
            .create(CreateUser {
                full_name: input.full_name,
                email,
                phone: input.phone,
                password: input.password,
                avatar: input.avatar,
                role: Role::User,
            })
            .await
            .map_err(|e| match e {
                ShopError::AlreadyExists { .. } => ShopError::AlreadyExists {
                    entity: "User with this email".into(),
                },
                other => other,
            })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Authenticate with email + password and issue a token pair.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> ShopResult<LoginOutput> {
        let user = match self.user_repo.get_by_email(email).await {
            Ok(u) => u,
            Err(ShopError::NotFound { .. }) => return Err(AuthError::InvalidCredentials.into()),
            Err(e) => return Err(e),
        };

        let valid =
            password::verify_password(password, &user.password_hash, self.config.pepper.as_deref())?;
        if !valid {
            warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let output = self.issue_pair(user).await?;
        info!(user_id = %output.user.id, "User logged in");
        Ok(output)
    }

    /// Rotate tokens. The presented refresh token must be the one most
    /// recently issued to its subject.
    pub async fn refresh(&self, raw_refresh_token: &str) -> ShopResult<LoginOutput> {
        if raw_refresh_token.is_empty() {
            return Err(AuthError::MissingToken.into());
        }
        let claims = token::decode_refresh_token(raw_refresh_token, &self.config)?;
        let user = self
            .user_repo
            .get_by_id(claims.user_id()?)
            .await
            .map_err(|e| match e {
                ShopError::NotFound { .. } => {
                    AuthError::TokenInvalid("user no longer exists".into()).into()
                }
                other => other,
            })?;

        if user.refresh_token.as_deref() != Some(raw_refresh_token) {
            warn!(user_id = %user.id, "Refresh token mismatch");
            return Err(AuthError::TokenInvalid("token mismatched or expired".into()).into());
        }

        self.issue_pair(user).await
    }

    /// Forget the stored refresh token so it can no longer be rotated.
    pub async fn logout(&self, user_id: Uuid) -> ShopResult<()> {
        self.user_repo
            .update(
                user_id,
                UpdateUser {
                    refresh_token: Some(None),
                    ..Default::default()
                },
            )
            .await?;
        info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    /// Resolve an access token to the current user record.
    pub async fn authenticate(&self, access_token: &str) -> ShopResult<User> {
        let claims = token::decode_access_token(access_token, &self.config)?;
        match self.user_repo.get_by_id(claims.user_id()?).await {
            Ok(user) => Ok(user),
            Err(ShopError::NotFound { .. }) => {
                Err(AuthError::TokenInvalid("user no longer exists".into()).into())
            }
            Err(e) => Err(e),
        }
    }

    /// Issue a reset token for the account behind `email`.
    ///
    /// Returns `None` for unknown addresses so callers can answer
    /// uniformly.
    pub async fn request_password_reset(&self, email: &str) -> ShopResult<Option<PasswordReset>> {
        let user = match self.user_repo.get_by_email(email).await {
            Ok(u) => u,
            Err(ShopError::NotFound { .. }) => {
                info!("Password reset requested for unknown email");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let (raw_token, token_hash) = token::generate_reset_token();
        let expires_at =
            Utc::now() + Duration::seconds(self.config.reset_token_lifetime_secs as i64);

        let user = self
            .user_repo
            .update(
                user.id,
                UpdateUser {
                    reset_password_token: Some(Some(token_hash)),
                    reset_password_expires_at: Some(Some(expires_at)),
                    ..Default::default()
                },
            )
            .await?;

        info!(user_id = %user.id, "Password reset token issued");
        Ok(Some(PasswordReset {
            user,
            raw_token,
            expires_at,
        }))
    }

    /// Set a new password using a reset token. The token is consumed.
    pub async fn reset_password(
        &self,
        raw_token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> ShopResult<User> {
        password::check_new_password(
            new_password,
            confirm_password,
            self.config.min_password_length,
        )?;

        let token_hash = token::hash_reset_token(raw_token);
        let user = match self.user_repo.get_by_reset_token(&token_hash).await {
            Ok(u) => u,
            Err(ShopError::NotFound { .. }) => return Err(AuthError::ResetTokenInvalid.into()),
            Err(e) => return Err(e),
        };

        let user = self.user_repo.set_password(user.id, new_password).await?;
        info!(user_id = %user.id, "Password reset");
        Ok(user)
    }

    /// Change the password of a signed-in user.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> ShopResult<()> {
        if old_password.is_empty() || new_password.is_empty() || confirm_password.is_empty() {
            return Err(ShopError::validation("All fields are required"));
        }

        let user = self.user_repo.get_by_id(user_id).await?;
        let valid = password::verify_password(
            old_password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            return Err(AuthError::WrongOldPassword.into());
        }
        if old_password == new_password {
            return Err(AuthError::PasswordReused.into());
        }
        password::check_new_password(
            new_password,
            confirm_password,
            self.config.min_password_length,
        )?;

        self.user_repo.set_password(user_id, new_password).await?;
        info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    async fn issue_pair(&self, user: User) -> ShopResult<LoginOutput> {
        let access_token = token::issue_access_token(&user, &self.config)?;
        let refresh_token = token::issue_refresh_token(user.id, &self.config)?;

        let user = self
            .user_repo
            .update(
                user.id,
                UpdateUser {
                    refresh_token: Some(Some(refresh_token.clone())),
                    ..Default::default()
                },
            )
            .await?;

        Ok(LoginOutput {
            user,
            access_token,
            refresh_token,
        })
    }
}
