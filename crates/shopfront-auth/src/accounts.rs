//! Account management: self-service profile edits and the
//! administrator's user directory.

use shopfront_core::error::{ShopError, ShopResult};
use shopfront_core::models::media::ImageRef;
use shopfront_core::models::user::{CreateUser, Role, UpdateUser, User, normalize_email};
use shopfront_core::repository::{PaginatedResult, Pagination, UserRepository};
use tracing::info;
use uuid::Uuid;

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<ImageRef>,
}

pub struct AccountService<U: UserRepository> {
    user_repo: U,
}

impl<U: UserRepository> AccountService<U> {
    pub fn new(user_repo: U) -> Self {
        Self { user_repo }
    }

    pub async fn profile(&self, user_id: Uuid) -> ShopResult<User> {
        self.user_repo.get_by_id(user_id).await
    }

    /// Apply a profile update. Returns the updated user and the avatar it
    /// replaced, if any, so the caller can discard the old media.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> ShopResult<(User, Option<ImageRef>)> {
        let current = self.user_repo.get_by_id(user_id).await?;

        let full_name = update
            .full_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let email = update.email.map(|e| normalize_email(&e)).filter(|e| !e.is_empty());
        if email.as_ref().is_some_and(|e| !e.contains('@')) {
            return Err(ShopError::validation("Please provide a valid email"));
        }
        let phone = update.phone.filter(|p| !p.trim().is_empty());
        let replaced = match &update.avatar {
            Some(_) => current.avatar.clone(),
            None => None,
        };

        let changes = UpdateUser {
            full_name,
            email,
            phone,
            avatar: update.avatar,
            ..Default::default()
        };
        if changes.is_empty() {
            return Ok((current, None));
        }

        let user = self
            .user_repo
            .update(user_id, changes)
            .await
            .map_err(|e| match e {
                ShopError::AlreadyExists { .. } => ShopError::AlreadyExists {
                    entity: "User with this email".into(),
                },
                other => other,
            })?;
        Ok((user, replaced))
    }

    pub async fn list_users(&self, pagination: Pagination) -> ShopResult<PaginatedResult<User>> {
        self.user_repo.list(pagination).await
    }

    pub async fn get_user(&self, user_id: Uuid) -> ShopResult<User> {
        self.user_repo.get_by_id(user_id).await
    }

    /// Change a user's role. `role` is the raw value from the request.
    pub async fn update_role(&self, user_id: Uuid, role: Option<&str>) -> ShopResult<User> {
        let role = match role.map(str::trim).filter(|r| !r.is_empty()) {
            Some(r) => r.parse::<Role>().map_err(ShopError::validation)?,
            None => return Err(ShopError::validation("Please select a role (user or admin)")),
        };

        self.user_repo.get_by_id(user_id).await?;
        let user = self
            .user_repo
            .update(
                user_id,
                UpdateUser {
                    role: Some(role),
                    ..Default::default()
                },
            )
            .await?;
        info!(user_id = %user_id, role = %role, "User role updated");
        Ok(user)
    }

    /// Remove an account. Returns the removed user so its avatar can be
    /// discarded.
    pub async fn delete_user(&self, user_id: Uuid) -> ShopResult<User> {
        let user = self.user_repo.delete(user_id).await?;
        info!(user_id = %user_id, "User deleted");
        Ok(user)
    }

    /// Make sure an administrator account exists for `email`, creating it
    /// or promoting the existing account.
    pub async fn ensure_admin(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> ShopResult<User> {
        match self.user_repo.get_by_email(email).await {
            Ok(user) if user.role == Role::Admin => Ok(user),
            Ok(user) => {
                info!(user_id = %user.id, "Promoting bootstrap administrator");
                self.user_repo
                    .update(
                        user.id,
                        UpdateUser {
                            role: Some(Role::Admin),
                            ..Default::default()
                        },
                    )
                    .await
            }
            Err(ShopError::NotFound { .. }) => {
                let user = self
                    .user_repo
                    .create(CreateUser {
                        full_name: full_name.to_string(),
                        email: email.to_string(),
                        phone: None,
                        password: password.to_string(),
                        avatar: None,
                        role: Role::Admin,
                    })
                    .await?;
                info!(user_id = %user.id, "Bootstrap administrator created");
                Ok(user)
            }
            Err(e) => Err(e),
        }
    }
}
