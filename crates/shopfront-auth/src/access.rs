//! Role-based access checks.

use shopfront_core::models::user::{Role, User};

use crate::error::AuthError;

/// Allow the request only if the user's role is in `allowed`.
pub fn authorize(user: &User, allowed: &[Role]) -> Result<(), AuthError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden(user.role.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user_with(role: Role) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            full_name: "Test".into(),
            email: "t@example.com".into(),
            phone: None,
            password_hash: String::new(),
            avatar: None,
            role,
            refresh_token: None,
            reset_password_token: None,
            reset_password_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn admin_only_rejects_users() {
        assert!(authorize(&user_with(Role::Admin), &[Role::Admin]).is_ok());
        assert!(matches!(
            authorize(&user_with(Role::User), &[Role::Admin]),
            Err(AuthError::Forbidden(role)) if role == "user"
        ));
    }

    #[test]
    fn shared_routes_allow_both() {
        let both = [Role::User, Role::Admin];
        assert!(authorize(&user_with(Role::User), &both).is_ok());
        assert!(authorize(&user_with(Role::Admin), &both).is_ok());
    }
}
