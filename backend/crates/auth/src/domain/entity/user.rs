//! User Entity
//!
//! Account record created once the registration OTP is verified.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    email::Email, user_id::UserId, user_name::UserName, user_password::UserPassword,
    user_role::UserRole,
};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier (token `id` claim)
    pub user_id: UserId,
    /// Display name
    pub name: UserName,
    /// Login email (unique, lowercase)
    pub email: Email,
    /// Argon2id hash; `None` for accounts without a password
    pub password_hash: Option<UserPassword>,
    /// Role carried in token claims
    pub role: UserRole,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with the default role
    pub fn new(name: UserName, email: Email, password_hash: UserPassword) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            name,
            email,
            password_hash: Some(password_hash),
            role: UserRole::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_password::RawPassword;

    fn sample() -> User {
        let raw = RawPassword::new("secret1".to_string()).unwrap();
        User::new(
            UserName::new("Alice").unwrap(),
            Email::new("a@x.com").unwrap(),
            UserPassword::from_raw(&raw, None).unwrap(),
        )
    }

    #[test]
    fn test_new_user() {
        let user = sample();
        assert_eq!(user.role, UserRole::User);
        assert!(user.password_hash.is_some());
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_new_users_get_distinct_ids() {
        assert_ne!(sample().user_id, sample().user_id);
    }
}
