//! User Info Use Case
//!
//! Resolves the user behind an access token.

use std::sync::Arc;

use crate::application::token::TokenIssuer;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};

/// User info use case
pub struct UserInfoUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    tokens: Arc<TokenIssuer>,
}

impl<U> UserInfoUseCase<U>
where
    U: UserRepository + Sync,
{
    pub fn new(user_repo: Arc<U>, tokens: Arc<TokenIssuer>) -> Self {
        Self { user_repo, tokens }
    }

    /// The account must still exist for the token to count
    pub async fn execute(&self, access_token: Option<&str>) -> AuthResult<User> {
        let access_token = access_token
            .filter(|t| !t.trim().is_empty())
            .ok_or(AuthError::Unauthorized("token missing."))?;

        let claims = self.tokens.verify_access(access_token)?;
        let user_id = claims.user_id()?;

        self.user_repo
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::Unauthorized("user not found."))
    }
}
