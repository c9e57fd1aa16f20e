//! Refresh Use Case
//!
//! Exchanges a refresh token for a new access token.

use std::sync::Arc;

use crate::application::refresh_queue::RefreshQueue;
use crate::application::token::TokenIssuer;
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};

/// Refresh use case
pub struct RefreshUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    tokens: Arc<TokenIssuer>,
    queue: Arc<RefreshQueue>,
}

impl<U> RefreshUseCase<U>
where
    U: UserRepository + Sync,
{
    pub fn new(user_repo: Arc<U>, tokens: Arc<TokenIssuer>, queue: Arc<RefreshQueue>) -> Self {
        Self {
            user_repo,
            tokens,
            queue,
        }
    }

    /// Returns a fresh access token
    pub async fn execute(&self, refresh_token: Option<&str>) -> AuthResult<String> {
        let refresh_token = refresh_token
            .filter(|t| !t.trim().is_empty())
            .ok_or(AuthError::Unauthorized("token missing."))?;

        self.queue
            .run(refresh_token, || async {
                let claims = self.tokens.verify_refresh(refresh_token)?;
                let user_id = claims.user_id()?;

                let user = self
                    .user_repo
                    .find_by_id(&user_id)
                    .await?
                    .ok_or(AuthError::Unauthorized("user not found."))?;

                let access_token = self.tokens.issue_access(&user.user_id, user.role)?;
                tracing::info!(user_id = %user.user_id, "Access token refreshed");
                Ok::<_, AuthError>(access_token)
            })
            .await
    }
}
