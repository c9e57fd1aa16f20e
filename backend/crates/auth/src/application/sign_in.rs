//! Sign In Use Case
//!
//! Authenticates a user by email and password and issues a token pair.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::input::{parse_email, require};
use crate::application::token::{TokenIssuer, TokenPair};
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_password::RawPassword;
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Sign in output
pub struct SignInOutput {
    pub user: User,
    pub tokens: TokenPair,
}

/// Sign in use case
pub struct SignInUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    tokens: Arc<TokenIssuer>,
    config: Arc<AuthConfig>,
}

impl<U> SignInUseCase<U>
where
    U: UserRepository + Sync,
{
    pub fn new(user_repo: Arc<U>, tokens: Arc<TokenIssuer>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            tokens,
            config,
        }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutput> {
        require(&[&input.email, &input.password], "Credentials are required!")?;
        let email = parse_email(&input.email)?;

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        // A password that fails today's policy cannot match a stored hash
        let raw_password =
            RawPassword::new(input.password).map_err(|_| AuthError::InvalidCredentials)?;

        let password_valid = user
            .password_hash
            .as_ref()
            .is_some_and(|hash| hash.verify(&raw_password, self.config.pepper()));

        if !password_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.tokens.issue_pair(&user)?;

        tracing::info!(
            user_id = %user.user_id,
            email = %user.email.masked(),
            "User signed in"
        );

        Ok(SignInOutput { user, tokens })
    }
}
