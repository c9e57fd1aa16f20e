//! Verify User Use Case
//!
//! Completes a registration: checks the OTP, then creates the account.

use std::sync::Arc;

use platform::rate_limit::KeyValueStore;

use crate::application::config::AuthConfig;
use crate::application::input::{parse_email, parse_name, parse_password, require};
use crate::application::otp::OtpService;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_password::UserPassword;
use crate::error::{AuthError, AuthResult};
use crate::infra::mailer::Mailer;

/// Verify user input
pub struct VerifyUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub otp: String,
}

/// Verify user use case
pub struct VerifyUserUseCase<U, S, M>
where
    U: UserRepository,
    S: KeyValueStore,
    M: Mailer,
{
    user_repo: Arc<U>,
    otp: Arc<OtpService<S, M>>,
    config: Arc<AuthConfig>,
}

impl<U, S, M> VerifyUserUseCase<U, S, M>
where
    U: UserRepository + Sync,
    S: KeyValueStore + Sync,
    M: Mailer + Sync,
{
    pub fn new(user_repo: Arc<U>, otp: Arc<OtpService<S, M>>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            otp,
            config,
        }
    }

    pub async fn execute(&self, input: VerifyUserInput) -> AuthResult<User> {
        require(
            &[&input.name, &input.email, &input.password, &input.otp],
            "All fields are required!",
        )?;
        let email = parse_email(&input.email)?;
        let name = parse_name(&input.name)?;
        let raw_password = parse_password(input.password)?;

        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::AlreadyExists);
        }

        self.otp.verify(&email, &input.otp).await?;

        // Hashed only now, after the OTP proved control of the address
        let password_hash = UserPassword::from_raw(&raw_password, self.config.pepper())?;
        let user = User::new(name, email, password_hash);

        self.user_repo.create(&user).await?;

        tracing::info!(
            user_id = %user.user_id,
            email = %user.email.masked(),
            "User registered"
        );

        Ok(user)
    }
}
