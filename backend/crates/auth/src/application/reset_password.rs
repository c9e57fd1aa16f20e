//! Reset Password Use Case

use std::sync::Arc;

use platform::rate_limit::KeyValueStore;

use crate::application::config::AuthConfig;
use crate::application::input::{parse_email, parse_password, require};
use crate::application::otp::OtpService;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_password::UserPassword;
use crate::error::{AuthError, AuthResult};
use crate::infra::mailer::Mailer;

/// Reset password input
pub struct ResetPasswordInput {
    pub email: String,
    pub new_password: String,
}

/// Reset password use case
pub struct ResetPasswordUseCase<U, S, M>
where
    U: UserRepository,
    S: KeyValueStore,
    M: Mailer,
{
    user_repo: Arc<U>,
    otp: Arc<OtpService<S, M>>,
    config: Arc<AuthConfig>,
}

impl<U, S, M> ResetPasswordUseCase<U, S, M>
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

    pub async fn execute(&self, input: ResetPasswordInput) -> AuthResult<()> {
        require(
            &[&input.email, &input.new_password],
            "Email and new password are required!",
        )?;
        let email = parse_email(&input.email)?;

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self.otp.has_reset_grant(&email).await? {
            return Err(AuthError::ResetNotVerified);
        }

        let raw_password = parse_password(input.new_password)?;
        let pepper = self.config.pepper();

        if user
            .password_hash
            .as_ref()
            .is_some_and(|hash| hash.verify(&raw_password, pepper))
        {
            return Err(AuthError::SamePassword);
        }

        let password_hash = UserPassword::from_raw(&raw_password, pepper)?;
        if !self
            .user_repo
            .update_password(&user.user_id, &password_hash)
            .await?
        {
            return Err(AuthError::UserNotFound);
        }

        self.otp.clear_reset_grant(&email).await?;

        tracing::info!(user_id = %user.user_id, "Password reset");
        Ok(())
    }
}
