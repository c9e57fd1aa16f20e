//! Forgot Password Use Case
//!
//! Mails a reset OTP to an existing account and verifies it.

use std::sync::Arc;

use platform::rate_limit::KeyValueStore;

use crate::application::input::{parse_email, require};
use crate::application::otp::OtpService;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};
use crate::infra::mailer::{MailTemplate, Mailer};

/// Forgot password use case (request + verify)
pub struct ForgotPasswordUseCase<U, S, M>
where
    U: UserRepository,
    S: KeyValueStore,
    M: Mailer,
{
    user_repo: Arc<U>,
    otp: Arc<OtpService<S, M>>,
}

impl<U, S, M> ForgotPasswordUseCase<U, S, M>
where
    U: UserRepository + Sync,
    S: KeyValueStore + Sync,
    M: Mailer + Sync,
{
    pub fn new(user_repo: Arc<U>, otp: Arc<OtpService<S, M>>) -> Self {
        Self { user_repo, otp }
    }

    async fn find_user(&self, email: &str) -> AuthResult<User> {
        let email = parse_email(email)?;
        self.user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Mail a reset OTP
    pub async fn request(&self, email: &str) -> AuthResult<()> {
        require(&[email], "Email is required!")?;
        let user = self.find_user(email).await?;

        self.otp
            .request(&user.name, &user.email, MailTemplate::ForgotPassword)
            .await?;

        tracing::info!(email = %user.email.masked(), "Password reset OTP sent");
        Ok(())
    }

    /// Check the reset OTP; success allows one password reset
    pub async fn verify(&self, email: &str, otp: &str) -> AuthResult<()> {
        require(&[email, otp], "Email and OTP are required!")?;
        let user = self.find_user(email).await?;

        self.otp.verify(&user.email, otp).await?;
        self.otp.grant_reset(&user.email).await?;

        tracing::info!(email = %user.email.masked(), "Password reset OTP verified");
        Ok(())
    }
}
