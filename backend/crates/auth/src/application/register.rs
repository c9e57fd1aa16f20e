//! Registration Use Case
//!
//! Starts a registration by mailing an activation OTP. No user record is
//! written here; see [`VerifyUserUseCase`](super::verify_user::VerifyUserUseCase).

use std::sync::Arc;

use platform::rate_limit::KeyValueStore;

use crate::application::input::{parse_email, parse_name, parse_password, require};
use crate::application::otp::OtpService;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};
use crate::infra::mailer::{MailTemplate, Mailer};

/// Registration input
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Registration output
pub struct RegisterOutput {
    /// Normalized address the OTP was sent to
    pub email: Email,
}

/// Registration use case (register + resend)
pub struct RegisterUseCase<U, S, M>
where
    U: UserRepository,
    S: KeyValueStore,
    M: Mailer,
{
    user_repo: Arc<U>,
    otp: Arc<OtpService<S, M>>,
}

impl<U, S, M> RegisterUseCase<U, S, M>
where
    U: UserRepository + Sync,
    S: KeyValueStore + Sync,
    M: Mailer + Sync,
{
    pub fn new(user_repo: Arc<U>, otp: Arc<OtpService<S, M>>) -> Self {
        Self { user_repo, otp }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        require(
            &[&input.name, &input.email, &input.password],
            "Missing required fields!",
        )?;
        let email = parse_email(&input.email)?;
        let name = parse_name(&input.name)?;
        // Rejected early so the user does not verify an OTP for nothing
        parse_password(input.password)?;

        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::AlreadyExists);
        }

        self.otp
            .request(&name, &email, MailTemplate::UserActivation)
            .await?;

        tracing::info!(email = %email.masked(), "Registration OTP sent");

        Ok(RegisterOutput { email })
    }

    /// Send a fresh activation OTP to an existing account
    ///
    /// Accounts only exist after the registration OTP is verified, so a
    /// pending registrant gets `UserNotFound` here. They get a new code by
    /// calling [`execute`](Self::execute) again once the cool-down ends.
    pub async fn resend(&self, email: &str) -> AuthResult<RegisterOutput> {
        require(&[email], "Email is required!")?;
        let email = parse_email(email)?;

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.otp
            .request(&user.name, &email, MailTemplate::UserActivation)
            .await?;

        tracing::info!(email = %email.masked(), "Activation OTP resent");

        Ok(RegisterOutput { email })
    }
}
