//! Outbound mail
//!
//! OTP mails are plain text rendered from a [`MailTemplate`]. Delivery goes
//! through SMTP ([`SmtpMailer`]) or is captured in memory ([`MemoryMailer`]).

use std::sync::{Arc, Mutex};

use lettre::message::{Mailbox, Message, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Mail templates known to the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTemplate {
    /// Registration / resend OTP
    UserActivation,
    /// Forgot-password OTP
    ForgotPassword,
}

impl MailTemplate {
    /// Template identifier
    pub fn name(&self) -> &'static str {
        match self {
            MailTemplate::UserActivation => "user-activation-mail",
            MailTemplate::ForgotPassword => "forgot-password-user-mail",
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            MailTemplate::UserActivation => "Verify Your Email",
            MailTemplate::ForgotPassword => "Reset Your Password",
        }
    }

    /// Render the plain-text body
    pub fn render(&self, vars: &MailVars) -> String {
        match self {
            MailTemplate::UserActivation => format!(
                "Hi {name},\n\n\
                Thank you for signing up. Use the code below to activate your account:\n\n\
                {otp}\n\n\
                This code expires in 5 minutes.\n\
                If you did not request this, please ignore this email.",
                name = vars.name,
                otp = vars.otp,
            ),
            MailTemplate::ForgotPassword => format!(
                "Hi {name},\n\n\
                We received a request to reset your password. Use the code below to continue:\n\n\
                {otp}\n\n\
                This code expires in 5 minutes.\n\
                If you did not request this, please ignore this email.",
                name = vars.name,
                otp = vars.otp,
            ),
        }
    }
}

/// Variables substituted into a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailVars {
    pub name: String,
    pub otp: String,
}

/// Mail delivery trait
#[trait_variant::make(Mailer: Send)]
pub trait LocalMailer {
    async fn send(
        &self,
        to: &Email,
        subject: &str,
        template: MailTemplate,
        vars: &MailVars,
    ) -> AuthResult<()>;
}

// ============================================================================
// SMTP
// ============================================================================

/// SMTP connection settings
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    /// Empty host selects log-only mode
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 465,
            username: None,
            password: None,
            from: "no-reply@example.com".to_string(),
        }
    }
}

/// SMTP mailer (or log-only when no host is configured)
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> AuthResult<Self> {
        let from = settings
            .from
            .parse::<Mailbox>()
            .map_err(|e| AuthError::Internal(format!("Invalid SMTP_FROM address: {}", e)))?;

        let transport = if settings.host.trim().is_empty() {
            tracing::warn!("SMTP host not configured; mails will be logged, not sent");
            None
        } else {
            let builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
                .map_err(|e| {
                    AuthError::Internal(format!("Failed to configure SMTP transport: {}", e))
                })?
                .port(settings.port);

            let builder = if let (Some(username), Some(password)) =
                (&settings.username, &settings.password)
            {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            } else {
                builder
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self { transport, from })
    }

    /// Check if SMTP transport is enabled
    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }
}

impl Mailer for SmtpMailer {
    async fn send(
        &self,
        to: &Email,
        subject: &str,
        template: MailTemplate,
        vars: &MailVars,
    ) -> AuthResult<()> {
        let body = template.render(vars);

        let Some(transport) = &self.transport else {
            tracing::info!(
                to = %to.masked(),
                template = template.name(),
                "Mail transport disabled; skipping send"
            );
            tracing::debug!(body = %body, "Unsent mail body");
            return Ok(());
        };

        let recipient = to
            .as_str()
            .parse::<Mailbox>()
            .map_err(|e| AuthError::Mail(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AuthError::Mail(format!("Failed to build message: {}", e)))?;

        transport
            .send(message)
            .await
            .map_err(|e| AuthError::Mail(format!("Failed to send mail: {}", e)))?;

        tracing::info!(to = %to.masked(), template = template.name(), "Mail sent");
        Ok(())
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// A captured message
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub template: MailTemplate,
    pub vars: MailVars,
    pub body: String,
}

/// Mailer that keeps every message in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<SentMail>>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of captured messages, oldest first
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Most recent OTP mailed to `to`
    pub fn last_otp_for(&self, to: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|m| m.to == to)
            .map(|m| m.vars.otp)
    }
}

impl Mailer for MemoryMailer {
    async fn send(
        &self,
        to: &Email,
        subject: &str,
        template: MailTemplate,
        vars: &MailVars,
    ) -> AuthResult<()> {
        let mail = SentMail {
            to: to.as_str().to_string(),
            subject: subject.to_string(),
            template,
            vars: vars.clone(),
            body: template.render(vars),
        };

        self.sent
            .lock()
            .map_err(|_| AuthError::Mail("memory mailer poisoned".to_string()))?
            .push(mail);
        Ok(())
    }
}
