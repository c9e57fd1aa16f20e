//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use std::fmt;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::rate_limit::StoreError;
use serde_json::json;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Why a new OTP cannot be issued right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpRestriction {
    /// Too many failed verifications
    Locked,
    /// Too many OTP requests in the request window
    SpamLocked,
    /// An OTP was issued moments ago
    CoolDown,
}

impl OtpRestriction {
    pub fn code(&self) -> &'static str {
        match self {
            OtpRestriction::Locked => "otp_locked",
            OtpRestriction::SpamLocked => "otp_spam_locked",
            OtpRestriction::CoolDown => "otp_cool_down",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            OtpRestriction::Locked => {
                "Account locked due to multiple failed attempts! Try again after 30 minutes"
            }
            OtpRestriction::SpamLocked => {
                "Too many OTP requests! Please wait 1 hour before requesting again."
            }
            OtpRestriction::CoolDown => "Please wait 1 minute before requesting for new OTP!",
        }
    }
}

impl fmt::Display for OtpRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

fn attempts(n: &u32) -> String {
    match n {
        1 => "1 attempt".to_string(),
        n => format!("{n} attempts"),
    }
}

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed or missing input
    #[error("{message}")]
    Validation {
        message: String,
        action: Option<String>,
    },

    /// Email is already registered
    #[error("User already exists with this email!")]
    AlreadyExists,

    /// OTP issuance blocked by a lock, spam lock or cool-down
    #[error("{reason}")]
    RateLimited {
        reason: OtpRestriction,
        retry_after: Option<Duration>,
    },

    /// No OTP stored for this email (never issued, expired, or consumed)
    #[error("Invalid or expired OTP!")]
    InvalidOrExpiredOtp,

    /// Submitted OTP does not match
    #[error("Incorrect OTP! {} left.", attempts(.remaining))]
    IncorrectOtp { remaining: u32 },

    /// Verification is locked after too many mismatches
    #[error("Too many failed attempts. Your account is locked for 30 minutes!")]
    LockedOut,

    /// Password reset attempted without a verified OTP
    #[error("Please verify the OTP sent to your email before resetting your password.")]
    ResetNotVerified,

    /// New password equals the current one
    #[error("New password cannot be the same as the old password!")]
    SamePassword,

    /// User not found
    #[error("User not found!")]
    UserNotFound,

    /// Invalid credentials (wrong password)
    #[error("Invalid credentials!")]
    InvalidCredentials,

    /// Missing, invalid or expired token
    #[error("Unauthorized! {0}")]
    Unauthorized(&'static str),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Rate-limit store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Mail delivery error
    #[error("Mail error: {0}")]
    Mail(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Failure of a concurrent request this one waited on
    #[error("{message}")]
    Relayed { kind: ErrorKind, message: String },
}

impl AuthError {
    /// Validation error without a suggested action
    pub fn validation(message: impl Into<String>) -> Self {
        AuthError::Validation {
            message: message.into(),
            action: None,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation { .. }
            | AuthError::AlreadyExists
            | AuthError::RateLimited { .. }
            | AuthError::InvalidOrExpiredOtp
            | AuthError::IncorrectOtp { .. }
            | AuthError::LockedOut
            | AuthError::ResetNotVerified
            | AuthError::SamePassword => ErrorKind::BadRequest,
            AuthError::InvalidCredentials | AuthError::Unauthorized(_) => ErrorKind::Unauthorized,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::Database(_)
            | AuthError::Store(_)
            | AuthError::Mail(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
            AuthError::Relayed { kind, .. } => *kind,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            AuthError::Validation {
                action: Some(action),
                ..
            } => err.with_action(action.clone()),
            AuthError::RateLimited {
                reason,
                retry_after,
            } => err.with_details(json!({
                "reason": reason.code(),
                "retryAfterSecs": retry_after.map(|d| d.as_secs()),
            })),
            AuthError::IncorrectOtp { remaining } => {
                err.with_details(json!({ "remainingAttempts": remaining }))
            }
            AuthError::ResetNotVerified => {
                err.with_action("Request a new OTP and verify it first")
            }
            _ => err,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Store(e) => {
                tracing::error!(error = %e, "Auth store error");
            }
            AuthError::Mail(msg) => {
                tracing::error!(message = %msg, "Auth mail error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::LockedOut => {
                tracing::warn!("OTP verification locked");
            }
            AuthError::RateLimited { reason, .. } => {
                tracing::warn!(reason = reason.code(), "OTP request rate limited");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        if err.is_client_error() {
            AuthError::Validation {
                message: err.message().to_string(),
                action: err.action().map(str::to_string),
            }
        } else {
            AuthError::Internal(err.to_string())
        }
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::Validation {
            message: "Invalid request body!".to_string(),
            action: Some(rejection.body_text()),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AuthError::Internal(format!("token encoding failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthError::validation("Email is required!").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::AlreadyExists.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::RateLimited {
                reason: OtpRestriction::CoolDown,
                retry_after: None
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::LockedOut.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::SamePassword.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Unauthorized("token missing.").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::UserNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AuthError::Store(StoreError::Connection("down".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AuthError::Mail("smtp".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_incorrect_otp_details() {
        let app = AuthError::IncorrectOtp { remaining: 1 }.to_app_error();
        assert_eq!(app.message(), "Incorrect OTP! 1 attempt left.");
        assert_eq!(app.details(), Some(&json!({ "remainingAttempts": 1 })));

        let app = AuthError::IncorrectOtp { remaining: 0 }.to_app_error();
        assert_eq!(app.message(), "Incorrect OTP! 0 attempts left.");
    }

    #[test]
    fn test_relayed_keeps_kind() {
        let err = AuthError::Relayed {
            kind: ErrorKind::InternalServerError,
            message: "Store error: down".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_app_error().is_server_error());
    }

    #[test]
    fn test_rate_limited_details() {
        let app = AuthError::RateLimited {
            reason: OtpRestriction::SpamLocked,
            retry_after: Some(Duration::from_secs(3599)),
        }
        .to_app_error();
        assert_eq!(
            app.message(),
            "Too many OTP requests! Please wait 1 hour before requesting again."
        );
        assert_eq!(
            app.details(),
            Some(&json!({ "reason": "otp_spam_locked", "retryAfterSecs": 3599 }))
        );
    }

    #[test]
    fn test_from_app_error() {
        let err: AuthError = AppError::bad_request("Invalid email format")
            .with_action("Check the address")
            .into();
        assert!(matches!(
            err,
            AuthError::Validation { ref message, action: Some(ref action) }
                if message == "Invalid email format" && action == "Check the address"
        ));

        let err: AuthError = AppError::internal("boom").into();
        assert!(matches!(err, AuthError::Internal(_)));
    }
}
