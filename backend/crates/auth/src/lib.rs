//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Use cases, OTP service, tokens
//! - `infra/` - PostgreSQL / in-memory repositories, mail delivery
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Registration gated by an emailed 4-digit OTP
//! - Email + password login issuing access / refresh JWT cookies
//! - Forgot-password flow with OTP verification before reset
//!
//! ## Security Model
//! - Passwords hashed with Argon2id
//! - OTP issuance throttled by cool-down and spam lock
//! - OTP verification locked after repeated mismatches

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::{AuthConfig, OtpPolicy};
pub use error::{AuthError, AuthResult};
pub use infra::{MemoryMailer, MemoryUserRepository, PgUserRepository, SmtpMailer, UserBackend};
pub use presentation::handlers::AuthAppState;
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}
