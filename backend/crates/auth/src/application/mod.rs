//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod forgot_password;
mod input;
pub mod otp;
pub mod refresh;
pub mod refresh_queue;
pub mod register;
pub mod reset_password;
pub mod sign_in;
pub mod token;
pub mod user_info;
pub mod verify_user;

// Re-exports
pub use config::{AuthConfig, OtpPolicy};
pub use forgot_password::ForgotPasswordUseCase;
pub use otp::OtpService;
pub use refresh::RefreshUseCase;
pub use refresh_queue::RefreshQueue;
pub use register::{RegisterInput, RegisterOutput, RegisterUseCase};
pub use reset_password::{ResetPasswordInput, ResetPasswordUseCase};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use token::{Claims, TokenIssuer, TokenPair};
pub use user_info::UserInfoUseCase;
pub use verify_user::{VerifyUserInput, VerifyUserUseCase};
