//! API DTOs (Data Transfer Objects)
//!
//! Request fields default to empty so that a missing field surfaces as a
//! validation error with the service's own message.

use serde::{Deserialize, Serialize};

use crate::domain::entity::user::User;
use crate::domain::value_object::user_role::UserRole;

// ============================================================================
// Requests
// ============================================================================

/// POST /user-registration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// POST /verify-user
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VerifyUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub otp: String,
}

/// POST /resend-otp, POST /user-forgot-password
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmailRequest {
    pub email: String,
}

/// POST /user-login
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /verify-user-forgot-password
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VerifyForgotPasswordRequest {
    pub email: String,
    pub otp: String,
}

/// POST /user-reset-password
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub new_password: String,
}

// ============================================================================
// Responses
// ============================================================================

/// Generic `{success, message}` body
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

impl MessageResponse {
    pub fn ok(message: &'static str) -> Self {
        Self {
            success: true,
            message,
        }
    }
}

/// Public part of a user returned at login
#[derive(Debug, Clone, Serialize)]
pub struct LoginUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl From<&User> for LoginUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id.to_string(),
            email: user.email.as_str().to_string(),
            name: user.name.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: LoginUser,
}

/// Profile of the authenticated user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id.to_string(),
            email: user.email.as_str().to_string(),
            name: user.name.as_str().to_string(),
            role: user.role,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserInfoResponse {
    pub success: bool,
    pub user: UserProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_empty() {
        let req: RegistrationRequest = serde_json::from_str(r#"{"email":"a@x.com"}"#).unwrap();
        assert_eq!(req.email, "a@x.com");
        assert!(req.name.is_empty());
        assert!(req.password.is_empty());
    }

    #[test]
    fn test_reset_password_camel_case() {
        let req: ResetPasswordRequest =
            serde_json::from_str(r#"{"email":"a@x.com","newPassword":"secret2"}"#).unwrap();
        assert_eq!(req.new_password, "secret2");
    }

    #[test]
    fn test_message_response_shape() {
        let body = serde_json::to_value(MessageResponse::ok("done")).unwrap();
        assert_eq!(body, serde_json::json!({"success": true, "message": "done"}));
    }
}
