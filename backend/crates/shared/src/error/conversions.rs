//! HTTP rendering of [`AppError`]
//!
//! Body shape: `{"status":"error","message":...,"action"?,"details"?}`.

use super::app_error::AppError;

/// Message returned in place of the real one for server-side failures
pub const GENERIC_SERVER_ERROR_MESSAGE: &str = "something went wrong please try again later!";

impl AppError {
    /// JSON body sent to the client
    pub fn to_body(&self) -> serde_json::Value {
        // Internal details never leave the process
        let message = if self.is_server_error() {
            GENERIC_SERVER_ERROR_MESSAGE
        } else {
            self.message()
        };

        let mut body = serde_json::json!({
            "status": "error",
            "message": message,
        });
        if let Some(action) = self.action() {
            body["action"] = serde_json::Value::from(action);
        }
        if let Some(details) = self.details() {
            body["details"] = details.clone();
        }
        body
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_error_body() {
        let body = AppError::bad_request("Incorrect OTP! 0 attempts left.")
            .with_details(json!({ "remainingAttempts": 0 }))
            .to_body();
        assert_eq!(
            body,
            json!({
                "status": "error",
                "message": "Incorrect OTP! 0 attempts left.",
                "details": { "remainingAttempts": 0 },
            })
        );
    }

    #[test]
    fn test_server_error_body_is_generic() {
        let body = AppError::internal("redis connection refused")
            .with_action("retry")
            .to_body();
        assert_eq!(body["message"], GENERIC_SERVER_ERROR_MESSAGE);
        assert_eq!(body["action"], "retry");
    }

    #[cfg(feature = "axum")]
    #[test]
    fn test_into_response_status() {
        use axum::response::IntoResponse;

        let response = AppError::not_found("Route not found!").into_response();
        assert_eq!(response.status().as_u16(), 404);
    }
}
