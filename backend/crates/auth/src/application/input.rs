//! Request input validation shared by the use cases

use crate::domain::value_object::{
    email::Email,
    user_name::UserName,
    user_password::RawPassword,
};
use crate::error::{AuthError, AuthResult};

/// Fail with `message` when any field is blank
pub(crate) fn require(fields: &[&str], message: &'static str) -> AuthResult<()> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(AuthError::validation(message));
    }
    Ok(())
}

pub(crate) fn parse_email(raw: &str) -> AuthResult<Email> {
    Ok(Email::new(raw)?)
}

pub(crate) fn parse_name(raw: &str) -> AuthResult<UserName> {
    UserName::new(raw).map_err(|e| AuthError::validation(e.to_string()))
}

pub(crate) fn parse_password(raw: String) -> AuthResult<RawPassword> {
    Ok(RawPassword::new(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require() {
        assert!(require(&["a", "b"], "Missing required fields!").is_ok());
        let err = require(&["a", "  "], "Missing required fields!").unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields!");
    }

    #[test]
    fn test_parse_email() {
        assert_eq!(parse_email(" A@X.com").unwrap().as_str(), "a@x.com");
        let err = parse_email("nope").unwrap_err();
        assert_eq!(err.to_string(), "Invalid email format!");
    }

    #[test]
    fn test_parse_password_keeps_action() {
        let err = parse_password("abc".to_string()).unwrap_err();
        assert!(matches!(err, AuthError::Validation { action: Some(_), .. }));
    }
}
