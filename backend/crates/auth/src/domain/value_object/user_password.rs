//! Password value objects
//!
//! [`RawPassword`] is what the client typed, already normalised and checked
//! against the policy. [`UserPassword`] is the stored Argon2id PHC hash.

use std::fmt;

use kernel::error::app_error::{AppError, AppResult};
use platform::password::{self, PolicyViolation, Zeroizing};

/// Policy-checked clear text, wiped on drop
pub struct RawPassword(Zeroizing<String>);

impl RawPassword {
    pub fn new(raw: String) -> AppResult<Self> {
        password::check_policy(raw)
            .map(Self)
            .map_err(policy_error)
    }
}

fn policy_error(violation: PolicyViolation) -> AppError {
    let action = match violation {
        PolicyViolation::TooShort { .. } => "Please choose a longer password",
        PolicyViolation::TooLong { .. } => "Please choose a shorter password",
        PolicyViolation::Blank => "Please enter a password",
        PolicyViolation::ControlCharacter => "Please remove any special control characters",
        PolicyViolation::Predictable => "Please choose a more unique password",
    };
    AppError::bad_request(violation.to_string()).with_action(action)
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawPassword([REDACTED])")
    }
}

/// Stored PHC hash
#[derive(Clone)]
pub struct UserPassword(String);

impl UserPassword {
    /// Hash `raw`; `pepper` must be the same one later given to [`verify`](Self::verify)
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AppResult<Self> {
        password::hash_password(&raw.0, pepper)
            .map(Self)
            .map_err(|e| AppError::internal(e.to_string()))
    }

    /// Wrap a hash loaded from the database
    pub fn from_phc_string(phc: String) -> AppResult<Self> {
        password::check_phc(&phc)
            .map(|()| Self(phc))
            .map_err(|e| AppError::internal(e.to_string()))
    }

    pub fn as_phc_string(&self) -> &str {
        &self.0
    }

    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        password::verify_password(&self.0, &raw.0, pepper)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserPassword([HASH])")
    }
}
