//! Password policy and Argon2id hashing
//!
//! Input is NFKC-normalised before the policy runs, so the policy and the
//! hash see the same characters. Hashes are PHC strings with a per-call salt;
//! compare with [`verify_password`], never by string equality.
//!
//! ```rust
//! use platform::password::{check_policy, hash_password, verify_password};
//!
//! let secret = check_policy("hunter42!".to_string()).unwrap();
//! let phc = hash_password(&secret, None).unwrap();
//! assert!(verify_password(&phc, &secret, None));
//! ```

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroize;

pub use zeroize::Zeroizing;

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Reasons a password is refused before hashing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password cannot be empty")]
    Blank,

    #[error("Password contains invalid characters")]
    ControlCharacter,

    #[error("Password is too common or follows a predictable pattern")]
    Predictable,
}

#[derive(Debug, Error)]
pub enum HashError {
    #[error("argon2 failure: {0}")]
    Argon2(String),

    #[error("malformed PHC string")]
    MalformedPhc,
}

/// Normalise `raw` and apply the password policy
///
/// Length is counted in code points after normalisation. Tab and newline
/// are the only control characters accepted. The input buffer is wiped
/// before returning.
pub fn check_policy(mut raw: String) -> Result<Zeroizing<String>, PolicyViolation> {
    let normalized = Zeroizing::new(raw.nfkc().collect::<String>());
    raw.zeroize();

    if normalized.trim().is_empty() {
        return Err(PolicyViolation::Blank);
    }

    let actual = normalized.chars().count();
    if actual < MIN_PASSWORD_LENGTH {
        return Err(PolicyViolation::TooShort {
            min: MIN_PASSWORD_LENGTH,
            actual,
        });
    }
    if actual > MAX_PASSWORD_LENGTH {
        return Err(PolicyViolation::TooLong {
            max: MAX_PASSWORD_LENGTH,
            actual,
        });
    }

    if normalized
        .chars()
        .any(|ch| ch.is_control() && ch != '\t' && ch != '\n')
    {
        return Err(PolicyViolation::ControlCharacter);
    }

    if is_predictable(&normalized) {
        return Err(PolicyViolation::Predictable);
    }

    Ok(normalized)
}

/// Hash with Argon2id defaults (m=19456, t=2, p=1) and a fresh salt
pub fn hash_password(secret: &str, pepper: Option<&[u8]>) -> Result<String, HashError> {
    let input = peppered(secret, pepper);
    let salt = SaltString::generate(OsRng);

    Argon2::default()
        .hash_password(&input, &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HashError::Argon2(e.to_string()))
}

/// Reject strings that are not parseable PHC hashes
pub fn check_phc(phc: &str) -> Result<(), HashError> {
    PasswordHash::new(phc)
        .map(|_| ())
        .map_err(|_| HashError::MalformedPhc)
}

/// Constant-time check of `secret` against a stored PHC hash
///
/// A malformed hash verifies nothing.
pub fn verify_password(phc: &str, secret: &str, pepper: Option<&[u8]>) -> bool {
    let Ok(parsed) = PasswordHash::new(phc) else {
        return false;
    };
    let input = peppered(secret, pepper);
    Argon2::default().verify_password(&input, &parsed).is_ok()
}

fn peppered(secret: &str, pepper: Option<&[u8]>) -> Zeroizing<Vec<u8>> {
    let mut bytes = Zeroizing::new(secret.as_bytes().to_vec());
    if let Some(pepper) = pepper {
        bytes.extend_from_slice(pepper);
    }
    bytes
}

const DENYLIST: &[&str] = &[
    "password",
    "password1",
    "password123",
    "123456",
    "1234567",
    "12345678",
    "qwerty",
    "qwerty123",
    "abc123",
    "letmein",
    "welcome",
    "admin123",
    "iloveyou",
    "monkey",
    "dragon",
];

/// One repeated character, a run of consecutive digits, or a denylisted word
fn is_predictable(password: &str) -> bool {
    let lower = password.to_lowercase();

    let mut chars = lower.chars();
    if let Some(first) = chars.next() {
        if chars.all(|c| c == first) {
            return true;
        }
    }

    is_digit_run(&lower) || DENYLIST.contains(&lower.as_str())
}

/// `1234`, `7890`, `4321` and longer; wraps between 9 and 0
fn is_digit_run(s: &str) -> bool {
    let Some(digits) = s
        .chars()
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<u32>>>()
    else {
        return false;
    };
    if digits.len() < 4 {
        return false;
    }

    let step = |a: u32, b: u32| (a + 1) % 10 == b;
    digits.windows(2).all(|w| step(w[0], w[1])) || digits.windows(2).all(|w| step(w[1], w[0]))
}
