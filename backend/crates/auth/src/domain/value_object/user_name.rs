//! User Name Value Object
//!
//! ユーザー名は、メール本文や画面に表示される**表示名**。
//! ログイン識別子ではない（ログインはメールアドレスで行う）。
//!
//! ## 設計方針
//! - NFKC正規化 → 前後の空白除去 → 検証 の順で処理
//! - 大文字・小文字はそのまま保持
//! - 一意性は要求しない
//!
//! ## 不変条件
//! - 長さ: 1〜50文字（正規化後）
//! - 制御文字禁止

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for user name (in characters)
pub const USER_NAME_MAX_LENGTH: usize = 50;

// ============================================================================
// Error Types
// ============================================================================

/// User name validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserNameError {
    /// Empty after trimming
    Empty,
    /// Too long (in characters)
    TooLong { max: usize, actual: usize },
    /// Contains control characters
    InvalidCharacter,
}

impl fmt::Display for UserNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserNameError::Empty => write!(f, "Name is required!"),
            UserNameError::TooLong { max, actual } => {
                write!(f, "Name must be at most {max} characters (got {actual})")
            }
            UserNameError::InvalidCharacter => write!(f, "Name contains invalid characters"),
        }
    }
}

impl std::error::Error for UserNameError {}

// ============================================================================
// UserName
// ============================================================================

/// Display name of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserName(String);

impl UserName {
    /// Normalize and validate a display name
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserNameError> {
        let normalized: String = raw.as_ref().nfkc().collect();
        let trimmed = normalized.trim();

        if trimmed.is_empty() {
            return Err(UserNameError::Empty);
        }

        let char_count = trimmed.chars().count();
        if char_count > USER_NAME_MAX_LENGTH {
            return Err(UserNameError::TooLong {
                max: USER_NAME_MAX_LENGTH,
                actual: char_count,
            });
        }

        if trimmed.chars().any(char::is_control) {
            return Err(UserNameError::InvalidCharacter);
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Restore from database (assumed already validated)
    pub fn from_db(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
