//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::crypto::random_bytes;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// OTP lifetimes and throttling thresholds
#[derive(Debug, Clone)]
pub struct OtpPolicy {
    /// Lifetime of an issued code
    pub code_ttl: Duration,
    /// Minimum wait between two issuances
    pub cool_down: Duration,
    /// Fixed window in which issuance requests are counted
    pub request_window: Duration,
    /// Issuances allowed per window; the next request trips the spam lock
    pub max_requests: u32,
    /// Spam lock duration
    pub spam_lock: Duration,
    /// Mismatches tolerated before verification locks (the last one locks)
    pub max_failed_attempts: u32,
    /// Verification lock duration
    pub lock_duration: Duration,
    /// How long a verified forgot-password OTP allows a reset
    pub reset_grant_ttl: Duration,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            code_ttl: Duration::from_secs(300),          // 5 minutes
            cool_down: Duration::from_secs(60),          // 1 minute
            request_window: Duration::from_secs(3600),   // 1 hour
            max_requests: 3,
            spam_lock: Duration::from_secs(3600),        // 1 hour
            max_failed_attempts: 3,
            lock_duration: Duration::from_secs(30 * 60), // 30 minutes
            reset_grant_ttl: Duration::from_secs(600),   // 10 minutes
        }
    }
}

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 secret for access tokens (`JWT_SECRET`)
    pub access_token_secret: Vec<u8>,
    /// HS256 secret for refresh tokens (`REFRESH_TOKEN_SECRET`)
    pub refresh_token_secret: Vec<u8>,
    /// Access token lifetime (15 minutes)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (1 week)
    pub refresh_token_ttl: Duration,
    /// Access token cookie name
    pub access_cookie_name: String,
    /// Refresh token cookie name
    pub refresh_cookie_name: String,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// OTP policy
    pub otp: OtpPolicy,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: Vec::new(),
            refresh_token_secret: Vec::new(),
            access_token_ttl: Duration::from_secs(15 * 60), // 15 minutes
            refresh_token_ttl: Duration::from_secs(7 * 24 * 3600), // 1 week
            access_cookie_name: "access_token".to_string(),
            refresh_cookie_name: "refresh_token".to_string(),
            cookie_secure: true,
            cookie_same_site: SameSite::None,
            password_pepper: None,
            otp: OtpPolicy::default(),
        }
    }
}

impl AuthConfig {
    /// Create config with the given token secrets
    pub fn with_secrets(access: impl Into<Vec<u8>>, refresh: impl Into<Vec<u8>>) -> Self {
        Self {
            access_token_secret: access.into(),
            refresh_token_secret: refresh.into(),
            ..Default::default()
        }
    }

    /// Create config with random token secrets (for development)
    pub fn with_random_secret() -> Self {
        Self::with_secrets(random_bytes(32), random_bytes(32))
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            cookie_same_site: SameSite::Lax,
            ..Self::with_random_secret()
        }
    }

    /// Cookie carrying the access token
    pub fn access_cookie(&self) -> CookieConfig {
        self.cookie(&self.access_cookie_name, self.access_token_ttl)
    }

    /// Cookie carrying the refresh token
    pub fn refresh_cookie(&self) -> CookieConfig {
        self.cookie(&self.refresh_cookie_name, self.refresh_token_ttl)
    }

    fn cookie(&self, name: &str, ttl: Duration) -> CookieConfig {
        CookieConfig {
            secure: self.cookie_secure,
            same_site: self.cookie_same_site,
            ..CookieConfig::named(name, ttl.as_secs() as i64)
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}
