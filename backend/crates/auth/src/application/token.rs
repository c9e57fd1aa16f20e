//! Session Tokens
//!
//! HS256 JWTs. Access and refresh tokens share the claim layout but are
//! signed with different secrets, so one can never stand in for the other.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::value_object::{user_id::UserId, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

/// JWT claim set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub id: String,
    pub role: UserRole,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expires at (seconds since epoch)
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> AuthResult<UserId> {
        UserId::parse_str(&self.id).map_err(|_| AuthError::Unauthorized("token invalid."))
    }
}

/// Access + refresh token pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Keys {
    fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }
}

/// Signs and verifies session tokens
pub struct TokenIssuer {
    access: Keys,
    refresh: Keys,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            access: Keys::new(&config.access_token_secret, config.access_token_ttl),
            refresh: Keys::new(&config.refresh_token_secret, config.refresh_token_ttl),
            validation,
        }
    }

    fn sign(keys: &Keys, user_id: &UserId, role: UserRole) -> AuthResult<String> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            id: user_id.to_string(),
            role,
            iat,
            exp: iat + keys.ttl.as_secs() as i64,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)?)
    }

    fn check(&self, keys: &Keys, token: &str) -> AuthResult<Claims> {
        decode::<Claims>(token, &keys.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                AuthError::Unauthorized("token invalid.")
            })
    }

    pub fn issue_access(&self, user_id: &UserId, role: UserRole) -> AuthResult<String> {
        Self::sign(&self.access, user_id, role)
    }

    pub fn issue_refresh(&self, user_id: &UserId, role: UserRole) -> AuthResult<String> {
        Self::sign(&self.refresh, user_id, role)
    }

    /// Issue both tokens for a signed-in user
    pub fn issue_pair(&self, user: &User) -> AuthResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue_access(&user.user_id, user.role)?,
            refresh_token: self.issue_refresh(&user.user_id, user.role)?,
        })
    }

    pub fn verify_access(&self, token: &str) -> AuthResult<Claims> {
        self.check(&self.access, token)
    }

    pub fn verify_refresh(&self, token: &str) -> AuthResult<Claims> {
        self.check(&self.refresh, token)
    }
}
