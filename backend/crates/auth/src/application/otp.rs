//! OTP Issuance and Verification
//!
//! All state lives in the injected [`KeyValueStore`], keyed by normalized
//! email:
//!
//! | key                        | value   | ttl                     |
//! |----------------------------|---------|-------------------------|
//! | `otp:{email}`              | code    | `code_ttl`              |
//! | `otp_cool_down:{email}`    | `true`  | `cool_down`             |
//! | `otp_request_count:{email}`| counter | `request_window` (fixed)|
//! | `otp_spam_lock:{email}`    | `true`  | `spam_lock`             |
//! | `otp_attempts:{email}`     | counter | `code_ttl` (fixed)      |
//! | `otp_lock:{email}`         | `true`  | `lock_duration`         |
//! | `password_reset:{email}`   | `true`  | `reset_grant_ttl`       |
//!
//! Concurrent verifications for the same email are not serialized; the
//! store's per-key atomicity is the only guarantee.

use std::sync::Arc;

use platform::crypto::{constant_time_eq, random_in_range};
use platform::rate_limit::KeyValueStore;

use crate::application::config::OtpPolicy;
use crate::domain::value_object::{email::Email, user_name::UserName};
use crate::error::{AuthError, AuthResult, OtpRestriction};
use crate::infra::mailer::{MailTemplate, MailVars, Mailer};

const OTP: &str = "otp";
const COOL_DOWN: &str = "otp_cool_down";
const REQUEST_COUNT: &str = "otp_request_count";
const SPAM_LOCK: &str = "otp_spam_lock";
const ATTEMPTS: &str = "otp_attempts";
const LOCK: &str = "otp_lock";
const RESET_GRANT: &str = "password_reset";

/// Range of issued codes (always four digits)
pub const OTP_RANGE: std::ops::RangeInclusive<u32> = 1000..=9999;

fn key(prefix: &str, email: &Email) -> String {
    format!("{prefix}:{}", email.as_str())
}

/// OTP issuer and verifier
pub struct OtpService<S, M>
where
    S: KeyValueStore,
    M: Mailer,
{
    store: Arc<S>,
    mailer: Arc<M>,
    policy: OtpPolicy,
}

impl<S, M> OtpService<S, M>
where
    S: KeyValueStore + Sync,
    M: Mailer + Sync,
{
    pub fn new(store: Arc<S>, mailer: Arc<M>, policy: OtpPolicy) -> Self {
        Self {
            store,
            mailer,
            policy,
        }
    }

    /// Fail with `RateLimited` while a lock, spam lock or cool-down is active
    pub async fn check_restrictions(&self, email: &Email) -> AuthResult<()> {
        let checks = [
            (LOCK, OtpRestriction::Locked),
            (SPAM_LOCK, OtpRestriction::SpamLocked),
            (COOL_DOWN, OtpRestriction::CoolDown),
        ];

        for (prefix, reason) in checks {
            let k = key(prefix, email);
            if self.store.exists(&k).await? {
                let retry_after = self.store.ttl(&k).await?;
                return Err(AuthError::RateLimited {
                    reason,
                    retry_after,
                });
            }
        }

        Ok(())
    }

    /// Count an issuance request; the request past the limit trips the spam lock
    pub async fn track_request(&self, email: &Email) -> AuthResult<()> {
        let count_key = key(REQUEST_COUNT, email);
        let count = self
            .store
            .incr(&count_key, self.policy.request_window)
            .await?;

        if count > i64::from(self.policy.max_requests) {
            self.store
                .set(&key(SPAM_LOCK, email), "true", self.policy.spam_lock)
                .await?;
            // A fresh window starts once the spam lock expires
            self.store.delete(&[&count_key]).await?;

            tracing::warn!(
                email = %email.masked(),
                requests = count,
                "OTP spam lock engaged"
            );

            return Err(AuthError::RateLimited {
                reason: OtpRestriction::SpamLocked,
                retry_after: Some(self.policy.spam_lock),
            });
        }

        Ok(())
    }

    /// Generate a code, mail it, then record it with its cool-down
    ///
    /// Returns the code so callers (and tests) can observe it; it is never
    /// sent back to HTTP clients.
    pub async fn issue(
        &self,
        name: &UserName,
        email: &Email,
        template: MailTemplate,
    ) -> AuthResult<String> {
        let code = random_in_range(OTP_RANGE).to_string();

        let vars = MailVars {
            name: name.to_string(),
            otp: code.clone(),
        };
        self.mailer
            .send(email, template.subject(), template, &vars)
            .await?;

        self.store
            .set(&key(OTP, email), &code, self.policy.code_ttl)
            .await?;
        self.store
            .set(&key(COOL_DOWN, email), "true", self.policy.cool_down)
            .await?;

        tracing::info!(
            email = %email.masked(),
            template = template.name(),
            "OTP issued"
        );

        Ok(code)
    }

    /// Full issuance flow: restrictions, request tracking, then issue
    pub async fn request(
        &self,
        name: &UserName,
        email: &Email,
        template: MailTemplate,
    ) -> AuthResult<String> {
        self.check_restrictions(email).await?;
        self.track_request(email).await?;
        self.issue(name, email, template).await
    }

    /// Check a submitted code and consume it on success
    pub async fn verify(&self, email: &Email, submitted: &str) -> AuthResult<()> {
        if self.store.exists(&key(LOCK, email)).await? {
            return Err(AuthError::LockedOut);
        }

        let otp_key = key(OTP, email);
        let attempts_key = key(ATTEMPTS, email);

        let stored = self
            .store
            .get(&otp_key)
            .await?
            .ok_or(AuthError::InvalidOrExpiredOtp)?;

        if constant_time_eq(stored.as_bytes(), submitted.trim().as_bytes()) {
            self.store.delete(&[&otp_key, &attempts_key]).await?;
            tracing::info!(email = %email.masked(), "OTP verified");
            return Ok(());
        }

        let failures = self
            .store
            .incr(&attempts_key, self.policy.code_ttl)
            .await?;
        let max = i64::from(self.policy.max_failed_attempts);

        if failures >= max {
            self.store
                .set(&key(LOCK, email), "true", self.policy.lock_duration)
                .await?;
            self.store.delete(&[&otp_key, &attempts_key]).await?;

            tracing::warn!(email = %email.masked(), "OTP verification locked");
            return Err(AuthError::LockedOut);
        }

        let remaining = u32::try_from(max - 1 - failures).unwrap_or(0);
        tracing::debug!(email = %email.masked(), remaining, "Incorrect OTP");
        Err(AuthError::IncorrectOtp { remaining })
    }

    /// Allow one password reset for `email`
    pub async fn grant_reset(&self, email: &Email) -> AuthResult<()> {
        self.store
            .set(&key(RESET_GRANT, email), "true", self.policy.reset_grant_ttl)
            .await?;
        Ok(())
    }

    /// Whether a verified forgot-password OTP currently allows a reset
    pub async fn has_reset_grant(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.store.exists(&key(RESET_GRANT, email)).await?)
    }

    /// Drop the reset grant once it has been used
    pub async fn clear_reset_grant(&self, email: &Email) -> AuthResult<()> {
        self.store.delete(&[&key(RESET_GRANT, email)]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use platform::rate_limit::MemoryStore;

    use super::*;
    use crate::infra::mailer::MemoryMailer;

    fn service() -> (OtpService<MemoryStore, MemoryMailer>, MemoryStore, MemoryMailer) {
        let store = MemoryStore::new();
        let mailer = MemoryMailer::new();
        let svc = OtpService::new(
            Arc::new(store.clone()),
            Arc::new(mailer.clone()),
            OtpPolicy::default(),
        );
        (svc, store, mailer)
    }

    fn alice() -> (UserName, Email) {
        (
            UserName::new("Alice").unwrap(),
            Email::new("a@x.com").unwrap(),
        )
    }

    /// A code guaranteed to differ from `code`
    fn wrong(code: &str) -> &'static str {
        if code == "0000" { "1111" } else { "0000" }
    }

    #[tokio::test(start_paused = true)]
    async fn test_issue_stores_code_and_mails_it() {
        let (svc, store, mailer) = service();
        let (name, email) = alice();

        let code = svc
            .issue(&name, &email, MailTemplate::UserActivation)
            .await
            .unwrap();

        assert_eq!(code.len(), 4);
        assert!(OTP_RANGE.contains(&code.parse::<u32>().unwrap()));
        assert_eq!(store.get("otp:a@x.com").await.unwrap(), Some(code.clone()));
        assert!(store.exists("otp_cool_down:a@x.com").await.unwrap());

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@x.com");
        assert_eq!(sent[0].template, MailTemplate::UserActivation);
        assert_eq!(sent[0].vars.otp, code);
        assert_eq!(sent[0].vars.name, "Alice");
    }

    #[tokio::test(start_paused = true)]
    async fn test_issue_then_verify_consumes_code() {
        let (svc, _, _) = service();
        let (name, email) = alice();

        let code = svc
            .issue(&name, &email, MailTemplate::UserActivation)
            .await
            .unwrap();
        svc.verify(&email, &code).await.unwrap();

        assert!(matches!(
            svc.verify(&email, &code).await,
            Err(AuthError::InvalidOrExpiredOtp)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_code_expires() {
        let (svc, _, _) = service();
        let (name, email) = alice();

        let code = svc
            .issue(&name, &email, MailTemplate::UserActivation)
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(300)).await;

        assert!(matches!(
            svc.verify(&email, &code).await,
            Err(AuthError::InvalidOrExpiredOtp)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cool_down_blocks_second_request() {
        let (svc, _, mailer) = service();
        let (name, email) = alice();

        svc.request(&name, &email, MailTemplate::UserActivation)
            .await
            .unwrap();

        let err = svc
            .request(&name, &email, MailTemplate::UserActivation)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::RateLimited {
                reason: OtpRestriction::CoolDown,
                retry_after: Some(d),
            } if d == Duration::from_secs(60)
        ));
        assert_eq!(mailer.sent().len(), 1);

        tokio::time::advance(Duration::from_secs(60)).await;
        svc.request(&name, &email, MailTemplate::UserActivation)
            .await
            .unwrap();
        assert_eq!(mailer.sent().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spam_lock_after_three_issuances() {
        let (svc, store, mailer) = service();
        let (name, email) = alice();

        for _ in 0..3 {
            svc.request(&name, &email, MailTemplate::UserActivation)
                .await
                .unwrap();
            tokio::time::advance(Duration::from_secs(61)).await;
        }

        let err = svc
            .request(&name, &email, MailTemplate::UserActivation)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::RateLimited {
                reason: OtpRestriction::SpamLocked,
                ..
            }
        ));
        assert_eq!(mailer.sent().len(), 3);
        assert!(store.exists("otp_spam_lock:a@x.com").await.unwrap());
        assert!(!store.exists("otp_request_count:a@x.com").await.unwrap());

        // Still blocked just before the lock expires
        tokio::time::advance(Duration::from_secs(3599)).await;
        assert!(matches!(
            svc.check_restrictions(&email).await,
            Err(AuthError::RateLimited {
                reason: OtpRestriction::SpamLocked,
                ..
            })
        ));

        tokio::time::advance(Duration::from_secs(1)).await;
        svc.request(&name, &email, MailTemplate::UserActivation)
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_window_is_fixed() {
        let (svc, _, _) = service();
        let (name, email) = alice();

        for _ in 0..3 {
            svc.request(&name, &email, MailTemplate::UserActivation)
                .await
                .unwrap();
            tokio::time::advance(Duration::from_secs(61)).await;
        }

        // The window opened with the first request; it has closed by now
        tokio::time::advance(Duration::from_secs(3600 - 3 * 61)).await;
        svc.request(&name, &email, MailTemplate::UserActivation)
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_incorrect_then_locked() {
        let (svc, store, _) = service();
        let (name, email) = alice();

        let code = svc
            .issue(&name, &email, MailTemplate::UserActivation)
            .await
            .unwrap();
        let bad = wrong(&code);

        assert!(matches!(
            svc.verify(&email, bad).await,
            Err(AuthError::IncorrectOtp { remaining: 1 })
        ));
        assert!(matches!(
            svc.verify(&email, bad).await,
            Err(AuthError::IncorrectOtp { remaining: 0 })
        ));
        assert!(matches!(
            svc.verify(&email, bad).await,
            Err(AuthError::LockedOut)
        ));

        assert!(store.exists("otp_lock:a@x.com").await.unwrap());
        assert!(!store.exists("otp:a@x.com").await.unwrap());
        assert!(!store.exists("otp_attempts:a@x.com").await.unwrap());

        // Correct code no longer helps
        assert!(matches!(
            svc.verify(&email, &code).await,
            Err(AuthError::LockedOut)
        ));

        // Issuance is blocked by the lock too
        assert!(matches!(
            svc.check_restrictions(&email).await,
            Err(AuthError::RateLimited {
                reason: OtpRestriction::Locked,
                ..
            })
        ));

        tokio::time::advance(Duration::from_secs(1800)).await;
        assert!(svc.check_restrictions(&email).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_clears_attempts() {
        let (svc, store, _) = service();
        let (name, email) = alice();

        let code = svc
            .issue(&name, &email, MailTemplate::UserActivation)
            .await
            .unwrap();
        let _ = svc.verify(&email, wrong(&code)).await;
        assert!(store.exists("otp_attempts:a@x.com").await.unwrap());

        svc.verify(&email, &format!(" {code} ")).await.unwrap();
        assert!(!store.exists("otp_attempts:a@x.com").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_grant_lifecycle() {
        let (svc, _, _) = service();
        let (_, email) = alice();

        assert!(!svc.has_reset_grant(&email).await.unwrap());
        svc.grant_reset(&email).await.unwrap();
        assert!(svc.has_reset_grant(&email).await.unwrap());
        svc.clear_reset_grant(&email).await.unwrap();
        assert!(!svc.has_reset_grant(&email).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_grant_expires() {
        let (svc, _, _) = service();
        let (_, email) = alice();

        svc.grant_reset(&email).await.unwrap();
        tokio::time::advance(Duration::from_secs(600)).await;
        assert!(!svc.has_reset_grant(&email).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_wrong_codes_race() {
        let (svc, store, _) = service();
        let svc = Arc::new(svc);
        let (name, email) = alice();

        let code = svc
            .issue(&name, &email, MailTemplate::UserActivation)
            .await
            .unwrap();
        let bad = wrong(&code);

        let mut handles = Vec::new();
        for _ in 0..6 {
            let svc = svc.clone();
            let email = email.clone();
            handles.push(tokio::spawn(async move { svc.verify(&email, bad).await }));
        }

        let mut locked = 0;
        for h in handles {
            match h.await.unwrap() {
                Err(AuthError::LockedOut) => locked += 1,
                Err(AuthError::IncorrectOtp { .. }) | Err(AuthError::InvalidOrExpiredOtp) => {}
                other => panic!("unexpected result: {other:?}"),
            }
        }

        // Interleaving varies, but the lock always ends up set and no wrong
        // code is ever accepted
        assert!(locked >= 1);
        assert!(store.exists("otp_lock:a@x.com").await.unwrap());
    }
}
