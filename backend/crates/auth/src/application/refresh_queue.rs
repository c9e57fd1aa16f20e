//! Single-flight coordination for token refresh
//!
//! Browsers tend to fire several refresh requests at once when an access
//! token expires. The first request for a given refresh token becomes the
//! leader and performs the issuance; the others wait for its outcome and
//! receive the same access token, or an error with the leader's status.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use kernel::error::kind::ErrorKind;
use platform::crypto::{sha256, to_base64};
use tokio::sync::watch;

use crate::error::{AuthError, AuthResult};

/// `None` while the leader is still working
type Outcome = Option<Result<String, Failure>>;

/// Leader's error as handed to followers
#[derive(Debug, Clone)]
struct Failure {
    kind: ErrorKind,
    message: String,
}

impl From<&AuthError> for Failure {
    fn from(err: &AuthError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<Failure> for AuthError {
    fn from(failure: Failure) -> Self {
        AuthError::Relayed {
            kind: failure.kind,
            message: failure.message,
        }
    }
}

/// In-flight refreshes keyed by refresh token digest
#[derive(Default)]
pub struct RefreshQueue {
    in_flight: Mutex<HashMap<String, watch::Receiver<Outcome>>>,
}

/// Removes the leader's entry even if its future is dropped
struct Flight<'a> {
    queue: &'a RefreshQueue,
    key: String,
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        if let Ok(mut map) = self.queue.in_flight.lock() {
            map.remove(&self.key);
        }
    }
}

enum Role {
    Leader(watch::Sender<Outcome>),
    Follower(watch::Receiver<Outcome>),
}

impl RefreshQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of refreshes currently being issued
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().map(|m| m.len()).unwrap_or(0)
    }

    fn join(&self, key: &str) -> AuthResult<Role> {
        let mut map = self
            .in_flight
            .lock()
            .map_err(|_| AuthError::Internal("refresh queue poisoned".to_string()))?;

        if let Some(rx) = map.get(key) {
            return Ok(Role::Follower(rx.clone()));
        }

        let (tx, rx) = watch::channel(None);
        map.insert(key.to_string(), rx);
        Ok(Role::Leader(tx))
    }

    /// Run `issue` once per concurrent group of callers sharing `refresh_token`
    pub async fn run<F, Fut>(&self, refresh_token: &str, issue: F) -> AuthResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AuthResult<String>>,
    {
        let key = to_base64(&sha256(refresh_token.as_bytes()));

        match self.join(&key)? {
            Role::Leader(tx) => {
                let _flight = Flight { queue: self, key };
                let result = issue().await;
                let shared = result.as_ref().cloned().map_err(Failure::from);
                // Followers may all have gone away; nothing to do then
                let _ = tx.send(Some(shared));
                result
            }
            Role::Follower(mut rx) => {
                tracing::debug!("Joining in-flight token refresh");
                let outcome = rx.wait_for(Option::is_some).await.map(|o| (*o).clone());
                match outcome {
                    Ok(Some(Ok(token))) => Ok(token),
                    Ok(Some(Err(failure))) => Err(failure.into()),
                    // Leader was cancelled before finishing
                    Ok(None) | Err(_) => issue().await,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::http::StatusCode;
    use platform::rate_limit::StoreError;

    use super::*;

    /// Leader fails with `err` after a delay; returns (leader, follower) results
    async fn fail_shared(err: AuthError) -> (AuthResult<String>, AuthResult<String>) {
        let queue = Arc::new(RefreshQueue::new());

        let leader = {
            let queue = queue.clone();
            tokio::spawn(async move {
                queue
                    .run("t", move || async move {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Err(err)
                    })
                    .await
            })
        };
        // Let the leader register first
        tokio::task::yield_now().await;

        let follower = queue
            .run("t", || async { Ok("never".to_string()) })
            .await;

        (leader.await.unwrap(), follower)
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_issuance() {
        let queue = Arc::new(RefreshQueue::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let queue = queue.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                queue
                    .run("refresh-token", || async {
                        let n = calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(format!("access-{n}"))
                    })
                    .await
            }));
        }

        for h in handles {
            assert_eq!(h.await.unwrap().unwrap(), "access-0");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(queue.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_tokens_do_not_share() {
        let queue = Arc::new(RefreshQueue::new());

        let a = {
            let queue = queue.clone();
            tokio::spawn(async move {
                queue
                    .run("token-a", || async {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Ok("a".to_string())
                    })
                    .await
            })
        };
        let b = queue.run("token-b", || async { Ok("b".to_string()) }).await;

        assert_eq!(b.unwrap(), "b");
        assert_eq!(a.await.unwrap().unwrap(), "a");
    }

    #[tokio::test(start_paused = true)]
    async fn test_followers_see_leader_failure() {
        let (leader, follower) = fail_shared(AuthError::Unauthorized("token invalid.")).await;

        assert!(matches!(leader, Err(AuthError::Unauthorized(_))));
        let follower = follower.unwrap_err();
        assert_eq!(follower.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(follower.to_string(), "Unauthorized! token invalid.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_followers_keep_server_error_status() {
        let (leader, follower) =
            fail_shared(AuthError::Store(StoreError::Connection("down".into()))).await;

        assert!(matches!(leader, Err(AuthError::Store(_))));
        assert_eq!(
            follower.unwrap_err().status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_sequential_calls_issue_again() {
        let queue = RefreshQueue::new();
        let first = queue.run("t", || async { Ok("1".to_string()) }).await;
        let second = queue.run("t", || async { Ok("2".to_string()) }).await;
        assert_eq!(first.unwrap(), "1");
        assert_eq!(second.unwrap(), "2");
    }
}
