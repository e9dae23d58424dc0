//! Named, time-bounded exclusive locks keyed by character identity.
//!
//! [`LockManager`] is the capability every backend implements:
//! - [`InProcessLockManager`] for single-instance deployments
//! - [`RedisLockManager`] for deployments spanning several server processes
//!
//! [`LockBackend`] picks one of them from configuration.
//!
//! A lock whose TTL elapses is implicitly freed. Holders must check
//! [`LockHandle::is_expired`] before trusting a long-running critical section;
//! the optimistic write in [`MutationGuard`](crate::guard::MutationGuard) covers
//! the remaining race.
pub mod backend;
pub mod memory;
pub mod redis_lock;

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

pub use backend::LockBackend;
pub use memory::InProcessLockManager;
pub use redis_lock::RedisLockManager;

/// Behaviour when the requested key is held by someone else.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AcquirePolicy {
    /// Fail immediately with [`LockFailureReason::AlreadyLocked`].
    FailFast,
    /// Wait up to the wait timeout, then fail with [`LockFailureReason::Timeout`].
    #[default]
    Wait,
}

impl FromStr for AcquirePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "wait" => Ok(AcquirePolicy::Wait),
            "fail_fast" | "fail-fast" | "failfast" => Ok(AcquirePolicy::FailFast),
            other => Err(format!("unknown lock policy `{other}`")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum LockFailureReason {
    AlreadyLocked,
    Timeout,
    ConnectionFailure,
    LockExpired,
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("lock `{key}` failed: {reason}")]
pub struct LockFailure {
    pub key: String,
    pub reason: LockFailureReason,
}

impl LockFailure {
    pub fn new(key: impl Into<String>, reason: LockFailureReason) -> Self {
        Self {
            key: key.into(),
            reason,
        }
    }
}

/// Result of releasing a handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ReleaseOutcome {
    /// The handle still owned the key and it has been freed.
    Released,
    /// The TTL had already elapsed; the key was freed (and possibly re-taken)
    /// before this release.
    Expired,
}

/// Proof of ownership of one key.
///
/// Not `Clone`: [`LockManager::release`] consumes it, so a handle is released
/// at most once.
#[derive(Debug)]
#[must_use = "a lock handle must be released"]
pub struct LockHandle {
    key: String,
    owner: String,
    acquired_at: Instant,
    ttl: Duration,
    expires_at: Instant,
}

impl LockHandle {
    pub(crate) fn new(
        key: impl Into<String>,
        owner: impl Into<String>,
        acquired_at: Instant,
        ttl: Duration,
    ) -> Self {
        Self {
            key: key.into(),
            owner: owner.into(),
            acquired_at,
            ttl,
            expires_at: acquired_at + ttl,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Owner token written to the coordination store.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn acquired_at(&self) -> Instant {
        self.acquired_at
    }

    /// TTL granted by the most recent acquire or extend.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub(crate) fn renewed(&mut self, at: Instant, ttl: Duration) {
        self.ttl = ttl;
        self.expires_at = at + ttl;
    }
}

/// Fresh owner token for one acquisition.
pub fn new_owner_token() -> String {
    Uuid::new_v4().to_string()
}

/// Exclusive, TTL-bounded lock over a string key.
#[async_trait]
pub trait LockManager: Send + Sync {
    /// Acquire `key` for `ttl` under a fresh owner token.
    ///
    /// Blocks the calling task (never the process) for at most `wait_timeout`
    /// when the backend's policy is [`AcquirePolicy::Wait`].
    async fn acquire(
        &self,
        key: &str,
        ttl: Duration,
        wait_timeout: Duration,
    ) -> Result<LockHandle, LockFailure> {
        let owner = new_owner_token();
        self.acquire_as(key, &owner, ttl, wait_timeout).await
    }

    /// Acquire `key` for `ttl` under a caller-chosen owner token.
    ///
    /// A key already held by `owner` counts as acquired. Knowing the token up
    /// front lets a caller that abandons this call still free the key through
    /// [`release_owner`](Self::release_owner).
    async fn acquire_as(
        &self,
        key: &str,
        owner: &str,
        ttl: Duration,
        wait_timeout: Duration,
    ) -> Result<LockHandle, LockFailure>;

    /// Release a handle. An expired handle is not an error.
    async fn release(&self, handle: LockHandle) -> Result<ReleaseOutcome, LockFailure> {
        self.release_owner(handle.key(), handle.owner()).await
    }

    /// Free `key` only if `owner` holds it. A key owned by someone else, or by
    /// nobody, is left alone and reported as [`ReleaseOutcome::Expired`].
    async fn release_owner(&self, key: &str, owner: &str) -> Result<ReleaseOutcome, LockFailure>;

    /// Best-effort TTL extension. Returns `false` when the handle no longer
    /// owns the key.
    async fn extend(&self, handle: &mut LockHandle, ttl: Duration) -> Result<bool, LockFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parses_config_spellings() {
        assert_eq!("wait".parse(), Ok(AcquirePolicy::Wait));
        assert_eq!("FAIL_FAST".parse(), Ok(AcquirePolicy::FailFast));
        assert_eq!("fail-fast".parse(), Ok(AcquirePolicy::FailFast));
        assert!("sometimes".parse::<AcquirePolicy>().is_err());
    }

    #[test]
    fn failure_message_names_key_and_reason() {
        let failure = LockFailure::new("lock:character:7", LockFailureReason::Timeout);
        assert_eq!(failure.to_string(), "lock `lock:character:7` failed: Timeout");
    }

    #[tokio::test]
    async fn handle_tracks_expiry() {
        let now = Instant::now();
        let mut handle = LockHandle::new("k", "owner", now, Duration::from_millis(5));
        assert_eq!(handle.expires_at(), now + Duration::from_millis(5));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(handle.is_expired());
        assert_eq!(handle.remaining(), Duration::ZERO);

        handle.renewed(Instant::now(), Duration::from_secs(5));
        assert!(!handle.is_expired());
        assert_eq!(handle.ttl(), Duration::from_secs(5));
    }
}
