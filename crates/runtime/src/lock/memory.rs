//! In-process lock manager for single-instance deployments.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::debug;

use super::{
    AcquirePolicy, LockFailure, LockFailureReason, LockHandle, LockManager, ReleaseOutcome,
};

struct Entry {
    owner: String,
    expires_at: Instant,
}

/// Mutex-guarded key table with TTL expiry.
///
/// Waiters are woken by releases through a [`Notify`]; keys that expire
/// without a release are picked up by the poll interval.
pub struct InProcessLockManager {
    entries: Mutex<HashMap<String, Entry>>,
    released: Notify,
    policy: AcquirePolicy,
    poll_interval: Duration,
}

impl InProcessLockManager {
    pub fn new(policy: AcquirePolicy, poll_interval: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            released: Notify::new(),
            policy,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    pub fn policy(&self) -> AcquirePolicy {
        self.policy
    }

    /// Whether `key` is held by an unexpired owner.
    pub fn is_locked(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .lock()
            .map(|entries| entries.get(key).is_some_and(|e| e.expires_at > now))
            .unwrap_or(false)
    }

    fn try_acquire(
        &self,
        key: &str,
        owner: &str,
        ttl: Duration,
    ) -> Result<Option<LockHandle>, LockFailure> {
        let now = Instant::now();
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| LockFailure::new(key, LockFailureReason::Unknown))?;

        if entries
            .get(key)
            .is_some_and(|e| e.expires_at > now && e.owner != owner)
        {
            return Ok(None);
        }

        entries.insert(
            key.to_owned(),
            Entry {
                owner: owner.to_owned(),
                expires_at: now + ttl,
            },
        );
        Ok(Some(LockHandle::new(key, owner, now, ttl)))
    }
}

impl Default for InProcessLockManager {
    fn default() -> Self {
        Self::new(AcquirePolicy::Wait, Duration::from_millis(25))
    }
}

#[async_trait]
impl LockManager for InProcessLockManager {
    async fn acquire_as(
        &self,
        key: &str,
        owner: &str,
        ttl: Duration,
        wait_timeout: Duration,
    ) -> Result<LockHandle, LockFailure> {
        if let Some(handle) = self.try_acquire(key, owner, ttl)? {
            debug!(key, ttl_ms = ttl.as_millis() as u64, "lock acquired");
            return Ok(handle);
        }

        if self.policy == AcquirePolicy::FailFast {
            debug!(key, "lock held elsewhere, failing fast");
            return Err(LockFailure::new(key, LockFailureReason::AlreadyLocked));
        }

        let deadline = Instant::now() + wait_timeout;
        loop {
            // Register for wakeups before re-checking so a release between the
            // check and the wait is not missed.
            let notified = self.released.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(handle) = self.try_acquire(key, owner, ttl)? {
                debug!(key, ttl_ms = ttl.as_millis() as u64, "lock acquired after wait");
                return Ok(handle);
            }

            let now = Instant::now();
            if now >= deadline {
                debug!(key, wait_ms = wait_timeout.as_millis() as u64, "lock wait timed out");
                return Err(LockFailure::new(key, LockFailureReason::Timeout));
            }

            let wake_at = (now + self.poll_interval).min(deadline);
            tokio::select! {
                _ = notified.as_mut() => {}
                _ = tokio::time::sleep_until(wake_at) => {}
            }
        }
    }

    async fn release_owner(&self, key: &str, owner: &str) -> Result<ReleaseOutcome, LockFailure> {
        let now = Instant::now();
        let outcome = {
            let mut entries = self
                .entries
                .lock()
                .map_err(|_| LockFailure::new(key, LockFailureReason::Unknown))?;

            match entries.get(key) {
                Some(entry) if entry.owner == owner => {
                    let live = entry.expires_at > now;
                    entries.remove(key);
                    if live {
                        ReleaseOutcome::Released
                    } else {
                        ReleaseOutcome::Expired
                    }
                }
                // Expired and re-taken by another owner, or already reaped.
                _ => ReleaseOutcome::Expired,
            }
        };

        self.released.notify_waiters();
        debug!(key, %outcome, "lock released");
        Ok(outcome)
    }

    async fn extend(&self, handle: &mut LockHandle, ttl: Duration) -> Result<bool, LockFailure> {
        let now = Instant::now();
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| LockFailure::new(handle.key(), LockFailureReason::Unknown))?;

        match entries.get_mut(handle.key()) {
            Some(entry) if entry.owner == handle.owner() && entry.expires_at > now => {
                entry.expires_at = now + ttl;
                handle.renewed(now, ttl);
                debug!(key = handle.key(), ttl_ms = ttl.as_millis() as u64, "lock extended");
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
