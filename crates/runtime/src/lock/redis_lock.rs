//! Redis-backed lock manager for multi-process deployments.
//!
//! Acquisition, release and extension all run as Lua scripts keyed on the owner
//! token. Acquisition is `SET key owner NX PX ttl`, falling back to a refresh
//! when the key already carries our own token, so a SET resent after a lost
//! reply cannot lock out its own sender. Release and extension compare the
//! stored token first, so a holder whose TTL lapsed can never free or prolong
//! a lock that someone else now owns.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, RedisError, Script};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{
    AcquirePolicy, LockFailure, LockFailureReason, LockHandle, LockManager, ReleaseOutcome,
};
use crate::retry::{Backoff, retry_transient};

const ACQUIRE_SCRIPT: &str = r#"
if redis.call('SET', KEYS[1], ARGV[1], 'NX', 'PX', ARGV[2]) then
    return 1
end
if redis.call('GET', KEYS[1]) == ARGV[1] then
    redis.call('PEXPIRE', KEYS[1], ARGV[2])
    return 1
end
return 0
"#;

const RELEASE_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
else
    return 0
end
"#;

const EXTEND_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('PEXPIRE', KEYS[1], ARGV[2])
else
    return 0
end
"#;

fn is_transient(error: &RedisError) -> bool {
    error.is_io_error()
        || error.is_timeout()
        || error.is_connection_dropped()
        || error.is_connection_refusal()
}

fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

pub struct RedisLockManager {
    connection: ConnectionManager,
    acquire_script: Script,
    release_script: Script,
    extend_script: Script,
    policy: AcquirePolicy,
    poll_interval: Duration,
    retry_attempts: u32,
    backoff: Backoff,
}

impl RedisLockManager {
    /// Open a managed connection to `url`.
    ///
    /// Transient command failures are retried `retry_attempts` times with
    /// `backoff` before surfacing as [`LockFailureReason::ConnectionFailure`].
    pub async fn connect(
        url: &str,
        policy: AcquirePolicy,
        poll_interval: Duration,
        retry_attempts: u32,
        backoff: Backoff,
    ) -> Result<Self, RedisError> {
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        info!(%policy, "redis lock manager connected");

        Ok(Self {
            connection,
            acquire_script: Script::new(ACQUIRE_SCRIPT),
            release_script: Script::new(RELEASE_SCRIPT),
            extend_script: Script::new(EXTEND_SCRIPT),
            policy,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
            retry_attempts,
            backoff,
        })
    }

    pub fn policy(&self) -> AcquirePolicy {
        self.policy
    }

    async fn try_acquire(
        &self,
        key: &str,
        owner: &str,
        ttl: Duration,
    ) -> Result<bool, LockFailure> {
        let acquired = retry_transient(
            "lock.acquire",
            self.retry_attempts,
            self.backoff,
            is_transient,
            || self.run_owner_script(&self.acquire_script, key, owner, Some(ttl)),
        )
        .await
        .map_err(|error| connection_failure(key, "acquire", &error))?;
        Ok(acquired == 1)
    }

    async fn run_owner_script(
        &self,
        script: &Script,
        key: &str,
        owner: &str,
        ttl: Option<Duration>,
    ) -> Result<i64, RedisError> {
        let mut connection = self.connection.clone();
        let mut invocation = script.key(key);
        invocation.arg(owner);
        if let Some(ttl) = ttl {
            invocation.arg(ttl_millis(ttl));
        }
        invocation.invoke_async::<_, i64>(&mut connection).await
    }
}

fn connection_failure(key: &str, operation: &'static str, error: &RedisError) -> LockFailure {
    warn!(key, operation, %error, "redis lock command failed");
    LockFailure::new(key, LockFailureReason::ConnectionFailure)
}

#[async_trait]
impl LockManager for RedisLockManager {
    async fn acquire_as(
        &self,
        key: &str,
        owner: &str,
        ttl: Duration,
        wait_timeout: Duration,
    ) -> Result<LockHandle, LockFailure> {
        let deadline = Instant::now() + wait_timeout;

        loop {
            // Stamped before the round-trip so local expiry never trails the store's.
            let attempted_at = Instant::now();
            if self.try_acquire(key, owner, ttl).await? {
                debug!(key, ttl_ms = ttl.as_millis() as u64, "lock acquired");
                return Ok(LockHandle::new(key, owner, attempted_at, ttl));
            }

            if self.policy == AcquirePolicy::FailFast {
                debug!(key, "lock held elsewhere, failing fast");
                return Err(LockFailure::new(key, LockFailureReason::AlreadyLocked));
            }

            let now = Instant::now();
            if now >= deadline {
                debug!(key, wait_ms = wait_timeout.as_millis() as u64, "lock wait timed out");
                return Err(LockFailure::new(key, LockFailureReason::Timeout));
            }
            tokio::time::sleep_until((now + self.poll_interval).min(deadline)).await;
        }
    }

    async fn release_owner(&self, key: &str, owner: &str) -> Result<ReleaseOutcome, LockFailure> {
        let deleted = retry_transient(
            "lock.release",
            self.retry_attempts,
            self.backoff,
            is_transient,
            || self.run_owner_script(&self.release_script, key, owner, None),
        )
        .await
        .map_err(|error| connection_failure(key, "release", &error))?;

        let outcome = if deleted == 1 {
            ReleaseOutcome::Released
        } else {
            ReleaseOutcome::Expired
        };
        debug!(key, %outcome, "lock released");
        Ok(outcome)
    }

    async fn extend(&self, handle: &mut LockHandle, ttl: Duration) -> Result<bool, LockFailure> {
        let attempted_at = Instant::now();
        let extended = {
            let key = handle.key();
            let owner = handle.owner();
            retry_transient(
                "lock.extend",
                self.retry_attempts,
                self.backoff,
                is_transient,
                || self.run_owner_script(&self.extend_script, key, owner, Some(ttl)),
            )
            .await
            .map_err(|error| connection_failure(key, "extend", &error))?
        };

        if extended == 1 {
            handle.renewed(attempted_at, ttl);
            debug!(key = handle.key(), ttl_ms = ttl.as_millis() as u64, "lock extended");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
