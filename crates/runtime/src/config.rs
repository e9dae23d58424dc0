//! Runtime configuration structures and loaders.
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::guard::MutationOptions;
use crate::lock::AcquirePolicy;
use crate::retry::Backoff;

/// Which [`LockManager`](crate::lock::LockManager) implementation to build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum LockBackendKind {
    #[default]
    InProcess,
    Redis,
}

impl FromStr for LockBackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in_process" | "in-process" => Ok(LockBackendKind::InProcess),
            "redis" => Ok(LockBackendKind::Redis),
            other => Err(format!("unknown lock backend `{other}`")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockConfig {
    pub backend: LockBackendKind,
    pub redis_url: String,
    pub key_prefix: String,
    pub policy: AcquirePolicy,
    pub ttl: Duration,
    pub wait_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            backend: LockBackendKind::InProcess,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "lock".to_string(),
            policy: AcquirePolicy::Wait,
            ttl: Duration::from_millis(5000),
            wait_timeout: Duration::from_millis(2000),
            poll_interval: Duration::from_millis(25),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MutationConfig {
    /// Optimistic-write attempts before giving up.
    pub max_attempts: u32,
    pub backoff: Backoff,
    /// Attempts per persistence or coordination-store call on transient errors.
    pub store_retry_attempts: u32,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Backoff::default(),
            store_retry_attempts: 3,
        }
    }
}

/// Configuration shared by the lock backend, the guard and the handle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub lock: LockConfig,
    pub mutation: MutationConfig,
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `LOCK_BACKEND` - `memory` or `redis` (default: memory)
    /// - `REDIS_URL` - Coordination store URL (default: redis://127.0.0.1:6379)
    /// - `LOCK_KEY_PREFIX` - Prefix of every lock key (default: lock)
    /// - `LOCK_POLICY` - `wait` or `fail_fast` (default: wait)
    /// - `LOCK_TTL_MS` - Lock time-to-live (default: 5000)
    /// - `LOCK_WAIT_TIMEOUT_MS` - Longest wait for a held lock (default: 2000)
    /// - `LOCK_POLL_INTERVAL_MS` - Re-check interval while waiting (default: 25)
    /// - `MUTATION_MAX_ATTEMPTS` - Optimistic-write attempts (default: 5)
    /// - `MUTATION_BACKOFF_MS` - Base conflict backoff (default: 10)
    /// - `MUTATION_BACKOFF_MAX_MS` - Backoff ceiling (default: 250)
    /// - `STORE_RETRY_ATTEMPTS` - Attempts per store call on transient errors (default: 3)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Lock configuration
        if let Some(backend) = read_env::<LockBackendKind>("LOCK_BACKEND") {
            config.lock.backend = backend;
        }
        if let Ok(url) = env::var("REDIS_URL") {
            config.lock.redis_url = url;
        }
        if let Ok(prefix) = env::var("LOCK_KEY_PREFIX") {
            config.lock.key_prefix = prefix;
        }
        if let Some(policy) = read_env::<AcquirePolicy>("LOCK_POLICY") {
            config.lock.policy = policy;
        }
        if let Some(ttl) = read_millis("LOCK_TTL_MS") {
            config.lock.ttl = ttl.max(Duration::from_millis(1));
        }
        if let Some(wait) = read_millis("LOCK_WAIT_TIMEOUT_MS") {
            config.lock.wait_timeout = wait;
        }
        if let Some(poll) = read_millis("LOCK_POLL_INTERVAL_MS") {
            config.lock.poll_interval = poll.max(Duration::from_millis(1));
        }

        // Mutation configuration
        if let Some(attempts) = read_env::<u32>("MUTATION_MAX_ATTEMPTS") {
            config.mutation.max_attempts = attempts.max(1);
        }
        if let Some(base) = read_millis("MUTATION_BACKOFF_MS") {
            config.mutation.backoff.base = base;
        }
        if let Some(max) = read_millis("MUTATION_BACKOFF_MAX_MS") {
            config.mutation.backoff.max = max;
        }
        if let Some(attempts) = read_env::<u32>("STORE_RETRY_ATTEMPTS") {
            config.mutation.store_retry_attempts = attempts.max(1);
        }

        config
    }

    /// Per-call options derived from the configured defaults.
    pub fn mutation_options(&self) -> MutationOptions {
        MutationOptions {
            max_attempts: self.mutation.max_attempts,
            lock_ttl: self.lock.ttl,
            wait_timeout: self.lock.wait_timeout,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    env::var(key).ok()?.parse().ok()
}

fn read_millis(key: &str) -> Option<Duration> {
    read_env::<u64>(key).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RuntimeConfig::default();
        assert_eq!(config.lock.backend, LockBackendKind::InProcess);
        assert_eq!(config.lock.key_prefix, "lock");
        assert_eq!(config.lock.ttl, Duration::from_secs(5));
        assert_eq!(config.lock.wait_timeout, Duration::from_secs(2));
        assert_eq!(config.mutation.max_attempts, 5);
        assert_eq!(config.mutation.store_retry_attempts, 3);

        let options = config.mutation_options();
        assert_eq!(options.max_attempts, 5);
        assert_eq!(options.lock_ttl, Duration::from_secs(5));
    }

    #[test]
    fn backend_kind_parses_config_spellings() {
        assert_eq!("memory".parse(), Ok(LockBackendKind::InProcess));
        assert_eq!("Redis".parse(), Ok(LockBackendKind::Redis));
        assert!("etcd".parse::<LockBackendKind>().is_err());
    }
}
