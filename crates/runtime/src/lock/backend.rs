//! Configuration-selected lock backend.

use std::time::Duration;

use async_trait::async_trait;
use redis::RedisError;
use tracing::info;

use super::{
    InProcessLockManager, LockFailure, LockHandle, LockManager, RedisLockManager, ReleaseOutcome,
};
use crate::config::{LockBackendKind, LockConfig, MutationConfig};

/// One of the concrete lock managers, dispatched statically.
pub enum LockBackend {
    InProcess(InProcessLockManager),
    Redis(RedisLockManager),
}

impl LockBackend {
    /// Build the backend named by `lock.backend`.
    ///
    /// Only the Redis backend can fail, when its initial connection does.
    pub async fn from_config(
        lock: &LockConfig,
        mutation: &MutationConfig,
    ) -> Result<Self, RedisError> {
        let backend = match lock.backend {
            LockBackendKind::InProcess => {
                LockBackend::InProcess(InProcessLockManager::new(lock.policy, lock.poll_interval))
            }
            LockBackendKind::Redis => LockBackend::Redis(
                RedisLockManager::connect(
                    &lock.redis_url,
                    lock.policy,
                    lock.poll_interval,
                    mutation.store_retry_attempts,
                    mutation.backoff,
                )
                .await?,
            ),
        };

        info!(backend = %backend.kind(), policy = %lock.policy, "lock backend ready");
        Ok(backend)
    }

    pub fn kind(&self) -> LockBackendKind {
        match self {
            LockBackend::InProcess(_) => LockBackendKind::InProcess,
            LockBackend::Redis(_) => LockBackendKind::Redis,
        }
    }
}

#[async_trait]
impl LockManager for LockBackend {
    async fn acquire_as(
        &self,
        key: &str,
        owner: &str,
        ttl: Duration,
        wait_timeout: Duration,
    ) -> Result<LockHandle, LockFailure> {
        match self {
            LockBackend::InProcess(locks) => locks.acquire_as(key, owner, ttl, wait_timeout).await,
            LockBackend::Redis(locks) => locks.acquire_as(key, owner, ttl, wait_timeout).await,
        }
    }

    async fn release_owner(&self, key: &str, owner: &str) -> Result<ReleaseOutcome, LockFailure> {
        match self {
            LockBackend::InProcess(locks) => locks.release_owner(key, owner).await,
            LockBackend::Redis(locks) => locks.release_owner(key, owner).await,
        }
    }

    async fn extend(&self, handle: &mut LockHandle, ttl: Duration) -> Result<bool, LockFailure> {
        match self {
            LockBackend::InProcess(locks) => locks.extend(handle, ttl).await,
            LockBackend::Redis(locks) => locks.extend(handle, ttl).await,
        }
    }
}
