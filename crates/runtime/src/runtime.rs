//! High-level runtime assembly.
//!
//! [`CombatRuntime`] owns the configured lock backend, the stats repository and
//! the mutation service, and hands out cloneable [`CombatHandle`]s.

use std::sync::Arc;

use tracing::info;

use crate::api::{CombatHandle, Result, RuntimeError};
use crate::config::RuntimeConfig;
use crate::guard::MutationGuard;
use crate::lock::{LockBackend, LockManager};
use crate::repository::StatsRepository;
use crate::service::StatMutationService;

/// Assembled combat runtime.
///
/// Design: the runtime owns the wiring, [`CombatHandle`] is the cloneable
/// façade callers share across tasks.
pub struct CombatRuntime {
    config: RuntimeConfig,
    handle: CombatHandle,
}

impl CombatRuntime {
    /// Create a new runtime builder
    pub fn builder() -> CombatRuntimeBuilder {
        CombatRuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> CombatHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

/// Builder for [`CombatRuntime`].
pub struct CombatRuntimeBuilder {
    config: RuntimeConfig,
    repository: Option<Arc<dyn StatsRepository>>,
    locks: Option<Arc<dyn LockManager>>,
}

impl CombatRuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            repository: None,
            locks: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the required stats repository
    pub fn repository(mut self, repository: Arc<dyn StatsRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Use an explicit lock manager instead of the configured backend.
    pub fn lock_manager(mut self, locks: Arc<dyn LockManager>) -> Self {
        self.locks = Some(locks);
        self
    }

    pub async fn build(self) -> Result<CombatRuntime> {
        let repository = self.repository.ok_or(RuntimeError::MissingRepository)?;

        let locks = match self.locks {
            Some(locks) => locks,
            None => {
                let backend = LockBackend::from_config(&self.config.lock, &self.config.mutation)
                    .await
                    .map_err(|source| RuntimeError::LockBackendConnect {
                        url: self.config.lock.redis_url.clone(),
                        source,
                    })?;
                Arc::new(backend) as Arc<dyn LockManager>
            }
        };

        let guard = MutationGuard::new(
            locks,
            repository,
            self.config.lock.key_prefix.clone(),
            self.config.mutation.backoff,
            self.config.mutation.store_retry_attempts,
        );
        let service = Arc::new(StatMutationService::new(guard));
        let handle = CombatHandle::new(service, self.config.mutation_options());

        info!(
            lock_backend = %self.config.lock.backend,
            key_prefix = %self.config.lock.key_prefix,
            max_attempts = self.config.mutation.max_attempts,
            "combat runtime built"
        );

        Ok(CombatRuntime {
            config: self.config,
            handle,
        })
    }
}
