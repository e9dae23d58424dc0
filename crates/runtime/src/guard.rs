//! Lock + optimistic-write read-modify-write of persisted stats.
//!
//! [`MutationGuard::run_guarded`] is the only path that writes a
//! [`StatsRecord`]. It serializes writers for one character through the lock
//! manager and still verifies every write against the stored version, so a
//! writer that lost its lock to TTL expiry (or never took it) cannot cause a
//! lost update.
//!
//! Each call walks the phases
//!
//! ```text
//! Pending → LockAcquired → StateLoaded → DeltaApplied → Committed
//!                               ↑              │
//!                               └── conflict ──┘
//! ```
//!
//! and ends either in `Committed` or in one of the `Aborted*` phases.
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use game_core::DomainRuleViolation;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::api::{Result, RuntimeError};
use crate::lock::{
    LockFailure, LockFailureReason, LockHandle, LockManager, ReleaseOutcome, new_owner_token,
};
use crate::repository::{
    CasOutcome, CharacterId, RepositoryError, StatValues, StatsRecord, StatsRepository,
};
use crate::retry::{Backoff, retry_transient};

/// Optimistic writes kept conflicting until the attempt budget ran out.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{entity_type} {entity_id}: optimistic write conflicted on all {retry_attempts} attempts")]
pub struct ConcurrencyFailure {
    pub entity_type: &'static str,
    pub entity_id: CharacterId,
    pub retry_attempts: u32,
}

/// Per-call limits of one guarded mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MutationOptions {
    /// Optimistic-write attempts, including the first.
    pub max_attempts: u32,
    pub lock_ttl: Duration,
    pub wait_timeout: Duration,
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lock_ttl: Duration::from_millis(5000),
            wait_timeout: Duration::from_millis(2000),
        }
    }
}

impl MutationOptions {
    pub fn validate(&self) -> std::result::Result<(), DomainRuleViolation> {
        if self.max_attempts == 0 {
            return Err(DomainRuleViolation::ZeroParameter {
                parameter: "max_attempts",
            });
        }
        if self.lock_ttl.is_zero() {
            return Err(DomainRuleViolation::ZeroParameter {
                parameter: "lock_ttl",
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum MutationPhase {
    Pending,
    LockAcquired,
    StateLoaded,
    DeltaApplied,
    Committed,
    AbortedLockTimeout,
    AbortedLockFailure,
    AbortedConcurrencyExhausted,
    AbortedCancelled,
    AbortedStoreFailure,
}

impl MutationPhase {
    pub const fn is_terminal(self) -> bool {
        !matches!(
            self,
            MutationPhase::Pending
                | MutationPhase::LockAcquired
                | MutationPhase::StateLoaded
                | MutationPhase::DeltaApplied
        )
    }

    pub const fn can_transition_to(self, next: MutationPhase) -> bool {
        use MutationPhase::*;

        match (self, next) {
            (
                Pending,
                LockAcquired | AbortedLockTimeout | AbortedLockFailure | AbortedCancelled,
            ) => true,
            (LockAcquired, StateLoaded) => true,
            (StateLoaded, DeltaApplied) => true,
            (DeltaApplied, Committed | StateLoaded | AbortedConcurrencyExhausted) => true,
            // The lock can expire under any held phase, and both the store and
            // the caller can fail or cancel any pending round-trip.
            (
                LockAcquired | StateLoaded | DeltaApplied,
                AbortedLockFailure | AbortedCancelled | AbortedStoreFailure,
            ) => true,
            _ => false,
        }
    }
}

/// Ordered record of the phases one mutation went through.
#[derive(Debug)]
struct PhaseLog {
    id: CharacterId,
    phases: Vec<MutationPhase>,
}

impl PhaseLog {
    fn new(id: CharacterId) -> Self {
        Self {
            id,
            phases: vec![MutationPhase::Pending],
        }
    }

    fn current(&self) -> MutationPhase {
        self.phases
            .last()
            .copied()
            .unwrap_or(MutationPhase::Pending)
    }

    fn advance(&mut self, next: MutationPhase) {
        let from = self.current();
        debug_assert!(
            from.can_transition_to(next),
            "illegal mutation transition {from} -> {next}"
        );
        trace!(character = %self.id, %from, to = %next, "mutation phase");
        self.phases.push(next);
    }
}

/// A committed mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationReport {
    pub record: StatsRecord,
    /// Optimistic-write attempts used, including the successful one.
    pub attempts: u32,
    pub phases: Vec<MutationPhase>,
}

pub struct MutationGuard {
    locks: Arc<dyn LockManager>,
    repository: Arc<dyn StatsRepository>,
    key_prefix: String,
    backoff: Backoff,
    store_retry_attempts: u32,
}

impl MutationGuard {
    pub fn new(
        locks: Arc<dyn LockManager>,
        repository: Arc<dyn StatsRepository>,
        key_prefix: impl Into<String>,
        backoff: Backoff,
        store_retry_attempts: u32,
    ) -> Self {
        Self {
            locks,
            repository,
            key_prefix: key_prefix.into(),
            backoff,
            store_retry_attempts: store_retry_attempts.max(1),
        }
    }

    pub fn repository(&self) -> &Arc<dyn StatsRepository> {
        &self.repository
    }

    pub fn lock_key(&self, id: CharacterId) -> String {
        id.lock_key(&self.key_prefix)
    }

    /// Lock `id`, then load, apply `op` and compare-and-swap until a write
    /// commits or `options.max_attempts` conflicts have been seen.
    ///
    /// `op` may run several times and must be a pure function of the record it
    /// is given. The lock is released on every exit path: commit, error,
    /// cancellation and a panic in `op` or the store (which is re-raised once
    /// the lock is free). Dropping the returned future frees the key from a
    /// background task.
    ///
    /// Cancelling `cancel` aborts the lock wait, any pending store call and any
    /// backoff sleep; nothing is written after cancellation is observed.
    pub async fn run_guarded<F>(
        &self,
        id: CharacterId,
        options: &MutationOptions,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<MutationReport>
    where
        F: FnMut(&StatsRecord) -> StatValues + Send,
    {
        options.validate()?;

        let key = self.lock_key(id);
        let owner = new_owner_token();
        let mut phases = PhaseLog::new(id);
        // Armed before acquisition: if this future is dropped anywhere past
        // here, the key is freed in the background instead of at TTL expiry.
        let mut abandoned = ReleaseOnDrop::new(Arc::clone(&self.locks), &key, &owner);

        let acquire = self
            .locks
            .acquire_as(&key, &owner, options.lock_ttl, options.wait_timeout);
        let acquired = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RuntimeError::Cancelled),
            result = acquire => result.map_err(RuntimeError::from),
        };
        let mut handle = match acquired {
            Ok(handle) => handle,
            Err(error) => {
                if may_hold_lock(&error) {
                    // The store may have taken the lock before the call was
                    // abandoned or its reply was lost.
                    self.release_owner(&key, &owner).await;
                }
                abandoned.disarm();
                phases.advance(error.terminal_phase());
                debug!(character = %id, key = %key, %error, "mutation aborted before lock");
                return Err(error);
            }
        };
        phases.advance(MutationPhase::LockAcquired);

        let outcome = AssertUnwindSafe(self.mutate(
            id,
            &mut handle,
            options,
            cancel,
            &mut op,
            &mut phases,
        ))
        .catch_unwind()
        .await;
        self.release(handle).await;
        abandoned.disarm();

        match outcome {
            Ok(Ok((record, attempts))) => Ok(MutationReport {
                record,
                attempts,
                phases: phases.phases,
            }),
            Ok(Err(error)) => {
                phases.advance(error.terminal_phase());
                Err(error)
            }
            Err(panic) => {
                warn!(character = %id, key = %key, "mutation panicked, lock released");
                std::panic::resume_unwind(panic)
            }
        }
    }

    async fn mutate<F>(
        &self,
        id: CharacterId,
        handle: &mut LockHandle,
        options: &MutationOptions,
        cancel: &CancellationToken,
        op: &mut F,
        phases: &mut PhaseLog,
    ) -> Result<(StatsRecord, u32)>
    where
        F: FnMut(&StatsRecord) -> StatValues + Send,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let current = self
                .store_call("stats.load", cancel, || self.repository.load_stats(id))
                .await?;
            phases.advance(MutationPhase::StateLoaded);

            let values = op(&current);
            phases.advance(MutationPhase::DeltaApplied);

            if handle.is_expired() {
                warn!(
                    character = %id,
                    key = handle.key(),
                    held_ms = handle.acquired_at().elapsed().as_millis() as u64,
                    "lock expired before write"
                );
                return Err(LockFailure::new(handle.key(), LockFailureReason::LockExpired).into());
            }

            let expected_version = current.version;
            let written = self
                .store_call("stats.compare_and_swap", cancel, || {
                    self.repository
                        .compare_and_swap_stats(id, expected_version, values)
                })
                .await?;

            match written {
                CasOutcome::Committed(record) => {
                    phases.advance(MutationPhase::Committed);
                    info!(
                        character = %id,
                        attempt,
                        version = record.version,
                        health = record.health,
                        mana = record.mana,
                        experience = record.experience,
                        "stats committed"
                    );
                    return Ok((record, attempt));
                }
                CasOutcome::Conflict { current_version } => {
                    warn!(
                        character = %id,
                        attempt,
                        max_attempts = options.max_attempts,
                        expected_version,
                        current_version,
                        "optimistic write conflicted"
                    );

                    if attempt >= options.max_attempts {
                        return Err(ConcurrencyFailure {
                            entity_type: "character",
                            entity_id: id,
                            retry_attempts: attempt,
                        }
                        .into());
                    }

                    let delay = self.backoff.delay_for(attempt - 1);
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(RuntimeError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    self.refresh_lock(handle, options.lock_ttl).await;
                }
            }
        }
    }

    /// Run one store call with transient-error retry, abortable by `cancel`.
    async fn store_call<T, F, Fut>(
        &self,
        operation: &'static str,
        cancel: &CancellationToken,
        op: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, RepositoryError>>,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RuntimeError::Cancelled),
            result = retry_transient(
                operation,
                self.store_retry_attempts,
                self.backoff,
                RepositoryError::is_transient,
                op,
            ) => result.map_err(RuntimeError::from),
        }
    }

    /// Best-effort extension once less than half the TTL is left.
    async fn refresh_lock(&self, handle: &mut LockHandle, ttl: Duration) {
        if handle.remaining() >= ttl / 2 {
            return;
        }
        match self.locks.extend(handle, ttl).await {
            Ok(true) => {}
            Ok(false) => debug!(key = handle.key(), "lock no longer owned, not extended"),
            Err(error) => debug!(key = handle.key(), %error, "lock extension failed"),
        }
    }

    async fn release(&self, handle: LockHandle) {
        let key = handle.key().to_owned();
        let held_ms = handle.acquired_at().elapsed().as_millis() as u64;

        match self.locks.release(handle).await {
            Ok(ReleaseOutcome::Released) => debug!(key = %key, held_ms, "lock released"),
            Ok(ReleaseOutcome::Expired) => {
                warn!(key = %key, held_ms, "lock had expired before release")
            }
            Err(error) => {
                warn!(key = %key, held_ms, %error, "lock release failed, key frees at TTL")
            }
        }
    }

    async fn release_owner(&self, key: &str, owner: &str) {
        match self.locks.release_owner(key, owner).await {
            Ok(ReleaseOutcome::Released) => debug!(key, "lock taken by abandoned acquire released"),
            Ok(ReleaseOutcome::Expired) => {}
            Err(error) => warn!(key, %error, "lock release failed, key frees at TTL"),
        }
    }
}

/// Whether a failed acquisition may still have left `owner`'s lock behind.
fn may_hold_lock(error: &RuntimeError) -> bool {
    match error {
        RuntimeError::Cancelled => true,
        RuntimeError::Lock(failure) => failure.reason == LockFailureReason::ConnectionFailure,
        _ => false,
    }
}

/// Frees a lock by owner token when dropped while still armed.
///
/// Explicit releases disarm it. It only fires when the mutation future itself
/// is dropped mid-flight, and then spawns the release onto the current runtime.
struct ReleaseOnDrop {
    locks: Arc<dyn LockManager>,
    key: String,
    owner: String,
    armed: bool,
}

impl ReleaseOnDrop {
    fn new(locks: Arc<dyn LockManager>, key: &str, owner: &str) -> Self {
        Self {
            locks,
            key: key.to_owned(),
            owner: owner.to_owned(),
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let key = std::mem::take(&mut self.key);
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(key = %key, "mutation dropped outside a runtime, key frees at TTL");
            return;
        };

        let locks = Arc::clone(&self.locks);
        let owner = std::mem::take(&mut self.owner);
        runtime.spawn(async move {
            match locks.release_owner(&key, &owner).await {
                Ok(outcome) => debug!(key = %key, %outcome, "dropped mutation's lock released"),
                Err(error) => warn!(key = %key, %error, "lock release failed, key frees at TTL"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MutationPhase::*;

    #[test]
    fn happy_path_transitions_are_legal() {
        let path = [Pending, LockAcquired, StateLoaded, DeltaApplied, Committed];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert!(DeltaApplied.can_transition_to(StateLoaded));
    }

    #[test]
    fn no_transition_skips_a_phase() {
        assert!(!Pending.can_transition_to(StateLoaded));
        assert!(!LockAcquired.can_transition_to(DeltaApplied));
        assert!(!StateLoaded.can_transition_to(Committed));
        assert!(!LockAcquired.can_transition_to(Committed));
        assert!(!Pending.can_transition_to(AbortedConcurrencyExhausted));
    }

    #[test]
    fn terminal_phases_have_no_exits() {
        for terminal in [
            Committed,
            AbortedLockTimeout,
            AbortedLockFailure,
            AbortedConcurrencyExhausted,
            AbortedCancelled,
            AbortedStoreFailure,
        ] {
            assert!(terminal.is_terminal());
            for next in [Pending, LockAcquired, StateLoaded, DeltaApplied, Committed] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn zero_limits_are_rule_violations() {
        let zero_attempts = MutationOptions {
            max_attempts: 0,
            ..MutationOptions::default()
        };
        assert_eq!(
            zero_attempts.validate(),
            Err(DomainRuleViolation::ZeroParameter {
                parameter: "max_attempts"
            })
        );

        let zero_ttl = MutationOptions {
            lock_ttl: Duration::ZERO,
            ..MutationOptions::default()
        };
        assert!(zero_ttl.validate().is_err());
        assert!(MutationOptions::default().validate().is_ok());
    }

    #[test]
    fn errors_map_to_terminal_phases() {
        let timeout = RuntimeError::from(LockFailure::new("k", LockFailureReason::Timeout));
        assert_eq!(timeout.terminal_phase(), AbortedLockTimeout);

        let held = RuntimeError::from(LockFailure::new("k", LockFailureReason::AlreadyLocked));
        assert_eq!(held.terminal_phase(), AbortedLockFailure);

        let store = RuntimeError::from(RepositoryError::Unavailable("down".into()));
        assert_eq!(store.terminal_phase(), AbortedStoreFailure);
        assert_eq!(RuntimeError::Cancelled.terminal_phase(), AbortedCancelled);
    }
}
