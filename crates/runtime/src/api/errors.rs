//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from lock coordination, the optimistic write loop and the
//! stats repository so callers get one typed, retryable-or-not failure.
use game_core::{DomainRuleViolation, ErrorSeverity};
use thiserror::Error;

use crate::guard::{ConcurrencyFailure, MutationPhase};
use crate::lock::{LockFailure, LockFailureReason};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    DomainRule(#[from] DomainRuleViolation),

    #[error(transparent)]
    Lock(#[from] LockFailure),

    #[error(transparent)]
    Concurrency(#[from] ConcurrencyFailure),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("mutation cancelled by caller")]
    Cancelled,

    #[error("runtime requires a stats repository before building")]
    MissingRepository,

    #[error("failed to connect lock backend at {url}")]
    LockBackendConnect {
        url: String,
        #[source]
        source: redis::RedisError,
    },
}

impl RuntimeError {
    /// Whether re-issuing the whole action later may succeed.
    ///
    /// No failing call commits a partial delta, so every retryable failure can
    /// be re-issued as-is.
    pub fn is_retryable(&self) -> bool {
        match self {
            RuntimeError::Lock(_) | RuntimeError::Concurrency(_) => true,
            RuntimeError::Repository(error) => error.is_transient(),
            RuntimeError::DomainRule(_)
            | RuntimeError::Cancelled
            | RuntimeError::MissingRepository
            | RuntimeError::LockBackendConnect { .. } => false,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RuntimeError::DomainRule(violation) => violation.severity(),
            _ if self.is_retryable() => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Internal,
        }
    }

    /// Phase a guarded mutation ends in when it fails with this error.
    pub fn terminal_phase(&self) -> MutationPhase {
        match self {
            RuntimeError::Lock(failure) if failure.reason == LockFailureReason::Timeout => {
                MutationPhase::AbortedLockTimeout
            }
            RuntimeError::Lock(_) => MutationPhase::AbortedLockFailure,
            RuntimeError::Concurrency(_) => MutationPhase::AbortedConcurrencyExhausted,
            RuntimeError::Cancelled => MutationPhase::AbortedCancelled,
            _ => MutationPhase::AbortedStoreFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::CharacterId;

    #[test]
    fn coordination_failures_are_retryable() {
        let lock = RuntimeError::from(LockFailure::new("k", LockFailureReason::ConnectionFailure));
        assert!(lock.is_retryable());
        assert_eq!(lock.severity(), ErrorSeverity::Recoverable);

        let exhausted = RuntimeError::from(ConcurrencyFailure {
            entity_type: "character",
            entity_id: CharacterId(3),
            retry_attempts: 5,
        });
        assert!(exhausted.is_retryable());
    }

    #[test]
    fn rule_violations_are_never_retried() {
        let error = RuntimeError::from(DomainRuleViolation::InvalidLevel(0));
        assert!(!error.is_retryable());
        assert_eq!(error.severity(), ErrorSeverity::Validation);
    }

    #[test]
    fn only_unavailable_store_is_retryable() {
        assert!(RuntimeError::from(RepositoryError::Unavailable("down".into())).is_retryable());
        let missing = RuntimeError::from(RepositoryError::NotFound(CharacterId(1)));
        assert!(!missing.is_retryable());
        assert_eq!(missing.severity(), ErrorSeverity::Internal);
    }
}
