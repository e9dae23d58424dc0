//! Concurrency-safe stat mutation for resolved combat.
//!
//! This crate wires the pure resolver in `game-core` to persisted character
//! state. Consumers build a [`CombatRuntime`] and share its [`CombatHandle`]
//! across tasks.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the builder
//! - [`api`] exposes the types downstream callers interact with
//! - [`lock`] provides named TTL locks, in-process or Redis-backed
//! - [`guard`] runs lock + optimistic compare-and-swap mutations
//! - [`service`] converts attack results into bounded stat deltas
//! - [`repository`] defines the persistence boundary
pub mod api;
pub mod config;
pub mod guard;
pub mod lock;
pub mod repository;
pub mod retry;
pub mod runtime;
pub mod service;

pub use api::{CombatHandle, Result, RuntimeError};
pub use config::{LockBackendKind, LockConfig, MutationConfig, RuntimeConfig};
pub use guard::{ConcurrencyFailure, MutationGuard, MutationOptions, MutationPhase, MutationReport};
pub use lock::{
    AcquirePolicy, InProcessLockManager, LockBackend, LockFailure, LockFailureReason, LockHandle,
    LockManager, RedisLockManager, ReleaseOutcome,
};
pub use repository::{
    CasOutcome, CharacterId, InMemoryStatsRepository, RepositoryError, StatValues, StatsRecord,
    StatsRepository,
};
pub use retry::Backoff;
pub use runtime::{CombatRuntime, CombatRuntimeBuilder};
pub use service::{CharacterSnapshot, StatDelta, StatMutationService};
