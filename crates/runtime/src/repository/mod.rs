//! Repository layer for persisted character stats.
//!
//! The stats record is the only shared mutable resource in the runtime. It is
//! written exclusively through [`MutationGuard`](crate::guard::MutationGuard),
//! which pairs a lock with the version-checked write defined here.

mod error;
mod memory;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use memory::InMemoryStatsRepository;
pub use traits::StatsRepository;
pub use types::{CasOutcome, CharacterId, StatValues, StatsRecord};
