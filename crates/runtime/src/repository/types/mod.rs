//! Shared types for repository layer.

mod character;

pub use character::{CasOutcome, CharacterId, StatValues, StatsRecord};
