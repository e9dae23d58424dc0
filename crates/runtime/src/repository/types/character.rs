//! Persisted character stats and the values a compare-and-swap writes.

use std::fmt;

use game_core::ResourcePools;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub u64);

impl CharacterId {
    /// Lock key guarding this character: `{prefix}:character:{id}`.
    pub fn lock_key(self, prefix: &str) -> String {
        format!("{prefix}:character:{}", self.0)
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A character's mutable stats as stored, with the optimistic version token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRecord {
    pub health: u32,
    pub max_health: u32,
    pub mana: u32,
    pub max_mana: u32,
    pub experience: u64,
    /// Incremented by every committed write.
    pub version: u64,
}

impl StatsRecord {
    /// Fresh record at full health and mana.
    pub fn seeded(pools: ResourcePools) -> Self {
        Self {
            health: pools.max_health,
            max_health: pools.max_health,
            mana: pools.max_mana,
            max_mana: pools.max_mana,
            experience: 0,
            version: 0,
        }
    }

    pub fn values(&self) -> StatValues {
        StatValues {
            health: self.health,
            mana: self.mana,
            experience: self.experience,
        }
    }
}

/// New values proposed by one optimistic write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatValues {
    pub health: u32,
    pub mana: u32,
    pub experience: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CasOutcome {
    Committed(StatsRecord),
    /// The stored version moved on since the writer loaded it.
    Conflict { current_version: u64 },
}
