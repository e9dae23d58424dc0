//! Turns resolved attacks into bounded stat deltas and commits them.

use game_core::{AttackResult, AttackType, CombatStats};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::Result;
use crate::guard::{MutationGuard, MutationOptions, MutationReport};
use crate::repository::{CharacterId, StatValues, StatsRecord};

/// Mana spent per attack by magic-based attack types.
const MAGIC_ATTACK_COST: u32 = 5;
const HYBRID_ATTACK_COST: u32 = 2;

/// Signed change to a character's pools plus an experience gain.
///
/// Experience is unsigned: combat never takes experience away.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatDelta {
    pub health: i64,
    pub mana: i64,
    pub experience: u64,
}

impl StatDelta {
    /// Damage taken by the defender of `result`.
    pub fn from_attack(result: &AttackResult) -> Self {
        Self {
            health: -i64::from(result.final_damage),
            ..Self::default()
        }
    }

    pub const fn experience_gain(amount: u64) -> Self {
        Self {
            health: 0,
            mana: 0,
            experience: amount,
        }
    }

    /// What the attacker of `result` earns and spends: experience equal to the
    /// damage dealt, and the mana cost of its attack type.
    pub fn attacker_reward(attacker: &CombatStats, result: &AttackResult) -> Self {
        Self {
            health: 0,
            mana: -i64::from(mana_cost(attacker.attack_type)),
            experience: u64::from(result.final_damage),
        }
    }

    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }

    /// Values after applying this delta to `current`.
    ///
    /// Health and mana are clamped into `[0, max]`; experience saturates.
    pub fn apply_to(&self, current: &StatsRecord) -> StatValues {
        StatValues {
            health: clamp_pool(current.health, self.health, current.max_health),
            mana: clamp_pool(current.mana, self.mana, current.max_mana),
            experience: current.experience.saturating_add(self.experience),
        }
    }
}

pub const fn mana_cost(attack_type: AttackType) -> u32 {
    match attack_type {
        AttackType::ElementalMagic | AttackType::SpiritualMagic => MAGIC_ATTACK_COST,
        AttackType::MeleeHybrid | AttackType::RangedHybrid => HYBRID_ATTACK_COST,
        AttackType::HeavyMelee | AttackType::FastMelee => 0,
    }
}

fn clamp_pool(current: u32, delta: i64, max: u32) -> u32 {
    let next = i64::from(current).saturating_add(delta);
    // Bounded by `max`, so the narrowing is lossless.
    next.clamp(0, i64::from(max)) as u32
}

/// Post-mutation view of a character returned to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSnapshot {
    pub id: CharacterId,
    pub health: u32,
    pub max_health: u32,
    pub mana: u32,
    pub max_mana: u32,
    pub experience: u64,
    pub version: u64,
}

impl CharacterSnapshot {
    pub fn new(id: CharacterId, record: &StatsRecord) -> Self {
        Self {
            id,
            health: record.health,
            max_health: record.max_health,
            mana: record.mana,
            max_mana: record.max_mana,
            experience: record.experience,
            version: record.version,
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.health == 0
    }
}

/// Applies deltas to persisted characters through a [`MutationGuard`].
pub struct StatMutationService {
    guard: MutationGuard,
}

impl StatMutationService {
    pub fn new(guard: MutationGuard) -> Self {
        Self { guard }
    }

    pub fn guard(&self) -> &MutationGuard {
        &self.guard
    }

    /// Apply the damage of `result` to character `id`.
    pub async fn apply(
        &self,
        id: CharacterId,
        result: &AttackResult,
        options: &MutationOptions,
        cancel: &CancellationToken,
    ) -> Result<CharacterSnapshot> {
        self.apply_delta(id, StatDelta::from_attack(result), options, cancel)
            .await
    }

    pub async fn apply_delta(
        &self,
        id: CharacterId,
        delta: StatDelta,
        options: &MutationOptions,
        cancel: &CancellationToken,
    ) -> Result<CharacterSnapshot> {
        // A miss, or a free physical attack that dealt nothing, changes no
        // stats: skip the lock and the version bump.
        if delta.is_noop() {
            debug!(character = %id, "empty stat delta, nothing to write");
            return self.snapshot(id).await;
        }

        debug!(
            character = %id,
            health = delta.health,
            mana = delta.mana,
            experience = delta.experience,
            "applying stat delta"
        );

        let MutationReport { record, .. } = self
            .guard
            .run_guarded(id, options, cancel, |current| delta.apply_to(current))
            .await?;

        Ok(CharacterSnapshot::new(id, &record))
    }

    /// Current persisted stats, read without taking the lock.
    pub async fn snapshot(&self, id: CharacterId) -> Result<CharacterSnapshot> {
        let record = self.guard.repository().load_stats(id).await?;
        Ok(CharacterSnapshot::new(id, &record))
    }
}
