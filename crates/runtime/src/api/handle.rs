//! Cloneable façade over combat resolution and stat mutation.
//!
//! [`CombatHandle`] is what the routing or bot layer holds: the pure resolver
//! calls run inline, the mutation calls go through the lock and the optimistic
//! write loop.
use std::sync::Arc;

use game_core::{AttackResult, CombatStats, Combatant};
use tokio_util::sync::CancellationToken;

use super::errors::Result;
use crate::guard::MutationOptions;
use crate::repository::CharacterId;
use crate::service::{CharacterSnapshot, StatDelta, StatMutationService};

/// Client-facing handle to the combat runtime
#[derive(Clone)]
pub struct CombatHandle {
    service: Arc<StatMutationService>,
    defaults: MutationOptions,
}

impl CombatHandle {
    pub(crate) fn new(service: Arc<StatMutationService>, defaults: MutationOptions) -> Self {
        Self { service, defaults }
    }

    /// Mutation options built from the runtime configuration.
    pub fn default_options(&self) -> MutationOptions {
        self.defaults
    }

    /// Resolve one attack with a PCG stream seeded by `seed`.
    pub fn resolve_attack(
        &self,
        attacker: &CombatStats,
        defender: &CombatStats,
        level_delta: i32,
        seed: u64,
    ) -> AttackResult {
        game_core::resolve_attack_seeded(attacker, defender, level_delta, seed)
    }

    /// Validate two raw combatants, derive their stats and resolve.
    pub fn resolve_between(
        &self,
        attacker: &Combatant,
        defender: &Combatant,
        seed: u64,
    ) -> Result<AttackResult> {
        Ok(game_core::resolve_between(attacker, defender, seed)?)
    }

    /// Apply the damage of `result` to the defending character `id`.
    pub async fn apply_combat_result(
        &self,
        id: CharacterId,
        result: &AttackResult,
        options: MutationOptions,
    ) -> Result<CharacterSnapshot> {
        self.apply_combat_result_with_cancel(id, result, options, &CancellationToken::new())
            .await
    }

    /// [`apply_combat_result`](Self::apply_combat_result) abortable through `cancel`.
    pub async fn apply_combat_result_with_cancel(
        &self,
        id: CharacterId,
        result: &AttackResult,
        options: MutationOptions,
        cancel: &CancellationToken,
    ) -> Result<CharacterSnapshot> {
        self.service.apply(id, result, &options, cancel).await
    }

    /// Credit the attacking character `id` with experience and charge its mana.
    pub async fn award_attacker(
        &self,
        id: CharacterId,
        attacker: &CombatStats,
        result: &AttackResult,
        options: MutationOptions,
    ) -> Result<CharacterSnapshot> {
        let delta = StatDelta::attacker_reward(attacker, result);
        self.apply_delta(id, delta, options, &CancellationToken::new())
            .await
    }

    pub async fn apply_delta(
        &self,
        id: CharacterId,
        delta: StatDelta,
        options: MutationOptions,
        cancel: &CancellationToken,
    ) -> Result<CharacterSnapshot> {
        self.service.apply_delta(id, delta, &options, cancel).await
    }

    /// Current persisted stats of `id` (read-only, unlocked).
    pub async fn character(&self, id: CharacterId) -> Result<CharacterSnapshot> {
        self.service.snapshot(id).await
    }
}
