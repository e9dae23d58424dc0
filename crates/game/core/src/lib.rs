//! Deterministic combat math shared by every service that resolves fights.
//!
//! `game-core` derives combat statistics from raw attributes ([`stats`]) and
//! resolves one attack between two combatants ([`combat`]). Nothing in this
//! crate performs I/O, reads a clock or touches ambient randomness: rolls come
//! from a caller-supplied [`RandomSource`], so every resolution can be replayed
//! from its seed.
pub mod combat;
pub mod config;
pub mod error;
pub mod rng;
pub mod stats;

pub use combat::{
    AttackOutcome, AttackResult, Chances, DamageCalculation, Effectiveness, resolve_attack,
    resolve_attack_seeded,
};
pub use config::CombatConfig;
pub use error::{DomainRuleViolation, ErrorSeverity};
pub use rng::{PcgRng, RandomSource};
pub use stats::{
    Archetype, AttackType, Attributes, CharacterClass, CombatStats, Combatant, DefenseType,
    ResourcePools, ValidAttributes,
};

/// Resolve an attack between two raw combatants.
///
/// Validates both attribute blocks, derives their combat stats and the level
/// delta (attacker minus defender), then resolves with a [`PcgRng`] seeded
/// from `seed`.
pub fn resolve_between(
    attacker: &Combatant,
    defender: &Combatant,
    seed: u64,
) -> Result<AttackResult, DomainRuleViolation> {
    let attacker_stats = attacker.combat_stats()?;
    let defender_stats = defender.combat_stats()?;
    let level_delta = attacker.attributes.level - defender.attributes.level;

    Ok(resolve_attack_seeded(
        &attacker_stats,
        &defender_stats,
        level_delta,
        seed,
    ))
}
