//! Damage calculation and the audit record it produces.

use crate::config::CombatConfig;

use super::effectiveness::Effectiveness;
use super::result::AttackOutcome;

/// Every intermediate value of one damage calculation.
///
/// Kept verbatim for replay and debugging; nothing here is recomputed from
/// `final_damage`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageCalculation {
    pub raw_attack_power: u32,
    pub defense: u32,
    /// Fraction of the raw attack absorbed by defense, in `[0, 1)`.
    pub defense_reduction: f64,
    pub post_defense_damage: f64,
    pub stat_bonus: f64,
    pub level_bonus: f64,
    pub base_damage: f64,
    pub type_multiplier: f64,
    pub level_modifier: f64,
    pub mitigation_factor: f64,
    pub crit_multiplier: f64,
    pub variance: f64,
    pub final_damage: u32,
}

/// Inputs shared by every branch of the damage pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageInputs {
    pub raw_attack_power: u32,
    pub defense: u32,
    pub level_delta: i32,
    pub effectiveness: Effectiveness,
}

/// `defense / (defense + 100)`: half the attack is absorbed at 100 defense.
pub fn defense_reduction(defense: u32) -> f64 {
    let d = defense as f64;
    d / (d + CombatConfig::DEFENSE_HALF_POINT)
}

/// `clamp(1 + 0.03·Δlvl, 0.7, 1.3)`
pub fn level_modifier(level_delta: i32) -> f64 {
    (1.0 + CombatConfig::LEVEL_MODIFIER_PER_LEVEL * level_delta as f64).clamp(
        CombatConfig::MIN_LEVEL_MODIFIER,
        CombatConfig::MAX_LEVEL_MODIFIER,
    )
}

/// Map a uniform roll onto the variance band `[0.85, 1.0]`.
pub fn variance_from_roll(roll: f64) -> f64 {
    CombatConfig::MIN_VARIANCE + (CombatConfig::MAX_VARIANCE - CombatConfig::MIN_VARIANCE) * roll
}

impl DamageCalculation {
    /// Audit record for a missed attack: matchup fields kept, damage fields zeroed.
    pub fn missed(inputs: &DamageInputs) -> Self {
        Self {
            raw_attack_power: inputs.raw_attack_power,
            defense: inputs.defense,
            defense_reduction: defense_reduction(inputs.defense),
            post_defense_damage: 0.0,
            stat_bonus: 0.0,
            level_bonus: 0.0,
            base_damage: 0.0,
            type_multiplier: inputs.effectiveness.multiplier(),
            level_modifier: level_modifier(inputs.level_delta),
            mitigation_factor: 1.0,
            crit_multiplier: 1.0,
            variance: 1.0,
            final_damage: 0,
        }
    }

    /// Calculate damage for a landed attack.
    ///
    /// # Formula
    ///
    /// ```text
    /// reduction    = defense / (defense + 100)
    /// post_defense = attack - attack·reduction
    /// stat_bonus   = 0.1·max(attack - defense, 0)
    /// level_bonus  = 0.5·max(Δlvl, 0)
    /// base         = post_defense + stat_bonus + level_bonus
    /// final        = round(base · type · level · mitigated · crit · variance), floored at 0
    /// ```
    ///
    /// `variance_roll` is a uniform draw in `[0, 1)`.
    pub fn landed(inputs: &DamageInputs, outcome: AttackOutcome, variance_roll: f64) -> Self {
        let attack = inputs.raw_attack_power as f64;
        let defense = inputs.defense as f64;
        let levels = inputs.level_delta as f64;

        let reduction = defense_reduction(inputs.defense);
        let post_defense_damage = attack - attack * reduction;
        let stat_bonus = CombatConfig::STAT_BONUS_RATE * (attack - defense).max(0.0);
        let level_bonus = CombatConfig::LEVEL_BONUS_PER_LEVEL * levels.max(0.0);
        let base_damage = post_defense_damage + stat_bonus + level_bonus;

        let type_multiplier = inputs.effectiveness.multiplier();
        let level_modifier = level_modifier(inputs.level_delta);
        let mitigation_factor = match outcome {
            AttackOutcome::Mitigated => CombatConfig::MITIGATED_FACTOR,
            _ => 1.0,
        };
        let crit_multiplier = match outcome {
            AttackOutcome::Critical => CombatConfig::CRIT_MULTIPLIER,
            _ => 1.0,
        };
        let variance = variance_from_roll(variance_roll);

        let scaled = base_damage
            * type_multiplier
            * level_modifier
            * mitigation_factor
            * crit_multiplier
            * variance;
        let final_damage = scaled.round().max(0.0) as u32;

        Self {
            raw_attack_power: inputs.raw_attack_power,
            defense: inputs.defense,
            defense_reduction: reduction,
            post_defense_damage,
            stat_bonus,
            level_bonus,
            base_damage,
            type_multiplier,
            level_modifier,
            mitigation_factor,
            crit_multiplier,
            variance,
            final_damage,
        }
    }
}
