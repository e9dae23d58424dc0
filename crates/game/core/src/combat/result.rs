//! Combat result types and attack resolution.

use crate::rng::{PcgRng, RandomSource};
use crate::stats::CombatStats;

use super::damage::{DamageCalculation, DamageInputs};
use super::effectiveness::Effectiveness;
use super::hit::{Chances, calculate_chances, roll_outcome};

/// Outcome of an attack attempt, in roll precedence order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttackOutcome {
    /// Attack missed the target. Always zero damage.
    Miss,
    /// Attack landed but a tank defender turned part of it aside.
    Mitigated,
    /// Critical hit.
    Critical,
    /// Attack hit the target.
    Hit,
}

impl AttackOutcome {
    pub const fn landed(self) -> bool {
        !matches!(self, AttackOutcome::Miss)
    }
}

/// Result of a combat resolution.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackResult {
    pub outcome: AttackOutcome,
    pub final_damage: u32,
    pub hit_chance: f64,
    pub crit_chance: f64,
    pub mitigation_chance: f64,
    pub was_effective: bool,
    pub was_resisted: bool,
    pub calculation: DamageCalculation,
    pub log: String,
}

impl AttackResult {
    pub const fn chances(&self) -> Chances {
        Chances {
            hit: self.hit_chance,
            crit: self.crit_chance,
            mitigation: self.mitigation_chance,
        }
    }
}

/// Resolve a complete attack: defense selection, outcome roll, damage.
///
/// `level_delta` is attacker level minus defender level. Draws one roll for the
/// outcome and, if the attack lands, a second for damage variance.
///
/// # Steps
///
/// 1. Select the defender's defense for the attacker's attack type (hybrids: max of two)
/// 2. Compute hit / crit / mitigation chances
/// 3. Roll the outcome (Miss > Mitigated > Critical > Hit)
/// 4. On a landed attack, run the damage pipeline
/// 5. Compose the log line
pub fn resolve_attack(
    attacker: &CombatStats,
    defender: &CombatStats,
    level_delta: i32,
    rng: &mut impl RandomSource,
) -> AttackResult {
    let attack_type = attacker.attack_type;
    let inputs = DamageInputs {
        raw_attack_power: attacker.attack_power(),
        defense: defender.defense_against(attack_type),
        level_delta,
        effectiveness: Effectiveness::of(attack_type, defender.archetype()),
    };

    let chances = calculate_chances(
        inputs.raw_attack_power,
        inputs.defense,
        level_delta,
        defender.is_tank,
    );
    let outcome = roll_outcome(&chances, rng.next_unit());

    let calculation = if outcome.landed() {
        DamageCalculation::landed(&inputs, outcome, rng.next_unit())
    } else {
        DamageCalculation::missed(&inputs)
    };

    let log = compose_log(attacker, outcome, calculation.final_damage, inputs.effectiveness);

    AttackResult {
        outcome,
        final_damage: calculation.final_damage,
        hit_chance: chances.hit,
        crit_chance: chances.crit,
        mitigation_chance: chances.mitigation,
        was_effective: inputs.effectiveness == Effectiveness::Effective,
        was_resisted: inputs.effectiveness == Effectiveness::Resisted,
        calculation,
        log,
    }
}

/// [`resolve_attack`] driven by a fresh [`PcgRng`] stream seeded with `seed`.
pub fn resolve_attack_seeded(
    attacker: &CombatStats,
    defender: &CombatStats,
    level_delta: i32,
    seed: u64,
) -> AttackResult {
    let mut rng = PcgRng::new(seed);
    resolve_attack(attacker, defender, level_delta, &mut rng)
}

fn compose_log(
    attacker: &CombatStats,
    outcome: AttackOutcome,
    damage: u32,
    effectiveness: Effectiveness,
) -> String {
    let attack_type = attacker.attack_type;
    let mut line = match outcome {
        AttackOutcome::Miss => return format!("{attack_type} attack missed"),
        AttackOutcome::Mitigated => format!("{attack_type} hit was mitigated for {damage} damage"),
        AttackOutcome::Critical => format!("{attack_type} critical hit for {damage} damage"),
        AttackOutcome::Hit => format!("{attack_type} hit for {damage} damage"),
    };

    match effectiveness {
        Effectiveness::Effective => line.push_str(" (effective)"),
        Effectiveness::Resisted => line.push_str(" (resisted)"),
        Effectiveness::Neutral => {}
    }
    line
}
