//! Hit, critical and mitigation chances, and the outcome roll.

use crate::config::CombatConfig;

use super::result::AttackOutcome;

/// Probabilities computed for one exchange. Each lies in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chances {
    pub hit: f64,
    pub crit: f64,
    pub mitigation: f64,
}

/// Signed advantage of attack over defense, in `(-1, 1)`.
pub fn stat_edge(attack: u32, defense: u32) -> f64 {
    let a = attack as f64;
    let d = defense as f64;
    (a - d) / (a + d + 1.0)
}

/// Calculate hit, crit and mitigation chances.
///
/// # Formula
///
/// ```text
/// edge       = (attack - defense) / (attack + defense + 1)
/// hit        = clamp(0.85 + 0.25·edge + 0.01·Δlvl, 0.05, 0.95)
/// crit       = clamp(0.05 + 0.10·edge + 0.005·Δlvl, 0, 0.5)
/// mitigation = clamp(0.10 - 0.15·edge - 0.005·Δlvl, 0, 0.4)   tank defenders only
/// ```
pub fn calculate_chances(
    attack: u32,
    defense: u32,
    level_delta: i32,
    defender_is_tank: bool,
) -> Chances {
    let edge = stat_edge(attack, defense);
    let levels = level_delta as f64;

    let hit = (CombatConfig::BASE_HIT_CHANCE
        + CombatConfig::HIT_EDGE_WEIGHT * edge
        + CombatConfig::HIT_PER_LEVEL * levels)
        .clamp(CombatConfig::MIN_HIT_CHANCE, CombatConfig::MAX_HIT_CHANCE);

    let crit = (CombatConfig::BASE_CRIT_CHANCE
        + CombatConfig::CRIT_EDGE_WEIGHT * edge
        + CombatConfig::CRIT_PER_LEVEL * levels)
        .clamp(0.0, CombatConfig::MAX_CRIT_CHANCE);

    let mitigation = if defender_is_tank {
        (CombatConfig::BASE_MITIGATION_CHANCE
            - CombatConfig::MITIGATION_EDGE_WEIGHT * edge
            - CombatConfig::MITIGATION_PER_LEVEL * levels)
            .clamp(0.0, CombatConfig::MAX_MITIGATION_CHANCE)
    } else {
        0.0
    };

    Chances {
        hit,
        crit,
        mitigation,
    }
}

/// Map a single uniform roll onto an outcome.
///
/// Bands are laid out in precedence order Miss, Mitigated, Critical, Hit.
/// Boundaries are inclusive, so a roll landing exactly on a threshold takes
/// the lower-damage outcome.
pub fn roll_outcome(chances: &Chances, roll: f64) -> AttackOutcome {
    let miss_threshold = 1.0 - chances.hit;
    let mitigated_threshold = miss_threshold + chances.hit * chances.mitigation;
    let critical_threshold = miss_threshold + chances.hit * (chances.mitigation + chances.crit);

    if roll <= miss_threshold {
        AttackOutcome::Miss
    } else if roll <= mitigated_threshold {
        AttackOutcome::Mitigated
    } else if roll <= critical_threshold {
        AttackOutcome::Critical
    } else {
        AttackOutcome::Hit
    }
}
