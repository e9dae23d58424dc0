/// Balance constants for combat math and damage resolution.
///
/// Everything here is a compile-time constant: resolution must be replayable
/// from a combat log, so none of these are runtime-tunable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CombatConfig;

impl CombatConfig {
    // ===== combat math =====
    /// Flat bonus added to every defense of a tank archetype.
    pub const TANK_DEFENSE_BONUS: u32 = 15;

    // ===== hit / crit / mitigation =====
    pub const BASE_HIT_CHANCE: f64 = 0.85;
    pub const HIT_EDGE_WEIGHT: f64 = 0.25;
    pub const HIT_PER_LEVEL: f64 = 0.01;
    pub const MIN_HIT_CHANCE: f64 = 0.05;
    pub const MAX_HIT_CHANCE: f64 = 0.95;

    pub const BASE_CRIT_CHANCE: f64 = 0.05;
    pub const CRIT_EDGE_WEIGHT: f64 = 0.10;
    pub const CRIT_PER_LEVEL: f64 = 0.005;
    pub const MAX_CRIT_CHANCE: f64 = 0.5;

    pub const BASE_MITIGATION_CHANCE: f64 = 0.10;
    pub const MITIGATION_EDGE_WEIGHT: f64 = 0.15;
    pub const MITIGATION_PER_LEVEL: f64 = 0.005;
    pub const MAX_MITIGATION_CHANCE: f64 = 0.4;

    // ===== damage =====
    /// Defense value at which half of the raw attack is absorbed.
    pub const DEFENSE_HALF_POINT: f64 = 100.0;
    pub const STAT_BONUS_RATE: f64 = 0.1;
    pub const LEVEL_BONUS_PER_LEVEL: f64 = 0.5;

    pub const LEVEL_MODIFIER_PER_LEVEL: f64 = 0.03;
    pub const MIN_LEVEL_MODIFIER: f64 = 0.7;
    pub const MAX_LEVEL_MODIFIER: f64 = 1.3;

    pub const MITIGATED_FACTOR: f64 = 0.5;
    pub const CRIT_MULTIPLIER: f64 = 1.5;

    pub const MIN_VARIANCE: f64 = 0.85;
    pub const MAX_VARIANCE: f64 = 1.0;

    // ===== type effectiveness =====
    pub const RESISTED_MULTIPLIER: f64 = 0.85;
    pub const NEUTRAL_MULTIPLIER: f64 = 1.0;
    pub const EFFECTIVE_MULTIPLIER: f64 = 1.15;
}
