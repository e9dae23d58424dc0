//! Type effectiveness: attack type × defender archetype.

use crate::config::CombatConfig;
use crate::stats::{Archetype, AttackType};

/// Matchup class of an attack against a defender archetype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Effectiveness {
    Resisted,
    Neutral,
    Effective,
}

impl Effectiveness {
    /// Damage scalar: 0.85, 1.0 or 1.15.
    pub const fn multiplier(self) -> f64 {
        match self {
            Effectiveness::Resisted => CombatConfig::RESISTED_MULTIPLIER,
            Effectiveness::Neutral => CombatConfig::NEUTRAL_MULTIPLIER,
            Effectiveness::Effective => CombatConfig::EFFECTIVE_MULTIPLIER,
        }
    }

    /// Look up the fixed matchup table.
    ///
    /// ```text
    ///                  PhysFighter  PhysTank  Caster  CasterTank
    /// HeavyMelee          1.0        0.85     1.15      1.0
    /// FastMelee           1.15       0.85     1.0       1.0
    /// ElementalMagic      1.15       1.15     1.0       0.85
    /// SpiritualMagic      1.0        1.15     0.85      1.0
    /// MeleeHybrid         1.0        1.0      1.15      0.85
    /// RangedHybrid        1.15       1.0      1.0       0.85
    /// ```
    pub const fn of(attack: AttackType, defender: Archetype) -> Self {
        use Archetype::*;
        use Effectiveness::*;

        match (attack, defender) {
            (AttackType::HeavyMelee, PhysicalTank) => Resisted,
            (AttackType::HeavyMelee, Caster) => Effective,

            (AttackType::FastMelee, PhysicalFighter) => Effective,
            (AttackType::FastMelee, PhysicalTank) => Resisted,

            (AttackType::ElementalMagic, PhysicalFighter | PhysicalTank) => Effective,
            (AttackType::ElementalMagic, CasterTank) => Resisted,

            (AttackType::SpiritualMagic, PhysicalTank) => Effective,
            (AttackType::SpiritualMagic, Caster) => Resisted,

            (AttackType::MeleeHybrid, Caster) => Effective,
            (AttackType::MeleeHybrid, CasterTank) => Resisted,

            (AttackType::RangedHybrid, PhysicalFighter) => Effective,
            (AttackType::RangedHybrid, CasterTank) => Resisted,

            _ => Neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn multiplier_is_always_one_of_three_values() {
        for attack in AttackType::iter() {
            for archetype in Archetype::iter() {
                let m = Effectiveness::of(attack, archetype).multiplier();
                assert!(
                    m == 0.85 || m == 1.0 || m == 1.15,
                    "{attack} vs {archetype}: {m}"
                );
            }
        }
    }

    #[test]
    fn every_attack_type_has_a_counter_and_a_weakness() {
        for attack in AttackType::iter() {
            let row: Vec<_> = Archetype::iter()
                .map(|a| Effectiveness::of(attack, a))
                .collect();
            assert!(row.contains(&Effectiveness::Resisted), "{attack}");
            assert!(row.contains(&Effectiveness::Effective), "{attack}");
        }
    }
}
