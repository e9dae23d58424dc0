//! Combat stats - Layer 2 of the stat system.
//!
//! Attack powers, typed defenses and archetype flags derived from validated
//! attributes, class and level. These are NOT stored - a fresh [`CombatStats`]
//! is computed for every resolution and discarded afterwards.

use crate::config::CombatConfig;
use crate::stats::class::{AttackType, CharacterClass, DefenseType, MagicFocus};
use crate::stats::core::ValidAttributes;
use crate::stats::total;

/// Combat-relevant statistics of one combatant for one resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatStats {
    pub melee_attack: u32,
    pub ranged_attack: u32,
    pub magic_attack: u32,

    pub heavy_melee_defense: u32,
    pub fast_melee_defense: u32,
    pub elemental_defense: u32,
    pub spiritual_defense: u32,

    pub attack_type: AttackType,
    pub is_tank: bool,
    pub is_physical: bool,
}

impl CombatStats {
    /// Derive combat stats from validated attributes and class.
    ///
    /// Base formulas (truncating division):
    /// - Melee: STR × 2 + DEX + level
    /// - Ranged: DEX × 2 + STR / 2 + LUK / 4 + level
    /// - Magic: by [`MagicFocus`]
    /// - Each defense: primary stat + half a secondary + level / 2 + armour
    ///
    /// Tanks add [`CombatConfig::TANK_DEFENSE_BONUS`] to all four defenses
    /// after the base formula. Every sum saturates at `u32::MAX`.
    pub fn derive(attrs: &ValidAttributes, class: CharacterClass) -> Self {
        let profile = class.profile();
        let level = attrs.level;
        let half_level = level / 2;

        let magic_attack = match profile.magic_focus {
            MagicFocus::Arcane => total([attrs.int.saturating_mul(2), attrs.wis / 2, level]),
            MagicFocus::Divine => total([attrs.wis.saturating_mul(2), attrs.spi, level]),
            MagicFocus::Untrained => {
                // Widened so three large attributes average instead of saturating.
                let sum = u64::from(attrs.int) + u64::from(attrs.wis) + u64::from(attrs.spi);
                total([(sum / 3) as u32, half_level])
            }
        };

        let armour = profile.armour;
        let tank_bonus = if profile.is_tank {
            CombatConfig::TANK_DEFENSE_BONUS
        } else {
            0
        };

        Self {
            melee_attack: total([attrs.str.saturating_mul(2), attrs.dex, level]),
            ranged_attack: total([
                attrs.dex.saturating_mul(2),
                attrs.str / 2,
                attrs.luk / 4,
                level,
            ]),
            magic_attack,
            heavy_melee_defense: total([
                attrs.con,
                attrs.str / 2,
                half_level,
                armour.heavy,
                tank_bonus,
            ]),
            fast_melee_defense: total([
                attrs.dex,
                attrs.con / 2,
                half_level,
                armour.fast,
                tank_bonus,
            ]),
            elemental_defense: total([
                attrs.int,
                attrs.wis / 2,
                half_level,
                armour.elemental,
                tank_bonus,
            ]),
            spiritual_defense: total([
                attrs.spi,
                attrs.wis / 2,
                half_level,
                armour.spiritual,
                tank_bonus,
            ]),
            attack_type: profile.attack_type,
            is_tank: profile.is_tank,
            is_physical: profile.is_physical,
        }
    }

    pub const fn defense(&self, kind: DefenseType) -> u32 {
        match kind {
            DefenseType::HeavyMelee => self.heavy_melee_defense,
            DefenseType::FastMelee => self.fast_melee_defense,
            DefenseType::ElementalMagic => self.elemental_defense,
            DefenseType::SpiritualMagic => self.spiritual_defense,
        }
    }

    /// Defense this combatant brings against an attack of the given type.
    ///
    /// Hybrid attacks are resolved against the higher of their two defenses.
    pub fn defense_against(&self, attack: AttackType) -> u32 {
        match attack.defenses() {
            (only, None) => self.defense(only),
            (first, Some(second)) => self.defense(first).max(self.defense(second)),
        }
    }

    /// Attack power this combatant uses for its own attack type.
    ///
    /// Hybrids use the stronger of their two powers.
    pub fn attack_power(&self) -> u32 {
        match self.attack_type {
            AttackType::HeavyMelee | AttackType::FastMelee => self.melee_attack,
            AttackType::ElementalMagic | AttackType::SpiritualMagic => self.magic_attack,
            AttackType::MeleeHybrid => self.melee_attack.max(self.magic_attack),
            AttackType::RangedHybrid => self.ranged_attack.max(self.magic_attack),
        }
    }

    pub const fn archetype(&self) -> crate::stats::class::Archetype {
        crate::stats::class::Archetype::from_flags(self.is_physical, self.is_tank)
    }
}
