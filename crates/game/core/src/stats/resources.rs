//! Resource pools - maximum health and mana.
//!
//! Maximums are derived, current values are persisted by the runtime. These are
//! used to seed a new character record and to bound stat mutations.

use crate::stats::class::CharacterClass;
use crate::stats::core::ValidAttributes;
use crate::stats::total;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourcePools {
    pub max_health: u32,
    pub max_mana: u32,
}

impl ResourcePools {
    /// Derive resource maximums.
    ///
    /// - Health: CON × 10 + level × 8 + STR
    /// - Mana (casters): INT × 6 + WIS × 6 + SPI × 4 + level × 4
    /// - Mana (physical): (INT + WIS + SPI) × 2 + level × 2
    ///
    /// Both saturate at `u32::MAX`.
    pub fn derive(attrs: &ValidAttributes, class: CharacterClass) -> Self {
        let max_health = total([
            attrs.con.saturating_mul(10),
            attrs.level.saturating_mul(8),
            attrs.str,
        ]);
        let max_mana = if class.is_physical() {
            total([attrs.int, attrs.wis, attrs.spi, attrs.level]).saturating_mul(2)
        } else {
            total([
                attrs.int.saturating_mul(6),
                attrs.wis.saturating_mul(6),
                attrs.spi.saturating_mul(4),
                attrs.level.saturating_mul(4),
            ])
        };

        Self {
            max_health,
            max_mana,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::core::Attributes;

    #[test]
    fn casters_have_deeper_mana_pools() {
        let attrs = Attributes::new(10, 10, 10, 30, 20, 10, 10, 5)
            .validate()
            .expect("valid");

        let mage = ResourcePools::derive(&attrs, CharacterClass::Mage);
        let warrior = ResourcePools::derive(&attrs, CharacterClass::Warrior);

        // 30×6 + 20×6 + 10×4 + 5×4 = 360
        assert_eq!(mage.max_mana, 360);
        // (30 + 20 + 10)×2 + 5×2 = 130
        assert_eq!(warrior.max_mana, 130);
        // 10×10 + 5×8 + 10 = 150 for both
        assert_eq!(mage.max_health, 150);
        assert_eq!(warrior.max_health, mage.max_health);
    }

    #[test]
    fn huge_attributes_saturate_pools() {
        let attrs = Attributes::new(i32::MAX, 10, i32::MAX, i32::MAX, 10, 10, 10, 3)
            .validate()
            .expect("valid");

        let mage = ResourcePools::derive(&attrs, CharacterClass::Mage);
        let knight = ResourcePools::derive(&attrs, CharacterClass::Knight);
        assert_eq!(mage.max_health, u32::MAX);
        assert_eq!(mage.max_mana, u32::MAX);
        // (2^31 - 1 + 10 + 10 + 3)×2 exceeds u32::MAX
        assert_eq!(knight.max_mana, u32::MAX);
    }
}
