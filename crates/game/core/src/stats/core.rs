//! Raw attributes - Layer 1 of the stat system.
//!
//! Attributes (STR, DEX, CON, INT, WIS, SPI, LUK) plus level are the only
//! persisted inputs to combat math. They arrive from outside the core as signed
//! integers and must pass [`Attributes::validate`] before anything is derived
//! from them.

use crate::error::DomainRuleViolation;
use crate::stats::class::CharacterClass;

/// The seven raw attributes and the level of a combatant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attributes {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub spirit: i32,
    pub luck: i32,
    pub level: i32,
}

impl Attributes {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        strength: i32,
        dexterity: i32,
        constitution: i32,
        intelligence: i32,
        wisdom: i32,
        spirit: i32,
        luck: i32,
        level: i32,
    ) -> Self {
        Self {
            strength,
            dexterity,
            constitution,
            intelligence,
            wisdom,
            spirit,
            luck,
            level,
        }
    }

    /// Baseline attribute spread for a class at the given level.
    ///
    /// Primary attributes sit at 30, secondaries at 20, everything else at 10.
    pub fn preset(class: CharacterClass, level: i32) -> Self {
        let (strength, dexterity, constitution, intelligence, wisdom, spirit) = match class {
            CharacterClass::Warrior => (30, 20, 20, 10, 10, 10),
            CharacterClass::Knight => (20, 10, 30, 10, 20, 10),
            CharacterClass::Paladin => (20, 10, 20, 10, 30, 20),
            CharacterClass::Rogue => (20, 30, 10, 10, 10, 10),
            CharacterClass::Ranger => (10, 30, 10, 20, 10, 10),
            CharacterClass::Mage => (10, 10, 10, 30, 20, 10),
            CharacterClass::Cleric => (10, 10, 10, 10, 30, 20),
            CharacterClass::Warlock => (10, 10, 20, 30, 10, 20),
        };
        Self::new(
            strength,
            dexterity,
            constitution,
            intelligence,
            wisdom,
            spirit,
            10,
            level,
        )
    }

    /// Reject negative attributes and levels below 1.
    pub fn validate(&self) -> Result<ValidAttributes, DomainRuleViolation> {
        for (attribute, value) in self.named() {
            if value < 0 {
                return Err(DomainRuleViolation::NegativeAttribute { attribute, value });
            }
        }
        if self.level < 1 {
            return Err(DomainRuleViolation::InvalidLevel(self.level));
        }

        Ok(ValidAttributes {
            str: self.strength as u32,
            dex: self.dexterity as u32,
            con: self.constitution as u32,
            int: self.intelligence as u32,
            wis: self.wisdom as u32,
            spi: self.spirit as u32,
            luk: self.luck as u32,
            level: self.level as u32,
        })
    }

    fn named(&self) -> [(&'static str, i32); 7] {
        [
            ("strength", self.strength),
            ("dexterity", self.dexterity),
            ("constitution", self.constitution),
            ("intelligence", self.intelligence),
            ("wisdom", self.wisdom),
            ("spirit", self.spirit),
            ("luck", self.luck),
        ]
    }
}

impl Default for Attributes {
    /// Default attributes: all 10 (average adventurer), level 1
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10, 10, 1)
    }
}

/// Attributes that passed validation.
///
/// Only obtainable through [`Attributes::validate`], so every derivation that
/// takes one can rely on non-negative values and a level of at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValidAttributes {
    pub(crate) str: u32,
    pub(crate) dex: u32,
    pub(crate) con: u32,
    pub(crate) int: u32,
    pub(crate) wis: u32,
    pub(crate) spi: u32,
    pub(crate) luk: u32,
    pub(crate) level: u32,
}

impl ValidAttributes {
    pub const fn level(&self) -> u32 {
        self.level
    }
}
