//! Class-keyed classification tables.
//!
//! Every class-dependent decision in combat math is a lookup here: attack
//! type, physical/caster and tank archetype, which attributes feed magic power,
//! and which armour profile feeds the defenses. No behavior hangs off class
//! beyond these tables.

/// Playable and monster classes.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CharacterClass {
    Warrior,
    Knight,
    Paladin,
    Rogue,
    Ranger,
    Mage,
    Cleric,
    Warlock,
}

/// How a combatant deals damage, and therefore which defense it is resolved against.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr, strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttackType {
    HeavyMelee,
    FastMelee,
    ElementalMagic,
    SpiritualMagic,
    /// Heavy weapon strikes laced with divine power.
    MeleeHybrid,
    /// Projectiles carrying elemental charge.
    RangedHybrid,
}

/// The four typed defenses every combatant carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DefenseType {
    HeavyMelee,
    FastMelee,
    ElementalMagic,
    SpiritualMagic,
}

impl AttackType {
    /// Defenses an attack of this type is resolved against.
    ///
    /// Pure attacks map to exactly one defense. Hybrids map to two, and the
    /// defender gets the better of them.
    pub const fn defenses(self) -> (DefenseType, Option<DefenseType>) {
        match self {
            AttackType::HeavyMelee => (DefenseType::HeavyMelee, None),
            AttackType::FastMelee => (DefenseType::FastMelee, None),
            AttackType::ElementalMagic => (DefenseType::ElementalMagic, None),
            AttackType::SpiritualMagic => (DefenseType::SpiritualMagic, None),
            AttackType::MeleeHybrid => (DefenseType::HeavyMelee, Some(DefenseType::SpiritualMagic)),
            AttackType::RangedHybrid => (DefenseType::FastMelee, Some(DefenseType::ElementalMagic)),
        }
    }

    pub const fn is_hybrid(self) -> bool {
        matches!(self, AttackType::MeleeHybrid | AttackType::RangedHybrid)
    }

    pub const fn is_magic(self) -> bool {
        matches!(self, AttackType::ElementalMagic | AttackType::SpiritualMagic)
    }
}

/// Defender classification used by the type-effectiveness matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Archetype {
    PhysicalFighter,
    PhysicalTank,
    Caster,
    CasterTank,
}

impl Archetype {
    pub const fn from_flags(is_physical: bool, is_tank: bool) -> Self {
        match (is_physical, is_tank) {
            (true, false) => Archetype::PhysicalFighter,
            (true, true) => Archetype::PhysicalTank,
            (false, false) => Archetype::Caster,
            (false, true) => Archetype::CasterTank,
        }
    }
}

/// Which attributes drive magic power.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MagicFocus {
    /// INT-weighted.
    Arcane,
    /// WIS and SPI weighted.
    Divine,
    /// No training; an even, weak mix of all three.
    Untrained,
}

/// Flat per-defense armour values: (heavy, fast, elemental, spiritual).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArmourProfile {
    pub heavy: u32,
    pub fast: u32,
    pub elemental: u32,
    pub spiritual: u32,
}

impl ArmourProfile {
    pub const PLATE: Self = Self::new(12, 6, 2, 4);
    pub const LEATHER: Self = Self::new(6, 10, 4, 4);
    pub const CLOTH: Self = Self::new(2, 3, 10, 10);

    pub const fn new(heavy: u32, fast: u32, elemental: u32, spiritual: u32) -> Self {
        Self {
            heavy,
            fast,
            elemental,
            spiritual,
        }
    }
}

/// One row of the class table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassProfile {
    pub attack_type: AttackType,
    pub is_physical: bool,
    pub is_tank: bool,
    pub magic_focus: MagicFocus,
    pub armour: ArmourProfile,
}

impl CharacterClass {
    pub const fn profile(self) -> ClassProfile {
        use AttackType::*;
        use MagicFocus::*;

        let (attack_type, is_physical, is_tank, magic_focus, armour) = match self {
            CharacterClass::Warrior => (HeavyMelee, true, false, Untrained, ArmourProfile::PLATE),
            CharacterClass::Knight => (HeavyMelee, true, true, Untrained, ArmourProfile::PLATE),
            CharacterClass::Paladin => (MeleeHybrid, true, true, Divine, ArmourProfile::PLATE),
            CharacterClass::Rogue => (FastMelee, true, false, Untrained, ArmourProfile::LEATHER),
            CharacterClass::Ranger => (RangedHybrid, true, false, Arcane, ArmourProfile::LEATHER),
            CharacterClass::Mage => (ElementalMagic, false, false, Arcane, ArmourProfile::CLOTH),
            CharacterClass::Cleric => (SpiritualMagic, false, false, Divine, ArmourProfile::CLOTH),
            CharacterClass::Warlock => (ElementalMagic, false, true, Arcane, ArmourProfile::CLOTH),
        };

        ClassProfile {
            attack_type,
            is_physical,
            is_tank,
            magic_focus,
            armour,
        }
    }

    pub const fn attack_type(self) -> AttackType {
        self.profile().attack_type
    }

    pub const fn is_tank(self) -> bool {
        self.profile().is_tank
    }

    pub const fn is_physical(self) -> bool {
        self.profile().is_physical
    }

    pub const fn archetype(self) -> Archetype {
        let profile = self.profile();
        Archetype::from_flags(profile.is_physical, profile.is_tank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn hybrids_map_to_two_defenses() {
        for attack in AttackType::iter() {
            let (_, second) = attack.defenses();
            assert_eq!(second.is_some(), attack.is_hybrid(), "{attack}");
        }
    }

    #[test]
    fn class_names_parse_case_insensitively() {
        assert_eq!("Paladin".parse::<CharacterClass>(), Ok(CharacterClass::Paladin));
        assert_eq!("warlock".parse::<CharacterClass>(), Ok(CharacterClass::Warlock));
        assert!("bard".parse::<CharacterClass>().is_err());
    }

    #[test]
    fn archetype_follows_flags() {
        assert_eq!(CharacterClass::Knight.archetype(), Archetype::PhysicalTank);
        assert_eq!(CharacterClass::Rogue.archetype(), Archetype::PhysicalFighter);
        assert_eq!(CharacterClass::Cleric.archetype(), Archetype::Caster);
        assert_eq!(CharacterClass::Warlock.archetype(), Archetype::CasterTank);
    }
}
