//! Stat system - combat math.
//!
//! ```text
//! [ Attributes (Layer 1) ]   raw, persisted, validated at the boundary
//!      ↓
//! [ CombatStats (Layer 2) ]  attack powers, typed defenses, archetype flags
//!      ↓
//! [ ResourcePools ]          health / mana maximums
//! ```
//!
//! ## Principles
//!
//! 1. **Deterministic**: pure functions, no I/O or randomness
//! 2. **Table-driven**: class behavior is a lookup in [`class`], never a type hierarchy
//! 3. **Validated input**: derivations take [`ValidAttributes`], so they cannot fail

pub mod class;
pub mod core;
pub mod derived;
pub mod resources;

pub use class::{
    Archetype, ArmourProfile, AttackType, CharacterClass, ClassProfile, DefenseType, MagicFocus,
};
pub use self::core::{Attributes, ValidAttributes};
pub use derived::CombatStats;
pub use resources::ResourcePools;

/// Saturating sum of formula terms.
pub(crate) fn total<const N: usize>(terms: [u32; N]) -> u32 {
    terms.into_iter().fold(0, u32::saturating_add)
}

use crate::error::DomainRuleViolation;

/// A combatant as it arrives from outside the core: class plus raw attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    pub class: CharacterClass,
    pub attributes: Attributes,
}

impl Combatant {
    pub const fn new(class: CharacterClass, attributes: Attributes) -> Self {
        Self { class, attributes }
    }

    /// Class baseline at the given level.
    pub fn preset(class: CharacterClass, level: i32) -> Self {
        Self::new(class, Attributes::preset(class, level))
    }

    pub fn combat_stats(&self) -> Result<CombatStats, DomainRuleViolation> {
        let attrs = self.attributes.validate()?;
        Ok(CombatStats::derive(&attrs, self.class))
    }

    pub fn resource_pools(&self) -> Result<ResourcePools, DomainRuleViolation> {
        let attrs = self.attributes.validate()?;
        Ok(ResourcePools::derive(&attrs, self.class))
    }
}
