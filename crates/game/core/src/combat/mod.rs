//! Combat resolution system.
//!
//! Pure functions that turn two [`CombatStats`](crate::stats::CombatStats)
//! snapshots and a [`RandomSource`](crate::rng::RandomSource) into an auditable
//! [`AttackResult`]. All combat logic is deterministic and side-effect free.
//!
//! # Core Functions
//!
//! - `resolve_attack`: complete resolution (defense selection, roll, damage, log)
//! - `calculate_chances`: hit / crit / mitigation probabilities
//! - `roll_outcome`: one roll mapped onto Miss > Mitigated > Critical > Hit
//! - `DamageCalculation::landed`: the damage pipeline and its audit record

pub mod damage;
pub mod effectiveness;
pub mod hit;
pub mod result;

pub use damage::{DamageCalculation, DamageInputs, defense_reduction, level_modifier};
pub use effectiveness::Effectiveness;
pub use hit::{Chances, calculate_chances, roll_outcome, stat_edge};
pub use result::{AttackOutcome, AttackResult, resolve_attack, resolve_attack_seeded};
