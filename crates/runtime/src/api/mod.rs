//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! the lock, guard and repository layers can stay focused on coordination.

pub mod errors;
pub mod handle;

pub use errors::{Result, RuntimeError};
pub use handle::CombatHandle;
