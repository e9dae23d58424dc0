//! Error types raised by repository implementations.

use thiserror::Error;

use super::CharacterId;

/// Errors surfaced by repository implementations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("character {0} not found")]
    NotFound(CharacterId),

    #[error("stats repository lock was poisoned")]
    LockPoisoned,

    /// The store could not be reached. The only transient variant.
    #[error("stats store unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::Unavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
