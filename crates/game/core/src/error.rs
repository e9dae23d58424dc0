//! Domain rule violations raised before any combat math runs.
//!
//! Combat resolution itself cannot fail for well-formed input. Callers turn raw,
//! untrusted attribute blocks and request parameters into typed values through
//! the validators in this crate, and those validators report problems as
//! [`DomainRuleViolation`]. Violations are never retried.

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ErrorSeverity {
    /// Recoverable error: the same request may succeed if re-issued later.
    ///
    /// Examples: lock held by another exchange, optimistic write exhausted
    Recoverable,

    /// Validation error: invalid input, must not be retried unchanged.
    ///
    /// Examples: negative attribute, zero retry budget
    Validation,

    /// Internal error: a backing store or invariant failed unexpectedly.
    Internal,
}

impl ErrorSeverity {
    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Input that breaks a domain rule and is rejected before resolution.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DomainRuleViolation {
    #[error("attribute `{attribute}` must be non-negative, got {value}")]
    NegativeAttribute { attribute: &'static str, value: i32 },

    #[error("level must be at least 1, got {0}")]
    InvalidLevel(i32),

    #[error("`{parameter}` must be greater than zero")]
    ZeroParameter { parameter: &'static str },
}

impl DomainRuleViolation {
    pub const fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }
}
