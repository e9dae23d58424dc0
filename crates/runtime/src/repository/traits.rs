//! Repository contract for persisted character stats.

use async_trait::async_trait;

use super::{CasOutcome, CharacterId, Result, StatValues, StatsRecord};

/// Persistence boundary for character stats.
///
/// Writes are version-checked: a write succeeds only if the stored version
/// still equals the version the writer loaded. Implementations must make the
/// compare and the write a single atomic step.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Load the current stats and version of a character.
    async fn load_stats(&self, id: CharacterId) -> Result<StatsRecord>;

    /// Write `values` if the stored version equals `expected_version`.
    ///
    /// On success the stored version is incremented and the new record is
    /// returned. Maxima are not touched by this call.
    async fn compare_and_swap_stats(
        &self,
        id: CharacterId,
        expected_version: u64,
        values: StatValues,
    ) -> Result<CasOutcome>;
}
