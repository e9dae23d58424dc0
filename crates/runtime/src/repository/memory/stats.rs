//! In-memory StatsRepository implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::repository::{
    CasOutcome, CharacterId, RepositoryError, Result, StatValues, StatsRecord, StatsRepository,
};

/// In-memory implementation of StatsRepository.
///
/// The compare and the write happen under one write lock, which is what makes
/// the swap atomic.
pub struct InMemoryStatsRepository {
    records: RwLock<HashMap<CharacterId, StatsRecord>>,
}

impl InMemoryStatsRepository {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or overwrite a record, bypassing version checks. Seeding only.
    pub fn insert(&self, id: CharacterId, record: StatsRecord) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        records.insert(id, record);
        Ok(())
    }

    /// Synchronous read of a record.
    pub fn get(&self, id: CharacterId) -> Result<Option<StatsRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(records.get(&id).copied())
    }
}

impl Default for InMemoryStatsRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatsRepository for InMemoryStatsRepository {
    async fn load_stats(&self, id: CharacterId) -> Result<StatsRecord> {
        self.get(id)?.ok_or(RepositoryError::NotFound(id))
    }

    async fn compare_and_swap_stats(
        &self,
        id: CharacterId,
        expected_version: u64,
        values: StatValues,
    ) -> Result<CasOutcome> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let record = records.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;

        if record.version != expected_version {
            return Ok(CasOutcome::Conflict {
                current_version: record.version,
            });
        }

        record.health = values.health;
        record.mana = values.mana;
        record.experience = values.experience;
        record.version += 1;
        Ok(CasOutcome::Committed(*record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> StatsRecord {
        StatsRecord {
            health: 100,
            max_health: 100,
            mana: 50,
            max_mana: 50,
            experience: 0,
            version: 0,
        }
    }

    #[tokio::test]
    async fn swap_with_current_version_commits() {
        let repo = InMemoryStatsRepository::new();
        repo.insert(CharacterId(1), record()).unwrap();

        let values = StatValues {
            health: 80,
            mana: 45,
            experience: 12,
        };
        let outcome = repo
            .compare_and_swap_stats(CharacterId(1), 0, values)
            .await
            .unwrap();

        let CasOutcome::Committed(committed) = outcome else {
            panic!("expected commit, got {outcome:?}");
        };
        assert_eq!(committed.values(), values);
        assert_eq!(committed.version, 1);
        assert_eq!(repo.load_stats(CharacterId(1)).await.unwrap(), committed);
    }

    #[tokio::test]
    async fn swap_with_stale_version_conflicts_without_writing() {
        let repo = InMemoryStatsRepository::new();
        repo.insert(CharacterId(1), StatsRecord { version: 3, ..record() })
            .unwrap();

        let outcome = repo
            .compare_and_swap_stats(
                CharacterId(1),
                2,
                StatValues {
                    health: 1,
                    mana: 1,
                    experience: 1,
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome, CasOutcome::Conflict { current_version: 3 });
        assert_eq!(
            repo.get(CharacterId(1)).unwrap(),
            Some(StatsRecord { version: 3, ..record() })
        );
    }

    #[tokio::test]
    async fn missing_character_is_not_found() {
        let repo = InMemoryStatsRepository::new();
        assert_eq!(
            repo.load_stats(CharacterId(9)).await,
            Err(RepositoryError::NotFound(CharacterId(9)))
        );
    }
}
