//! Shared fixtures and repository doubles for runtime integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use combat_runtime::repository::Result;
use combat_runtime::{
    AcquirePolicy, Backoff, CasOutcome, CharacterId, InMemoryStatsRepository,
    InProcessLockManager, LockFailure, LockHandle, LockManager, MutationGuard, ReleaseOutcome,
    RepositoryError, StatValues, StatsRecord, StatsRepository,
};

pub const HERO: CharacterId = CharacterId(1);

pub fn fresh_record() -> StatsRecord {
    StatsRecord {
        health: 100,
        max_health: 100,
        mana: 40,
        max_mana: 40,
        experience: 0,
        version: 0,
    }
}

pub fn seeded_repository() -> Arc<InMemoryStatsRepository> {
    let repo = Arc::new(InMemoryStatsRepository::new());
    repo.insert(HERO, fresh_record()).expect("seed");
    repo
}

pub fn fast_backoff() -> Backoff {
    Backoff::new(Duration::from_millis(1), Duration::from_millis(5))
}

pub fn in_process_locks(policy: AcquirePolicy) -> Arc<InProcessLockManager> {
    Arc::new(InProcessLockManager::new(policy, Duration::from_millis(5)))
}

pub fn guard(
    locks: Arc<InProcessLockManager>,
    repository: Arc<dyn StatsRepository>,
) -> MutationGuard {
    let locks: Arc<dyn LockManager> = locks;
    MutationGuard::new(locks, repository, "lock", fast_backoff(), 3)
}

/// Loads normally but rejects every write as conflicting.
pub struct ConflictingRepository {
    pub inner: InMemoryStatsRepository,
    pub writes: AtomicU32,
}

impl ConflictingRepository {
    pub fn new() -> Self {
        let inner = InMemoryStatsRepository::new();
        inner.insert(HERO, fresh_record()).expect("seed");
        Self {
            inner,
            writes: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl StatsRepository for ConflictingRepository {
    async fn load_stats(&self, id: CharacterId) -> Result<StatsRecord> {
        self.inner.load_stats(id).await
    }

    async fn compare_and_swap_stats(
        &self,
        _id: CharacterId,
        expected_version: u64,
        _values: StatValues,
    ) -> Result<CasOutcome> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(CasOutcome::Conflict {
            current_version: expected_version + 1,
        })
    }
}

/// Commits `interference` writes of +10 experience behind the caller's back,
/// right after the caller has loaded, as a writer that skips the lock would.
pub struct InterferingRepository {
    pub inner: InMemoryStatsRepository,
    pub interference: AtomicU32,
}

impl InterferingRepository {
    pub fn new(interference: u32) -> Self {
        let inner = InMemoryStatsRepository::new();
        inner.insert(HERO, fresh_record()).expect("seed");
        Self {
            inner,
            interference: AtomicU32::new(interference),
        }
    }
}

#[async_trait]
impl StatsRepository for InterferingRepository {
    async fn load_stats(&self, id: CharacterId) -> Result<StatsRecord> {
        let loaded = self.inner.load_stats(id).await?;

        let remaining = self.interference.load(Ordering::SeqCst);
        if remaining > 0 {
            self.interference.store(remaining - 1, Ordering::SeqCst);
            let mut sneaky = loaded.values();
            sneaky.experience += 10;
            self.inner
                .compare_and_swap_stats(id, loaded.version, sneaky)
                .await?;
        }

        Ok(loaded)
    }

    async fn compare_and_swap_stats(
        &self,
        id: CharacterId,
        expected_version: u64,
        values: StatValues,
    ) -> Result<CasOutcome> {
        self.inner
            .compare_and_swap_stats(id, expected_version, values)
            .await
    }
}

/// Fails the first `failures` calls with `Unavailable`, then delegates.
pub struct FlakyRepository {
    pub inner: InMemoryStatsRepository,
    pub failures: AtomicU32,
    pub calls: AtomicU32,
}

impl FlakyRepository {
    pub fn new(failures: u32) -> Self {
        let inner = InMemoryStatsRepository::new();
        inner.insert(HERO, fresh_record()).expect("seed");
        Self {
            inner,
            failures: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
        }
    }

    fn trip(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(RepositoryError::Unavailable("connection reset".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl StatsRepository for FlakyRepository {
    async fn load_stats(&self, id: CharacterId) -> Result<StatsRecord> {
        self.trip()?;
        self.inner.load_stats(id).await
    }

    async fn compare_and_swap_stats(
        &self,
        id: CharacterId,
        expected_version: u64,
        values: StatValues,
    ) -> Result<CasOutcome> {
        self.trip()?;
        self.inner
            .compare_and_swap_stats(id, expected_version, values)
            .await
    }
}

/// Delays every load by `delay`.
pub struct SlowRepository {
    pub inner: InMemoryStatsRepository,
    pub delay: Duration,
}

impl SlowRepository {
    pub fn new(delay: Duration) -> Self {
        let inner = InMemoryStatsRepository::new();
        inner.insert(HERO, fresh_record()).expect("seed");
        Self { inner, delay }
    }
}

#[async_trait]
impl StatsRepository for SlowRepository {
    async fn load_stats(&self, id: CharacterId) -> Result<StatsRecord> {
        tokio::time::sleep(self.delay).await;
        self.inner.load_stats(id).await
    }

    async fn compare_and_swap_stats(
        &self,
        id: CharacterId,
        expected_version: u64,
        values: StatValues,
    ) -> Result<CasOutcome> {
        self.inner
            .compare_and_swap_stats(id, expected_version, values)
            .await
    }
}

/// Takes the lock in `inner`, then never answers, like a store whose reply to
/// a successful acquisition is still in flight.
pub struct StallingLockManager {
    pub inner: Arc<InProcessLockManager>,
}

#[async_trait]
impl LockManager for StallingLockManager {
    async fn acquire_as(
        &self,
        key: &str,
        owner: &str,
        ttl: Duration,
        wait_timeout: Duration,
    ) -> std::result::Result<LockHandle, LockFailure> {
        let _taken = self.inner.acquire_as(key, owner, ttl, wait_timeout).await?;
        std::future::pending::<std::result::Result<LockHandle, LockFailure>>().await
    }

    async fn release_owner(
        &self,
        key: &str,
        owner: &str,
    ) -> std::result::Result<ReleaseOutcome, LockFailure> {
        self.inner.release_owner(key, owner).await
    }

    async fn extend(
        &self,
        handle: &mut LockHandle,
        ttl: Duration,
    ) -> std::result::Result<bool, LockFailure> {
        self.inner.extend(handle, ttl).await
    }
}
