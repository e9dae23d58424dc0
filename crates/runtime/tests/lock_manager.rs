//! Lock manager contract: exclusivity, TTL expiry, policies and owner checks.

mod common;

use std::sync::Arc;
use std::time::Duration;

use combat_runtime::{
    AcquirePolicy, Backoff, InProcessLockManager, LockFailureReason, LockManager,
    RedisLockManager, ReleaseOutcome,
};

const KEY: &str = "lock:character:1";

#[tokio::test]
async fn held_key_is_already_locked_until_ttl_elapses() {
    let locks = common::in_process_locks(AcquirePolicy::FailFast);
    let ttl = Duration::from_millis(50);

    let first = locks.acquire(KEY, ttl, Duration::ZERO).await.expect("acquire");
    let err = locks
        .acquire(KEY, ttl, Duration::ZERO)
        .await
        .expect_err("key is held");
    assert_eq!(err.reason, LockFailureReason::AlreadyLocked);
    assert_eq!(err.key, KEY);

    tokio::time::sleep(Duration::from_millis(80)).await;

    let second = locks
        .acquire(KEY, ttl, Duration::ZERO)
        .await
        .expect("expired lock is free again");

    // The stale holder must not free the new owner's lock.
    assert_eq!(locks.release(first).await, Ok(ReleaseOutcome::Expired));
    assert!(locks.is_locked(KEY));
    assert_eq!(locks.release(second).await, Ok(ReleaseOutcome::Released));
    assert!(!locks.is_locked(KEY));
}

#[tokio::test]
async fn wait_policy_times_out_on_a_held_key() {
    let locks = common::in_process_locks(AcquirePolicy::Wait);
    let held = locks
        .acquire(KEY, Duration::from_secs(5), Duration::ZERO)
        .await
        .expect("acquire");

    let started = tokio::time::Instant::now();
    let err = locks
        .acquire(KEY, Duration::from_secs(5), Duration::from_millis(60))
        .await
        .expect_err("wait must time out");

    assert_eq!(err.reason, LockFailureReason::Timeout);
    assert!(started.elapsed() >= Duration::from_millis(60));
    locks.release(held).await.expect("release");
}

#[tokio::test]
async fn wait_policy_picks_up_an_expired_key() {
    let locks = common::in_process_locks(AcquirePolicy::Wait);
    let _abandoned = locks
        .acquire(KEY, Duration::from_millis(30), Duration::ZERO)
        .await
        .expect("acquire");

    let handle = locks
        .acquire(KEY, Duration::from_secs(5), Duration::from_secs(2))
        .await
        .expect("acquired once the abandoned lock expires");
    assert!(!handle.is_expired());
    locks.release(handle).await.expect("release");
}

#[tokio::test]
async fn distinct_keys_do_not_contend() {
    let locks = common::in_process_locks(AcquirePolicy::FailFast);
    let ttl = Duration::from_secs(5);

    let a = locks
        .acquire("lock:character:1", ttl, Duration::ZERO)
        .await
        .expect("a");
    let b = locks
        .acquire("lock:character:2", ttl, Duration::ZERO)
        .await
        .expect("b");

    assert_ne!(a.owner(), b.owner());
    locks.release(a).await.expect("release a");
    locks.release(b).await.expect("release b");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn only_one_concurrent_acquirer_wins() {
    let locks = Arc::new(InProcessLockManager::new(
        AcquirePolicy::FailFast,
        Duration::from_millis(5),
    ));

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let locks = locks.clone();
        tasks.push(tokio::spawn(async move {
            locks
                .acquire(KEY, Duration::from_secs(5), Duration::ZERO)
                .await
        }));
    }

    let mut winners = Vec::new();
    for task in tasks {
        if let Ok(handle) = task.await.expect("join") {
            winners.push(handle);
        }
    }

    assert_eq!(winners.len(), 1);
    for handle in winners {
        locks.release(handle).await.expect("release");
    }
}

/// Runs against a live server only when `REDIS_URL` is set.
#[tokio::test]
async fn redis_lock_round_trip() {
    let Ok(url) = std::env::var("REDIS_URL") else {
        return;
    };
    let locks = RedisLockManager::connect(
        &url,
        AcquirePolicy::FailFast,
        Duration::from_millis(10),
        3,
        Backoff::default(),
    )
    .await
    .expect("connect");

    let key = format!("test:character:{}", uuid::Uuid::new_v4());
    let ttl = Duration::from_millis(200);

    let mut held = locks.acquire(&key, ttl, Duration::ZERO).await.expect("acquire");
    let err = locks
        .acquire(&key, ttl, Duration::ZERO)
        .await
        .expect_err("held");
    assert_eq!(err.reason, LockFailureReason::AlreadyLocked);

    // Resending the acquisition under the holder's own token is idempotent.
    let resent = locks
        .acquire_as(&key, held.owner(), ttl, Duration::ZERO)
        .await
        .expect("own token re-acquires");
    assert_eq!(resent.owner(), held.owner());
    drop(resent);

    assert_eq!(locks.extend(&mut held, Duration::from_secs(2)).await, Ok(true));
    assert_eq!(locks.release(held).await, Ok(ReleaseOutcome::Released));

    let short = locks
        .acquire(&key, Duration::from_millis(50), Duration::ZERO)
        .await
        .expect("free after release");
    tokio::time::sleep(Duration::from_millis(120)).await;
    let next = locks
        .acquire(&key, ttl, Duration::ZERO)
        .await
        .expect("free after ttl");
    assert_eq!(locks.release(short).await, Ok(ReleaseOutcome::Expired));
    assert_eq!(locks.release(next).await, Ok(ReleaseOutcome::Released));
}
