//! Bounded retry with jittered exponential backoff.
//!
//! Used for two different loops: transient failures of the coordination store
//! or persistence layer (retried transparently), and optimistic-write conflicts
//! in [`MutationGuard`](crate::guard::MutationGuard) (retried after a reload).
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

/// Longest exponent applied to the base delay.
const MAX_EXPONENT: u32 = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(10),
            max: Duration::from_millis(250),
        }
    }
}

impl Backoff {
    pub const fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// Upper bound of the delay before retry number `retry` (0-based).
    pub fn ceiling(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.min(MAX_EXPONENT);
        self.base.saturating_mul(factor).min(self.max)
    }

    /// Delay before retry number `retry`: uniformly jittered over the upper
    /// half of [`ceiling`](Self::ceiling).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let ceiling = u64::try_from(self.ceiling(retry).as_millis()).unwrap_or(u64::MAX);
        if ceiling == 0 {
            return Duration::ZERO;
        }

        let floor = ceiling / 2;
        let jitter = rand::thread_rng().gen_range(0..=ceiling - floor);
        Duration::from_millis(floor + jitter)
    }
}

/// Run `op` up to `attempts` times, sleeping between attempts while the error
/// is classified transient by `is_transient`.
///
/// Non-transient errors and the error of the final attempt are returned as-is.
pub async fn retry_transient<T, E, F, Fut>(
    operation: &'static str,
    attempts: u32,
    backoff: Backoff,
    is_transient: fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation, attempt, "recovered after transient failure");
                }
                return Ok(value);
            }
            Err(error) if attempt < attempts && is_transient(&error) => {
                let delay = backoff.delay_for(attempt - 1);
                warn!(
                    operation,
                    attempt,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    %error,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn ceiling_doubles_then_caps() {
        let backoff = Backoff::new(Duration::from_millis(10), Duration::from_millis(70));
        assert_eq!(backoff.ceiling(0), Duration::from_millis(10));
        assert_eq!(backoff.ceiling(1), Duration::from_millis(20));
        assert_eq!(backoff.ceiling(2), Duration::from_millis(40));
        assert_eq!(backoff.ceiling(3), Duration::from_millis(70));
        assert_eq!(backoff.ceiling(u32::MAX), Duration::from_millis(70));
    }

    #[test]
    fn delay_stays_within_upper_half_of_ceiling() {
        let backoff = Backoff::new(Duration::from_millis(8), Duration::from_millis(100));
        for retry in 0..6 {
            let ceiling = backoff.ceiling(retry);
            for _ in 0..50 {
                let delay = backoff.delay_for(retry);
                assert!(delay <= ceiling);
                assert!(delay >= ceiling / 2);
            }
        }
    }

    #[test]
    fn zero_backoff_never_sleeps() {
        let backoff = Backoff::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(backoff.delay_for(3), Duration::ZERO);
    }

    fn always_transient(_: &String) -> bool {
        true
    }

    fn never_transient(_: &String) -> bool {
        false
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let backoff = Backoff::new(Duration::from_millis(1), Duration::from_millis(2));

        let result: Result<u32, String> = retry_transient("test", 5, backoff, always_transient, || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { if n < 3 { Err(format!("flaky {n}")) } else { Ok(n) } }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn attempts_are_bounded() {
        let calls = AtomicU32::new(0);
        let backoff = Backoff::new(Duration::from_millis(1), Duration::from_millis(2));

        let result: Result<(), String> = retry_transient("test", 3, backoff, always_transient, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("down".to_string()) }
        })
        .await;

        assert_eq!(result, Err("down".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_surface_immediately() {
        let calls = AtomicU32::new(0);

        let result: Result<(), String> =
            retry_transient("test", 5, Backoff::default(), never_transient, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("bad input".to_string()) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
