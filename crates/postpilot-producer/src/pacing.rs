//! Leaky-bucket pacing for generation batches.
//!
//! Slots within one batch are produced sequentially; the pacer enforces a
//! minimum interval between producer calls derived from the service's
//! requests-per-minute limit, instead of a hard-coded sleep constant.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Spaces calls at a minimum interval (leaky bucket of capacity one).
///
/// The first call passes immediately; each subsequent call waits until the
/// interval since the previous *permitted* call has elapsed.
pub struct Pacer {
    min_interval: Duration,
    next_allowed: Mutex<Option<Instant>>,
}

impl Pacer {
    /// A pacer admitting at most `requests_per_minute` calls per minute,
    /// evenly spaced.
    #[must_use]
    pub fn per_minute(requests_per_minute: u32) -> Self {
        let rpm = requests_per_minute.max(1);
        Self {
            min_interval: Duration::from_millis(60_000 / u64::from(rpm)),
            next_allowed: Mutex::new(None),
        }
    }

    /// Waits until the next call is permitted, then books the slot.
    pub async fn wait(&self) {
        let mut next_allowed = self.next_allowed.lock().await;
        let now = Instant::now();
        if let Some(at) = *next_allowed {
            if at > now {
                tokio::time::sleep_until(at).await;
            }
        }
        *next_allowed = Some(Instant::now() + self.min_interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_call_is_immediate() {
        let pacer = Pacer::per_minute(12);
        let before = Instant::now();
        pacer.wait().await;
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn successive_calls_are_spaced_by_the_interval() {
        // 12/min = one call every 5 seconds.
        let pacer = Pacer::per_minute(12);
        let start = Instant::now();
        pacer.wait().await;
        pacer.wait().await;
        pacer.wait().await;
        let elapsed = Instant::now() - start;
        assert!(
            elapsed >= Duration::from_secs(10),
            "expected >= 10s for three calls, got {elapsed:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn zero_rpm_is_clamped_to_one() {
        let pacer = Pacer::per_minute(0);
        assert_eq!(pacer.min_interval, Duration::from_secs(60));
    }
}
