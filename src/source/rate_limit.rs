// Request pacing for the HTTP relay.
//
// Callers reserve send slots: each `acquire` books the earliest free slot,
// pushes the next one out by the interval and sleeps until its own slot
// without holding the lock. When the relay answers 429 the source calls
// `back_off` with the relay's Retry-After, so the next request (from this
// or a later run) waits out the pause. The 429 itself is still surfaced to
// the caller; nothing is retried here.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Slot-reserving pacer, shareable across clones.
#[derive(Clone)]
pub struct RequestPacer {
    interval: Duration,
    next_slot: Arc<Mutex<Option<Instant>>>,
}

impl RequestPacer {
    /// Allow `requests_per_second` calls per second. Zero, negative or
    /// non-finite rates disable spacing; `back_off` still applies.
    pub fn new(requests_per_second: f64) -> Self {
        let interval = if requests_per_second.is_finite() && requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::ZERO
        };
        Self {
            interval,
            next_slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Book the next slot and wait for it.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = next.map_or(now, |n| n.max(now));
            *next = Some(slot + self.interval);
            slot
        };
        tokio::time::sleep_until(slot).await;
    }

    /// Hold every later request until `pause` has elapsed. Never shortens a
    /// pause already in effect.
    pub async fn back_off(&self, pause: Duration) {
        let mut next = self.next_slot.lock().await;
        let resume = Instant::now() + pause;
        *next = Some(next.map_or(resume, |n| n.max(resume)));
    }
}
