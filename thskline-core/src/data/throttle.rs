//! Minimum spacing between request dispatches to the quote server.
//!
//! Shared by every worker thread. Each caller reserves the next free slot
//! under the lock and sleeps outside it, so N concurrent callers end up
//! `min_interval` apart rather than all waking together.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until this caller may dispatch. Returns how long it waited.
    pub fn acquire(&self) -> Duration {
        if self.min_interval.is_zero() {
            return Duration::ZERO;
        }

        let wait = {
            let mut next = self
                .next_slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let now = Instant::now();
            let slot = match *next {
                Some(t) if t > now => t,
                _ => now,
            };
            *next = Some(slot + self.min_interval);
            slot.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
        wait
    }
}
