//! Request pacing for a single provider.
//!
//! Every request start is spaced at least `min_interval` after the previous
//! one, across all threads sharing the pacer. The lock only guards the slot
//! bookkeeping; the sleep happens after it is released.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Reserve the next request slot and return the instant it starts.
    fn reserve(&self) -> Instant {
        let now = Instant::now();
        let mut next = self
            .next_slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let start = match *next {
            Some(slot) if slot > now => slot,
            _ => now,
        };
        *next = Some(start + self.min_interval);
        start
    }

    /// Block until this caller may issue its request.
    pub fn wait(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        let start = self.reserve();
        let now = Instant::now();
        if start > now {
            std::thread::sleep(start - now);
        }
    }
}
