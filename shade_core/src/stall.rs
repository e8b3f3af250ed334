//! Stall latch shared between interrupt context and the polling loop.
//!
//! The interrupt side does the absolute minimum: one atomic store, no
//! allocation, no logging, no blocking. Everything else (state transitions,
//! persistence, reporting) happens later on the polling loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable setter half of the latch. Hand this to the DIAG-pin interrupt
/// handler (or to a test).
#[derive(Debug, Clone)]
pub struct StallHandle {
    flag: Arc<AtomicBool>,
}

impl StallHandle {
    /// Latch a stall. Safe from interrupt context.
    #[inline]
    pub fn trip(&self) {
        self.flag.store(true, Ordering::Release);
    }
}

/// Polling half: confirms a latched stall after `debounce_ticks`
/// consecutive observations, then clears the latch.
#[derive(Debug)]
pub struct StallDetector {
    flag: Arc<AtomicBool>,
    debounce_ticks: u8,
    seen: u8,
}

impl StallDetector {
    pub fn new(debounce_ticks: u8) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            debounce_ticks: debounce_ticks.max(1),
            seen: 0,
        }
    }

    pub fn handle(&self) -> StallHandle {
        StallHandle {
            flag: Arc::clone(&self.flag),
        }
    }

    /// One non-blocking poll. Returns true exactly once per confirmed stall.
    pub fn poll(&mut self) -> bool {
        if self.flag.load(Ordering::Acquire) {
            self.seen = self.seen.saturating_add(1);
            if self.seen >= self.debounce_ticks {
                self.flag.store(false, Ordering::Release);
                self.seen = 0;
                return true;
            }
        } else {
            self.seen = 0;
        }
        false
    }

    /// Drop any latched stall, e.g. before starting a new move.
    pub fn clear(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.seen = 0;
    }
}
