//! Publish scheduler.
//!
//! A periodic timer increments a shared pending-publish counter; the main
//! loop drains it, running one sample+publish cycle per pending tick.
//!
//! ```text
//! ┌──────────────────────┐   record_tick()   ┌──────────────────────┐
//! │  Timer context       │ ────────────────► │  PendingPublishes    │
//! │  (esp_timer task /   │    fetch_add      │  Arc<AtomicU32>      │
//! │   host sim thread)   │                   └──────────┬───────────┘
//! └──────────────────────┘                              │ pending() /
//!                                                       │ complete_one()
//!                                                       ▼ (CAS, floor 0)
//!                                            ┌──────────────────────┐
//!                                            │  NodeService         │
//!                                            │  run_iteration()     │
//!                                            └──────────────────────┘
//! ```
//!
//! The timer side never blocks, allocates or performs I/O.  Ticks are
//! accumulated, never dropped, and drained one per loop iteration.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use log::debug;

// ═══════════════════════════════════════════════════════════════
//  Pending-publish counter
// ═══════════════════════════════════════════════════════════════

/// Shared handle to the pending-publish counter.
///
/// Cloned into the timer callback; every clone refers to the same counter.
#[derive(Debug, Clone)]
pub struct PendingPublishes(Arc<AtomicU32>);

impl PendingPublishes {
    pub fn new(initial: u32) -> Self {
        Self(Arc::new(AtomicU32::new(initial)))
    }

    /// Counter seeded so the first cycle runs right after boot when
    /// `publish_on_startup` is set.
    pub fn startup(publish_on_startup: bool) -> Self {
        Self::new(u32::from(publish_on_startup))
    }

    /// Timer side: one period elapsed.
    pub fn record_tick(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }

    /// Main-loop side: ticks not yet drained.
    pub fn pending(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }

    /// Main-loop side: one cycle finished.  Returns `false` (and leaves the
    /// counter untouched) if it was already zero.
    pub fn complete_one(&self) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tick generator
// ═══════════════════════════════════════════════════════════════

/// Converts elapsed time into timer ticks.
///
/// The host simulation thread and the tests drive this with a clock; on the
/// device the ESP timer service fires [`PendingPublishes::record_tick`]
/// directly at the same period.
#[derive(Debug, Clone)]
pub struct PublishTicker {
    period_ms: u64,
    next_due_ms: u64,
}

impl PublishTicker {
    /// First tick becomes due one full period after `start_ms`.
    pub fn new(period_ms: u64, start_ms: u64) -> Self {
        let period_ms = period_ms.max(1);
        Self {
            period_ms,
            next_due_ms: start_ms + period_ms,
        }
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Record every tick that has become due by `now_ms`.  Returns the
    /// number of ticks recorded.
    pub fn advance(&mut self, now_ms: u64, pending: &PendingPublishes) -> u32 {
        let mut fired = 0;
        while now_ms >= self.next_due_ms {
            pending.record_tick();
            self.next_due_ms += self.period_ms;
            fired += 1;
        }
        if fired > 0 {
            debug!("Scheduler: {} tick(s) at {} ms", fired, now_ms);
        }
        fired
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
