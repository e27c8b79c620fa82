//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  The service writes the pending-publish count and the cycle
//! outcome before each tick; handlers write the status the presenter
//! shows.

use crate::display::status::Status;
use crate::error::CommsError;

// ---------------------------------------------------------------------------
// Cycle outcome (written by the service after a sample+publish cycle)
// ---------------------------------------------------------------------------

/// Result of one sample+publish cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every active sensor was read, rendered and published.
    Completed,
    /// The network failed part-way; the rest of the cycle was skipped.
    Failed(CommsError),
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Inputs --
    /// Pending-publish ticks, sampled before each FSM tick.
    pub pending: u32,
    /// Outcome of the cycle run while in `Sending`.  Cleared on entry.
    pub cycle: Option<CycleOutcome>,

    // -- Outputs --
    /// Status to show on the status line.
    pub status: Status,
    /// Detail appended to the status line in `Error`.
    pub status_detail: String,

    // -- Bookkeeping --
    pub last_error: Option<CommsError>,
    pub cycles_completed: u32,
    pub cycles_failed: u32,
}

impl FsmContext {
    pub fn new() -> Self {
        Self {
            pending: 0,
            cycle: None,
            status: Status::Starting,
            status_detail: String::new(),
            last_error: None,
            cycles_completed: 0,
            cycles_failed: 0,
        }
    }

    /// Returns `true` when at least one publish tick is waiting.
    pub fn has_pending(&self) -> bool {
        self.pending > 0
    }
}

impl Default for FsmContext {
    fn default() -> Self {
        Self::new()
    }
}
