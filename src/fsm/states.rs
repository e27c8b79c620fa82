//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no
//! dynamic dispatch, no heap.
//!
//! ```text
//!  WAITING ──[pending > 0]──▶ SENDING ──[cycle failed]──▶ ERROR
//!     ▲                          │  ▲                       │
//!     └──────[cycle done]────────┘  └─────[pending > 0]─────┘
//! ```
//!
//! `Error` is left only through a new cycle; a successful cycle returns
//! to `Waiting` and clears the error detail.

use super::context::{CycleOutcome, FsmContext};
use super::{StateDescriptor, StateId};
use crate::display::status::Status;
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Waiting
        StateDescriptor {
            name: "Waiting",
            on_enter: Some(waiting_enter),
            on_exit: None,
            on_update: waiting_update,
        },
        // Index 1: Sending
        StateDescriptor {
            name: "Sending",
            on_enter: Some(sending_enter),
            on_exit: Some(sending_exit),
            on_update: sending_update,
        },
        // Index 2: Error
        StateDescriptor {
            name: "Error",
            on_enter: Some(error_enter),
            on_exit: None,
            on_update: error_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  WAITING state
// ═══════════════════════════════════════════════════════════════════════════

fn waiting_enter(ctx: &mut FsmContext) {
    ctx.status = Status::Waiting;
    ctx.status_detail.clear();
    ctx.last_error = None;
}

fn waiting_update(ctx: &mut FsmContext) -> Option<StateId> {
    ctx.has_pending().then_some(StateId::Sending)
}

// ═══════════════════════════════════════════════════════════════════════════
//  SENDING state: the service runs one sample+publish cycle
// ═══════════════════════════════════════════════════════════════════════════

fn sending_enter(ctx: &mut FsmContext) {
    ctx.status = Status::Sending;
    ctx.cycle = None;
    info!("SENDING: {} tick(s) pending", ctx.pending);
}

fn sending_exit(ctx: &mut FsmContext) {
    ctx.cycle = None;
}

fn sending_update(ctx: &mut FsmContext) -> Option<StateId> {
    match ctx.cycle? {
        CycleOutcome::Completed => {
            ctx.cycles_completed = ctx.cycles_completed.wrapping_add(1);
            Some(StateId::Waiting)
        }
        CycleOutcome::Failed(err) => {
            ctx.cycles_failed = ctx.cycles_failed.wrapping_add(1);
            ctx.last_error = Some(err);
            Some(StateId::Error)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  ERROR state: last cycle failed on the network, waiting for the next tick
// ═══════════════════════════════════════════════════════════════════════════

fn error_enter(ctx: &mut FsmContext) {
    ctx.status = Status::Error;
    ctx.status_detail = ctx
        .last_error
        .map(|e| e.to_string())
        .unwrap_or_default();
    warn!(
        "ERROR: cycle skipped ({}), {} failure(s) so far",
        ctx.status_detail, ctx.cycles_failed
    );
}

fn error_update(ctx: &mut FsmContext) -> Option<StateId> {
    ctx.has_pending().then_some(StateId::Sending)
}
