//! Status state machine.
//!
//! A table of plain `fn` pointers, one row per [`StateId`]:
//!
//! ```text
//!   StateId   on_enter        on_exit        on_update
//!   Waiting   waiting_enter   -              pending > 0 → Sending
//!   Sending   sending_enter   sending_exit   cycle outcome → Waiting | Error
//!   Error     error_enter     -              pending > 0 → Sending
//! ```
//!
//! [`Fsm::tick`] runs `on_update` of the current row; a returned id
//! runs `on_exit` of the old row and `on_enter` of the new one.  Handlers
//! only touch the [`FsmContext`] the service passes in.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

/// Main-loop states, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateId {
    Waiting,
    Sending,
    Error,
}

impl StateId {
    pub const COUNT: usize = 3;

    const fn index(self) -> usize {
        self as usize
    }
}

pub type StateActionFn = fn(&mut FsmContext);

/// `Some(next)` requests a transition.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<StateId>;

/// One row of the state table.
pub struct StateDescriptor {
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

pub struct Fsm {
    table: [StateDescriptor; StateId::COUNT],
    current: StateId,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial,
        }
    }

    /// Enter the initial state.  Call once before the first [`tick`].
    ///
    /// [`tick`]: Self::tick
    pub fn start(&mut self, ctx: &mut FsmContext) {
        let row = self.row(self.current);
        info!("FSM starting in state: {}", row.name);
        if let Some(enter) = row.on_enter {
            enter(ctx);
        }
    }

    pub fn tick(&mut self, ctx: &mut FsmContext) {
        let Some(next) = (self.row(self.current).on_update)(ctx) else {
            return;
        };

        let (from, to) = (self.row(self.current), self.row(next));
        info!("FSM transition: {} -> {}", from.name, to.name);
        if let Some(exit) = from.on_exit {
            exit(ctx);
        }
        if let Some(enter) = to.on_enter {
            enter(ctx);
        }
        self.current = next;
    }

    pub fn current_state(&self) -> StateId {
        self.current
    }

    fn row(&self, id: StateId) -> &StateDescriptor {
        &self.table[id.index()]
    }
}
