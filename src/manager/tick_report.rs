// src/manager/tick_report.rs

//! Result types describing what a tick did.

use crate::manager::arena::HandlerId;
use crate::manager::handler::StepOutcome;

/// What `run_handlers` did with the front of the active queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerStep {
    /// Nothing was active.
    QueueEmpty,
    /// The front handler was stepped once.
    Stepped {
        handler: HandlerId,
        outcome: StepOutcome,
        /// Children spliced to the front after this step, in enqueue order
        /// (so the last one is now at the very front).
        children: Vec<HandlerId>,
    },
    /// The front handler was never stepped and its trigger no longer holds;
    /// it was left in place.
    Held(HandlerId),
    /// As `Held`, but the handler was removed from the queue.
    Dropped(HandlerId),
}

impl HandlerStep {
    /// The handler whose step ran, if one did.
    pub fn stepped(&self) -> Option<HandlerId> {
        match self {
            HandlerStep::Stepped { handler, .. } => Some(*handler),
            _ => None,
        }
    }

    /// The handler that completed this tick, if one did.
    pub fn completed(&self) -> Option<HandlerId> {
        match self {
            HandlerStep::Stepped {
                handler,
                outcome: StepOutcome::Completed,
                ..
            } => Some(*handler),
            _ => None,
        }
    }
}

/// Structured result of a single `tick`.
///
/// Handy for tests that step the manager manually and assert on what changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// 1-based tick counter of the manager.
    pub tick: u64,
    /// Handlers inserted into the active queue by this tick's monitors.
    pub activated: Vec<HandlerId>,
    pub step: HandlerStep,
}
