// src/manager/handler.rs

//! The contract every reactive handler implements, and the context a step
//! runs in.

use tracing::{debug, warn};

use crate::errors::{EventMgrError, Result};
use crate::manager::arena::{HandlerArena, HandlerId, Lifetime};

/// Ordering key of a handler. Higher runs sooner.
pub type Priority = i32;

/// Priority forced onto a handler while it is armed or running, so that no
/// newly activated handler can be ordered ahead of it.
pub const SENTINEL_PRIORITY: Priority = Priority::MAX;

/// Execution state of a handler as seen by the manager.
///
/// Anything finer than this (phases, sub-steps) is tracked by the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    /// Not armed. Either not in the active queue, or queued but not yet stepped.
    Idle,
    /// Armed; the next (or current) step is its first.
    Initializing,
    /// Armed and past its first step.
    Running,
}

/// Result of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The handler is done; it leaves the active queue.
    Completed,
    /// The handler wants further steps on later ticks.
    Continuing,
}

/// A resumable task advanced one step per tick while it is active.
///
/// `step` must not block: the whole control loop waits for it.
pub trait Handler<S>: Send {
    fn step(&mut self, ctx: &mut StepContext<'_, S>) -> StepOutcome;

    /// Label used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// What a handler sees while it is being stepped.
pub struct StepContext<'a, S> {
    state: &'a mut S,
    arena: &'a mut HandlerArena<S>,
    current: HandlerId,
}

impl<'a, S> StepContext<'a, S> {
    pub(crate) fn new(state: &'a mut S, arena: &'a mut HandlerArena<S>, current: HandlerId) -> Self {
        Self {
            state,
            arena,
            current,
        }
    }

    pub fn state(&self) -> &S {
        &*self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut *self.state
    }

    /// Id of the handler being stepped.
    pub fn handler_id(&self) -> HandlerId {
        self.current
    }

    pub fn exec_state(&self) -> ExecState {
        self.arena
            .get(self.current)
            .map(|r| r.exec_state)
            .unwrap_or(ExecState::Idle)
    }

    /// Event whose trigger activated this handler, if any.
    pub fn bound_event(&self) -> Option<&str> {
        self.arena.get(self.current).and_then(|r| r.bound_event())
    }

    /// Create a new child task. It is freed once it completes.
    ///
    /// Children are spliced ahead of everything else in the active queue
    /// right after this step; the last child added runs first.
    pub fn spawn<H>(&mut self, handler: H, priority: Priority) -> HandlerId
    where
        H: Handler<S> + 'static,
    {
        let child = self
            .arena
            .insert(Box::new(handler), priority, Lifetime::Transient);
        debug!(parent = %self.current, child = %child, priority, "spawned child handler");
        self.push_child(child);
        child
    }

    /// Queue an existing handler as a child of this one.
    pub fn enqueue(&mut self, child: HandlerId) -> Result<()> {
        if !self.arena.contains(child) {
            return Err(EventMgrError::StaleHandle(child));
        }
        if child == self.current {
            warn!(handler = %child, "handler tried to enqueue itself as a child; ignoring");
            return Ok(());
        }
        self.push_child(child);
        Ok(())
    }

    fn push_child(&mut self, child: HandlerId) {
        if let Some(record) = self.arena.get_mut(self.current) {
            record.children.push(child);
        }
    }
}
