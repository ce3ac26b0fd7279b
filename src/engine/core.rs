// src/engine/core.rs

//! Pure core control loop.
//!
//! This module contains a synchronous, deterministic "core loop" that
//! consumes [`LoopEvent`]s and produces:
//! - an updated state (and event manager)
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::ControlLoop`) is responsible for:
//! - reading events from channels
//! - handing dispatched commands to a `CommandSink`
//! - handling Ctrl+C / shutdown
//!
//! The core can be unit tested without any Tokio, channels or sinks.

use tracing::{debug, info};

use crate::engine::{LoopEvent, LoopOptions, LoopState};
use crate::manager::{EventManager, TickReport};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreCommand<C> {
    /// Hand these commands to the sink, in order.
    Dispatch(Vec<C>),
    /// Request that the loop exits (tick budget used up).
    RequestExit,
}

/// Decision returned by the core after handling a single [`LoopEvent`].
#[derive(Debug, Clone)]
pub struct CoreStep<C> {
    pub commands: Vec<CoreCommand<C>>,
    /// Whether the outer loop should keep running.
    pub keep_running: bool,
    /// Set when the event was a tick.
    pub report: Option<TickReport>,
}

impl<C> CoreStep<C> {
    fn idle(keep_running: bool) -> Self {
        Self {
            commands: Vec::new(),
            keep_running,
            report: None,
        }
    }

    /// All dispatched commands of this step, flattened.
    pub fn dispatched(&self) -> impl Iterator<Item = &C> {
        self.commands.iter().flat_map(|c| match c {
            CoreCommand::Dispatch(cmds) => cmds.as_slice(),
            CoreCommand::RequestExit => &[][..],
        })
    }
}

/// Pure core loop state.
///
/// This owns:
/// - the event manager
/// - the state it runs over
/// - loop options (e.g. `max_ticks`)
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreLoop<S: LoopState> {
    manager: EventManager<S>,
    state: S,
    options: LoopOptions,
}

impl<S: LoopState> CoreLoop<S> {
    pub fn new(manager: EventManager<S>, state: S, options: LoopOptions) -> Self {
        Self {
            manager,
            state,
            options,
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn manager(&self) -> &EventManager<S> {
        &self.manager
    }

    pub fn ticks(&self) -> u64 {
        self.manager.tick_count()
    }

    /// Give the manager and state back (e.g. after a bounded run).
    pub fn into_parts(self) -> (EventManager<S>, S) {
        (self.manager, self.state)
    }

    /// Handle a single loop event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: LoopEvent<S>) -> CoreStep<S::Command> {
        match event {
            LoopEvent::Update(update) => {
                update(&mut self.state);
                CoreStep::idle(true)
            }
            LoopEvent::Tick => self.tick(),
            LoopEvent::ShutdownRequested => {
                info!(ticks = self.ticks(), "shutdown requested; stopping control loop");
                CoreStep::idle(false)
            }
        }
    }

    fn tick(&mut self) -> CoreStep<S::Command> {
        let next = self.manager.tick_count() + 1;
        self.state.on_tick(next);
        let report = self.manager.tick(&mut self.state);

        let mut commands = Vec::new();
        let outgoing = self.state.take_commands();
        if !outgoing.is_empty() {
            debug!(tick = report.tick, count = outgoing.len(), "handlers issued commands");
            commands.push(CoreCommand::Dispatch(outgoing));
        }

        let mut keep_running = true;
        if let Some(max) = self.options.max_ticks {
            if report.tick >= max {
                info!(ticks = report.tick, "tick budget reached");
                keep_running = false;
                commands.push(CoreCommand::RequestExit);
            }
        }
        if keep_running && self.manager.is_idle() && self.state.is_finished() {
            info!(ticks = report.tick, "state finished with no active handlers");
            keep_running = false;
            commands.push(CoreCommand::RequestExit);
        }

        CoreStep {
            commands,
            keep_running,
            report: Some(report),
        }
    }
}
