// src/engine/mod.rs

//! Control-loop driver around the [`EventManager`](crate::manager::EventManager).
//!
//! This module ties together:
//! - the event manager and the state it runs over
//! - state updates arriving from outside between ticks
//! - the periodic tick
//! - handing commands that handlers leave in the state to a command sink
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::fmt;

/// State type a control loop can drive.
///
/// Handlers communicate with the outside world by leaving commands in the
/// state; the loop drains them after every tick.
pub trait LoopState: Send + 'static {
    type Command: fmt::Debug + Send + 'static;

    /// Remove and return the commands produced since the last call.
    fn take_commands(&mut self) -> Vec<Self::Command>;

    /// Called at the start of every tick, before monitors run.
    fn on_tick(&mut self, _tick: u64) {}

    /// Once this returns true and no handler is active, the loop stops.
    fn is_finished(&self) -> bool {
        false
    }
}

/// A mutation of the state delivered from outside the loop.
pub type StateUpdate<S> = Box<dyn FnOnce(&mut S) + Send>;

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopOptions {
    /// Stop after this many ticks (used for bounded demo/test runs).
    pub max_ticks: Option<u64>,
}

/// Events flowing into the control loop.
pub enum LoopEvent<S> {
    /// Apply an update to the state (e.g. fresh telemetry).
    Update(StateUpdate<S>),
    /// Run one scheduler tick.
    Tick,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

impl<S> fmt::Debug for LoopEvent<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopEvent::Update(_) => f.write_str("Update(..)"),
            LoopEvent::Tick => f.write_str("Tick"),
            LoopEvent::ShutdownRequested => f.write_str("ShutdownRequested"),
        }
    }
}

impl<S> LoopEvent<S> {
    /// Convenience for building an `Update` from a closure.
    pub fn update<F>(f: F) -> Self
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        LoopEvent::Update(Box::new(f))
    }
}

pub mod core;
pub mod runtime;

pub use self::core::{CoreCommand, CoreLoop, CoreStep};
pub use self::runtime::{ControlLoop, spawn_ticker};
