// src/manager/mod.rs

//! The event manager core.
//!
//! - [`arena`] owns every handler record and hands out stable [`HandlerId`]s.
//! - [`handler`] defines the [`Handler`] contract and the [`StepContext`] a
//!   step runs in.
//! - [`phased`] adapts initialize/execute/terminate style handlers.
//! - [`registry`] maps event names to monitors and bound handlers.
//! - [`queue`] is the priority-ordered active queue.
//! - [`event_manager`] ties them together: `bind`, `run_monitors`,
//!   `run_handlers`, `tick`.
//! - [`tick_report`] describes what a tick did.

pub mod arena;
pub mod event_manager;
pub mod handler;
pub mod phased;
pub mod queue;
pub mod registry;
pub mod tick_report;

pub use arena::{HandlerArena, HandlerId, Lifetime};
pub use event_manager::EventManager;
pub use handler::{ExecState, Handler, Priority, SENTINEL_PRIORITY, StepContext, StepOutcome};
pub use phased::{Phase, PhaseStatus, Phased, PhasedHandler};
pub use queue::ActiveQueue;
pub use registry::{EventName, EventRegistry, Monitor};
pub use tick_report::{HandlerStep, TickReport};
