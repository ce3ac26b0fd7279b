// src/exec/mod.rs

//! Command dispatch layer.
//!
//! Handlers never talk to the outside world directly; they leave commands in
//! the state, the control loop drains them after each tick, and a
//! [`CommandSink`] delivers them.

pub mod backend;

pub use backend::{ChannelSink, CommandSink, TracingSink};
