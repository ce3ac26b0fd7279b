// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::manager::Priority;
use crate::types::ManagerPolicy;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [manager]
/// stale_trigger = "drop"
/// rebind = "allow"
///
/// [loop]
/// tick_period_ms = 100
/// max_ticks = 200
///
/// [event.traffic_conflict]
/// priority = 10
///
/// [event.flightplan_deviation]
/// enabled = false
///
/// [sim]
/// waypoints = 4
/// conflict_start_tick = 40
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Scheduler policies from `[manager]`.
    #[serde(default)]
    pub manager: ManagerPolicy,

    /// Control-loop timing from `[loop]`.
    #[serde(default, rename = "loop")]
    pub control_loop: LoopSection,

    /// Per-event overrides from `[event.<name>]`.
    #[serde(default)]
    pub event: BTreeMap<String, EventConfig>,

    /// Demo scenario knobs from `[sim]`.
    #[serde(default)]
    pub sim: SimSection,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`
/// (or the loader), so everything holding one can rely on the checks in
/// `validate.rs`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub manager: ManagerPolicy,
    pub control_loop: LoopSection,
    pub event: BTreeMap<String, EventConfig>,
    pub sim: SimSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            manager: raw.manager,
            control_loop: raw.control_loop,
            event: raw.event,
            sim: raw.sim,
        }
    }

    /// Priority override for `event`, if configured.
    pub fn priority_override(&self, event: &str) -> Option<Priority> {
        self.event.get(event).and_then(|e| e.priority)
    }

    /// Whether `event` should be registered at all (default: yes).
    pub fn is_enabled(&self, event: &str) -> bool {
        self.event.get(event).map(|e| e.enabled).unwrap_or(true)
    }
}

/// `[loop]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LoopSection {
    /// Milliseconds between ticks.
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,

    /// Stop after this many ticks. Runs until Ctrl-C when unset.
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

fn default_tick_period_ms() -> u64 {
    100
}

impl Default for LoopSection {
    fn default() -> Self {
        Self {
            tick_period_ms: default_tick_period_ms(),
            max_ticks: None,
        }
    }
}

/// `[event.<name>]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EventConfig {
    /// Overrides the built-in priority of the event's handler.
    #[serde(default)]
    pub priority: Option<Priority>,

    /// If false the event is not registered with the manager.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            priority: None,
            enabled: default_enabled(),
        }
    }
}

/// `[sim]` section: the scripted mission the demo binary flies.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimSection {
    /// Number of flight-plan waypoints after takeoff.
    #[serde(default = "default_waypoints")]
    pub waypoints: u32,

    #[serde(default = "default_takeoff_altitude_m")]
    pub takeoff_altitude_m: f64,

    /// Ticks needed to fly one leg between waypoints.
    #[serde(default = "default_ticks_per_leg")]
    pub ticks_per_leg: u32,

    /// Tick at which an intruder shows up. No traffic when unset.
    #[serde(default)]
    pub conflict_start_tick: Option<u64>,

    #[serde(default = "default_conflict_duration_ticks")]
    pub conflict_duration_ticks: u64,

    /// Tick at which a wind gust pushes the vehicle off the plan. No gust
    /// when unset.
    #[serde(default)]
    pub deviation_start_tick: Option<u64>,

    /// Cross-track error tolerated before `flightplan_deviation` fires.
    #[serde(default = "default_allowed_xtrack_m")]
    pub allowed_xtrack_m: f64,
}

fn default_waypoints() -> u32 {
    4
}

fn default_takeoff_altitude_m() -> f64 {
    30.0
}

fn default_ticks_per_leg() -> u32 {
    5
}

fn default_conflict_duration_ticks() -> u64 {
    5
}

fn default_allowed_xtrack_m() -> f64 {
    10.0
}

impl Default for SimSection {
    fn default() -> Self {
        Self {
            waypoints: default_waypoints(),
            takeoff_altitude_m: default_takeoff_altitude_m(),
            ticks_per_leg: default_ticks_per_leg(),
            conflict_start_tick: None,
            conflict_duration_ticks: default_conflict_duration_ticks(),
            deviation_start_tick: None,
            allowed_xtrack_m: default_allowed_xtrack_m(),
        }
    }
}
