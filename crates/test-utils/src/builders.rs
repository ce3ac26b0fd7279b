#![allow(dead_code)]

use eventmgr::config::{ConfigFile, EventConfig, RawConfigFile};
use eventmgr::types::{RebindPolicy, StaleTriggerPolicy};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn stale_trigger(mut self, policy: StaleTriggerPolicy) -> Self {
        self.config.manager.stale_trigger = policy;
        self
    }

    pub fn rebind(mut self, policy: RebindPolicy) -> Self {
        self.config.manager.rebind = policy;
        self
    }

    pub fn tick_period_ms(mut self, ms: u64) -> Self {
        self.config.control_loop.tick_period_ms = ms;
        self
    }

    pub fn max_ticks(mut self, ticks: u64) -> Self {
        self.config.control_loop.max_ticks = Some(ticks);
        self
    }

    pub fn event_priority(mut self, event: &str, priority: i32) -> Self {
        self.event_entry(event).priority = Some(priority);
        self
    }

    pub fn disable_event(mut self, event: &str) -> Self {
        self.event_entry(event).enabled = false;
        self
    }

    pub fn conflict_at(mut self, tick: u64, duration: u64) -> Self {
        self.config.sim.conflict_start_tick = Some(tick);
        self.config.sim.conflict_duration_ticks = duration;
        self
    }

    pub fn gust_at(mut self, tick: u64) -> Self {
        self.config.sim.deviation_start_tick = Some(tick);
        self
    }

    pub fn waypoints(mut self, waypoints: u32, ticks_per_leg: u32) -> Self {
        self.config.sim.waypoints = waypoints;
        self.config.sim.ticks_per_leg = ticks_per_leg;
        self
    }

    fn event_entry(&mut self, event: &str) -> &mut EventConfig {
        self.config.event.entry(event.to_string()).or_default()
    }

    /// The unvalidated config, for tests that exercise validation.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
