// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{EventMgrError, Result};
use crate::manager::SENTINEL_PRIORITY;
use crate::sim::EVENT_NAMES;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = EventMgrError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_loop(cfg)?;
    validate_events(cfg)?;
    validate_sim(cfg)?;
    Ok(())
}

fn validate_loop(cfg: &RawConfigFile) -> Result<()> {
    if cfg.control_loop.tick_period_ms == 0 {
        return Err(EventMgrError::ConfigError(
            "[loop].tick_period_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.control_loop.max_ticks == Some(0) {
        return Err(EventMgrError::ConfigError(
            "[loop].max_ticks must be >= 1 when set (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_events(cfg: &RawConfigFile) -> Result<()> {
    for (name, event) in cfg.event.iter() {
        if !EVENT_NAMES.contains(&name.as_str()) {
            return Err(EventMgrError::UnknownEvent(format!(
                "[event.{name}] (known events: {})",
                EVENT_NAMES.join(", ")
            )));
        }
        if event.priority == Some(SENTINEL_PRIORITY) {
            return Err(EventMgrError::ConfigError(format!(
                "[event.{name}].priority {SENTINEL_PRIORITY} is reserved for armed handlers"
            )));
        }
    }
    Ok(())
}

fn validate_sim(cfg: &RawConfigFile) -> Result<()> {
    let sim = &cfg.sim;

    if sim.waypoints == 0 {
        return Err(EventMgrError::ConfigError(
            "[sim].waypoints must be >= 1 (got 0)".to_string(),
        ));
    }
    if sim.ticks_per_leg == 0 {
        return Err(EventMgrError::ConfigError(
            "[sim].ticks_per_leg must be >= 1 (got 0)".to_string(),
        ));
    }
    if !(sim.takeoff_altitude_m.is_finite() && sim.takeoff_altitude_m > 0.0) {
        return Err(EventMgrError::ConfigError(format!(
            "[sim].takeoff_altitude_m must be a positive number (got {})",
            sim.takeoff_altitude_m
        )));
    }
    if !(sim.allowed_xtrack_m.is_finite() && sim.allowed_xtrack_m > 0.0) {
        return Err(EventMgrError::ConfigError(format!(
            "[sim].allowed_xtrack_m must be a positive number (got {})",
            sim.allowed_xtrack_m
        )));
    }
    if sim.conflict_start_tick.is_some() && sim.conflict_duration_ticks == 0 {
        return Err(EventMgrError::ConfigError(
            "[sim].conflict_duration_ticks must be >= 1 when a conflict is scheduled".to_string(),
        ));
    }
    Ok(())
}
