// src/types.rs

use std::str::FromStr;
use serde::Deserialize;

/// What the manager does when the front handler is still `Idle` and the event
/// that activated it no longer holds at the moment it would take its first step.
///
/// - `Drop`: remove it from the active queue and reset it to its base priority
///   (default).
/// - `Hold`: leave the handler at the front, untouched, until the trigger holds
///   again. Nothing behind it runs in the meantime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleTriggerPolicy {
    Hold,
    Drop,
}

impl Default for StaleTriggerPolicy {
    fn default() -> Self {
        StaleTriggerPolicy::Drop
    }
}

impl FromStr for StaleTriggerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hold" => Ok(StaleTriggerPolicy::Hold),
            "drop" => Ok(StaleTriggerPolicy::Drop),
            other => Err(format!(
                "invalid stale_trigger policy: {other} (expected \"hold\" or \"drop\")"
            )),
        }
    }
}

/// What `bind` does when the event already has a handler sitting in the
/// active queue.
///
/// - `Allow`: overwrite the binding; the queued handler stays queued and runs
///   to completion under the new monitor (default).
/// - `Reject`: refuse with `RebindWhileActive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebindPolicy {
    Allow,
    Reject,
}

impl Default for RebindPolicy {
    fn default() -> Self {
        RebindPolicy::Allow
    }
}

impl FromStr for RebindPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "allow" => Ok(RebindPolicy::Allow),
            "reject" => Ok(RebindPolicy::Reject),
            other => Err(format!(
                "invalid rebind policy: {other} (expected \"allow\" or \"reject\")"
            )),
        }
    }
}

/// Both policies together, as handed to `EventManager::new`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ManagerPolicy {
    #[serde(default)]
    pub stale_trigger: StaleTriggerPolicy,
    #[serde(default)]
    pub rebind: RebindPolicy,
}
