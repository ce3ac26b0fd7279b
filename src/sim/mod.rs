// src/sim/mod.rs

//! Demo vehicle domain driven by the event manager.
//!
//! Four events watch a [`VehicleState`]: `takeoff`, `land`,
//! `flightplan_deviation` and `traffic_conflict`. Their handlers issue
//! [`Command`]s, which the plant task applies back onto the state between
//! ticks.

pub mod handlers;
pub mod state;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::engine::LoopEvent;
use crate::errors::{EventMgrError, Result};
use crate::manager::{EventManager, Handler, PhasedHandler, Priority};
use crate::sim::handlers::{FlightPlanDeviation, Land, Takeoff, TrafficConflict};

pub use state::{Command, FlightMode, MissionPhase, VehicleState};

pub const TAKEOFF: &str = "takeoff";
pub const LAND: &str = "land";
pub const FLIGHTPLAN_DEVIATION: &str = "flightplan_deviation";
pub const TRAFFIC_CONFLICT: &str = "traffic_conflict";

/// Every event the demo knows, in registration order.
pub const EVENT_NAMES: [&str; 4] = [TAKEOFF, LAND, FLIGHTPLAN_DEVIATION, TRAFFIC_CONFLICT];

/// Built-in priority of `event`'s handler.
pub fn default_priority(event: &str) -> Option<Priority> {
    match event {
        TAKEOFF => Some(1),
        LAND => Some(2),
        FLIGHTPLAN_DEVIATION => Some(5),
        TRAFFIC_CONFLICT => Some(10),
        _ => None,
    }
}

fn takeoff_pending(s: &VehicleState) -> bool {
    s.mission == MissionPhase::Pending
}

fn plan_finished(s: &VehicleState) -> bool {
    s.mission == MissionPhase::Enroute && s.plan_finished()
}

fn off_track(s: &VehicleState) -> bool {
    s.mission == MissionPhase::Enroute && s.off_track()
}

fn traffic_conflict(s: &VehicleState) -> bool {
    s.mission == MissionPhase::Enroute && s.traffic_conflict
}

/// Build the event manager and initial state described by `cfg`.
pub fn build(cfg: &ConfigFile) -> Result<(EventManager<VehicleState>, VehicleState)> {
    let mut manager = EventManager::new(cfg.manager);

    register(&mut manager, cfg, TAKEOFF, takeoff_pending, |_| {
        PhasedHandler::new(Takeoff::default())
    })?;
    register(&mut manager, cfg, LAND, plan_finished, |_| PhasedHandler::new(Land))?;
    register(&mut manager, cfg, FLIGHTPLAN_DEVIATION, off_track, |_| {
        FlightPlanDeviation
    })?;
    register(
        &mut manager,
        cfg,
        TRAFFIC_CONFLICT,
        traffic_conflict,
        TrafficConflict::new,
    )?;

    Ok((manager, VehicleState::new(&cfg.sim)))
}

/// Add the handler made by `make` and bind it to `event`, unless the config
/// disables the event.
fn register<H, F>(
    manager: &mut EventManager<VehicleState>,
    cfg: &ConfigFile,
    event: &str,
    monitor: fn(&VehicleState) -> bool,
    make: F,
) -> Result<()>
where
    H: Handler<VehicleState> + 'static,
    F: FnOnce(Priority) -> H,
{
    if !cfg.is_enabled(event) {
        info!(event, "event disabled by config");
        return Ok(());
    }
    let priority = cfg
        .priority_override(event)
        .or_else(|| default_priority(event))
        .ok_or_else(|| EventMgrError::UnknownEvent(event.to_string()))?;

    let id = manager.add_handler(make(priority));
    manager.bind(event, priority, monitor, Some(id))?;
    debug!(event, priority, handler = %id, "sim event bound");
    Ok(())
}

/// Spawn the plant: every command received on `commands` is applied to the
/// state through `loop_tx`, the way a vehicle answers over the bus.
///
/// The task ends when either channel closes.
pub fn spawn_plant(
    mut commands: mpsc::UnboundedReceiver<Command>,
    loop_tx: mpsc::Sender<LoopEvent<VehicleState>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(command) = commands.recv().await {
            info!(?command, "plant received command");
            let update = LoopEvent::update(move |s: &mut VehicleState| s.apply(command));
            if loop_tx.send(update).await.is_err() {
                debug!("plant: loop event channel closed");
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RawConfigFile, SimSection};
    use crate::engine::{CoreLoop, LoopOptions};

    fn config(sim: SimSection) -> ConfigFile {
        ConfigFile::try_from(RawConfigFile {
            sim,
            ..RawConfigFile::default()
        })
        .unwrap()
    }

    /// Tick until the loop stops, feeding every command straight back into
    /// the plant. Returns the commands in dispatch order.
    fn fly(core: &mut CoreLoop<VehicleState>, limit: u64) -> Vec<Command> {
        let mut issued = Vec::new();
        for _ in 0..limit {
            let step = core.step(LoopEvent::Tick);
            let commands: Vec<Command> = step.dispatched().cloned().collect();
            issued.extend(commands.iter().cloned());
            core.step(LoopEvent::update(move |s: &mut VehicleState| {
                for c in commands {
                    s.apply(c);
                }
            }));
            if !step.keep_running {
                break;
            }
        }
        issued
    }

    fn mission(sim: SimSection) -> CoreLoop<VehicleState> {
        let (manager, state) = build(&config(sim)).unwrap();
        CoreLoop::new(manager, state, LoopOptions::default())
    }

    #[test]
    fn nominal_mission_takes_off_flies_the_plan_and_lands() {
        let mut core = mission(SimSection::default());
        let issued = fly(&mut core, 100);

        assert_eq!(
            issued,
            vec![
                Command::Arm,
                Command::Takeoff { altitude_m: 30.0 },
                Command::GotoWaypoint { index: 0 },
                Command::Land,
            ]
        );
        let state = core.state();
        assert_eq!(state.mission, MissionPhase::Complete);
        assert!(state.on_ground);
        assert_eq!(state.next_waypoint, 4);
        assert_eq!(core.ticks(), 30);
    }

    #[test]
    fn traffic_conflict_climbs_through_a_transient_child_then_resumes() {
        let mut core = mission(SimSection {
            conflict_start_tick: Some(10),
            conflict_duration_ticks: 5,
            ..SimSection::default()
        });
        let handlers_before = core.manager().handler_count();
        let issued = fly(&mut core, 100);

        let climb = issued
            .iter()
            .position(|c| *c == Command::SetAltitude { altitude_m: 50.0 })
            .expect("climb issued");
        let descend = issued
            .iter()
            .position(|c| *c == Command::SetAltitude { altitude_m: 30.0 })
            .expect("return to cruise issued");
        assert!(climb < descend);
        assert_eq!(issued.last(), Some(&Command::Land));
        assert_eq!(core.state().mission, MissionPhase::Complete);
        // The climb child was freed once it completed.
        assert_eq!(core.manager().handler_count(), handlers_before);
    }

    #[test]
    fn deviation_is_intercepted_before_the_plan_continues() {
        let mut core = mission(SimSection {
            deviation_start_tick: Some(8),
            ..SimSection::default()
        });
        let issued = fly(&mut core, 100);

        let intercept = issued
            .iter()
            .position(|c| matches!(c, Command::Intercept { .. }))
            .expect("intercept issued");
        assert_eq!(issued[intercept + 1], Command::GotoWaypoint { index: 0 });
        assert!(!core.state().off_track());
        assert_eq!(core.state().mission, MissionPhase::Complete);
    }

    #[test]
    fn disabled_events_are_not_registered_and_priorities_can_be_overridden() {
        let raw: RawConfigFile = toml::from_str(
            r#"
            [event.traffic_conflict]
            enabled = false

            [event.land]
            priority = 9
            "#,
        )
        .unwrap();
        let (manager, _) = build(&ConfigFile::try_from(raw).unwrap()).unwrap();

        let names: Vec<&str> = manager.event_names().collect();
        assert_eq!(names, vec![TAKEOFF, LAND, FLIGHTPLAN_DEVIATION]);
        let land = manager.handler_for(LAND).unwrap();
        assert_eq!(manager.base_priority(land), Some(9));
    }
}
