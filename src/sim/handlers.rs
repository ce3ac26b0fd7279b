// src/sim/handlers.rs

//! Reactive handlers for the demo mission.

use tracing::{debug, info};

use crate::manager::{
    ExecState, Handler, PhaseStatus, Phased, Priority, StepContext, StepOutcome,
};
use crate::sim::state::{Command, MissionPhase, VehicleState};

/// Extra altitude the traffic resolution climbs above cruise.
pub const CONFLICT_CLIMB_M: f64 = 20.0;

/// Arm, climb to the takeoff altitude, then start the flight plan.
#[derive(Debug, Default)]
pub struct Takeoff {
    takeoff_sent: bool,
}

impl Phased<VehicleState> for Takeoff {
    fn initialize(&mut self, ctx: &mut StepContext<'_, VehicleState>) -> PhaseStatus {
        self.takeoff_sent = false;
        let state = ctx.state_mut();
        state.mission = MissionPhase::TakingOff;
        state.issue(Command::Arm);
        PhaseStatus::Success
    }

    fn execute(&mut self, ctx: &mut StepContext<'_, VehicleState>) -> PhaseStatus {
        let state = ctx.state_mut();
        if !state.armed {
            return PhaseStatus::InProgress;
        }

        let target = state.cruise_altitude_m();
        if !self.takeoff_sent {
            state.issue(Command::Takeoff { altitude_m: target });
            self.takeoff_sent = true;
            return PhaseStatus::InProgress;
        }

        if state.at_altitude(target) {
            PhaseStatus::Success
        } else {
            PhaseStatus::InProgress
        }
    }

    fn terminate(&mut self, ctx: &mut StepContext<'_, VehicleState>) -> PhaseStatus {
        let state = ctx.state_mut();
        let index = state.next_waypoint;
        state.issue(Command::GotoWaypoint { index });
        state.mission = MissionPhase::Enroute;
        info!(altitude_m = state.altitude_m, "takeoff complete; starting flight plan");
        PhaseStatus::Success
    }

    fn name(&self) -> &str {
        "takeoff"
    }
}

/// Land once the last waypoint is reached.
#[derive(Debug, Default)]
pub struct Land;

impl Phased<VehicleState> for Land {
    fn initialize(&mut self, ctx: &mut StepContext<'_, VehicleState>) -> PhaseStatus {
        let state = ctx.state_mut();
        state.mission = MissionPhase::Landing;
        state.issue(Command::Land);
        PhaseStatus::Success
    }

    fn execute(&mut self, ctx: &mut StepContext<'_, VehicleState>) -> PhaseStatus {
        if ctx.state().on_ground {
            PhaseStatus::Success
        } else {
            PhaseStatus::InProgress
        }
    }

    fn terminate(&mut self, ctx: &mut StepContext<'_, VehicleState>) -> PhaseStatus {
        ctx.state_mut().mission = MissionPhase::Complete;
        info!("landed; mission complete");
        PhaseStatus::Success
    }

    fn name(&self) -> &str {
        "land"
    }
}

/// Steer back onto the flight plan after a cross-track excursion.
#[derive(Debug, Default)]
pub struct FlightPlanDeviation;

impl Handler<VehicleState> for FlightPlanDeviation {
    fn step(&mut self, ctx: &mut StepContext<'_, VehicleState>) -> StepOutcome {
        let armed = ctx.exec_state() == ExecState::Initializing;
        let state = ctx.state_mut();
        let index = state.next_waypoint;

        if armed {
            info!(xtrack_m = state.xtrack_m, waypoint = index, "intercepting flight plan");
            state.issue(Command::Intercept { index });
            return StepOutcome::Continuing;
        }

        if state.xtrack_m <= state.scenario().allowed_xtrack_m / 2.0 {
            state.issue(Command::GotoWaypoint { index });
            debug!(waypoint = index, "back on the flight plan");
            StepOutcome::Completed
        } else {
            StepOutcome::Continuing
        }
    }

    fn name(&self) -> &str {
        "flightplan_deviation"
    }
}

/// Resolve a traffic conflict by climbing away, then resume the plan once
/// the conflict has cleared.
#[derive(Debug)]
pub struct TrafficConflict {
    priority: Priority,
}

impl TrafficConflict {
    /// `priority` is what the spawned climb runs at.
    pub fn new(priority: Priority) -> Self {
        Self { priority }
    }
}

impl Handler<VehicleState> for TrafficConflict {
    fn step(&mut self, ctx: &mut StepContext<'_, VehicleState>) -> StepOutcome {
        if ctx.exec_state() == ExecState::Initializing {
            let target = ctx.state().cruise_altitude_m() + CONFLICT_CLIMB_M;
            let child = ctx.spawn(Climb::new(target), self.priority);
            info!(child = %child, target_m = target, "traffic conflict; climbing clear");
            return StepOutcome::Continuing;
        }

        let state = ctx.state_mut();
        if state.traffic_conflict {
            return StepOutcome::Continuing;
        }

        let cruise = state.cruise_altitude_m();
        let index = state.next_waypoint;
        state.issue(Command::SetAltitude { altitude_m: cruise });
        state.issue(Command::GotoWaypoint { index });
        info!("traffic clear; resuming flight plan");
        StepOutcome::Completed
    }

    fn name(&self) -> &str {
        "traffic_conflict"
    }
}

/// Transient child of [`TrafficConflict`]: change altitude and wait until
/// the vehicle gets there.
#[derive(Debug)]
pub struct Climb {
    target_m: f64,
}

impl Climb {
    pub fn new(target_m: f64) -> Self {
        Self { target_m }
    }
}

impl Handler<VehicleState> for Climb {
    fn step(&mut self, ctx: &mut StepContext<'_, VehicleState>) -> StepOutcome {
        let armed = ctx.exec_state() == ExecState::Initializing;
        let state = ctx.state_mut();
        if armed {
            state.issue(Command::SetAltitude {
                altitude_m: self.target_m,
            });
            return StepOutcome::Continuing;
        }

        if state.at_altitude(self.target_m) {
            StepOutcome::Completed
        } else {
            StepOutcome::Continuing
        }
    }

    fn name(&self) -> &str {
        "climb"
    }
}
