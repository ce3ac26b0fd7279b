// src/sim/state.rs

//! Vehicle state shared by monitors and handlers, plus the toy plant that
//! reacts to commands and moves the vehicle every tick.

use tracing::{debug, info};

use crate::config::SimSection;
use crate::engine::LoopState;

/// Vertical speed of the plant, in metres per tick.
pub const CLIMB_RATE_M_PER_TICK: f64 = 10.0;

/// Commands handlers issue to the vehicle.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Arm,
    Takeoff { altitude_m: f64 },
    GotoWaypoint { index: u32 },
    SetAltitude { altitude_m: f64 },
    /// Steer back onto the flight plan towards waypoint `index`.
    Intercept { index: u32 },
    Land,
}

/// What the vehicle's autopilot is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightMode {
    Ground,
    Climb,
    Mission,
    Intercept,
    Landing,
}

/// Mission progress as tracked by the handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionPhase {
    Pending,
    TakingOff,
    Enroute,
    Landing,
    Complete,
}

#[derive(Debug, Clone)]
pub struct VehicleState {
    pub tick: u64,

    // Plant.
    pub armed: bool,
    pub on_ground: bool,
    pub mode: FlightMode,
    pub altitude_m: f64,
    pub commanded_altitude_m: f64,
    pub next_waypoint: u32,
    pub leg_progress: u32,
    pub xtrack_m: f64,
    pub traffic_conflict: bool,

    // Written by handlers.
    pub mission: MissionPhase,

    pub outbox: Vec<Command>,
    scenario: SimSection,
}

impl VehicleState {
    pub fn new(scenario: &SimSection) -> Self {
        Self {
            tick: 0,
            armed: false,
            on_ground: true,
            mode: FlightMode::Ground,
            altitude_m: 0.0,
            commanded_altitude_m: 0.0,
            next_waypoint: 0,
            leg_progress: 0,
            xtrack_m: 0.0,
            traffic_conflict: false,
            mission: MissionPhase::Pending,
            outbox: Vec::new(),
            scenario: scenario.clone(),
        }
    }

    pub fn scenario(&self) -> &SimSection {
        &self.scenario
    }

    pub fn cruise_altitude_m(&self) -> f64 {
        self.scenario.takeoff_altitude_m
    }

    pub fn waypoint_count(&self) -> u32 {
        self.scenario.waypoints
    }

    pub fn plan_finished(&self) -> bool {
        self.next_waypoint >= self.waypoint_count()
    }

    pub fn off_track(&self) -> bool {
        self.xtrack_m > self.scenario.allowed_xtrack_m
    }

    pub fn at_altitude(&self, target_m: f64) -> bool {
        (self.altitude_m - target_m).abs() < 0.5
    }

    /// Queue a command for dispatch after this tick.
    pub fn issue(&mut self, command: Command) {
        debug!(?command, tick = self.tick, "command queued");
        self.outbox.push(command);
    }

    /// Apply a command to the plant, as the vehicle would on receipt.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Arm => self.armed = true,
            Command::Takeoff { altitude_m } => {
                if self.armed && self.on_ground {
                    self.on_ground = false;
                    self.mode = FlightMode::Climb;
                    self.commanded_altitude_m = altitude_m;
                }
            }
            Command::GotoWaypoint { index } => {
                self.mode = FlightMode::Mission;
                if index != self.next_waypoint {
                    self.next_waypoint = index;
                    self.leg_progress = 0;
                }
            }
            Command::SetAltitude { altitude_m } => self.commanded_altitude_m = altitude_m,
            Command::Intercept { index } => {
                self.mode = FlightMode::Intercept;
                self.next_waypoint = index;
            }
            Command::Land => {
                self.mode = FlightMode::Landing;
                self.commanded_altitude_m = 0.0;
            }
        }
    }

    fn apply_disturbances(&mut self, tick: u64) {
        if let Some(start) = self.scenario.conflict_start_tick {
            let active = tick >= start && tick < start + self.scenario.conflict_duration_ticks;
            if active != self.traffic_conflict {
                info!(tick, conflict = active, "traffic advisory changed");
            }
            self.traffic_conflict = active;
        }

        if self.scenario.deviation_start_tick == Some(tick) && !self.on_ground {
            self.xtrack_m += 3.0 * self.scenario.allowed_xtrack_m;
            info!(tick, xtrack_m = self.xtrack_m, "gust pushed vehicle off the flight plan");
        }
    }

    fn advance_vertical(&mut self) {
        if self.on_ground {
            return;
        }
        let delta = self.commanded_altitude_m - self.altitude_m;
        self.altitude_m += delta.clamp(-CLIMB_RATE_M_PER_TICK, CLIMB_RATE_M_PER_TICK);

        if self.mode == FlightMode::Landing && self.altitude_m <= 0.0 {
            self.altitude_m = 0.0;
            self.on_ground = true;
            self.armed = false;
            self.mode = FlightMode::Ground;
            info!(tick = self.tick, "touchdown");
        }
    }

    fn advance_lateral(&mut self) {
        match self.mode {
            FlightMode::Mission if !self.plan_finished() => {
                self.leg_progress += 1;
                if self.leg_progress >= self.scenario.ticks_per_leg {
                    self.leg_progress = 0;
                    self.next_waypoint += 1;
                    info!(tick = self.tick, waypoint = self.next_waypoint, "waypoint reached");
                }
            }
            FlightMode::Intercept => {
                self.xtrack_m *= 0.5;
                if self.xtrack_m < 0.5 {
                    self.xtrack_m = 0.0;
                }
            }
            _ => {}
        }
    }
}

impl LoopState for VehicleState {
    type Command = Command;

    fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbox)
    }

    fn on_tick(&mut self, tick: u64) {
        self.tick = tick;
        self.apply_disturbances(tick);
        self.advance_vertical();
        self.advance_lateral();
    }

    fn is_finished(&self) -> bool {
        self.mission == MissionPhase::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn airborne() -> VehicleState {
        let mut s = VehicleState::new(&SimSection::default());
        s.apply(Command::Arm);
        s.apply(Command::Takeoff { altitude_m: 30.0 });
        s
    }

    #[test]
    fn takeoff_requires_arming() {
        let mut s = VehicleState::new(&SimSection::default());
        s.apply(Command::Takeoff { altitude_m: 30.0 });
        assert!(s.on_ground);

        let s = airborne();
        assert!(!s.on_ground);
        assert_eq!(s.mode, FlightMode::Climb);
    }

    #[test]
    fn climbs_at_bounded_rate() {
        let mut s = airborne();
        s.on_tick(1);
        assert_eq!(s.altitude_m, 10.0);
        s.on_tick(2);
        s.on_tick(3);
        s.on_tick(4);
        assert!(s.at_altitude(30.0));
    }

    #[test]
    fn flies_legs_and_lands() {
        let scenario = SimSection {
            waypoints: 2,
            ticks_per_leg: 2,
            ..SimSection::default()
        };
        let mut s = VehicleState::new(&scenario);
        s.apply(Command::Arm);
        s.apply(Command::Takeoff { altitude_m: 10.0 });
        s.apply(Command::GotoWaypoint { index: 0 });
        for t in 1..=4 {
            s.on_tick(t);
        }
        assert!(s.plan_finished());

        s.apply(Command::Land);
        s.on_tick(5);
        assert!(s.on_ground);
        assert!(!s.armed);
        assert_eq!(s.mode, FlightMode::Ground);
    }

    #[test]
    fn scheduled_conflict_raises_and_clears() {
        let scenario = SimSection {
            conflict_start_tick: Some(2),
            conflict_duration_ticks: 2,
            ..SimSection::default()
        };
        let mut s = VehicleState::new(&scenario);
        let seen: Vec<bool> = (1..=4)
            .map(|t| {
                s.on_tick(t);
                s.traffic_conflict
            })
            .collect();
        assert_eq!(seen, vec![false, true, true, false]);
    }

    #[test]
    fn intercept_pulls_back_onto_plan() {
        let mut s = airborne();
        s.xtrack_m = 40.0;
        assert!(s.off_track());
        s.apply(Command::Intercept { index: 0 });
        for t in 1..=4 {
            s.on_tick(t);
        }
        assert!(!s.off_track());
    }

    #[test]
    fn commands_drain_from_outbox() {
        let mut s = VehicleState::new(&SimSection::default());
        s.issue(Command::Arm);
        s.issue(Command::Land);
        assert_eq!(s.take_commands(), vec![Command::Arm, Command::Land]);
        assert!(s.take_commands().is_empty());
    }
}
