// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod manager;
pub mod sim;
pub mod types;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_or_default};
use crate::engine::{ControlLoop, CoreLoop, LoopEvent, LoopOptions, spawn_ticker};
use crate::exec::ChannelSink;
use crate::sim::{Command, VehicleState};

/// Capacity of the loop event and command channels.
const CHANNEL_CAPACITY: usize = 64;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - event manager + vehicle state (`sim::build`)
/// - control loop, ticker and plant
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref().map(Path::new))?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let (manager, state) = sim::build(&cfg)?;

    let options = LoopOptions {
        max_ticks: args.ticks.or(cfg.control_loop.max_ticks),
    };

    // Loop event channel: ticks, plant updates, shutdown.
    let (loop_tx, loop_rx) = mpsc::channel::<LoopEvent<VehicleState>>(CHANNEL_CAPACITY);

    // Command channel: the bus towards the vehicle. Unbounded, since the plant
    // answers on the bounded loop channel.
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<Command>();

    let _plant = sim::spawn_plant(cmd_rx, loop_tx.clone());
    let _ticker = spawn_ticker(
        loop_tx.clone(),
        Duration::from_millis(cfg.control_loop.tick_period_ms),
    );

    // Ctrl-C → graceful shutdown.
    {
        let tx = loop_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(LoopEvent::ShutdownRequested).await;
        });
    }
    drop(loop_tx);

    info!(
        period_ms = cfg.control_loop.tick_period_ms,
        max_ticks = ?options.max_ticks,
        events = sim::EVENT_NAMES.len(),
        "starting control loop"
    );

    // Construct the pure core loop (single source of truth for semantics).
    let core = CoreLoop::new(manager, state, options);

    // Construct the async IO shell around the core.
    let control = ControlLoop::new(core, loop_rx, ChannelSink::new(cmd_tx));
    let core = control.run().await?;

    let state = core.state();
    info!(
        ticks = core.ticks(),
        mission = ?state.mission,
        altitude_m = state.altitude_m,
        waypoint = state.next_waypoint,
        "run finished"
    );
    Ok(())
}

/// Simple dry-run output: print policies, loop timing and the event table.
fn print_dry_run(cfg: &ConfigFile) {
    println!("eventmgr dry-run");
    println!("  manager.stale_trigger = {:?}", cfg.manager.stale_trigger);
    println!("  manager.rebind = {:?}", cfg.manager.rebind);
    println!("  loop.tick_period_ms = {}", cfg.control_loop.tick_period_ms);
    match cfg.control_loop.max_ticks {
        Some(n) => println!("  loop.max_ticks = {n}"),
        None => println!("  loop.max_ticks = (until Ctrl-C or mission end)"),
    }
    println!();

    println!("events ({}):", sim::EVENT_NAMES.len());
    for event in sim::EVENT_NAMES {
        let priority = cfg
            .priority_override(event)
            .or_else(|| sim::default_priority(event));
        let enabled = cfg.is_enabled(event);
        match (enabled, priority) {
            (true, Some(p)) => println!("  - {event} (priority {p})"),
            (true, None) => println!("  - {event}"),
            (false, _) => println!("  - {event} (disabled)"),
        }
    }

    println!();
    println!("sim:");
    println!("  waypoints = {}", cfg.sim.waypoints);
    println!("  takeoff_altitude_m = {}", cfg.sim.takeoff_altitude_m);
    println!("  ticks_per_leg = {}", cfg.sim.ticks_per_leg);
    if let Some(t) = cfg.sim.conflict_start_tick {
        println!(
            "  traffic conflict at tick {t} for {} ticks",
            cfg.sim.conflict_duration_ticks
        );
    }
    if let Some(t) = cfg.sim.deviation_start_tick {
        println!("  gust at tick {t}");
    }

    debug!("dry-run complete (no loop started)");
}
