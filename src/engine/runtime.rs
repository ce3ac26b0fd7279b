// src/engine/runtime.rs

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::CommandSink;

use super::core::CoreLoop;
use super::{CoreCommand, LoopEvent, LoopState};

/// Drives the event manager in response to `LoopEvent`s, and delegates
/// delivery of handler-issued commands to a `CommandSink`.
///
/// This is a pure IO shell around `CoreLoop`, which contains all the loop
/// semantics. This struct handles async IO: reading events from channels and
/// handing commands to the sink.
pub struct ControlLoop<S: LoopState, K: CommandSink<S::Command>> {
    core: CoreLoop<S>,
    event_rx: mpsc::Receiver<LoopEvent<S>>,
    sink: K,
}

impl<S: LoopState, K: CommandSink<S::Command>> fmt::Debug for ControlLoop<S, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlLoop")
            .field("ticks", &self.core.ticks())
            .finish_non_exhaustive()
    }
}

impl<S: LoopState, K: CommandSink<S::Command>> ControlLoop<S, K> {
    pub fn new(core: CoreLoop<S>, event_rx: mpsc::Receiver<LoopEvent<S>>, sink: K) -> Self {
        Self {
            core,
            event_rx,
            sink,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `LoopEvent`s from `event_rx`.
    /// - Feeds them into the core loop.
    /// - Executes commands returned by the core (dispatch, exit).
    ///
    /// Returns the core once the loop stops, so callers can inspect the final
    /// state.
    pub async fn run(mut self) -> Result<CoreLoop<S>> {
        info!("control loop started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("loop event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "control loop received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping control loop");
                break;
            }
        }

        info!(ticks = self.core.ticks(), "control loop exiting");
        Ok(self.core)
    }

    async fn execute_command(&mut self, command: CoreCommand<S::Command>) -> Result<()> {
        match command {
            CoreCommand::Dispatch(commands) => {
                debug!(count = commands.len(), "dispatching commands");
                self.sink.dispatch(commands).await?;
            }
            CoreCommand::RequestExit => {
                // keep_running is already false in this case; just note it.
                info!("core issued RequestExit command");
            }
        }
        Ok(())
    }
}

/// Spawn a task that sends `LoopEvent::Tick` every `period`.
///
/// The task ends once the receiving side of `tx` is gone. Missed ticks are
/// skipped rather than bunched up.
pub fn spawn_ticker<S>(tx: mpsc::Sender<LoopEvent<S>>, period: Duration) -> JoinHandle<()>
where
    S: Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if tx.send(LoopEvent::Tick).await.is_err() {
                debug!("ticker: loop event channel closed");
                break;
            }
        }
    })
}
