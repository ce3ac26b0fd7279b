// src/manager/phased.rs

//! Handlers written as initialize / execute / terminate phases.
//!
//! [`PhasedHandler`] runs exactly one phase call per step, so a handler built
//! this way still takes one scheduler step at a time.

use crate::manager::handler::{ExecState, Handler, StepContext, StepOutcome};

/// Status a phase reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    /// Phase finished; move to the next one on the following step.
    Success,
    /// Phase needs more steps.
    InProgress,
    /// Start over from `initialize` on the following step.
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initialize,
    Execute,
    Terminate,
}

pub trait Phased<S>: Send {
    fn initialize(&mut self, ctx: &mut StepContext<'_, S>) -> PhaseStatus;

    fn execute(&mut self, ctx: &mut StepContext<'_, S>) -> PhaseStatus;

    fn terminate(&mut self, _ctx: &mut StepContext<'_, S>) -> PhaseStatus {
        PhaseStatus::Success
    }

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Adapter from [`Phased`] to [`Handler`].
#[derive(Debug)]
pub struct PhasedHandler<P> {
    inner: P,
    phase: Phase,
}

impl<P> PhasedHandler<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            phase: Phase::Initialize,
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

impl<S, P> Handler<S> for PhasedHandler<P>
where
    P: Phased<S>,
{
    fn step(&mut self, ctx: &mut StepContext<'_, S>) -> StepOutcome {
        // A freshly armed handler always starts from the top.
        if ctx.exec_state() == ExecState::Initializing {
            self.phase = Phase::Initialize;
        }

        let status = match self.phase {
            Phase::Initialize => self.inner.initialize(ctx),
            Phase::Execute => self.inner.execute(ctx),
            Phase::Terminate => self.inner.terminate(ctx),
        };

        match (self.phase, status) {
            (_, PhaseStatus::InProgress) => StepOutcome::Continuing,
            (_, PhaseStatus::Reset) => {
                self.phase = Phase::Initialize;
                StepOutcome::Continuing
            }
            (Phase::Initialize, PhaseStatus::Success) => {
                self.phase = Phase::Execute;
                StepOutcome::Continuing
            }
            (Phase::Execute, PhaseStatus::Success) => {
                self.phase = Phase::Terminate;
                StepOutcome::Continuing
            }
            (Phase::Terminate, PhaseStatus::Success) => {
                self.phase = Phase::Initialize;
                StepOutcome::Completed
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::EventManager;

    /// Records each phase call into the state. The first execute resets;
    /// after that execute needs two calls.
    struct Recorder {
        execute_calls: u32,
        reset_once: bool,
    }

    impl Phased<Vec<&'static str>> for Recorder {
        fn initialize(&mut self, ctx: &mut StepContext<'_, Vec<&'static str>>) -> PhaseStatus {
            ctx.state_mut().push("init");
            PhaseStatus::Success
        }

        fn execute(&mut self, ctx: &mut StepContext<'_, Vec<&'static str>>) -> PhaseStatus {
            ctx.state_mut().push("exec");
            if self.reset_once {
                self.reset_once = false;
                return PhaseStatus::Reset;
            }
            self.execute_calls += 1;
            if self.execute_calls >= 2 {
                PhaseStatus::Success
            } else {
                PhaseStatus::InProgress
            }
        }

        fn terminate(&mut self, ctx: &mut StepContext<'_, Vec<&'static str>>) -> PhaseStatus {
            ctx.state_mut().push("term");
            PhaseStatus::Success
        }

        fn name(&self) -> &str {
            "recorder"
        }
    }

    #[test]
    fn one_phase_call_per_step_with_reset() {
        let mut manager: EventManager<Vec<&'static str>> = EventManager::default();
        let id = manager.add_handler(PhasedHandler::new(Recorder {
            execute_calls: 0,
            reset_once: true,
        }));
        manager.bind("go", 1, |_| true, Some(id)).unwrap();
        assert_eq!(manager.handler_name(id), "recorder");

        let mut log = Vec::new();
        let mut completed_at = None;
        for tick in 1..=10 {
            let report = manager.tick(&mut log);
            if report.step.completed() == Some(id) {
                completed_at = Some(tick);
                break;
            }
        }

        // init, exec(reset), init, exec(1: in progress), exec(2: success), term
        assert_eq!(log, vec!["init", "exec", "init", "exec", "exec", "term"]);
        assert_eq!(completed_at, Some(6));
    }
}
