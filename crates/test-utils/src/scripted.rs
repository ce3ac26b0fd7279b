use eventmgr::manager::{ExecState, Handler, HandlerId, Priority, StepContext, StepOutcome};

use crate::board::SignalBoard;

/// A handler driven by a fixed script:
/// - completes after `steps` steps (counted from its latest arming)
/// - writes its label into the board's journal on every step
/// - optionally spawns children / enqueues existing handlers at given steps
/// - optionally emits its label as a command on every step
#[derive(Debug, Clone)]
pub struct ScriptedHandler {
    label: String,
    steps: u32,
    taken: u32,
    spawns: Vec<(u32, ScriptedHandler, Priority)>,
    enqueues: Vec<(u32, HandlerId)>,
    emit: bool,
}

impl ScriptedHandler {
    pub fn new(label: &str, steps: u32) -> Self {
        Self {
            label: label.to_string(),
            steps: steps.max(1),
            taken: 0,
            spawns: Vec::new(),
            enqueues: Vec::new(),
            emit: false,
        }
    }

    /// Completes on its first step.
    pub fn once(label: &str) -> Self {
        Self::new(label, 1)
    }

    /// On step `at` (1-based), spawn `child` as a transient handler.
    pub fn spawning(mut self, at: u32, child: ScriptedHandler, priority: Priority) -> Self {
        self.spawns.push((at, child, priority));
        self
    }

    /// On step `at` (1-based), enqueue the already-added handler `id`.
    pub fn enqueuing(mut self, at: u32, id: HandlerId) -> Self {
        self.enqueues.push((at, id));
        self
    }

    /// Push the label into the board's outbox on every step.
    pub fn emitting(mut self) -> Self {
        self.emit = true;
        self
    }
}

impl Handler<SignalBoard> for ScriptedHandler {
    fn step(&mut self, ctx: &mut StepContext<'_, SignalBoard>) -> StepOutcome {
        if ctx.exec_state() == ExecState::Initializing {
            self.taken = 0;
        }
        self.taken += 1;

        let board = ctx.state_mut();
        board.journal.push(self.label.clone());
        if self.emit {
            board.outbox.push(self.label.clone());
        }

        for (at, child, priority) in &self.spawns {
            if *at == self.taken {
                ctx.spawn(child.clone(), *priority);
            }
        }
        for (at, id) in &self.enqueues {
            if *at == self.taken {
                if let Err(e) = ctx.enqueue(*id) {
                    let note = format!("{}: {e}", self.label);
                    ctx.state_mut().journal.push(note);
                }
            }
        }

        if self.taken >= self.steps {
            StepOutcome::Completed
        } else {
            StepOutcome::Continuing
        }
    }

    fn name(&self) -> &str {
        &self.label
    }
}
