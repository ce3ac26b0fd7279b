use std::collections::BTreeSet;

use eventmgr::engine::LoopState;

/// Minimal state for scheduler tests: a set of named signals that monitors
/// read, a journal handlers write their steps into, and an outbox of
/// commands for the control loop.
#[derive(Debug, Default, Clone)]
pub struct SignalBoard {
    raised: BTreeSet<String>,
    /// One entry per handler step, in the order the steps ran.
    pub journal: Vec<String>,
    pub outbox: Vec<String>,
}

impl SignalBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Board with the given signals already raised.
    pub fn with_raised(signals: &[&str]) -> Self {
        let mut board = Self::new();
        for s in signals {
            board.raise(s);
        }
        board
    }

    pub fn raise(&mut self, signal: &str) {
        self.raised.insert(signal.to_string());
    }

    pub fn clear(&mut self, signal: &str) {
        self.raised.remove(signal);
    }

    pub fn is_raised(&self, signal: &str) -> bool {
        self.raised.contains(signal)
    }

    /// Monitor that holds while `signal` is raised.
    pub fn monitor(signal: &str) -> impl Fn(&SignalBoard) -> bool + Send + 'static {
        let signal = signal.to_string();
        move |board: &SignalBoard| board.is_raised(&signal)
    }

    /// Journal entries, as `&str` for easy comparison.
    pub fn steps(&self) -> Vec<&str> {
        self.journal.iter().map(String::as_str).collect()
    }
}

impl LoopState for SignalBoard {
    type Command = String;

    fn take_commands(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outbox)
    }
}
