// src/manager/registry.rs

//! Event registry: event name -> monitor, plus the optional bound handler.

use std::collections::HashMap;

use crate::manager::arena::HandlerId;

/// Canonical event name type used throughout the manager.
pub type EventName = String;

/// Side-effect-free trigger predicate over the shared state.
pub type Monitor<S> = Box<dyn Fn(&S) -> bool + Send>;

pub(crate) struct EventEntry<S> {
    pub(crate) name: EventName,
    pub(crate) monitor: Monitor<S>,
    pub(crate) handler: Option<HandlerId>,
}

/// Registered events, kept in first-registration order so that monitor
/// evaluation order is reproducible.
pub struct EventRegistry<S> {
    entries: Vec<EventEntry<S>>,
    index: HashMap<EventName, usize>,
}

impl<S> Default for EventRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> std::fmt::Debug for EventRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|e| (&e.name, e.handler)))
            .finish()
    }
}

impl<S> EventRegistry<S> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, event: &str) -> bool {
        self.index.contains_key(event)
    }

    /// Event names in evaluation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn handler_for(&self, event: &str) -> Option<HandlerId> {
        let idx = *self.index.get(event)?;
        self.entries[idx].handler
    }

    /// Insert or overwrite the monitor for `event`. An existing event keeps
    /// its position and its handler binding.
    pub(crate) fn upsert(&mut self, event: EventName, monitor: Monitor<S>) -> &mut EventEntry<S> {
        match self.index.get(&event) {
            Some(&idx) => {
                let entry = &mut self.entries[idx];
                entry.monitor = monitor;
                entry
            }
            None => {
                let idx = self.entries.len();
                self.index.insert(event.clone(), idx);
                self.entries.push(EventEntry {
                    name: event,
                    monitor,
                    handler: None,
                });
                &mut self.entries[idx]
            }
        }
    }

    /// Evaluate one event's monitor. `None` if the event is unknown.
    pub fn evaluate(&self, event: &str, state: &S) -> Option<bool> {
        let idx = *self.index.get(event)?;
        Some((self.entries[idx].monitor)(state))
    }

    /// Evaluate every monitor in registration order and return the events that
    /// hold, paired with their bound handler (if any).
    pub fn triggered(&self, state: &S) -> Vec<(&str, Option<HandlerId>)> {
        self.entries
            .iter()
            .filter(|entry| (entry.monitor)(state))
            .map(|entry| (entry.name.as_str(), entry.handler))
            .collect()
    }
}
