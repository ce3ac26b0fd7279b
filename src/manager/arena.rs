// src/manager/arena.rs

//! Slot arena holding every handler the manager knows about.
//!
//! The registry and the active queue only ever store [`HandlerId`]s. A slot
//! that is freed (transient children, once they complete) gets its generation
//! bumped, so an old id can never resolve to whatever is stored there next.

use std::fmt;

use crate::manager::handler::{ExecState, Handler, Priority};

/// Stable handle to a handler record: slot index plus generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId {
    slot: u32,
    generation: u32,
}

impl HandlerId {
    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.slot, self.generation)
    }
}

/// How long a record lives in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Added through `EventManager::add_handler`; never freed.
    Registered,
    /// Spawned as a child during a step; freed once it completes.
    Transient,
}

/// Scheduler-managed fields of a handler, plus the handler body itself.
pub struct HandlerRecord<S> {
    pub(crate) name: String,
    pub(crate) base_priority: Priority,
    pub(crate) current_priority: Priority,
    pub(crate) exec_state: ExecState,
    pub(crate) bound_event: Option<String>,
    /// Children produced by the last step, in enqueue order.
    pub(crate) children: Vec<HandlerId>,
    pub(crate) lifetime: Lifetime,
    /// `None` only while the body is being stepped.
    body: Option<Box<dyn Handler<S>>>,
}

impl<S> HandlerRecord<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_priority(&self) -> Priority {
        self.base_priority
    }

    pub fn current_priority(&self) -> Priority {
        self.current_priority
    }

    pub fn exec_state(&self) -> ExecState {
        self.exec_state
    }

    pub fn bound_event(&self) -> Option<&str> {
        self.bound_event.as_deref()
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }
}

impl<S> fmt::Debug for HandlerRecord<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRecord")
            .field("name", &self.name)
            .field("base_priority", &self.base_priority)
            .field("current_priority", &self.current_priority)
            .field("exec_state", &self.exec_state)
            .field("bound_event", &self.bound_event)
            .field("children", &self.children)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

struct Slot<S> {
    generation: u32,
    record: Option<HandlerRecord<S>>,
}

pub struct HandlerArena<S> {
    slots: Vec<Slot<S>>,
    free: Vec<u32>,
    live: usize,
}

impl<S> Default for HandlerArena<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for HandlerArena<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerArena")
            .field("slots", &self.slots.len())
            .field("live", &self.live)
            .field("free", &self.free.len())
            .finish()
    }
}

impl<S> HandlerArena<S> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Store a handler body; both priorities start at `priority`.
    pub fn insert(
        &mut self,
        body: Box<dyn Handler<S>>,
        priority: Priority,
        lifetime: Lifetime,
    ) -> HandlerId {
        let record = HandlerRecord {
            name: body.name().to_string(),
            base_priority: priority,
            current_priority: priority,
            exec_state: ExecState::Idle,
            bound_event: None,
            children: Vec::new(),
            lifetime,
            body: Some(body),
        };

        self.live += 1;

        if let Some(slot) = self.free.pop() {
            let entry = &mut self.slots[slot as usize];
            entry.record = Some(record);
            return HandlerId {
                slot,
                generation: entry.generation,
            };
        }

        let slot = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            record: Some(record),
        });
        HandlerId {
            slot,
            generation: 0,
        }
    }

    pub fn contains(&self, id: HandlerId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: HandlerId) -> Option<&HandlerRecord<S>> {
        let slot = self.slots.get(id.slot as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.record.as_ref()
    }

    pub fn get_mut(&mut self, id: HandlerId) -> Option<&mut HandlerRecord<S>> {
        let slot = self.slots.get_mut(id.slot as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.record.as_mut()
    }

    pub fn current_priority(&self, id: HandlerId) -> Option<Priority> {
        self.get(id).map(|r| r.current_priority)
    }

    /// Free a record. The slot's generation is bumped so `id` goes stale.
    pub fn remove(&mut self, id: HandlerId) -> Option<HandlerRecord<S>> {
        let slot = self.slots.get_mut(id.slot as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let record = slot.record.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.slot);
        self.live -= 1;
        Some(record)
    }

    /// Borrow the handler body out of its record for the duration of a step.
    pub(crate) fn take_body(&mut self, id: HandlerId) -> Option<Box<dyn Handler<S>>> {
        self.get_mut(id)?.body.take()
    }

    pub(crate) fn restore_body(&mut self, id: HandlerId, body: Box<dyn Handler<S>>) {
        if let Some(record) = self.get_mut(id) {
            record.body = Some(body);
        }
    }
}
