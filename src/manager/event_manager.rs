// src/manager/event_manager.rs

use tracing::{debug, info, trace, warn};

use crate::errors::{EventMgrError, Result};
use crate::manager::arena::{HandlerArena, HandlerId, Lifetime};
use crate::manager::handler::{
    ExecState, Handler, Priority, SENTINEL_PRIORITY, StepContext, StepOutcome,
};
use crate::manager::queue::ActiveQueue;
use crate::manager::registry::{EventName, EventRegistry};
use crate::manager::tick_report::{HandlerStep, TickReport};
use crate::types::{ManagerPolicy, RebindPolicy, StaleTriggerPolicy};

/// Priority-ordered, hierarchical event/handler scheduler over a state `S`.
///
/// Each [`tick`](EventManager::tick):
/// - evaluates every monitor and activates the bound handler of each event
///   that holds, unless that handler is already active
/// - steps exactly one handler: the front of the active queue
/// - splices any children produced by that step to the front of the queue
///
/// The manager performs no IO and never blocks; monitors and steps are plain
/// callbacks over the state.
#[derive(Debug)]
pub struct EventManager<S> {
    registry: EventRegistry<S>,
    arena: HandlerArena<S>,
    queue: ActiveQueue,
    policy: ManagerPolicy,
    ticks: u64,
}

impl<S> Default for EventManager<S> {
    fn default() -> Self {
        Self::new(ManagerPolicy::default())
    }
}

impl<S> EventManager<S> {
    pub fn new(policy: ManagerPolicy) -> Self {
        Self {
            registry: EventRegistry::new(),
            arena: HandlerArena::new(),
            queue: ActiveQueue::new(),
            policy,
            ticks: 0,
        }
    }

    pub fn policy(&self) -> ManagerPolicy {
        self.policy
    }

    /// Hand a handler to the manager. The returned id is what `bind` takes.
    ///
    /// There is no way to remove a handler added this way.
    pub fn add_handler<H>(&mut self, handler: H) -> HandlerId
    where
        H: Handler<S> + 'static,
    {
        let id = self
            .arena
            .insert(Box::new(handler), 0, Lifetime::Registered);
        debug!(handler = %id, name = self.handler_name(id), "handler added");
        id
    }

    /// Register (or overwrite) `event` with its monitor, optionally binding a
    /// handler that is activated whenever the monitor holds.
    ///
    /// - Binding a handler sets both its base and current priority to
    ///   `priority`. A handler that is already armed keeps the sentinel until
    ///   it completes.
    /// - Passing `None` leaves any earlier handler binding of `event` in place.
    /// - If the event's handler is currently active, [`RebindPolicy`] decides:
    ///   `Allow` overwrites and leaves the queued entry alone, `Reject` errors.
    pub fn bind<M>(
        &mut self,
        event: impl Into<EventName>,
        priority: Priority,
        monitor: M,
        handler: Option<HandlerId>,
    ) -> Result<()>
    where
        M: Fn(&S) -> bool + Send + 'static,
    {
        let event = event.into();

        if priority == SENTINEL_PRIORITY {
            return Err(EventMgrError::ReservedPriority(priority));
        }
        if let Some(id) = handler {
            if !self.arena.contains(id) {
                return Err(EventMgrError::StaleHandle(id));
            }
        }

        if let Some(previous) = self.registry.handler_for(&event) {
            if self.queue.contains(previous) {
                match self.policy.rebind {
                    RebindPolicy::Reject => {
                        return Err(EventMgrError::RebindWhileActive(event));
                    }
                    RebindPolicy::Allow => {
                        warn!(
                            event = %event,
                            handler = %previous,
                            "re-binding event while its handler is active; queued entry is kept"
                        );
                    }
                }
            }
        }

        let entry = self.registry.upsert(event.clone(), Box::new(monitor));

        let Some(id) = handler else {
            debug!(event = %event, "event registered (monitor only)");
            return Ok(());
        };
        entry.handler = Some(id);

        let mut needs_reorder = false;
        if let Some(record) = self.arena.get_mut(id) {
            record.base_priority = priority;
            if record.exec_state == ExecState::Idle {
                record.current_priority = priority;
                needs_reorder = true;
            }
        }
        if needs_reorder && self.queue.contains(id) {
            let arena = &self.arena;
            self.queue
                .reorder(|h| arena.current_priority(h).unwrap_or(Priority::MIN));
        }

        debug!(event = %event, handler = %id, priority, "event bound to handler");
        Ok(())
    }

    /// Evaluate every monitor (in registration order) and activate the bound
    /// handlers of events that hold. Returns the newly activated handlers.
    pub fn run_monitors(&mut self, state: &S) -> Vec<HandlerId> {
        let mut activated = Vec::new();

        for (event, handler) in self.registry.triggered(state) {
            let Some(id) = handler else {
                trace!(event = %event, "event holds; no handler bound");
                continue;
            };

            if self.queue.contains(id) {
                continue;
            }

            let Some(record) = self.arena.get_mut(id) else {
                warn!(event = %event, handler = %id, "bound handler missing from arena; skipping");
                continue;
            };
            record.exec_state = ExecState::Idle;
            record.bound_event = Some(event.to_string());
            let priority = record.current_priority;

            let arena = &self.arena;
            self.queue
                .push_back_sorted(id, |h| arena.current_priority(h).unwrap_or(Priority::MIN));

            info!(
                event = %event,
                handler = %id,
                priority,
                queued = self.queue.len(),
                "event triggered; handler activated"
            );
            activated.push(id);
        }

        activated
    }

    /// Advance the front handler of the active queue by one step.
    ///
    /// No other queued handler is looked at.
    pub fn run_handlers(&mut self, state: &mut S) -> HandlerStep {
        let Some(id) = self.queue.front() else {
            return HandlerStep::QueueEmpty;
        };

        let Some(record) = self.arena.get(id) else {
            warn!(handler = %id, "front handler missing from arena; discarding entry");
            self.queue.pop_front();
            return HandlerStep::Dropped(id);
        };

        if record.exec_state == ExecState::Idle {
            let trigger_holds = match record.bound_event.as_deref() {
                Some(event) => self.registry.evaluate(event, state).unwrap_or(false),
                // Not reached: children are armed on splice and activation
                // always records the event.
                None => true,
            };
            if !trigger_holds {
                return self.stale_front(id);
            }
            self.arm(id);
        }

        let Some(outcome) = self.step_once(id, state) else {
            warn!(handler = %id, "front handler has no body (re-entrant step?); discarding entry");
            self.queue.pop_front();
            return HandlerStep::Dropped(id);
        };

        let mut free_after = false;
        if let Some(record) = self.arena.get_mut(id) {
            match outcome {
                StepOutcome::Completed => {
                    record.current_priority = record.base_priority;
                    record.exec_state = ExecState::Idle;
                    free_after = record.lifetime == Lifetime::Transient;
                    debug!(
                        handler = %id,
                        name = %record.name,
                        priority = record.base_priority,
                        "handler completed; priority restored"
                    );
                }
                StepOutcome::Continuing => {
                    if record.exec_state == ExecState::Initializing {
                        record.exec_state = ExecState::Running;
                    }
                }
            }
        }
        if outcome == StepOutcome::Completed {
            self.queue.remove(id);
        }

        let children = self.splice_children(id);

        if free_after {
            self.arena.remove(id);
            trace!(handler = %id, "transient handler freed");
        }

        HandlerStep::Stepped {
            handler: id,
            outcome,
            children,
        }
    }

    /// One scheduler tick: `run_monitors` then `run_handlers`.
    pub fn tick(&mut self, state: &mut S) -> TickReport {
        self.ticks += 1;
        let activated = self.run_monitors(state);
        let step = self.run_handlers(state);
        trace!(tick = self.ticks, ?step, "tick finished");

        TickReport {
            tick: self.ticks,
            activated,
            step,
        }
    }

    /// Number of ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Active handlers in execution order (front first).
    pub fn active_handlers(&self) -> Vec<HandlerId> {
        self.queue.ids()
    }

    pub fn is_active(&self, id: HandlerId) -> bool {
        self.queue.contains(id)
    }

    /// Returns `true` if no handler is active.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn contains_handler(&self, id: HandlerId) -> bool {
        self.arena.contains(id)
    }

    pub fn exec_state(&self, id: HandlerId) -> Option<ExecState> {
        self.arena.get(id).map(|r| r.exec_state)
    }

    pub fn current_priority(&self, id: HandlerId) -> Option<Priority> {
        self.arena.get(id).map(|r| r.current_priority)
    }

    pub fn base_priority(&self, id: HandlerId) -> Option<Priority> {
        self.arena.get(id).map(|r| r.base_priority)
    }

    pub fn bound_event(&self, id: HandlerId) -> Option<&str> {
        self.arena.get(id).and_then(|r| r.bound_event())
    }

    pub fn handler_name(&self, id: HandlerId) -> &str {
        self.arena.get(id).map(|r| r.name()).unwrap_or("<stale>")
    }

    /// Handler bound to `event`, if any.
    pub fn handler_for(&self, event: &str) -> Option<HandlerId> {
        self.registry.handler_for(event)
    }

    /// Registered event names in evaluation order.
    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.registry.names()
    }

    /// Number of live handler records (registered plus unfinished children).
    pub fn handler_count(&self) -> usize {
        self.arena.len()
    }

    fn arm(&mut self, id: HandlerId) {
        if let Some(record) = self.arena.get_mut(id) {
            record.exec_state = ExecState::Initializing;
            record.current_priority = SENTINEL_PRIORITY;
            debug!(
                handler = %id,
                name = %record.name,
                event = record.bound_event.as_deref().unwrap_or("-"),
                "handler armed"
            );
        }
    }

    fn step_once(&mut self, id: HandlerId, state: &mut S) -> Option<StepOutcome> {
        let mut body = self.arena.take_body(id)?;
        let outcome = {
            let mut ctx = StepContext::new(state, &mut self.arena, id);
            body.step(&mut ctx)
        };
        self.arena.restore_body(id, body);
        trace!(handler = %id, ?outcome, "handler stepped");
        Some(outcome)
    }

    /// Front handler is still idle and its trigger is gone.
    fn stale_front(&mut self, id: HandlerId) -> HandlerStep {
        match self.policy.stale_trigger {
            StaleTriggerPolicy::Hold => {
                warn!(
                    handler = %id,
                    event = self.bound_event(id).unwrap_or("-"),
                    "trigger no longer holds before first step; holding handler at front"
                );
                HandlerStep::Held(id)
            }
            StaleTriggerPolicy::Drop => {
                self.queue.pop_front();
                if let Some(record) = self.arena.get_mut(id) {
                    record.exec_state = ExecState::Idle;
                    record.current_priority = record.base_priority;
                }
                info!(
                    handler = %id,
                    event = self.bound_event(id).unwrap_or("-"),
                    "trigger no longer holds before first step; handler dropped"
                );
                HandlerStep::Dropped(id)
            }
        }
    }

    /// Move the children produced by `parent`'s last step to the front of the
    /// queue, arming them. Returns them in enqueue order.
    fn splice_children(&mut self, parent: HandlerId) -> Vec<HandlerId> {
        let children = match self.arena.get_mut(parent) {
            Some(record) => std::mem::take(&mut record.children),
            None => return Vec::new(),
        };

        let mut spliced = Vec::with_capacity(children.len());
        for child in children {
            let Some(record) = self.arena.get_mut(child) else {
                warn!(parent = %parent, child = %child, "child missing from arena; skipping");
                continue;
            };
            if record.exec_state == ExecState::Idle {
                record.exec_state = ExecState::Initializing;
                record.current_priority = SENTINEL_PRIORITY;
                record.bound_event = None;
            }
            self.queue.splice_front(child);
            spliced.push(child);
        }

        if !spliced.is_empty() {
            debug!(parent = %parent, children = ?spliced, "children spliced to front of active queue");
        }
        spliced
    }
}
