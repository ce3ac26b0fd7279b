// tests/scheduler_properties.rs

mod common;
use crate::common::{ScriptedHandler, SignalBoard, bind_scripted, manager};

use std::collections::{HashMap, HashSet};

use eventmgr::manager::{EventManager, ExecState, HandlerStep, SENTINEL_PRIORITY};
use eventmgr::types::{ManagerPolicy, StaleTriggerPolicy};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct EventSpec {
    priority: i32,
    steps: u32,
    /// (steps, priority) of children spawned on the first step.
    children: Vec<(u32, i32)>,
}

fn event_strategy() -> impl Strategy<Value = EventSpec> {
    (
        -5..20i32,
        1..4u32,
        proptest::collection::vec((1..3u32, -5..20i32), 0..3),
    )
        .prop_map(|(priority, steps, children)| EventSpec {
            priority,
            steps,
            children,
        })
}

fn event_name(i: usize) -> String {
    format!("e{i}")
}

fn build(events: &[EventSpec], stale: StaleTriggerPolicy) -> EventManager<SignalBoard> {
    let mut mgr = manager(ManagerPolicy {
        stale_trigger: stale,
        ..ManagerPolicy::default()
    });
    for (i, spec) in events.iter().enumerate() {
        let name = event_name(i);
        let mut handler = ScriptedHandler::new(&name, spec.steps);
        for (j, (steps, priority)) in spec.children.iter().enumerate() {
            let child = ScriptedHandler::new(&format!("{name}.c{j}"), *steps);
            handler = handler.spawning(1, child, *priority);
        }
        bind_scripted(&mut mgr, &name, spec.priority, handler);
    }
    mgr
}

fn apply_signals(board: &mut SignalBoard, events: usize, mask: u8) {
    for i in 0..events {
        let name = event_name(i);
        if mask & (1 << i) != 0 {
            board.raise(&name);
        } else {
            board.clear(&name);
        }
    }
}

proptest! {
    #[test]
    fn scheduler_invariants_hold_for_random_schedules(
        events in proptest::collection::vec(event_strategy(), 1..6),
        schedule in proptest::collection::vec(any::<u8>(), 1..40),
        drop_stale in any::<bool>(),
    ) {
        let stale = if drop_stale { StaleTriggerPolicy::Drop } else { StaleTriggerPolicy::Hold };
        let mut mgr = build(&events, stale);
        let mut board = SignalBoard::new();

        for mask in schedule {
            apply_signals(&mut board, events.len(), mask);

            mgr.run_monitors(&board);
            let active = mgr.active_handlers();

            // P2: no handler is queued twice.
            let unique: HashSet<_> = active.iter().copied().collect();
            prop_assert_eq!(unique.len(), active.len());

            let before: HashMap<_, _> = active
                .iter()
                .map(|id| (*id, mgr.current_priority(*id).unwrap()))
                .collect();
            let journal_before = board.journal.len();

            let step = mgr.run_handlers(&mut board);

            // P1: at most one step per tick.
            prop_assert!(board.journal.len() - journal_before <= 1);
            if step.stepped().is_none() {
                prop_assert_eq!(board.journal.len(), journal_before);
            }

            // P3: the stepped handler had the highest current priority.
            if let Some(id) = step.stepped() {
                let max = before.values().copied().max().unwrap();
                prop_assert_eq!(before[&id], max);
            }

            // P4: armed handlers sit at the sentinel; completed ones are back
            // at their base priority.
            for id in mgr.active_handlers() {
                if mgr.exec_state(id) != Some(ExecState::Idle) {
                    prop_assert_eq!(mgr.current_priority(id), Some(SENTINEL_PRIORITY));
                }
            }
            if let Some(id) = step.completed() {
                if mgr.contains_handler(id) {
                    prop_assert_eq!(mgr.current_priority(id), mgr.base_priority(id));
                }
            }

            // P5: children occupy the front, last enqueued first.
            if let HandlerStep::Stepped { children, .. } = &step {
                let now = mgr.active_handlers();
                let expected: Vec<_> = children.iter().rev().copied().collect();
                prop_assert_eq!(&now[..expected.len()], &expected[..]);
            }
        }
    }

    #[test]
    fn every_triggered_handler_eventually_completes(
        events in proptest::collection::vec(event_strategy(), 1..6),
        mask in any::<u8>(),
    ) {
        let mut mgr = build(&events, StaleTriggerPolicy::Hold);
        let mut board = SignalBoard::new();
        apply_signals(&mut board, events.len(), mask);

        // One activation round, then drain the queue without running the
        // monitors again.
        mgr.tick(&mut board);
        let mut guard = 0;
        while !mgr.is_idle() {
            mgr.run_handlers(&mut board);
            guard += 1;
            prop_assert!(guard < 200, "queue did not drain");
        }

        // Only registered handlers remain; transient children were freed.
        prop_assert_eq!(mgr.handler_count(), events.len());
    }
}
