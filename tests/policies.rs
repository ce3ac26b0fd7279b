// tests/policies.rs

mod common;
use crate::common::{ScriptedHandler, SignalBoard, bind_scripted, init_tracing, manager};

use eventmgr::errors::EventMgrError;
use eventmgr::manager::{ExecState, HandlerStep, SENTINEL_PRIORITY};
use eventmgr::types::{ManagerPolicy, RebindPolicy, StaleTriggerPolicy};

fn policy(stale_trigger: StaleTriggerPolicy, rebind: RebindPolicy) -> ManagerPolicy {
    ManagerPolicy {
        stale_trigger,
        rebind,
    }
}

#[test]
fn hold_keeps_a_stale_front_handler_and_blocks_the_queue() {
    init_tracing();
    let mut mgr = manager(policy(StaleTriggerPolicy::Hold, RebindPolicy::Allow));
    let h = bind_scripted(&mut mgr, "A", 2, ScriptedHandler::once("H"));
    let other = bind_scripted(&mut mgr, "B", 1, ScriptedHandler::once("other"));
    let mut board = SignalBoard::with_raised(&["A", "B"]);

    assert_eq!(mgr.run_monitors(&board), vec![h, other]);
    board.clear("A");

    for _ in 0..3 {
        assert_eq!(mgr.run_handlers(&mut board), HandlerStep::Held(h));
    }
    assert_eq!(mgr.active_handlers(), vec![h, other]);
    assert_eq!(mgr.exec_state(h), Some(ExecState::Idle));
    assert_eq!(mgr.current_priority(h), Some(2));
    assert_eq!(mgr.bound_event(h), Some("A"));
    assert!(board.journal.is_empty());

    // Once the trigger holds again the held handler finally runs.
    board.raise("A");
    assert_eq!(mgr.run_handlers(&mut board).completed(), Some(h));
    assert_eq!(mgr.run_handlers(&mut board).completed(), Some(other));
    assert_eq!(board.steps(), vec!["H", "other"]);
}

#[test]
fn drop_removes_a_stale_front_handler() {
    init_tracing();
    let mut mgr = manager(policy(StaleTriggerPolicy::Drop, RebindPolicy::Allow));
    let h = bind_scripted(&mut mgr, "A", 2, ScriptedHandler::once("H"));
    let other = bind_scripted(&mut mgr, "B", 1, ScriptedHandler::once("other"));
    let mut board = SignalBoard::with_raised(&["A", "B"]);

    mgr.run_monitors(&board);
    board.clear("A");

    assert_eq!(mgr.run_handlers(&mut board), HandlerStep::Dropped(h));
    assert!(!mgr.is_active(h));
    assert_eq!(mgr.exec_state(h), Some(ExecState::Idle));
    assert_eq!(mgr.current_priority(h), Some(2));

    assert_eq!(mgr.run_handlers(&mut board).completed(), Some(other));
    assert_eq!(board.steps(), vec!["other"]);

    // Dropped handlers come back through the normal activation path.
    board.raise("A");
    let report = mgr.tick(&mut board);
    assert!(report.activated.contains(&h));
}

#[test]
fn default_policy_drops_a_stale_front_handler() {
    init_tracing();
    let mut mgr = manager(ManagerPolicy::default());
    let a = bind_scripted(&mut mgr, "A", 2, ScriptedHandler::once("A"));
    let b = bind_scripted(&mut mgr, "B", 1, ScriptedHandler::once("B"));
    let mut board = SignalBoard::with_raised(&["A", "B"]);

    mgr.run_monitors(&board);
    assert_eq!(mgr.active_handlers(), vec![a, b]);
    board.clear("A");

    assert_eq!(mgr.run_handlers(&mut board), HandlerStep::Dropped(a));
    assert_eq!(mgr.active_handlers(), vec![b]);
    assert_eq!(mgr.current_priority(a), Some(2));
    assert!(board.journal.is_empty());
}

#[test]
fn stale_check_only_applies_before_the_first_step() {
    init_tracing();
    let mut mgr = manager(policy(StaleTriggerPolicy::Drop, RebindPolicy::Allow));
    let h = bind_scripted(&mut mgr, "A", 1, ScriptedHandler::new("H", 3));
    let mut board = SignalBoard::with_raised(&["A"]);

    mgr.tick(&mut board);
    board.clear("A");
    mgr.tick(&mut board);
    let last = mgr.tick(&mut board);

    assert_eq!(last.step.completed(), Some(h));
    assert_eq!(board.steps(), vec!["H", "H", "H"]);
}

#[test]
fn reject_refuses_rebinding_while_the_handler_is_active() {
    init_tracing();
    let mut mgr = manager(policy(StaleTriggerPolicy::Hold, RebindPolicy::Reject));
    let h = bind_scripted(&mut mgr, "A", 1, ScriptedHandler::new("H", 2));
    let replacement = mgr.add_handler(ScriptedHandler::once("R"));
    let mut board = SignalBoard::with_raised(&["A"]);

    mgr.tick(&mut board);
    let err = mgr
        .bind("A", 3, SignalBoard::monitor("A"), Some(replacement))
        .unwrap_err();
    assert!(matches!(err, EventMgrError::RebindWhileActive(ref e) if e == "A"));
    assert_eq!(mgr.handler_for("A"), Some(h));

    board.clear("A");
    mgr.tick(&mut board);
    assert!(mgr.is_idle());

    mgr.bind("A", 3, SignalBoard::monitor("A"), Some(replacement))
        .unwrap();
    assert_eq!(mgr.handler_for("A"), Some(replacement));
}

#[test]
fn allow_keeps_the_stale_entry_running_to_completion() {
    init_tracing();
    let mut mgr = manager(policy(StaleTriggerPolicy::Hold, RebindPolicy::Allow));
    let h = bind_scripted(&mut mgr, "A", 1, ScriptedHandler::new("H", 2));
    let replacement = mgr.add_handler(ScriptedHandler::once("R"));
    let mut board = SignalBoard::with_raised(&["A"]);

    mgr.tick(&mut board);
    mgr.bind("A", 3, SignalBoard::monitor("A"), Some(replacement))
        .unwrap();

    // The old handler stays armed and queued; the new one joins behind it.
    let report = mgr.tick(&mut board);
    assert_eq!(report.activated, vec![replacement]);
    assert_eq!(report.step.completed(), Some(h));

    mgr.tick(&mut board);
    assert_eq!(board.steps(), vec!["H", "H", "R"]);
}

#[test]
fn rebinding_an_armed_handler_keeps_its_boost() {
    init_tracing();
    let mut mgr = manager(ManagerPolicy::default());
    let h = bind_scripted(&mut mgr, "A", 1, ScriptedHandler::new("H", 2));
    let mut board = SignalBoard::with_raised(&["A"]);

    mgr.tick(&mut board);
    mgr.bind("A", 8, SignalBoard::monitor("A"), Some(h)).unwrap();
    assert_eq!(mgr.current_priority(h), Some(SENTINEL_PRIORITY));
    assert_eq!(mgr.base_priority(h), Some(8));

    mgr.tick(&mut board);
    assert_eq!(mgr.current_priority(h), Some(8));
}

#[test]
fn rebinding_an_idle_queued_handler_reorders_the_queue() {
    init_tracing();
    let mut mgr = manager(ManagerPolicy::default());
    let h = bind_scripted(&mut mgr, "A", 1, ScriptedHandler::once("H"));
    let g = bind_scripted(&mut mgr, "B", 5, ScriptedHandler::once("G"));
    let board = SignalBoard::with_raised(&["A", "B"]);

    mgr.run_monitors(&board);
    assert_eq!(mgr.active_handlers(), vec![g, h]);

    mgr.bind("A", 10, SignalBoard::monitor("A"), Some(h)).unwrap();
    assert_eq!(mgr.active_handlers(), vec![h, g]);
    assert_eq!(mgr.current_priority(h), Some(10));
}

#[test]
fn monitor_only_rebind_keeps_the_handler_binding() {
    let mut mgr = manager(ManagerPolicy::default());
    let h = bind_scripted(&mut mgr, "A", 1, ScriptedHandler::once("H"));

    mgr.bind("A", 4, SignalBoard::monitor("other"), None).unwrap();
    assert_eq!(mgr.handler_for("A"), Some(h));
    assert_eq!(mgr.base_priority(h), Some(1));

    let mut board = SignalBoard::with_raised(&["A"]);
    assert!(mgr.tick(&mut board).activated.is_empty());
    board.raise("other");
    assert_eq!(mgr.tick(&mut board).activated, vec![h]);
}
