#![allow(dead_code)]

pub use eventmgr_test_utils::builders;
pub use eventmgr_test_utils::{RecordingSink, ScriptedHandler, SignalBoard, init_tracing, with_timeout};

use eventmgr::manager::{EventManager, HandlerId, Priority};
use eventmgr::types::ManagerPolicy;

/// Bind `event` (monitor: the signal of the same name) to a freshly added
/// scripted handler and return its id.
pub fn bind_scripted(
    manager: &mut EventManager<SignalBoard>,
    event: &str,
    priority: Priority,
    handler: ScriptedHandler,
) -> HandlerId {
    let id = manager.add_handler(handler);
    manager
        .bind(event, priority, SignalBoard::monitor(event), Some(id))
        .unwrap();
    id
}

pub fn manager(policy: ManagerPolicy) -> EventManager<SignalBoard> {
    EventManager::new(policy)
}
