//! Synthetic event dispatch.
//!
//! The host reports a raw event against an instance; the engine maps the
//! instance back to its fiber, collects handlers along the ancestor path,
//! and runs a capture phase (root to target) followed by a bubble phase
//! (target to root). `stop_propagation` suppresses every remaining
//! listener, including the phase switch.

use crate::element::listener_prop;
use crate::fiber::{FiberArena, FiberId, FiberTag};
use crate::host::InstanceId;

pub struct SyntheticEvent {
    event_type: String,
    target: InstanceId,
    propagation_stopped: bool,
    default_prevented: bool,
}

impl SyntheticEvent {
    pub(crate) fn new(event_type: &str, target: InstanceId) -> Self {
        Self {
            event_type: event_type.to_owned(),
            target,
            propagation_stopped: false,
            default_prevented: false,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn target(&self) -> InstanceId {
        self.target
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Handlers for one dispatch, collected up front so the fiber tree is not
/// borrowed while user code runs (handlers routinely dispatch updates).
pub(crate) struct DispatchPlan {
    pub capture: Vec<crate::element::EventHandler>,
    pub bubble: Vec<crate::element::EventHandler>,
}

pub(crate) fn plan_dispatch(
    arena: &FiberArena,
    target_fiber: FiberId,
    event_type: &str,
) -> DispatchPlan {
    let mut path = Vec::new();
    let mut cursor = Some(target_fiber);
    while let Some(fiber) = cursor {
        if arena[fiber].tag == FiberTag::HostComponent {
            path.push(fiber);
        }
        cursor = arena[fiber].return_;
    }

    let capture_name = listener_prop(event_type, true);
    let bubble_name = listener_prop(event_type, false);
    let capture = path
        .iter()
        .rev()
        .filter_map(|&fiber| arena[fiber].memoized_props.handler(&capture_name))
        .collect();
    let bubble = path
        .iter()
        .filter_map(|&fiber| arena[fiber].memoized_props.handler(&bubble_name))
        .collect();
    DispatchPlan { capture, bubble }
}

impl DispatchPlan {
    /// Runs both phases against `event`. Returns early the moment
    /// propagation is stopped.
    pub fn run(self, event: &mut SyntheticEvent) {
        for handler in self.capture.into_iter().chain(self.bubble) {
            if event.is_propagation_stopped() {
                return;
            }
            handler(event);
        }
    }
}
