//! Process-wide staging of updates dispatched between render passes.
//!
//! Dispatches never touch fiber trees directly; they append to the root's
//! staging buffer. The buffer is flushed exactly once, right after the
//! work-in-progress root is prepared, so every update staged before that
//! point lands in the same pass.

use std::any::Any;
use std::rc::Rc;

use crate::element::Element;
use crate::fiber::{FiberArena, FiberId, FiberState, RootState};
use crate::hooks::HookQueue;

pub(crate) enum StagedUpdate {
    /// A new root element from `Root::render`.
    Root { element: Element },
    /// A hook action dispatched through a `Dispatch` or `SetState`.
    Hook {
        fiber: FiberId,
        queue: Rc<HookQueue>,
        action: Rc<dyn Any>,
    },
}

/// Moves staged updates into the tree: root elements onto the
/// work-in-progress root's pending list, hook actions onto their queues.
pub(crate) fn flush_staged(arena: &mut FiberArena, wip_root: FiberId, staged: Vec<StagedUpdate>) {
    for update in staged {
        match update {
            StagedUpdate::Root { element } => {
                arena[wip_root].root_pending.push(element);
            }
            StagedUpdate::Hook { fiber, queue, action } => {
                log::trace!("queueing hook update for fiber {fiber:?}");
                queue.pending.borrow_mut().push(action);
            }
        }
    }
}

/// Folds the root's pending element updates FIFO; each payload replaces the
/// rendered element wholesale, so the last one wins. An empty queue leaves
/// the memoized element untouched.
pub(crate) fn process_root_queue(arena: &mut FiberArena, wip_root: FiberId) {
    let pending = std::mem::take(&mut arena[wip_root].root_pending);
    if let Some(element) = pending.into_iter().last() {
        arena[wip_root].memoized_state = FiberState::Root(RootState {
            element: Some(element),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, Props};
    use crate::fiber::PendingContent;

    #[test]
    fn last_root_update_wins() {
        let mut arena = FiberArena::new();
        let root = arena.create_host_root(0);
        let wip = arena.create_work_in_progress(root, PendingContent::FromCurrent);

        let staged = vec![
            StagedUpdate::Root {
                element: Element::host("div", Props::new()),
            },
            StagedUpdate::Root {
                element: Element::host("span", Props::new()),
            },
        ];
        flush_staged(&mut arena, wip, staged);
        process_root_queue(&mut arena, wip);

        match &arena[wip].memoized_state {
            FiberState::Root(state) => {
                let element = state.element.as_ref().unwrap();
                assert_eq!(element.ty(), &crate::element::ElementType::Host("span".into()));
            }
            other => panic!("unexpected root state: {other:?}"),
        }
    }

    #[test]
    fn empty_queue_preserves_memoized_element() {
        let mut arena = FiberArena::new();
        let root = arena.create_host_root(0);
        arena[root].memoized_state = FiberState::Root(RootState {
            element: Some(Element::host("div", Props::new())),
        });
        let wip = arena.create_work_in_progress(root, PendingContent::FromCurrent);

        process_root_queue(&mut arena, wip);
        match &arena[wip].memoized_state {
            FiberState::Root(state) => assert!(state.element.is_some()),
            other => panic!("unexpected root state: {other:?}"),
        }
    }
}
