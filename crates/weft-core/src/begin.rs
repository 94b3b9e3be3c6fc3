//! The begin stage: produce a fiber's children and diff them in.

use crate::element::ElementType;
use crate::fiber::{FiberId, FiberState, FiberTag};
use crate::hooks::render_with_hooks;
use crate::reconcile::{reconcile_children, NewChildren, TrackEffects};
use crate::update_queue::process_root_queue;
use crate::work_loop::RenderPass;

/// Runs a fiber's begin stage and returns the next unit of work (its first
/// child), or `None` when the fiber is a leaf this pass.
pub(crate) fn begin_work(
    pass: &mut RenderPass<'_>,
    current: Option<FiberId>,
    wip: FiberId,
) -> Option<FiberId> {
    match pass.arena[wip].tag {
        FiberTag::HostRoot => update_host_root(pass, current, wip),
        FiberTag::HostComponent => update_host_component(pass, current, wip),
        FiberTag::HostText => None,
        FiberTag::FunctionComponent | FiberTag::IndeterminateComponent => {
            update_function_component(pass, current, wip)
        }
    }
}

/// A fiber with no alternate is mounting inside a fresh subtree; its
/// children skip effect tracking and ride the subtree root's placement.
fn track_mode(current: Option<FiberId>) -> TrackEffects {
    if current.is_some() {
        TrackEffects::Tracked
    } else {
        TrackEffects::Untracked
    }
}

fn update_host_root(
    pass: &mut RenderPass<'_>,
    current: Option<FiberId>,
    wip: FiberId,
) -> Option<FiberId> {
    process_root_queue(pass.arena, wip);
    let element = match &pass.arena[wip].memoized_state {
        FiberState::Root(state) => state.element.clone(),
        _ => None,
    };
    let current_first = current.and_then(|c| pass.arena[c].child);
    let mode = track_mode(current);
    let next = match &element {
        Some(element) => reconcile_children(
            pass.arena,
            wip,
            current_first,
            NewChildren::Single(element),
            mode,
        ),
        None => reconcile_children(pass.arena, wip, current_first, NewChildren::None, mode),
    };
    pass.arena[wip].child = next;
    next
}

fn update_host_component(
    pass: &mut RenderPass<'_>,
    current: Option<FiberId>,
    wip: FiberId,
) -> Option<FiberId> {
    let ty = pass.arena[wip]
        .host_type()
        .expect("host fiber without a host type")
        .to_owned();
    let props = pass.arena[wip].pending_props.clone();

    // Direct text content is applied by the host; no text fiber exists.
    let new = if pass.host.should_set_text_content(&ty, &props) {
        NewChildren::None
    } else {
        NewChildren::List(props.child_list())
    };
    let current_first = current.and_then(|c| pass.arena[c].child);
    let next = reconcile_children(pass.arena, wip, current_first, new, track_mode(current));
    pass.arena[wip].child = next;
    next
}

fn update_function_component(
    pass: &mut RenderPass<'_>,
    current: Option<FiberId>,
    wip: FiberId,
) -> Option<FiberId> {
    if pass.arena[wip].tag == FiberTag::IndeterminateComponent {
        log::trace!(
            "mounting component {:?}",
            pass.arena[wip].ty.as_ref().map(|ty| match ty {
                ElementType::Component(c) => c.name(),
                ElementType::Host(tag) => tag.as_str(),
            })
        );
    }
    let handle = pass.handle.clone();
    let children = render_with_hooks(pass.arena, &handle, current, wip);
    pass.arena[wip].tag = FiberTag::FunctionComponent;

    let current_first = current.and_then(|c| pass.arena[c].child);
    let next = reconcile_children(
        pass.arena,
        wip,
        current_first,
        NewChildren::List(&children),
        track_mode(current),
    );
    pass.arena[wip].child = next;
    next
}
