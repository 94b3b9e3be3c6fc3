//! The complete stage: host instance creation, update preparation, and
//! flag bubbling.

use crate::fiber::{FiberArena, FiberId, FiberTag};
use crate::flags::FiberFlags;
use crate::host::{HostError, InstanceId};
use crate::work_loop::RenderPass;

pub(crate) fn complete_work(
    pass: &mut RenderPass<'_>,
    current: Option<FiberId>,
    wip: FiberId,
) -> Result<(), HostError> {
    match pass.arena[wip].tag {
        FiberTag::HostText => complete_host_text(pass, current, wip)?,
        FiberTag::HostComponent => complete_host_component(pass, current, wip)?,
        FiberTag::HostRoot
        | FiberTag::FunctionComponent
        | FiberTag::IndeterminateComponent => {}
    }
    bubble_properties(pass.arena, wip);
    Ok(())
}

fn complete_host_text(
    pass: &mut RenderPass<'_>,
    current: Option<FiberId>,
    wip: FiberId,
) -> Result<(), HostError> {
    let new_text = pass.arena[wip].text.clone().unwrap_or_default();
    if current.is_some() && pass.arena[wip].state_node.is_some() {
        let old_text = current
            .and_then(|c| pass.arena[c].memoized_text.clone())
            .unwrap_or_default();
        if old_text != new_text {
            pass.arena[wip].flags |= FiberFlags::UPDATE;
        }
    } else {
        let instance = pass.host.create_text_instance(&new_text)?;
        pass.arena[wip].state_node = Some(instance);
    }
    Ok(())
}

fn complete_host_component(
    pass: &mut RenderPass<'_>,
    current: Option<FiberId>,
    wip: FiberId,
) -> Result<(), HostError> {
    let ty = pass.arena[wip]
        .host_type()
        .expect("host fiber without a host type")
        .to_owned();
    let new_props = pass.arena[wip].pending_props.clone();

    if let (Some(current), Some(instance)) = (current, pass.arena[wip].state_node) {
        // Update path: diff now, apply in the mutation pass.
        let old_props = pass.arena[current].memoized_props.clone();
        if let Some(payload) = pass.host.prepare_update(instance, &ty, &old_props, &new_props)? {
            pass.arena[wip].update_payload = Some(payload);
            pass.arena[wip].flags |= FiberFlags::UPDATE;
        }
        return Ok(());
    }

    // Mount path: build the instance and attach the already-completed host
    // descendants, so the subtree enters the tree as one finished unit.
    let instance = pass.host.create_instance(&ty, &new_props)?;
    append_all_children(pass, instance, wip)?;
    pass.arena[wip].state_node = Some(instance);
    pass.host.finalize_initial_children(instance, &ty, &new_props)?;
    Ok(())
}

/// Appends every nearest host descendant of `wip` to `parent`, skipping
/// through component fibers without descending past host nodes.
fn append_all_children(
    pass: &mut RenderPass<'_>,
    parent: InstanceId,
    wip: FiberId,
) -> Result<(), HostError> {
    let mut node = match pass.arena[wip].child {
        Some(child) => child,
        None => return Ok(()),
    };
    loop {
        if pass.arena[node].tag.is_host() {
            if let Some(instance) = pass.arena[node].state_node {
                pass.host.append_initial_child(parent, instance)?;
            }
        } else if let Some(child) = pass.arena[node].child {
            node = child;
            continue;
        }
        if node == wip {
            return Ok(());
        }
        while pass.arena[node].sibling.is_none() {
            match pass.arena[node].return_ {
                None => return Ok(()),
                Some(parent_fiber) if parent_fiber == wip => return Ok(()),
                Some(parent_fiber) => node = parent_fiber,
            }
        }
        node = pass.arena[node].sibling.expect("sibling checked above");
    }
}

/// Folds each direct child's own and subtree flags into this fiber's
/// `subtree_flags`, letting commit skip untouched subtrees wholesale.
fn bubble_properties(arena: &mut FiberArena, wip: FiberId) {
    let mut subtree = FiberFlags::empty();
    let mut child = arena[wip].child;
    while let Some(fiber) = child {
        subtree |= arena[fiber].subtree_flags | arena[fiber].flags;
        child = arena[fiber].sibling;
    }
    arena[wip].subtree_flags |= subtree;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bubbling_folds_child_and_subtree_flags() {
        let mut arena = FiberArena::new();
        let parent = arena.create_host_root(0);
        let a = arena.create_text("a");
        let b = arena.create_text("b");
        arena[parent].child = Some(a);
        arena[a].sibling = Some(b);
        arena[a].flags |= FiberFlags::PLACEMENT;
        arena[b].subtree_flags |= FiberFlags::PASSIVE;

        bubble_properties(&mut arena, parent);
        assert!(arena[parent].subtree_flags.contains(FiberFlags::PLACEMENT));
        assert!(arena[parent].subtree_flags.contains(FiberFlags::PASSIVE));
        assert!(arena[parent].flags.is_empty());
    }
}
