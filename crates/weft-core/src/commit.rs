//! Commit: applying a finished work-in-progress tree to the host.
//!
//! Three passes over the finished tree, each pruned by `subtree_flags`:
//! mutation (deletions, insertions, property and text updates, layout
//! effect destroys), layout (layout effect creates), passive (deferred
//! effect destroys, then creates). Deletions inside a parent always run
//! before that parent's other mutations.

use std::rc::Rc;

use crate::fiber::{FiberArena, FiberId, FiberTag};
use crate::flags::{FiberFlags, HookFlags};
use crate::host::{HostAdapter, HostError, InstanceId};

pub(crate) struct CommitPass<'a> {
    pub arena: &'a mut FiberArena,
    pub host: &'a mut dyn HostAdapter,
    pub container: InstanceId,
}

pub(crate) fn commit_work(pass: &mut CommitPass<'_>, finished: FiberId) -> Result<(), HostError> {
    let flags = pass.arena[finished].flags | pass.arena[finished].subtree_flags;
    if flags.has_mutation_work() {
        commit_mutation_on_fiber(pass, finished)?;
    }
    if flags.has_layout_work() {
        commit_layout_effects(pass.arena, finished);
    }
    if flags.has_passive_work() {
        // Destroy-before-create across the whole tree, not per fiber.
        commit_passive_unmount(pass.arena, finished);
        commit_passive_mount(pass.arena, finished);
    }
    Ok(())
}

// ---------------------------------------------------------------- mutation

fn commit_mutation_on_fiber(pass: &mut CommitPass<'_>, fiber: FiberId) -> Result<(), HostError> {
    recursively_traverse_mutation(pass, fiber)?;
    commit_reconciliation(pass, fiber)?;

    let flags = pass.arena[fiber].flags;
    if !flags.contains(FiberFlags::UPDATE) {
        return Ok(());
    }
    match pass.arena[fiber].tag {
        FiberTag::FunctionComponent => {
            // Layout effect destroys run in the mutation pass, before any
            // layout creates anywhere in the tree.
            commit_hook_effect_unmount(
                pass.arena,
                fiber,
                HookFlags::HAS_EFFECT | HookFlags::LAYOUT,
            );
        }
        FiberTag::HostComponent => {
            if let (Some(instance), Some(payload)) = (
                pass.arena[fiber].state_node,
                pass.arena[fiber].update_payload.take(),
            ) {
                let ty = pass.arena[fiber]
                    .host_type()
                    .expect("host fiber without a host type")
                    .to_owned();
                let new_props = pass.arena[fiber].memoized_props.clone();
                let old_props = pass.arena[fiber]
                    .alternate
                    .map(|alt| pass.arena[alt].memoized_props.clone())
                    .unwrap_or_else(|| new_props.clone());
                pass.host
                    .commit_update(instance, &payload, &ty, &old_props, &new_props)?;
            }
        }
        FiberTag::HostText => {
            if let Some(instance) = pass.arena[fiber].state_node {
                let new_text = pass.arena[fiber].memoized_text.clone().unwrap_or_default();
                let old_text = pass.arena[fiber]
                    .alternate
                    .and_then(|alt| pass.arena[alt].memoized_text.clone())
                    .unwrap_or_default();
                pass.host.commit_text_update(instance, &old_text, &new_text)?;
            }
        }
        FiberTag::HostRoot | FiberTag::IndeterminateComponent => {}
    }
    Ok(())
}

fn recursively_traverse_mutation(
    pass: &mut CommitPass<'_>,
    parent: FiberId,
) -> Result<(), HostError> {
    let deletions = std::mem::take(&mut pass.arena[parent].deletions);
    for deleted in deletions {
        commit_deletion(pass, parent, deleted)?;
    }
    if pass.arena[parent].subtree_flags.has_mutation_work() {
        let mut child = pass.arena[parent].child;
        while let Some(fiber) = child {
            commit_mutation_on_fiber(pass, fiber)?;
            child = pass.arena[fiber].sibling;
        }
    }
    Ok(())
}

fn commit_reconciliation(pass: &mut CommitPass<'_>, fiber: FiberId) -> Result<(), HostError> {
    if pass.arena[fiber].flags.contains(FiberFlags::PLACEMENT) {
        commit_placement(pass, fiber)?;
        // Cleared as soon as the node is attached so later anchor searches
        // in this same pass can anchor on it.
        pass.arena[fiber].flags -= FiberFlags::PLACEMENT;
    }
    Ok(())
}

fn host_parent_instance(pass: &CommitPass<'_>, fiber: FiberId) -> InstanceId {
    let mut cursor = pass.arena[fiber].return_;
    while let Some(parent) = cursor {
        match pass.arena[parent].tag {
            FiberTag::HostComponent => {
                return pass.arena[parent]
                    .state_node
                    .expect("completed host fiber without an instance");
            }
            FiberTag::HostRoot => return pass.container,
            _ => cursor = pass.arena[parent].return_,
        }
    }
    panic!("placed fiber has no host parent");
}

fn commit_placement(pass: &mut CommitPass<'_>, fiber: FiberId) -> Result<(), HostError> {
    let parent = host_parent_instance(pass, fiber);
    let before = host_sibling(pass.arena, fiber);
    insert_or_append(pass, fiber, before, parent)
}

/// The next stable host instance after `fiber` among its siblings (and, for
/// non-host neighbours, their nearest host descendants). Fibers still
/// flagged for placement are not stable anchors and are skipped.
fn host_sibling(arena: &FiberArena, fiber: FiberId) -> Option<InstanceId> {
    let mut node = fiber;
    'siblings: loop {
        while arena[node].sibling.is_none() {
            match arena[node].return_ {
                None => return None,
                Some(parent) if arena[parent].tag.is_host() || arena[parent].tag == FiberTag::HostRoot => {
                    return None
                }
                Some(parent) => node = parent,
            }
        }
        node = arena[node].sibling.expect("sibling checked above");
        while !arena[node].tag.is_host() {
            if arena[node].flags.contains(FiberFlags::PLACEMENT) {
                continue 'siblings;
            }
            match arena[node].child {
                None => continue 'siblings,
                Some(child) => node = child,
            }
        }
        if !arena[node].flags.contains(FiberFlags::PLACEMENT) {
            return arena[node].state_node;
        }
    }
}

/// Inserts `node`'s host instance, or for component fibers every nearest
/// host descendant, at the anchor position.
fn insert_or_append(
    pass: &mut CommitPass<'_>,
    node: FiberId,
    before: Option<InstanceId>,
    parent: InstanceId,
) -> Result<(), HostError> {
    if pass.arena[node].tag.is_host() {
        let instance = pass.arena[node]
            .state_node
            .expect("placed host fiber without an instance");
        match before {
            Some(anchor) => pass.host.insert_before(parent, instance, anchor)?,
            None => pass.host.append_child(parent, instance)?,
        }
        return Ok(());
    }
    let mut child = pass.arena[node].child;
    while let Some(fiber) = child {
        insert_or_append(pass, fiber, before, parent)?;
        child = pass.arena[fiber].sibling;
    }
    Ok(())
}

// ---------------------------------------------------------------- deletion

fn commit_deletion(
    pass: &mut CommitPass<'_>,
    ret: FiberId,
    deleted: FiberId,
) -> Result<(), HostError> {
    // The deleted fiber hangs off the old tree; find the host parent from
    // the surviving return chain.
    let mut cursor = Some(ret);
    let mut host_parent = None;
    while let Some(parent) = cursor {
        match pass.arena[parent].tag {
            FiberTag::HostComponent | FiberTag::HostRoot => {
                host_parent = pass.arena[parent].state_node;
                break;
            }
            _ => cursor = pass.arena[parent].return_,
        }
    }
    commit_deletion_on_fiber(pass, host_parent, deleted)
}

/// Depth-first teardown: effect destroys fire top-down as the walk enters
/// each function component; host nodes detach from their nearest host
/// parent after their subtree is torn down.
fn commit_deletion_on_fiber(
    pass: &mut CommitPass<'_>,
    host_parent: Option<InstanceId>,
    fiber: FiberId,
) -> Result<(), HostError> {
    match pass.arena[fiber].tag {
        FiberTag::HostComponent | FiberTag::HostText => {
            let instance = pass.arena[fiber].state_node;
            let mut child = pass.arena[fiber].child;
            while let Some(next) = child {
                commit_deletion_on_fiber(pass, instance, next)?;
                child = pass.arena[next].sibling;
            }
            if let (Some(parent), Some(instance)) = (host_parent, instance) {
                pass.host.remove_child(parent, instance)?;
            }
        }
        FiberTag::FunctionComponent | FiberTag::IndeterminateComponent => {
            commit_unmount_effects(pass.arena, fiber);
            let mut child = pass.arena[fiber].child;
            while let Some(next) = child {
                commit_deletion_on_fiber(pass, host_parent, next)?;
                child = pass.arena[next].sibling;
            }
        }
        FiberTag::HostRoot => {
            let mut child = pass.arena[fiber].child;
            while let Some(next) = child {
                commit_deletion_on_fiber(pass, host_parent, next)?;
                child = pass.arena[next].sibling;
            }
        }
    }
    Ok(())
}

// ----------------------------------------------------------------- effects

/// Runs pending destroys for effects matching every bit of `mask`.
fn commit_hook_effect_unmount(arena: &FiberArena, fiber: FiberId, mask: HookFlags) {
    for effect in arena[fiber].effects.clone() {
        if effect.flags.get().contains(mask) {
            if let Some(destroy) = effect.destroy.borrow_mut().take() {
                destroy();
            }
        }
    }
}

/// Runs creates for effects matching every bit of `mask`, stashing the
/// returned cleanups.
fn commit_hook_effect_mount(arena: &FiberArena, fiber: FiberId, mask: HookFlags) {
    for effect in arena[fiber].effects.clone() {
        if effect.flags.get().contains(mask) {
            let create = Rc::clone(&*effect.create.borrow());
            let cleanup = create();
            *effect.destroy.borrow_mut() = cleanup;
        }
    }
}

/// Unmount teardown: every effect with a pending destroy runs it, dirty or
/// not, in declaration order.
fn commit_unmount_effects(arena: &FiberArena, fiber: FiberId) {
    for effect in arena[fiber].effects.clone() {
        if let Some(destroy) = effect.destroy.borrow_mut().take() {
            destroy();
        }
    }
}

fn commit_layout_effects(arena: &mut FiberArena, fiber: FiberId) {
    if arena[fiber].subtree_flags.has_layout_work() {
        let mut child = arena[fiber].child;
        while let Some(next) = child {
            commit_layout_effects(arena, next);
            child = arena[next].sibling;
        }
    }
    if arena[fiber].tag == FiberTag::FunctionComponent
        && arena[fiber].flags.has_layout_work()
    {
        commit_hook_effect_mount(arena, fiber, HookFlags::HAS_EFFECT | HookFlags::LAYOUT);
    }
}

fn commit_passive_unmount(arena: &mut FiberArena, fiber: FiberId) {
    if arena[fiber].subtree_flags.has_passive_work() {
        let mut child = arena[fiber].child;
        while let Some(next) = child {
            commit_passive_unmount(arena, next);
            child = arena[next].sibling;
        }
    }
    if arena[fiber].tag == FiberTag::FunctionComponent
        && arena[fiber].flags.has_passive_work()
    {
        commit_hook_effect_unmount(
            arena,
            fiber,
            HookFlags::HAS_EFFECT | HookFlags::PASSIVE,
        );
    }
}

fn commit_passive_mount(arena: &mut FiberArena, fiber: FiberId) {
    if arena[fiber].subtree_flags.has_passive_work() {
        let mut child = arena[fiber].child;
        while let Some(next) = child {
            commit_passive_mount(arena, next);
            child = arena[next].sibling;
        }
    }
    if arena[fiber].tag == FiberTag::FunctionComponent
        && arena[fiber].flags.has_passive_work()
    {
        commit_hook_effect_mount(arena, fiber, HookFlags::HAS_EFFECT | HookFlags::PASSIVE);
    }
}
