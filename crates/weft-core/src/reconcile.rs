//! Child reconciliation: diffing a fiber's current children against the
//! freshly rendered child list.
//!
//! Matching is two-tier: key first (`None` matches `None`), then element
//! type. A key match with a different type replaces the node; a key
//! mismatch at the same position falls through to the keyed map phase.
//! Moves are detected with the `last_placed_index` forward-scan heuristic,
//! which never emits a move for a node whose old index advances the
//! high-water mark.

use hashbrown::HashMap;

use crate::element::{Child, Element};
use crate::fiber::{FiberArena, FiberId, FiberTag, PendingContent};
use crate::flags::FiberFlags;

/// Whether this reconciliation records placement and deletion effects.
/// Fresh mounts inside a new subtree skip tracking; the subtree's root
/// placement inserts everything in one commit operation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum TrackEffects {
    Tracked,
    Untracked,
}

/// The rendered output being reconciled against the old children.
pub(crate) enum NewChildren<'a> {
    None,
    Single(&'a Element),
    List(&'a [Child]),
}

pub(crate) fn reconcile_children(
    arena: &mut FiberArena,
    ret: FiberId,
    current_first: Option<FiberId>,
    new: NewChildren<'_>,
    mode: TrackEffects,
) -> Option<FiberId> {
    match new {
        NewChildren::Single(element) => {
            let first = reconcile_single_element(arena, ret, current_first, element, mode);
            place_single_child(arena, first, mode);
            Some(first)
        }
        NewChildren::List(children) => {
            reconcile_child_array(arena, ret, current_first, children, mode)
        }
        NewChildren::None => {
            delete_remaining_children(arena, ret, current_first, mode);
            None
        }
    }
}

fn fiber_matches_element(arena: &FiberArena, fiber: FiberId, element: &Element) -> bool {
    arena[fiber].ty.as_ref() == Some(element.ty())
}

/// Reuses `current` for fresh props, detached from its old siblings.
fn use_fiber(arena: &mut FiberArena, current: FiberId, element: &Element) -> FiberId {
    let wip = arena.create_work_in_progress(current, PendingContent::Props(element.props().clone()));
    arena[wip].index = 0;
    arena[wip].sibling = None;
    wip
}

fn use_text_fiber(arena: &mut FiberArena, current: FiberId, content: &str) -> FiberId {
    let wip = arena.create_work_in_progress(current, PendingContent::Text(content.to_owned()));
    arena[wip].index = 0;
    arena[wip].sibling = None;
    wip
}

fn delete_child(arena: &mut FiberArena, ret: FiberId, child: FiberId, mode: TrackEffects) {
    if mode == TrackEffects::Untracked {
        return;
    }
    arena[ret].deletions.push(child);
    arena[ret].flags |= FiberFlags::CHILD_DELETION;
}

fn delete_remaining_children(
    arena: &mut FiberArena,
    ret: FiberId,
    first: Option<FiberId>,
    mode: TrackEffects,
) {
    let mut child = first;
    while let Some(fiber) = child {
        delete_child(arena, ret, fiber, mode);
        child = arena[fiber].sibling;
    }
}

/// A reused fiber has an alternate and needs no insertion; a created one
/// does not and gets flagged for placement.
fn place_single_child(arena: &mut FiberArena, fiber: FiberId, mode: TrackEffects) {
    if mode == TrackEffects::Tracked && arena[fiber].alternate.is_none() {
        arena[fiber].flags |= FiberFlags::PLACEMENT;
    }
}

/// Assigns the child's list index and decides whether it moved. Returns the
/// updated `last_placed_index` high-water mark.
fn place_child(
    arena: &mut FiberArena,
    fiber: FiberId,
    last_placed: usize,
    new_index: usize,
    mode: TrackEffects,
) -> usize {
    arena[fiber].index = new_index;
    if mode == TrackEffects::Untracked {
        return last_placed;
    }
    match arena[fiber].alternate {
        Some(current) => {
            let old_index = arena[current].index;
            if old_index < last_placed {
                arena[fiber].flags |= FiberFlags::PLACEMENT;
                last_placed
            } else {
                old_index
            }
        }
        None => {
            arena[fiber].flags |= FiberFlags::PLACEMENT;
            last_placed
        }
    }
}

fn reconcile_single_element(
    arena: &mut FiberArena,
    ret: FiberId,
    current_first: Option<FiberId>,
    element: &Element,
    mode: TrackEffects,
) -> FiberId {
    let key = element.key();
    let mut child = current_first;
    while let Some(existing) = child {
        let sibling = arena[existing].sibling;
        if arena[existing].key.as_deref() == key {
            if fiber_matches_element(arena, existing, element) {
                delete_remaining_children(arena, ret, sibling, mode);
                let reused = use_fiber(arena, existing, element);
                arena[reused].return_ = Some(ret);
                return reused;
            }
            // Same key, different type: nothing further can match either.
            delete_remaining_children(arena, ret, Some(existing), mode);
            break;
        }
        delete_child(arena, ret, existing, mode);
        child = sibling;
    }
    let created = arena.create_from_element(element);
    arena[created].return_ = Some(ret);
    created
}

/// Positional match attempt. `None` means the keys disagree and the
/// lockstep phase must stop.
fn update_slot(
    arena: &mut FiberArena,
    ret: FiberId,
    old: Option<FiberId>,
    new: &Child,
    _mode: TrackEffects,
) -> Option<FiberId> {
    let old_key = old.and_then(|fiber| arena[fiber].key.clone());
    match new {
        Child::Text(content) => {
            if old_key.is_some() {
                return None;
            }
            Some(update_text_node(arena, ret, old, content))
        }
        Child::Element(element) => {
            if element.key() != old_key.as_deref() {
                return None;
            }
            Some(update_element(arena, ret, old, element))
        }
    }
}

fn update_element(
    arena: &mut FiberArena,
    ret: FiberId,
    old: Option<FiberId>,
    element: &Element,
) -> FiberId {
    if let Some(existing) = old {
        if fiber_matches_element(arena, existing, element) {
            let reused = use_fiber(arena, existing, element);
            arena[reused].return_ = Some(ret);
            return reused;
        }
    }
    let created = arena.create_from_element(element);
    arena[created].return_ = Some(ret);
    created
}

fn update_text_node(
    arena: &mut FiberArena,
    ret: FiberId,
    old: Option<FiberId>,
    content: &str,
) -> FiberId {
    let fiber = match old {
        Some(existing) if arena[existing].tag == FiberTag::HostText => {
            use_text_fiber(arena, existing, content)
        }
        _ => arena.create_text(content),
    };
    arena[fiber].return_ = Some(ret);
    fiber
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum MapKey {
    Key(String),
    Index(usize),
}

fn child_map_key(new: &Child, index: usize) -> MapKey {
    match new.key() {
        Some(key) => MapKey::Key(key.to_owned()),
        None => MapKey::Index(index),
    }
}

fn map_remaining_children(
    arena: &FiberArena,
    first: Option<FiberId>,
) -> HashMap<MapKey, FiberId> {
    let mut map = HashMap::new();
    let mut cursor = first;
    while let Some(fiber) = cursor {
        let key = match &arena[fiber].key {
            Some(key) => MapKey::Key(key.clone()),
            None => MapKey::Index(arena[fiber].index),
        };
        map.insert(key, fiber);
        cursor = arena[fiber].sibling;
    }
    map
}

fn update_from_map(
    existing: &HashMap<MapKey, FiberId>,
    arena: &mut FiberArena,
    ret: FiberId,
    index: usize,
    new: &Child,
) -> FiberId {
    let candidate = existing.get(&child_map_key(new, index)).copied();
    match new {
        Child::Text(content) => update_text_node(arena, ret, candidate, content),
        Child::Element(element) => update_element(arena, ret, candidate, element),
    }
}

fn reconcile_child_array(
    arena: &mut FiberArena,
    ret: FiberId,
    current_first: Option<FiberId>,
    new_children: &[Child],
    mode: TrackEffects,
) -> Option<FiberId> {
    let mut resulting_first: Option<FiberId> = None;
    let mut previous: Option<FiberId> = None;
    let mut old_fiber = current_first;
    let mut last_placed = 0usize;
    let mut new_index = 0usize;

    // Lockstep phase: walk both lists in step while positions keep matching.
    while new_index < new_children.len() {
        let Some(old) = old_fiber else { break };
        // An index gap in the old list means deletions happened there; probe
        // against nothing but hold the old fiber for the next position.
        let (probe, next_old) = if arena[old].index > new_index {
            (None, Some(old))
        } else {
            (Some(old), arena[old].sibling)
        };
        let Some(new_fiber) = update_slot(arena, ret, probe, &new_children[new_index], mode)
        else {
            break;
        };
        if mode == TrackEffects::Tracked {
            if let Some(matched) = probe {
                // Matched by position but rebuilt from scratch: the old
                // fiber was not reused and must go.
                if arena[new_fiber].alternate.is_none() {
                    delete_child(arena, ret, matched, mode);
                }
            }
        }
        last_placed = place_child(arena, new_fiber, last_placed, new_index, mode);
        match previous {
            None => resulting_first = Some(new_fiber),
            Some(prev) => arena[prev].sibling = Some(new_fiber),
        }
        previous = Some(new_fiber);
        old_fiber = next_old;
        new_index += 1;
    }

    if new_index == new_children.len() {
        delete_remaining_children(arena, ret, old_fiber, mode);
        return resulting_first;
    }

    if old_fiber.is_none() {
        // Old list exhausted: everything left is a fresh insertion.
        for (offset, child) in new_children[new_index..].iter().enumerate() {
            let created = arena.create_from_child(child);
            arena[created].return_ = Some(ret);
            last_placed = place_child(arena, created, last_placed, new_index + offset, mode);
            match previous {
                None => resulting_first = Some(created),
                Some(prev) => arena[prev].sibling = Some(created),
            }
            previous = Some(created);
        }
        return resulting_first;
    }

    // Map phase: remaining old children by key (index when unkeyed), then
    // match, move, or create per remaining new child.
    let mut existing = map_remaining_children(arena, old_fiber);
    for index in new_index..new_children.len() {
        let child = &new_children[index];
        let new_fiber = update_from_map(&existing, arena, ret, index, child);
        if mode == TrackEffects::Tracked && arena[new_fiber].alternate.is_some() {
            existing.remove(&child_map_key(child, index));
        }
        last_placed = place_child(arena, new_fiber, last_placed, index, mode);
        match previous {
            None => resulting_first = Some(new_fiber),
            Some(prev) => arena[prev].sibling = Some(new_fiber),
        }
        previous = Some(new_fiber);
    }
    if mode == TrackEffects::Tracked {
        for (_, stale) in existing {
            delete_child(arena, ret, stale, mode);
        }
    }
    resulting_first
}
