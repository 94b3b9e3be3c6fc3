//! Fiber nodes and the slot-indexed arena that owns them.
//!
//! Fibers live in a [`FiberArena`] and refer to each other by [`FiberId`].
//! Ownership runs parent→child through `child`/`sibling`; `return_` is a
//! plain back-reference for upward walks and never implies ownership. Each
//! logical tree position has at most two fiber records at a time, paired
//! symmetrically through `alternate`.

use std::ops::{Index, IndexMut};
use std::rc::Rc;

use crate::element::{Child, Element, ElementType, Props};
use crate::flags::FiberFlags;
use crate::hooks::{EffectState, Hook};
use crate::host::{InstanceId, UpdatePayload};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct FiberId(pub(crate) usize);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FiberTag {
    HostRoot,
    HostComponent,
    HostText,
    FunctionComponent,
    /// A component fiber before its first render resolves it.
    IndeterminateComponent,
}

impl FiberTag {
    pub fn is_host(self) -> bool {
        matches!(self, FiberTag::HostComponent | FiberTag::HostText)
    }
}

/// Component-kind-dependent memoized state.
#[derive(Clone, Debug, Default)]
pub enum FiberState {
    #[default]
    None,
    Root(RootState),
    Hooks(Vec<Hook>),
}

#[derive(Clone, Debug, Default)]
pub struct RootState {
    pub element: Option<Element>,
}

pub struct Fiber {
    pub tag: FiberTag,
    pub key: Option<String>,
    pub ty: Option<ElementType>,
    pub state_node: Option<InstanceId>,

    pub return_: Option<FiberId>,
    pub child: Option<FiberId>,
    pub sibling: Option<FiberId>,
    pub index: usize,

    pub pending_props: Props,
    pub memoized_props: Props,
    /// HostText fibers carry their content here instead of in props.
    pub text: Option<String>,
    pub memoized_text: Option<String>,

    pub memoized_state: FiberState,
    /// Host fibers: property diff stashed by the complete stage.
    pub update_payload: Option<UpdatePayload>,
    /// Pending root-element updates; HostRoot only.
    pub root_pending: Vec<Element>,
    /// Function components: effect records in call order for this render.
    pub effects: Vec<Rc<EffectState>>,

    pub flags: FiberFlags,
    pub subtree_flags: FiberFlags,
    /// Children removed this pass; drives the deletion commit walk.
    pub deletions: Vec<FiberId>,

    pub alternate: Option<FiberId>,
}

impl Fiber {
    fn new(tag: FiberTag, pending_props: Props, key: Option<String>) -> Self {
        Self {
            tag,
            key,
            ty: None,
            state_node: None,
            return_: None,
            child: None,
            sibling: None,
            index: 0,
            pending_props,
            memoized_props: Props::default(),
            text: None,
            memoized_text: None,
            memoized_state: FiberState::None,
            update_payload: None,
            root_pending: Vec::new(),
            effects: Vec::new(),
            flags: FiberFlags::empty(),
            subtree_flags: FiberFlags::empty(),
            deletions: Vec::new(),
            alternate: None,
        }
    }

    pub fn hooks(&self) -> Option<&[Hook]> {
        match &self.memoized_state {
            FiberState::Hooks(hooks) => Some(hooks),
            _ => None,
        }
    }

    pub(crate) fn component(&self) -> Option<&crate::element::Component> {
        match &self.ty {
            Some(ElementType::Component(component)) => Some(component),
            _ => None,
        }
    }

    pub(crate) fn host_type(&self) -> Option<&str> {
        match &self.ty {
            Some(ElementType::Host(tag)) => Some(tag),
            _ => None,
        }
    }
}

/// Slot-indexed fiber storage with stable handles. Detached fibers are kept
/// until the arena is dropped; handles are never reused, so a stale id can
/// never alias a live fiber.
#[derive(Default)]
pub struct FiberArena {
    fibers: Vec<Fiber>,
}

impl FiberArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    fn alloc(&mut self, fiber: Fiber) -> FiberId {
        let id = FiberId(self.fibers.len());
        self.fibers.push(fiber);
        id
    }

    pub fn create_host_root(&mut self, container: InstanceId) -> FiberId {
        let mut fiber = Fiber::new(FiberTag::HostRoot, Props::default(), None);
        fiber.state_node = Some(container);
        fiber.memoized_state = FiberState::Root(RootState::default());
        self.alloc(fiber)
    }

    /// Fiber from an element description. Host tags resolve immediately;
    /// components stay indeterminate until their first render.
    pub fn create_from_element(&mut self, element: &Element) -> FiberId {
        let tag = match element.ty() {
            ElementType::Host(_) => FiberTag::HostComponent,
            ElementType::Component(_) => FiberTag::IndeterminateComponent,
        };
        let mut fiber = Fiber::new(
            tag,
            element.props().clone(),
            element.key().map(str::to_owned),
        );
        fiber.ty = Some(element.ty().clone());
        self.alloc(fiber)
    }

    pub fn create_text(&mut self, content: &str) -> FiberId {
        let mut fiber = Fiber::new(FiberTag::HostText, Props::default(), None);
        fiber.text = Some(content.to_owned());
        self.alloc(fiber)
    }

    pub(crate) fn create_from_child(&mut self, child: &Child) -> FiberId {
        match child {
            Child::Element(element) => self.create_from_element(element),
            Child::Text(content) => self.create_text(content),
        }
    }

    /// Produces (or reuses) the work-in-progress pairing of `current` with
    /// fresh pending content, clearing effect bookkeeping. At most two
    /// records exist per position: the pair is linked both ways and reused
    /// across renders.
    pub fn create_work_in_progress(&mut self, current: FiberId, pending: PendingContent) -> FiberId {
        let wip = match self[current].alternate {
            Some(existing) => {
                let fiber = &mut self[existing];
                fiber.flags = FiberFlags::empty();
                fiber.subtree_flags = FiberFlags::empty();
                fiber.deletions.clear();
                fiber.update_payload = None;
                existing
            }
            None => {
                let source = &self[current];
                let fiber = Fiber::new(source.tag, Props::default(), source.key.clone());
                let created = self.alloc(fiber);
                self[created].alternate = Some(current);
                self[current].alternate = Some(created);
                created
            }
        };

        match pending {
            PendingContent::Props(props) => self[wip].pending_props = props,
            PendingContent::Text(text) => self[wip].text = Some(text),
            PendingContent::FromCurrent => {
                let (props, text) = {
                    let source = &self[current];
                    (source.pending_props.clone(), source.text.clone())
                };
                self[wip].pending_props = props;
                self[wip].text = text;
            }
        }

        let (tag, ty, state_node, child, sibling, index, memoized_props, memoized_text, state, effects) = {
            let source = &self[current];
            (
                source.tag,
                source.ty.clone(),
                source.state_node,
                source.child,
                source.sibling,
                source.index,
                source.memoized_props.clone(),
                source.memoized_text.clone(),
                source.memoized_state.clone(),
                source.effects.clone(),
            )
        };
        let fiber = &mut self[wip];
        fiber.tag = tag;
        fiber.ty = ty;
        fiber.state_node = state_node;
        fiber.child = child;
        fiber.sibling = sibling;
        fiber.index = index;
        fiber.memoized_props = memoized_props;
        fiber.memoized_text = memoized_text;
        fiber.memoized_state = state;
        fiber.effects = effects;
        wip
    }
}

/// What a work-in-progress fiber starts the pass with.
pub enum PendingContent {
    Props(Props),
    Text(String),
    FromCurrent,
}

impl Index<FiberId> for FiberArena {
    type Output = Fiber;

    fn index(&self, id: FiberId) -> &Fiber {
        &self.fibers[id.0]
    }
}

impl IndexMut<FiberId> for FiberArena {
    fn index_mut(&mut self, id: FiberId) -> &mut Fiber {
        &mut self.fibers[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Props;

    #[test]
    fn alternate_pairing_is_symmetric_and_reused() {
        let mut arena = FiberArena::new();
        let root = arena.create_host_root(0);
        let wip = arena.create_work_in_progress(root, PendingContent::FromCurrent);
        assert_eq!(arena[root].alternate, Some(wip));
        assert_eq!(arena[wip].alternate, Some(root));

        // A second pass from the other side must reuse the pair, not grow it.
        let len = arena.len();
        let back = arena.create_work_in_progress(wip, PendingContent::FromCurrent);
        assert_eq!(back, root);
        assert_eq!(arena.len(), len);
    }

    #[test]
    fn work_in_progress_clears_effect_bookkeeping() {
        let mut arena = FiberArena::new();
        let root = arena.create_host_root(0);
        let wip = arena.create_work_in_progress(root, PendingContent::FromCurrent);
        arena[wip].flags |= FiberFlags::PLACEMENT;
        arena[wip].subtree_flags |= FiberFlags::UPDATE;
        arena[wip].deletions.push(root);

        let again = arena.create_work_in_progress(root, PendingContent::FromCurrent);
        assert_eq!(again, wip);
        assert!(arena[again].flags.is_empty());
        assert!(arena[again].subtree_flags.is_empty());
        assert!(arena[again].deletions.is_empty());
    }

    #[test]
    fn element_fibers_resolve_tags() {
        let mut arena = FiberArena::new();
        let host = arena.create_from_element(&Element::host("div", Props::new()));
        assert_eq!(arena[host].tag, FiberTag::HostComponent);
        let text = arena.create_text("hi");
        assert_eq!(arena[text].tag, FiberTag::HostText);
        assert_eq!(arena[text].text.as_deref(), Some("hi"));
    }
}
