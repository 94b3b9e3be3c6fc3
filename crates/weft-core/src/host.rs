//! The host adapter seam.
//!
//! Everything the engine does to a concrete UI tree goes through
//! [`HostAdapter`]. [`MemoryHost`] is the in-memory reference adapter used
//! by the test harness; it records every mutation it is asked to perform.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::element::{PropValue, Props};

/// Opaque handle to a concrete host node.
pub type InstanceId = usize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostError {
    MissingInstance { id: InstanceId },
    NotAChild { parent: InstanceId, child: InstanceId },
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::MissingInstance { id } => write!(f, "host instance {id} missing"),
            HostError::NotAChild { parent, child } => {
                write!(f, "instance {child} is not a child of {parent}")
            }
        }
    }
}

impl std::error::Error for HostError {}

/// One entry of a committed property diff.
#[derive(Clone, Debug, PartialEq)]
pub enum PropPatch {
    SetAttr(String, PropValue),
    RemoveAttr(String),
    SetText(String),
}

/// The stashed diff a completed host fiber carries into the mutation pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdatePayload {
    pub patches: Vec<PropPatch>,
}

impl UpdatePayload {
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}

/// Computes the property diff between two prop maps. Handler props are
/// skipped: the event subsystem reads them live from the fiber, so they
/// never reach the host as attributes. Returns `None` when nothing changed.
pub fn diff_props(old: &Props, new: &Props) -> Option<UpdatePayload> {
    let mut patches = Vec::new();
    for (name, value) in old.attrs() {
        if matches!(value, PropValue::Handler(_)) {
            continue;
        }
        if new.get(name).is_none() {
            patches.push(PropPatch::RemoveAttr(name.clone()));
        }
    }
    for (name, value) in new.attrs() {
        if matches!(value, PropValue::Handler(_)) {
            continue;
        }
        match old.get(name) {
            Some(previous) if previous == value => {}
            _ => patches.push(PropPatch::SetAttr(name.clone(), value.clone())),
        }
    }
    match (old.sole_text_child(), new.sole_text_child()) {
        (Some(a), Some(b)) if a == b => {}
        (_, Some(b)) => patches.push(PropPatch::SetText(b.to_owned())),
        (Some(_), None) => patches.push(PropPatch::SetText(String::new())),
        (None, None) => {}
    }
    if patches.is_empty() {
        None
    } else {
        Some(UpdatePayload { patches })
    }
}

/// Platform operations consumed by the complete and commit stages. All
/// failures are fatal to the in-flight render pass; there is no partial
/// commit recovery.
pub trait HostAdapter: Any {
    fn create_instance(&mut self, ty: &str, props: &Props) -> Result<InstanceId, HostError>;
    fn create_text_instance(&mut self, text: &str) -> Result<InstanceId, HostError>;
    fn append_initial_child(
        &mut self,
        parent: InstanceId,
        child: InstanceId,
    ) -> Result<(), HostError>;
    fn finalize_initial_children(
        &mut self,
        instance: InstanceId,
        ty: &str,
        props: &Props,
    ) -> Result<(), HostError>;
    fn append_child(&mut self, parent: InstanceId, child: InstanceId) -> Result<(), HostError>;
    fn insert_before(
        &mut self,
        parent: InstanceId,
        child: InstanceId,
        before: InstanceId,
    ) -> Result<(), HostError>;
    fn remove_child(&mut self, parent: InstanceId, child: InstanceId) -> Result<(), HostError>;

    /// Whether the host applies this node's single text child directly,
    /// instead of the engine reconciling a text fiber for it.
    fn should_set_text_content(&self, _ty: &str, props: &Props) -> bool {
        props.sole_text_child().is_some()
    }

    fn prepare_update(
        &self,
        _instance: InstanceId,
        _ty: &str,
        old_props: &Props,
        new_props: &Props,
    ) -> Result<Option<UpdatePayload>, HostError> {
        Ok(diff_props(old_props, new_props))
    }

    fn commit_update(
        &mut self,
        instance: InstanceId,
        payload: &UpdatePayload,
        ty: &str,
        old_props: &Props,
        new_props: &Props,
    ) -> Result<(), HostError>;

    fn commit_text_update(
        &mut self,
        instance: InstanceId,
        old_text: &str,
        new_text: &str,
    ) -> Result<(), HostError>;
}

impl dyn HostAdapter {
    pub fn as_any(&self) -> &dyn Any {
        self
    }

    pub fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Every host mutation the engine issued, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum HostMutation {
    CreateInstance { id: InstanceId, ty: String },
    CreateText { id: InstanceId, text: String },
    AppendInitialChild { parent: InstanceId, child: InstanceId },
    AppendChild { parent: InstanceId, child: InstanceId },
    InsertBefore { parent: InstanceId, child: InstanceId, before: InstanceId },
    RemoveChild { parent: InstanceId, child: InstanceId },
    CommitUpdate { id: InstanceId },
    CommitTextUpdate { id: InstanceId, text: String },
}

#[derive(Debug, Default)]
pub struct MemoryNode {
    pub ty: Option<String>,
    pub text: Option<String>,
    pub attrs: IndexMap<String, PropValue>,
    pub parent: Option<InstanceId>,
    pub children: Vec<InstanceId>,
}

#[derive(Default)]
struct MemoryHostInner {
    nodes: Vec<MemoryNode>,
    log: Vec<HostMutation>,
}

/// In-memory host tree with a recorded mutation log. Cloning yields another
/// handle to the same tree, so a test can keep one while the root owns the
/// other.
#[derive(Clone, Default)]
pub struct MemoryHost {
    inner: Rc<RefCell<MemoryHostInner>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a detached container node to mount a root into.
    pub fn create_container(&self) -> InstanceId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.nodes.len();
        inner.nodes.push(MemoryNode {
            ty: Some("#container".to_owned()),
            ..MemoryNode::default()
        });
        id
    }

    pub fn node(&self, id: InstanceId) -> Ref<'_, MemoryNode> {
        Ref::map(self.inner.borrow(), |inner| &inner.nodes[id])
    }

    pub fn children_of(&self, id: InstanceId) -> Vec<InstanceId> {
        self.inner.borrow().nodes[id].children.clone()
    }

    pub fn mutations(&self) -> Vec<HostMutation> {
        self.inner.borrow().log.clone()
    }

    pub fn take_mutations(&self) -> Vec<HostMutation> {
        std::mem::take(&mut self.inner.borrow_mut().log)
    }

    /// Concatenated text content of an instance's subtree.
    pub fn text_content(&self, id: InstanceId) -> String {
        let inner = self.inner.borrow();
        let mut out = String::new();
        collect_text(&inner.nodes, id, &mut out);
        out
    }

    pub fn dump_tree(&self, root: InstanceId) -> String {
        let inner = self.inner.borrow();
        let mut output = String::new();
        dump_node(&inner.nodes, &mut output, root, 0);
        output
    }

    fn node_mut(&self, id: InstanceId) -> Result<RefMut<'_, MemoryNode>, HostError> {
        let inner = self.inner.borrow_mut();
        if id >= inner.nodes.len() {
            return Err(HostError::MissingInstance { id });
        }
        Ok(RefMut::map(inner, |inner| &mut inner.nodes[id]))
    }

    fn detach(&self, child: InstanceId) {
        let mut inner = self.inner.borrow_mut();
        if let Some(parent) = inner.nodes[child].parent.take() {
            inner.nodes[parent].children.retain(|&c| c != child);
        }
    }

    fn apply_attrs(&self, id: InstanceId, props: &Props) -> Result<(), HostError> {
        let mut node = self.node_mut(id)?;
        for (name, value) in props.attrs() {
            if matches!(value, PropValue::Handler(_)) {
                continue;
            }
            node.attrs.insert(name.clone(), value.clone());
        }
        if let Some(text) = props.sole_text_child() {
            node.text = Some(text.to_owned());
        }
        Ok(())
    }
}

fn collect_text(nodes: &[MemoryNode], id: InstanceId, out: &mut String) {
    let node = &nodes[id];
    if let Some(text) = &node.text {
        out.push_str(text);
    }
    for &child in &node.children {
        collect_text(nodes, child, out);
    }
}

fn dump_node(nodes: &[MemoryNode], output: &mut String, id: InstanceId, depth: usize) {
    let indent = "  ".repeat(depth);
    let node = &nodes[id];
    match (&node.ty, &node.text) {
        (Some(ty), _) => output.push_str(&format!("{indent}[{id}] <{ty}>\n")),
        (None, Some(text)) => output.push_str(&format!("{indent}[{id}] {text:?}\n")),
        (None, None) => output.push_str(&format!("{indent}[{id}] (empty)\n")),
    }
    for &child in &node.children {
        dump_node(nodes, output, child, depth + 1);
    }
}

impl HostAdapter for MemoryHost {
    fn create_instance(&mut self, ty: &str, _props: &Props) -> Result<InstanceId, HostError> {
        let mut inner = self.inner.borrow_mut();
        let id = inner.nodes.len();
        inner.nodes.push(MemoryNode {
            ty: Some(ty.to_owned()),
            ..MemoryNode::default()
        });
        inner.log.push(HostMutation::CreateInstance {
            id,
            ty: ty.to_owned(),
        });
        Ok(id)
    }

    fn create_text_instance(&mut self, text: &str) -> Result<InstanceId, HostError> {
        let mut inner = self.inner.borrow_mut();
        let id = inner.nodes.len();
        inner.nodes.push(MemoryNode {
            text: Some(text.to_owned()),
            ..MemoryNode::default()
        });
        inner.log.push(HostMutation::CreateText {
            id,
            text: text.to_owned(),
        });
        Ok(id)
    }

    fn append_initial_child(
        &mut self,
        parent: InstanceId,
        child: InstanceId,
    ) -> Result<(), HostError> {
        self.detach(child);
        let mut inner = self.inner.borrow_mut();
        if parent >= inner.nodes.len() {
            return Err(HostError::MissingInstance { id: parent });
        }
        inner.nodes[parent].children.push(child);
        inner.nodes[child].parent = Some(parent);
        inner
            .log
            .push(HostMutation::AppendInitialChild { parent, child });
        Ok(())
    }

    fn finalize_initial_children(
        &mut self,
        instance: InstanceId,
        _ty: &str,
        props: &Props,
    ) -> Result<(), HostError> {
        self.apply_attrs(instance, props)
    }

    fn append_child(&mut self, parent: InstanceId, child: InstanceId) -> Result<(), HostError> {
        // Appending an attached node moves it, as in the DOM.
        self.detach(child);
        let mut inner = self.inner.borrow_mut();
        if parent >= inner.nodes.len() {
            return Err(HostError::MissingInstance { id: parent });
        }
        inner.nodes[parent].children.push(child);
        inner.nodes[child].parent = Some(parent);
        inner.log.push(HostMutation::AppendChild { parent, child });
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: InstanceId,
        child: InstanceId,
        before: InstanceId,
    ) -> Result<(), HostError> {
        self.detach(child);
        let mut inner = self.inner.borrow_mut();
        if parent >= inner.nodes.len() {
            return Err(HostError::MissingInstance { id: parent });
        }
        let index = inner.nodes[parent]
            .children
            .iter()
            .position(|&c| c == before)
            .ok_or(HostError::NotAChild {
                parent,
                child: before,
            })?;
        inner.nodes[parent].children.insert(index, child);
        inner.nodes[child].parent = Some(parent);
        inner.log.push(HostMutation::InsertBefore {
            parent,
            child,
            before,
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: InstanceId, child: InstanceId) -> Result<(), HostError> {
        let mut inner = self.inner.borrow_mut();
        if parent >= inner.nodes.len() {
            return Err(HostError::MissingInstance { id: parent });
        }
        let index = inner.nodes[parent]
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(HostError::NotAChild { parent, child })?;
        inner.nodes[parent].children.remove(index);
        inner.nodes[child].parent = None;
        inner.log.push(HostMutation::RemoveChild { parent, child });
        Ok(())
    }

    fn commit_update(
        &mut self,
        instance: InstanceId,
        payload: &UpdatePayload,
        _ty: &str,
        _old_props: &Props,
        _new_props: &Props,
    ) -> Result<(), HostError> {
        {
            let mut node = self.node_mut(instance)?;
            for patch in &payload.patches {
                match patch {
                    PropPatch::SetAttr(name, value) => {
                        node.attrs.insert(name.clone(), value.clone());
                    }
                    PropPatch::RemoveAttr(name) => {
                        node.attrs.shift_remove(name);
                    }
                    PropPatch::SetText(text) => {
                        node.text = if text.is_empty() {
                            None
                        } else {
                            Some(text.clone())
                        };
                    }
                }
            }
        }
        self.inner
            .borrow_mut()
            .log
            .push(HostMutation::CommitUpdate { id: instance });
        Ok(())
    }

    fn commit_text_update(
        &mut self,
        instance: InstanceId,
        _old_text: &str,
        new_text: &str,
    ) -> Result<(), HostError> {
        {
            let mut node = self.node_mut(instance)?;
            node.text = Some(new_text.to_owned());
        }
        self.inner.borrow_mut().log.push(HostMutation::CommitTextUpdate {
            id: instance,
            text: new_text.to_owned(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::text;

    #[test]
    fn diff_props_reports_added_changed_removed() {
        let old = Props::new().attr("id", "a").attr("class", "x");
        let new = Props::new().attr("id", "b").attr("title", "t");
        let payload = diff_props(&old, &new).unwrap();
        assert!(payload
            .patches
            .contains(&PropPatch::RemoveAttr("class".to_owned())));
        assert!(payload
            .patches
            .contains(&PropPatch::SetAttr("id".to_owned(), "b".into())));
        assert!(payload
            .patches
            .contains(&PropPatch::SetAttr("title".to_owned(), "t".into())));
    }

    #[test]
    fn diff_props_is_none_for_identical_props() {
        let old = Props::new().attr("id", "a").child(text("hi"));
        let new = Props::new().attr("id", "a").child(text("hi"));
        assert_eq!(diff_props(&old, &new), None);
    }

    #[test]
    fn diff_props_tracks_direct_text() {
        let old = Props::new().child(text("one"));
        let new = Props::new().child(text("two"));
        let payload = diff_props(&old, &new).unwrap();
        assert_eq!(payload.patches, vec![PropPatch::SetText("two".to_owned())]);

        let cleared = diff_props(&new, &Props::new()).unwrap();
        assert_eq!(cleared.patches, vec![PropPatch::SetText(String::new())]);
    }

    #[test]
    fn diff_props_ignores_handler_identity_changes() {
        let old = Props::new().on("click", |_| {});
        let new = Props::new().on("click", |_| {});
        assert_eq!(diff_props(&old, &new), None);
    }

    #[test]
    fn memory_host_moves_on_append() {
        let host = MemoryHost::new();
        let container = host.create_container();
        let mut adapter = host.clone();
        let a = adapter.create_instance("div", &Props::new()).unwrap();
        let b = adapter.create_instance("div", &Props::new()).unwrap();
        adapter.append_child(container, a).unwrap();
        adapter.append_child(container, b).unwrap();
        adapter.append_child(container, a).unwrap();
        assert_eq!(host.children_of(container), vec![b, a]);
    }

    #[test]
    fn memory_host_insert_before_requires_anchor() {
        let host = MemoryHost::new();
        let container = host.create_container();
        let mut adapter = host.clone();
        let a = adapter.create_instance("div", &Props::new()).unwrap();
        let err = adapter.insert_before(container, a, 99).unwrap_err();
        assert_eq!(
            err,
            HostError::NotAChild {
                parent: container,
                child: 99
            }
        );
    }
}
