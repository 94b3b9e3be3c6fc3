//! In-memory render harness.
//!
//! [`TestRoot`] mounts a root against a [`MemoryHost`] container and keeps
//! a second handle to the host tree, so tests can render, flush, and then
//! assert on the resulting nodes and the ordered mutation log.

use std::cell::RefCell;

use weft_core::element::Element;
use weft_core::host::{HostError, HostMutation, InstanceId, MemoryHost, MemoryNode};
use weft_core::root::Root;

pub struct TestRoot {
    root: Root,
    host: MemoryHost,
    container: InstanceId,
}

impl Default for TestRoot {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRoot {
    pub fn new() -> Self {
        let host = MemoryHost::new();
        let container = host.create_container();
        let root = Root::new(Box::new(host.clone()), container);
        Self {
            root,
            host,
            container,
        }
    }

    /// Renders an element and runs every scheduled pass, including passes
    /// scheduled by effects that fired during the first one.
    pub fn render(&self, element: Element) -> Result<(), HostError> {
        self.root.render(element);
        self.flush()
    }

    /// Runs scheduled work without staging anything new.
    pub fn flush(&self) -> Result<(), HostError> {
        self.root.flush_work()
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    pub fn host(&self) -> &MemoryHost {
        &self.host
    }

    pub fn container(&self) -> InstanceId {
        self.container
    }

    /// Direct children of the container, in host order.
    pub fn top_level(&self) -> Vec<InstanceId> {
        self.host.children_of(self.container)
    }

    pub fn node(&self, id: InstanceId) -> std::cell::Ref<'_, MemoryNode> {
        self.host.node(id)
    }

    pub fn text_content(&self) -> String {
        self.host.text_content(self.container)
    }

    pub fn mutations(&self) -> Vec<HostMutation> {
        self.host.mutations()
    }

    /// Drains the mutation log; the idiomatic reset point between the
    /// arrange and act halves of a test.
    pub fn take_mutations(&self) -> Vec<HostMutation> {
        self.host.take_mutations()
    }

    /// Dispatches a synthetic event and flushes the resulting work.
    pub fn dispatch(&self, target: InstanceId, event_type: &str) -> Result<bool, HostError> {
        let prevented = self.root.dispatch_event(target, event_type);
        self.flush()?;
        Ok(prevented)
    }

    /// Dispatches without flushing, for asserting on batching behaviour.
    pub fn dispatch_without_flush(&self, target: InstanceId, event_type: &str) -> bool {
        self.root.dispatch_event(target, event_type)
    }

    pub fn dump_tree(&self) -> String {
        self.host.dump_tree(self.container)
    }

    /// Finds the first node in the container subtree with the given type.
    pub fn find_by_type(&self, ty: &str) -> Option<InstanceId> {
        let mut stack = vec![self.container];
        while let Some(id) = stack.pop() {
            if self.host.node(id).ty.as_deref() == Some(ty) {
                return Some(id);
            }
            let mut children = self.host.children_of(id);
            children.reverse();
            stack.extend(children);
        }
        None
    }
}

/// Shared ordered call log for observing effect and handler sequencing.
#[derive(Clone, Default)]
pub struct CallLog {
    entries: std::rc::Rc<RefCell<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut self.entries.borrow_mut())
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }
}
