//! Immutable element descriptions.
//!
//! An [`Element`] is the value a render produces: a host tag or component
//! function, an optional sibling key, and a prop map. The engine never
//! mutates elements; reconciliation only reads them.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::events::SyntheticEvent;
use crate::hooks::RenderCx;

/// Handler stored in props under an `on*` name. Compared by identity.
pub type EventHandler = Rc<dyn Fn(&mut SyntheticEvent)>;

/// A single prop value. Handlers live here too but are never forwarded to
/// the host adapter as attributes; the event subsystem reads them live.
#[derive(Clone)]
pub enum PropValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Style(IndexMap<String, String>),
    Handler(EventHandler),
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Text(a), PropValue::Text(b)) => a == b,
            (PropValue::Number(a), PropValue::Number(b)) => a == b,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Style(a), PropValue::Style(b)) => a == b,
            (PropValue::Handler(a), PropValue::Handler(b)) => {
                Rc::ptr_eq(a, b)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Text(v) => write!(f, "{v:?}"),
            PropValue::Number(v) => write!(f, "{v}"),
            PropValue::Bool(v) => write!(f, "{v}"),
            PropValue::Style(v) => f.debug_map().entries(v.iter()).finish(),
            PropValue::Handler(_) => write!(f, "<handler>"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Text(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Text(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Number(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Number(value as f64)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Number(value as f64)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

/// Ordered attribute map plus nested children.
#[derive(Clone, Default, PartialEq)]
pub struct Props {
    attrs: IndexMap<String, PropValue>,
    children: Vec<Child>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute insertion.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Registers an event handler under `on{Event}` (e.g. `on("click", ..)`
    /// stores `onClick`).
    pub fn on(mut self, event: &str, handler: impl Fn(&mut SyntheticEvent) + 'static) -> Self {
        self.attrs
            .insert(listener_prop(event, false), PropValue::Handler(Rc::new(handler)));
        self
    }

    /// Capture-phase variant of [`Props::on`].
    pub fn on_capture(
        mut self,
        event: &str,
        handler: impl Fn(&mut SyntheticEvent) + 'static,
    ) -> Self {
        self.attrs
            .insert(listener_prop(event, true), PropValue::Handler(Rc::new(handler)));
        self
    }

    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Child>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.attrs.get(name)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&String, &PropValue)> {
        self.attrs.iter()
    }

    pub fn child_list(&self) -> &[Child] {
        &self.children
    }

    /// The direct text content, if the children are exactly one text child.
    /// Hosts apply such text directly instead of reconciling a child fiber.
    pub fn sole_text_child(&self) -> Option<&str> {
        match self.children.as_slice() {
            [Child::Text(text)] => Some(text),
            _ => None,
        }
    }

    pub fn handler(&self, name: &str) -> Option<EventHandler> {
        match self.attrs.get(name) {
            Some(PropValue::Handler(handler)) => Some(Rc::clone(handler)),
            _ => None,
        }
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("attrs", &self.attrs)
            .field("children", &self.children)
            .finish()
    }
}

pub(crate) fn listener_prop(event: &str, capture: bool) -> String {
    let mut name = String::with_capacity(2 + event.len() + 7);
    name.push_str("on");
    let mut chars = event.chars();
    if let Some(first) = chars.next() {
        name.extend(first.to_uppercase());
        name.push_str(chars.as_str());
    }
    if capture {
        name.push_str("Capture");
    }
    name
}

/// A function component: a named render closure. Two component values match
/// for reuse only when they share the same closure allocation, so hold one
/// `Component` and clone it across renders.
#[derive(Clone)]
pub struct Component {
    name: &'static str,
    render: Rc<dyn Fn(&mut RenderCx<'_>, &Props) -> Vec<Child>>,
}

impl Component {
    pub fn new(
        name: &'static str,
        render: impl Fn(&mut RenderCx<'_>, &Props) -> Vec<Child> + 'static,
    ) -> Self {
        Self {
            name,
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn render(&self, cx: &mut RenderCx<'_>, props: &Props) -> Vec<Child> {
        (self.render)(cx, props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ElementType {
    Host(String),
    Component(Component),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub(crate) ty: ElementType,
    pub(crate) key: Option<String>,
    pub(crate) props: Props,
}

impl Element {
    pub fn host(tag: impl Into<String>, props: Props) -> Self {
        Self {
            ty: ElementType::Host(tag.into()),
            key: None,
            props,
        }
    }

    pub fn component(component: &Component, props: Props) -> Self {
        Self {
            ty: ElementType::Component(component.clone()),
            key: None,
            props,
        }
    }

    pub fn keyed(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn ty(&self) -> &ElementType {
        &self.ty
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }
}

/// One entry in a child list. Text and numeric children become implicit
/// text fibers matched by position.
#[derive(Clone, Debug, PartialEq)]
pub enum Child {
    Element(Element),
    Text(String),
}

impl Child {
    pub(crate) fn key(&self) -> Option<&str> {
        match self {
            Child::Element(element) => element.key(),
            Child::Text(_) => None,
        }
    }
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Child::Element(element)
    }
}

/// Text child helper; accepts anything displayable (numbers included).
pub fn text(value: impl ToString) -> Child {
    Child::Text(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_props_compare_by_identity() {
        let handler: EventHandler = Rc::new(|_| {});
        let a = PropValue::Handler(Rc::clone(&handler));
        let b = PropValue::Handler(handler);
        let c = PropValue::Handler(Rc::new(|_| {}));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn listener_prop_names() {
        assert_eq!(listener_prop("click", false), "onClick");
        assert_eq!(listener_prop("click", true), "onClickCapture");
    }

    #[test]
    fn sole_text_child_detection() {
        let props = Props::new().child(text("hello"));
        assert_eq!(props.sole_text_child(), Some("hello"));

        let props = Props::new()
            .child(text("a"))
            .child(Element::host("span", Props::new()));
        assert_eq!(props.sole_text_child(), None);
    }

    #[test]
    fn component_identity_matches_clones_only() {
        let a = Component::new("A", |_, _| Vec::new());
        let b = a.clone();
        let c = Component::new("A", |_, _| Vec::new());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
