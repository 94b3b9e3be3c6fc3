//! A fiber-based UI reconciliation engine.
//!
//! Renders element trees produced by function components into an arbitrary
//! host through a [`host::HostAdapter`]. The engine keeps two fiber trees:
//! the committed current tree and a work-in-progress tree built by diffing
//! freshly rendered elements against it. A finished pass commits in three
//! stages (mutation, layout, passive effects) and then swaps the trees.
//!
//! ```
//! use weft_core::element::{text, Component, Element, Props};
//! use weft_core::host::MemoryHost;
//! use weft_core::root::Root;
//!
//! let counter = Component::new("Counter", |cx, _props| {
//!     let (count, set_count) = cx.use_state(|| 0);
//!     vec![Element::host(
//!         "button",
//!         Props::new()
//!             .on("click", move |_| set_count.set(count + 1))
//!             .child(text(count)),
//!     )
//!     .into()]
//! });
//!
//! let host = MemoryHost::new();
//! let container = host.create_container();
//! let root = Root::new(Box::new(host.clone()), container);
//! root.render(Element::component(&counter, Props::new()));
//! root.flush_work().unwrap();
//! assert_eq!(host.text_content(container), "0");
//! ```

pub mod element;
pub mod events;
pub mod fiber;
pub mod flags;
pub mod hooks;
pub mod host;
pub mod root;
pub mod scheduler;

mod begin;
mod commit;
mod complete;
mod reconcile;
mod update_queue;
mod work_loop;

pub use element::{text, Child, Component, Element, ElementType, EventHandler, PropValue, Props};
pub use events::SyntheticEvent;
pub use hooks::{Dep, Dispatch, EffectCleanup, RenderCx, SetState};
pub use host::{
    diff_props, HostAdapter, HostError, HostMutation, InstanceId, MemoryHost, PropPatch,
    UpdatePayload,
};
pub use root::{Root, RootHandle};
pub use scheduler::{QueueScheduler, Scheduler};
