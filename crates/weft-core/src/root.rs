//! The root: owns the fiber arena, the host adapter, and the current tree,
//! and drives render passes through a scheduler.
//!
//! [`Root`] is the strong owner. [`RootHandle`] is a weak reference cloned
//! into dispatchers, event handlers, and scheduled work; once the root is
//! dropped, everything through a handle becomes a no-op.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use hashbrown::HashMap;

use crate::commit::{commit_work, CommitPass};
use crate::element::Element;
use crate::events::{plan_dispatch, SyntheticEvent};
use crate::fiber::{FiberArena, FiberId, PendingContent};
use crate::hooks::HookQueue;
use crate::host::{HostAdapter, HostError, InstanceId};
use crate::scheduler::{QueueScheduler, Scheduler};
use crate::update_queue::{flush_staged, StagedUpdate};
use crate::work_loop::{render_root_sync, RenderPass};

pub struct Root {
    inner: Rc<RootInner>,
    /// Present when the root owns its scheduler; lets `flush_work` drive it.
    own_queue: Option<Rc<QueueScheduler>>,
}

pub(crate) struct RootInner {
    arena: RefCell<FiberArena>,
    host: RefCell<Box<dyn HostAdapter>>,
    container: InstanceId,
    current: Cell<FiberId>,
    staged: RefCell<Vec<StagedUpdate>>,
    scheduler: Rc<dyn Scheduler>,
    work_scheduled: Cell<bool>,
    rendering: Cell<bool>,
    instance_to_fiber: RefCell<HashMap<InstanceId, FiberId>>,
    /// First failure from a scheduled pass, surfaced by `flush_work`.
    pending_error: RefCell<Option<HostError>>,
}

impl Root {
    /// Root with a self-owned manual scheduler; drive it with
    /// [`Root::flush_work`].
    pub fn new(host: Box<dyn HostAdapter>, container: InstanceId) -> Self {
        let queue = Rc::new(QueueScheduler::new());
        let mut root = Self::with_scheduler(host, container, Rc::clone(&queue) as Rc<dyn Scheduler>);
        root.own_queue = Some(queue);
        root
    }

    pub fn with_scheduler(
        host: Box<dyn HostAdapter>,
        container: InstanceId,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        let mut arena = FiberArena::new();
        let current = arena.create_host_root(container);
        Self {
            inner: Rc::new(RootInner {
                arena: RefCell::new(arena),
                host: RefCell::new(host),
                container,
                current: Cell::new(current),
                staged: RefCell::new(Vec::new()),
                scheduler,
                work_scheduled: Cell::new(false),
                rendering: Cell::new(false),
                instance_to_fiber: RefCell::new(HashMap::new()),
                pending_error: RefCell::new(None),
            }),
            own_queue: None,
        }
    }

    pub fn handle(&self) -> RootHandle {
        RootHandle(Rc::downgrade(&self.inner))
    }

    pub fn container(&self) -> InstanceId {
        self.inner.container
    }

    /// Stages a new root element and schedules a pass. Several calls before
    /// the pass runs collapse into one render of the last element.
    pub fn render(&self, element: Element) {
        self.inner
            .staged
            .borrow_mut()
            .push(StagedUpdate::Root { element });
        RootInner::ensure_scheduled(&self.inner);
    }

    /// Runs scheduled work to quiescence (only meaningful with the
    /// self-owned scheduler) and surfaces the first host failure, if any.
    pub fn flush_work(&self) -> Result<(), HostError> {
        if let Some(queue) = &self.own_queue {
            queue.drain();
        }
        match self.inner.pending_error.borrow_mut().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn has_pending_work(&self) -> bool {
        self.inner.work_scheduled.get()
    }

    /// Dispatches a synthetic event against a host instance. Returns true
    /// when some handler called `prevent_default`.
    pub fn dispatch_event(&self, target: InstanceId, event_type: &str) -> bool {
        let plan = {
            let arena = self.inner.arena.borrow();
            let map = self.inner.instance_to_fiber.borrow();
            let Some(&fiber) = map.get(&target) else {
                log::debug!("event {event_type:?} on unknown instance {target}");
                return false;
            };
            plan_dispatch(&arena, fiber, event_type)
        };
        let mut event = SyntheticEvent::new(event_type, target);
        plan.run(&mut event);
        event.is_default_prevented()
    }

    /// Borrows the host adapter as a concrete type.
    pub fn with_host<H: HostAdapter, R>(&self, f: impl FnOnce(&mut H) -> R) -> Option<R> {
        let mut host = self.inner.host.borrow_mut();
        (**host).as_any_mut().downcast_mut::<H>().map(f)
    }
}

impl RootInner {
    fn ensure_scheduled(inner: &Rc<RootInner>) {
        if inner.work_scheduled.replace(true) {
            return;
        }
        let weak = Rc::downgrade(inner);
        inner.scheduler.schedule(Box::new(move || {
            let Some(inner) = weak.upgrade() else { return };
            inner.work_scheduled.set(false);
            if let Err(err) = RootInner::perform_work(&inner) {
                log::error!("render pass failed: {err}");
                let mut pending = inner.pending_error.borrow_mut();
                if pending.is_none() {
                    *pending = Some(err);
                }
            }
        }));
    }

    /// One full pass: prepare the work-in-progress root, flush every staged
    /// update into it, render to completion, commit, swap.
    fn perform_work(inner: &Rc<RootInner>) -> Result<(), HostError> {
        let handle = RootHandle(Rc::downgrade(inner));
        let mut arena = inner.arena.borrow_mut();
        let mut host = inner.host.borrow_mut();

        let current_root = inner.current.get();
        let wip_root = arena.create_work_in_progress(current_root, PendingContent::FromCurrent);
        let staged: Vec<StagedUpdate> = inner.staged.borrow_mut().drain(..).collect();
        log::debug!("render pass: {} staged update(s)", staged.len());
        flush_staged(&mut arena, wip_root, staged);

        inner.rendering.set(true);
        let rendered = {
            let mut pass = RenderPass {
                arena: &mut arena,
                host: &mut **host,
                handle,
            };
            render_root_sync(&mut pass, wip_root)
        };
        inner.rendering.set(false);
        // A failed render commits nothing; the current tree stays live.
        rendered?;

        {
            let mut pass = CommitPass {
                arena: &mut arena,
                host: &mut **host,
                container: inner.container,
            };
            commit_work(&mut pass, wip_root)?;
        }
        // The finished tree becomes current only after every commit pass
        // has run against it.
        inner.current.set(wip_root);
        log::debug!("committed pass; tree swapped");
        Self::refresh_instance_map(&arena, &mut inner.instance_to_fiber.borrow_mut(), wip_root);
        Ok(())
    }

    fn refresh_instance_map(
        arena: &FiberArena,
        map: &mut HashMap<InstanceId, FiberId>,
        root: FiberId,
    ) {
        map.clear();
        let mut node = arena[root].child;
        while let Some(fiber) = node {
            if arena[fiber].tag.is_host() {
                if let Some(instance) = arena[fiber].state_node {
                    map.insert(instance, fiber);
                }
            }
            // Preorder walk with explicit climb.
            if let Some(child) = arena[fiber].child {
                node = Some(child);
                continue;
            }
            let mut cursor = fiber;
            loop {
                if cursor == root {
                    return;
                }
                if let Some(sibling) = arena[cursor].sibling {
                    node = Some(sibling);
                    break;
                }
                match arena[cursor].return_ {
                    Some(parent) => cursor = parent,
                    None => return,
                }
            }
        }
    }
}

/// Weak reference to a root, safe to store anywhere user code lives.
#[derive(Clone)]
pub struct RootHandle(Weak<RootInner>);

impl RootHandle {
    pub(crate) fn dispatch_hook_action(
        &self,
        fiber: FiberId,
        queue: Rc<HookQueue>,
        action: Rc<dyn Any>,
    ) {
        let Some(inner) = self.0.upgrade() else { return };
        if inner.rendering.get() {
            panic!("cannot dispatch a state update while rendering");
        }

        // Eager bail-out: with nothing pending for this queue, the next
        // state is computable now; an unchanged value never renders.
        if let Some(eq) = &queue.eq {
            let queue_idle = queue.pending.borrow().is_empty()
                && !inner.staged.borrow().iter().any(|staged| {
                    matches!(staged, StagedUpdate::Hook { queue: q, .. } if Rc::ptr_eq(q, &queue))
                });
            if queue_idle {
                let last = Rc::clone(&queue.last_rendered.borrow());
                let eager = (queue.reducer.borrow())(&*last, &*action);
                if eq(&*eager, &*last) {
                    return;
                }
            }
        }

        inner.staged.borrow_mut().push(StagedUpdate::Hook {
            fiber,
            queue,
            action,
        });
        RootInner::ensure_scheduled(&inner);
    }
}
