//! Component-local state: the hook engine.
//!
//! Hooks are paired across renders by call position, never by name. A fiber
//! must invoke the same hooks in the same order on every render for its
//! lifetime; the engine does not guard against reordering beyond what the
//! typed downcasts happen to catch.
//!
//! All hook calls go through a [`RenderCx`], the explicit render-session
//! context threaded into the component function. One context exists per
//! component invocation, which makes the "one render in flight" rule a
//! structural property instead of a global-reset discipline.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::element::Child;
use crate::fiber::{FiberArena, FiberId, FiberState};
use crate::flags::{FiberFlags, HookFlags};
use crate::root::RootHandle;

pub(crate) type DynReducer = Rc<dyn Fn(&dyn Any, &dyn Any) -> Rc<dyn Any>>;
pub(crate) type DynEq = Rc<dyn Fn(&dyn Any, &dyn Any) -> bool>;

/// Cleanup returned by an effect's create callback.
pub type EffectCleanup = Box<dyn FnOnce()>;
pub(crate) type EffectCreate = Rc<dyn Fn() -> Option<EffectCleanup>>;

/// Per-hook update queue, shared between the current and work-in-progress
/// copies of a hook. Pending actions are folded FIFO on the next render.
pub struct HookQueue {
    pub(crate) pending: RefCell<Vec<Rc<dyn Any>>>,
    /// Latest reducer closure; refreshed each render so captured
    /// environment stays current.
    pub(crate) reducer: RefCell<DynReducer>,
    /// Present for state hooks only; enables the eager dispatch bail-out.
    pub(crate) eq: Option<DynEq>,
    /// State as of the last completed render; the basis for eager dispatch.
    pub(crate) last_rendered: RefCell<Rc<dyn Any>>,
}

/// One effect record. Shared between renders through `Rc`, so the pending
/// destroy callback carries across re-renders untouched.
pub struct EffectState {
    pub(crate) flags: Cell<HookFlags>,
    pub(crate) create: RefCell<EffectCreate>,
    pub(crate) destroy: RefCell<Option<EffectCleanup>>,
    pub(crate) deps: RefCell<Option<Vec<Dep>>>,
}

/// One hook call's memoized record, one per call site in call order.
#[derive(Clone)]
pub struct Hook {
    pub(crate) memo: HookMemo,
}

#[derive(Clone)]
pub(crate) enum HookMemo {
    State {
        state: Rc<dyn Any>,
        queue: Rc<HookQueue>,
    },
    Effect(Rc<EffectState>),
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.memo {
            HookMemo::State { .. } => write!(f, "Hook::State"),
            HookMemo::Effect(effect) => {
                write!(f, "Hook::Effect({:?})", effect.flags.get())
            }
        }
    }
}

/// One dependency slot. Compared per slot by value; reference-typed
/// dependencies go through [`Dep::ptr`] and compare by identity. Float
/// slots treat NaN as equal to itself, so a NaN dependency is stable
/// instead of re-running its effect every render.
#[derive(Clone, Debug)]
pub enum Dep {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Ptr(usize),
}

impl PartialEq for Dep {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Dep::Unit, Dep::Unit) => true,
            (Dep::Bool(a), Dep::Bool(b)) => a == b,
            (Dep::Int(a), Dep::Int(b)) => a == b,
            (Dep::Float(a), Dep::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Dep::Text(a), Dep::Text(b)) => a == b,
            (Dep::Ptr(a), Dep::Ptr(b)) => a == b,
            _ => false,
        }
    }
}

impl Dep {
    pub fn ptr<T>(value: &Rc<T>) -> Dep {
        Dep::Ptr(Rc::as_ptr(value) as usize)
    }
}

impl From<bool> for Dep {
    fn from(value: bool) -> Self {
        Dep::Bool(value)
    }
}

impl From<i32> for Dep {
    fn from(value: i32) -> Self {
        Dep::Int(value as i64)
    }
}

impl From<i64> for Dep {
    fn from(value: i64) -> Self {
        Dep::Int(value)
    }
}

impl From<usize> for Dep {
    fn from(value: usize) -> Self {
        Dep::Int(value as i64)
    }
}

impl From<f64> for Dep {
    fn from(value: f64) -> Self {
        Dep::Float(value)
    }
}

impl From<&str> for Dep {
    fn from(value: &str) -> Self {
        Dep::Text(value.to_owned())
    }
}

impl From<String> for Dep {
    fn from(value: String) -> Self {
        Dep::Text(value)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum HookMode {
    Mount,
    Update,
}

/// Dispatcher for a reducer hook. Cheap to clone; safe to move into event
/// handlers and effects. Dispatching stages an update and schedules a
/// render pass; dispatching during a render is a contract violation.
pub struct Dispatch<A> {
    handle: RootHandle,
    fiber: FiberId,
    queue: Rc<HookQueue>,
    _marker: PhantomData<fn(A)>,
}

impl<A: 'static> Dispatch<A> {
    pub fn dispatch(&self, action: A) {
        self.handle
            .dispatch_hook_action(self.fiber, Rc::clone(&self.queue), Rc::new(action));
    }
}

impl<A> Clone for Dispatch<A> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            fiber: self.fiber,
            queue: Rc::clone(&self.queue),
            _marker: PhantomData,
        }
    }
}

/// Setter half of [`RenderCx::use_state`]. Setting a value equal to the
/// previous render's state is a no-op (no update queued, no render).
pub struct SetState<T> {
    inner: Dispatch<T>,
}

impl<T: Clone + PartialEq + 'static> SetState<T> {
    pub fn set(&self, value: T) {
        self.inner.dispatch(value);
    }
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// The render-session context handed to a function component. Valid only
/// for the duration of that component's invocation.
pub struct RenderCx<'a> {
    handle: RootHandle,
    fiber: FiberId,
    mode: HookMode,
    old_hooks: &'a [Hook],
    hook_index: usize,
    hooks: Vec<Hook>,
    effects: Vec<Rc<EffectState>>,
    flags: FiberFlags,
}

impl<'a> RenderCx<'a> {
    /// Reducer hook: folds dispatched actions through `reducer` in FIFO
    /// order on the render after they are dispatched.
    pub fn use_reducer<T, A>(
        &mut self,
        reducer: impl Fn(&T, &A) -> T + 'static,
        init: impl FnOnce() -> T,
    ) -> (T, Dispatch<A>)
    where
        T: Clone + 'static,
        A: 'static,
    {
        let dyn_reducer: DynReducer = Rc::new(move |state, action| {
            let state = state
                .downcast_ref::<T>()
                .expect("hook state type changed between renders");
            let action = action
                .downcast_ref::<A>()
                .expect("dispatched action type does not match the hook");
            Rc::new(reducer(state, action))
        });
        let (state, queue) = self.reducer_hook(dyn_reducer, None, || Rc::new(init()));
        let value = state
            .downcast_ref::<T>()
            .expect("hook state type changed between renders")
            .clone();
        (
            value,
            Dispatch {
                handle: self.handle.clone(),
                fiber: self.fiber,
                queue,
                _marker: PhantomData,
            },
        )
    }

    /// State hook: a reducer whose action is the next state. Dispatch
    /// computes the eager result immediately; an identical value bails out
    /// without queueing anything.
    pub fn use_state<T>(&mut self, init: impl FnOnce() -> T) -> (T, SetState<T>)
    where
        T: Clone + PartialEq + 'static,
    {
        let dyn_reducer: DynReducer = Rc::new(|_state, action| {
            let action = action
                .downcast_ref::<T>()
                .expect("state value type changed between renders");
            Rc::new(action.clone())
        });
        let eq: DynEq = Rc::new(|a, b| {
            match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        });
        let (state, queue) = self.reducer_hook(dyn_reducer, Some(eq), || Rc::new(init()));
        let value = state
            .downcast_ref::<T>()
            .expect("hook state type changed between renders")
            .clone();
        (
            value,
            SetState {
                inner: Dispatch {
                    handle: self.handle.clone(),
                    fiber: self.fiber,
                    queue,
                    _marker: PhantomData,
                },
            },
        )
    }

    /// Passive effect: runs after commit, destroy-before-create across the
    /// whole commit. `deps: None` re-runs every render; `Some(vec![])` runs
    /// once at mount and cleans up at unmount.
    pub fn use_effect(
        &mut self,
        deps: Option<Vec<Dep>>,
        create: impl Fn() -> Option<EffectCleanup> + 'static,
    ) {
        self.effect_hook(HookFlags::PASSIVE, FiberFlags::PASSIVE, deps, Rc::new(create));
    }

    /// Layout effect: runs synchronously after the mutation pass, before
    /// the passive pass, with host instances already updated.
    pub fn use_layout_effect(
        &mut self,
        deps: Option<Vec<Dep>>,
        create: impl Fn() -> Option<EffectCleanup> + 'static,
    ) {
        self.effect_hook(HookFlags::LAYOUT, FiberFlags::UPDATE, deps, Rc::new(create));
    }

    fn reducer_hook(
        &mut self,
        reducer: DynReducer,
        eq: Option<DynEq>,
        init: impl FnOnce() -> Rc<dyn Any>,
    ) -> (Rc<dyn Any>, Rc<HookQueue>) {
        let index = self.hook_index;
        self.hook_index += 1;
        match self.mode {
            HookMode::Mount => {
                let state = init();
                let queue = Rc::new(HookQueue {
                    pending: RefCell::new(Vec::new()),
                    reducer: RefCell::new(reducer),
                    eq,
                    last_rendered: RefCell::new(Rc::clone(&state)),
                });
                self.hooks.push(Hook {
                    memo: HookMemo::State {
                        state: Rc::clone(&state),
                        queue: Rc::clone(&queue),
                    },
                });
                (state, queue)
            }
            HookMode::Update => {
                let old = self.old_hooks.get(index).unwrap_or_else(|| {
                    panic!("rendered more hooks than during the previous render")
                });
                let HookMemo::State { state, queue } = &old.memo else {
                    panic!("hook call order changed between renders");
                };
                *queue.reducer.borrow_mut() = reducer;
                let pending: Vec<Rc<dyn Any>> = queue.pending.borrow_mut().drain(..).collect();
                let mut next = Rc::clone(state);
                for action in pending {
                    let folded = (queue.reducer.borrow())(&*next, &*action);
                    next = folded;
                }
                *queue.last_rendered.borrow_mut() = Rc::clone(&next);
                let queue = Rc::clone(queue);
                self.hooks.push(Hook {
                    memo: HookMemo::State {
                        state: Rc::clone(&next),
                        queue: Rc::clone(&queue),
                    },
                });
                (next, queue)
            }
        }
    }

    fn effect_hook(
        &mut self,
        phase: HookFlags,
        fiber_bit: FiberFlags,
        deps: Option<Vec<Dep>>,
        create: EffectCreate,
    ) {
        let index = self.hook_index;
        self.hook_index += 1;
        match self.mode {
            HookMode::Mount => {
                let effect = Rc::new(EffectState {
                    flags: Cell::new(phase | HookFlags::HAS_EFFECT),
                    create: RefCell::new(create),
                    destroy: RefCell::new(None),
                    deps: RefCell::new(deps),
                });
                self.flags |= fiber_bit;
                self.effects.push(Rc::clone(&effect));
                self.hooks.push(Hook {
                    memo: HookMemo::Effect(effect),
                });
            }
            HookMode::Update => {
                let old = self.old_hooks.get(index).unwrap_or_else(|| {
                    panic!("rendered more hooks than during the previous render")
                });
                let HookMemo::Effect(effect) = &old.memo else {
                    panic!("hook call order changed between renders");
                };
                let effect = Rc::clone(effect);
                let unchanged = match (&deps, effect.deps.borrow().as_ref()) {
                    (Some(new), Some(prev)) => new == prev,
                    _ => false,
                };
                if unchanged {
                    // Relink clean: keeps list order without scheduling work.
                    effect.flags.set(phase);
                } else {
                    effect.flags.set(phase | HookFlags::HAS_EFFECT);
                    *effect.create.borrow_mut() = create;
                    self.flags |= fiber_bit;
                }
                *effect.deps.borrow_mut() = deps;
                self.effects.push(Rc::clone(&effect));
                self.hooks.push(Hook {
                    memo: HookMemo::Effect(effect),
                });
            }
        }
    }
}

/// Invokes a function component inside a fresh hook session and installs
/// the resulting hook and effect lists on the work-in-progress fiber.
pub(crate) fn render_with_hooks(
    arena: &mut FiberArena,
    handle: &RootHandle,
    current: Option<FiberId>,
    wip: FiberId,
) -> Vec<Child> {
    let component = arena[wip]
        .component()
        .cloned()
        .expect("function component fiber without a component type");
    let props = arena[wip].pending_props.clone();
    let old_hooks: Vec<Hook> = current
        .and_then(|c| arena[c].hooks().map(<[Hook]>::to_vec))
        .unwrap_or_default();
    let mode = if current.is_some() && !old_hooks.is_empty() {
        HookMode::Update
    } else {
        HookMode::Mount
    };

    let mut cx = RenderCx {
        handle: handle.clone(),
        fiber: wip,
        mode,
        old_hooks: &old_hooks,
        hook_index: 0,
        hooks: Vec::new(),
        effects: Vec::new(),
        flags: FiberFlags::empty(),
    };
    let children = component.render(&mut cx, &props);

    let RenderCx {
        hooks,
        effects,
        flags,
        ..
    } = cx;
    let fiber = &mut arena[wip];
    fiber.memoized_state = FiberState::Hooks(hooks);
    fiber.effects = effects;
    fiber.flags |= flags;
    children
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deps_compare_per_slot() {
        let a = vec![Dep::from(1), Dep::from("x")];
        let b = vec![Dep::from(1), Dep::from("x")];
        let c = vec![Dep::from(2), Dep::from("x")];
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn nan_float_deps_are_stable() {
        let a = vec![Dep::from(f64::NAN)];
        let b = vec![Dep::from(f64::NAN)];
        assert_eq!(a, b);
        assert_ne!(vec![Dep::from(f64::NAN)], vec![Dep::from(0.0)]);
        assert_eq!(vec![Dep::from(1.5)], vec![Dep::from(1.5)]);
    }

    #[test]
    fn ptr_deps_compare_by_identity() {
        let value = Rc::new(41);
        let same = Dep::ptr(&value);
        let other = Dep::ptr(&Rc::new(41));
        assert_eq!(Dep::ptr(&value), same);
        assert_ne!(same, other);
    }
}
