use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use derive_ex::derive_ex;

use crate::core::{track, BindSink, NodeId, NotifyContext, SourceBindings, SourceNode};


/// A memoized value derived from other observables.
///
/// The function runs lazily, on the first read after any of its dependencies changed.
/// A change makes the value stale at once, even inside an action, so reads never see an outdated result.
/// Readers depend on the `Computed` itself; a change of its dependencies notifies them
/// whether or not the recomputed value ends up different.
///
/// If the function panics, the previous value is kept and the next read retries.
/// Readers stay subscribed, so a later change of the dependencies reaches them again.
#[derive_ex(Clone, bound())]
pub struct Computed<T: 'static>(Rc<ComputedNode<T>>);

impl<T: 'static> Computed<T> {
    pub fn new(f: impl FnMut() -> T + 'static) -> Self {
        Self(Rc::new(ComputedNode {
            source: SourceNode::new(),
            is_stale: Cell::new(true),
            is_notifying: Cell::new(false),
            value: RefCell::new(None),
            compute: RefCell::new(Box::new(f)),
            sources: RefCell::new(SourceBindings::default()),
        }))
    }

    pub fn id(&self) -> NodeId {
        self.0.source.id()
    }

    /// Number of evaluations so far.
    pub fn version(&self) -> u64 {
        self.0.source.version()
    }
    pub fn observer_count(&self) -> usize {
        self.0.source.observer_count()
    }
    pub fn is_stale(&self) -> bool {
        self.0.is_stale.get()
    }

    /// Calls `f` with the up-to-date value and adds a dependency on this `Computed` to the running computation.
    pub fn with<U>(&self, f: impl FnOnce(&T) -> U) -> U {
        self.0.source.bind();
        self.0.update();
        let value = self.0.value.borrow();
        match &*value {
            Some(value) => f(value),
            None => unreachable!("computed value is evaluated by `update`"),
        }
    }
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }
}

impl<T: std::fmt::Debug + 'static> std::fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("value", &self.0.value.try_borrow().ok())
            .field("is_stale", &self.0.is_stale.get())
            .field("version", &self.0.source.version())
            .finish()
    }
}

#[allow(clippy::type_complexity)]
struct ComputedNode<T: 'static> {
    source: Rc<SourceNode>,
    is_stale: Cell<bool>,
    is_notifying: Cell<bool>,
    value: RefCell<Option<T>>,
    compute: RefCell<Box<dyn FnMut() -> T>>,
    sources: RefCell<SourceBindings>,
}

impl<T: 'static> ComputedNode<T> {
    fn update(self: &Rc<Self>) {
        if !self.is_stale.get() {
            return;
        }
        let Ok(mut compute) = self.compute.try_borrow_mut() else {
            panic!("detect cyclic dependency");
        };
        let sink: Weak<dyn BindSink> = Rc::downgrade(self) as Weak<dyn BindSink>;
        let value = track(sink, &self.sources, || (*compute)());
        *self.value.borrow_mut() = Some(value);
        self.is_stale.set(false);
        self.source.bump_version();
        tracing::trace!(computed = %self.source.id(), "evaluated");
    }
}

impl<T: 'static> BindSink for ComputedNode<T> {
    fn notify(self: Rc<Self>, nc: &mut NotifyContext) {
        self.is_stale.set(true);
        // A failed evaluation may have subscribed this node to itself.
        if self.is_notifying.replace(true) {
            return;
        }
        self.source.notify_sinks(nc);
        self.is_notifying.set(false);
    }
}
