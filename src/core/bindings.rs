use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use slabmap::SlabMap;

use super::{tracker, Globals, Job, NodeId};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub(crate) struct BindKey(usize);

/// Receives change notifications from the sources it depends on.
pub(crate) trait BindSink: 'static {
    fn notify(self: Rc<Self>, nc: &mut NotifyContext);
}

/// Collects the reactions scheduled by one change notification.
pub(crate) struct NotifyContext {
    scheduled: Vec<Weak<dyn Job>>,
    deferred: Vec<Weak<dyn Job>>,
}
impl NotifyContext {
    fn new() -> Self {
        Self {
            scheduled: Vec::new(),
            deferred: Vec::new(),
        }
    }
    pub fn schedule(&mut self, job: Weak<dyn Job>) {
        self.scheduled.push(job);
    }

    /// Schedules a reaction notified by its own run. It waits for the next flush.
    pub fn defer(&mut self, job: Weak<dyn Job>) {
        self.deferred.push(job);
    }
    fn finish(self) {
        if self.scheduled.is_empty() && self.deferred.is_empty() {
            return;
        }
        let _ = Globals::try_with(|g| {
            g.pending.extend(self.scheduled);
            g.deferred.extend(self.deferred);
        });
    }
}

struct SinkBinding {
    sink: Weak<dyn BindSink>,
}

/// The subscriber set of a source.
pub(crate) struct SinkBindings(SlabMap<SinkBinding>);

impl SinkBindings {
    fn new() -> Self {
        Self(SlabMap::new())
    }
    fn insert(&mut self, sink: Weak<dyn BindSink>) -> BindKey {
        BindKey(self.0.insert(SinkBinding { sink }))
    }
    fn remove(&mut self, key: BindKey) {
        self.0.remove(key.0);
    }
    fn live_sinks(&self) -> Vec<Rc<dyn BindSink>> {
        self.0.values().filter_map(|b| b.sink.upgrade()).collect()
    }
    fn len(&self) -> usize {
        self.0.len()
    }
}

/// The tracked half of every observable: identity, version and subscribers.
pub(crate) struct SourceNode {
    id: NodeId,
    version: Cell<u64>,
    sinks: RefCell<SinkBindings>,
}
impl SourceNode {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            id: NodeId::next(),
            version: Cell::new(0),
            sinks: RefCell::new(SinkBindings::new()),
        })
    }
    pub fn id(&self) -> NodeId {
        self.id
    }
    pub fn version(&self) -> u64 {
        self.version.get()
    }
    pub fn observer_count(&self) -> usize {
        self.sinks.borrow().len()
    }

    /// Registers this source as a dependency of the running computation, if any.
    pub fn bind(self: &Rc<Self>) {
        tracker::bind(self);
    }
    pub fn bump_version(&self) {
        self.version.set(self.version.get() + 1);
    }

    /// Records an applied mutation and notifies every dependent.
    pub fn mark_changed(&self) {
        self.bump_version();
        let mut nc = NotifyContext::new();
        self.notify_sinks(&mut nc);
        nc.finish();
    }
    pub fn notify_sinks(&self, nc: &mut NotifyContext) {
        let sinks = self.sinks.borrow().live_sinks();
        for sink in sinks {
            sink.notify(nc);
        }
    }

    pub(super) fn subscribe(&self, sink: Weak<dyn BindSink>) -> BindKey {
        self.sinks.borrow_mut().insert(sink)
    }
}

struct SourceBinding {
    source: Weak<SourceNode>,
    id: NodeId,
    key: BindKey,
}
impl SourceBinding {
    fn unbind(self) {
        if let Some(source) = self.source.upgrade() {
            source.sinks.borrow_mut().remove(self.key);
        }
    }
}

/// The dependency set of a computation.
#[derive(Default)]
pub(crate) struct SourceBindings(Vec<SourceBinding>);

impl SourceBindings {
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn contains(&self, id: NodeId) -> bool {
        self.0.iter().any(|b| b.id == id)
    }
    pub fn ids(&self) -> Vec<NodeId> {
        self.0.iter().map(|b| b.id).collect()
    }
    pub fn clear(&mut self) {
        for b in self.0.drain(..) {
            b.unbind();
        }
    }

    /// Reverses the order, so that the binding read first is popped first.
    pub(super) fn reverse(&mut self) {
        self.0.reverse();
    }

    /// Moves the binding for `source` out of `old` if it exists, otherwise subscribes anew.
    ///
    /// `old` is in reverse read order. The caller ensures `source` is not bound yet.
    pub(super) fn bind_from(
        &mut self,
        old: &mut SourceBindings,
        source: &Rc<SourceNode>,
        sink: &Weak<dyn BindSink>,
    ) {
        let id = source.id();
        // Sources are usually read in the same order on every run.
        let binding = if old.0.last().is_some_and(|b| b.id == id) {
            old.0.pop()
        } else {
            old.0
                .iter()
                .position(|b| b.id == id)
                .map(|index| old.0.remove(index))
        };
        let binding = binding.unwrap_or_else(|| SourceBinding {
            source: Rc::downgrade(source),
            id,
            key: source.subscribe(sink.clone()),
        });
        self.0.push(binding);
    }
}
impl Drop for SourceBindings {
    fn drop(&mut self) {
        self.clear();
    }
}
