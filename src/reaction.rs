use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use parse_display::Display;

use crate::{
    core::{
        track, untracked, Batch, BindSink, Job, NodeId, NotifyContext, ReactionId, SourceBindings,
    },
    Error,
};


/// Lifecycle of a reaction.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Display)]
#[display(style = "snake_case")]
pub enum ReactionState {
    /// Registered, not yet run.
    Pending,
    /// Has run at least once and is subscribed to what it read last.
    Active,
    /// Unsubscribed from everything; never runs again.
    Disposed,
}

/// Call a function now, and again each time an observable it read changes.
///
/// The function runs once immediately to establish its dependencies.
/// Afterwards it re-runs once per outermost action scope exit in which a dependency changed,
/// and each run replaces the dependency set with exactly what that run read.
///
/// If a run writes to one of its own dependencies, the re-run waits for the next flush
/// instead of repeating within the current one.
///
/// If the [`ReactionHandle`] returned from this function is dropped or disposed, the function will not be called again.
pub fn reaction(mut f: impl FnMut() + 'static) -> Result<ReactionHandle, Error> {
    ReactionHandle::register(Box::new(move |_| f()))
}

/// Like [`reaction`], but hands the result of each re-run of `track` to `on_invalidate`.
///
/// `track` runs tracked, immediately and on every change of what it read.
/// `on_invalidate` runs untracked after each re-run (not after the first run),
/// which is where a view layer re-renders the unit bound to this reaction.
pub fn reaction_with<T: 'static>(
    mut track: impl FnMut() -> T + 'static,
    mut on_invalidate: impl FnMut(T) + 'static,
) -> Result<ReactionHandle, Error> {
    ReactionHandle::register(Box::new(move |kind| {
        let value = track();
        if kind == RunKind::Rerun {
            untracked(|| on_invalidate(value));
        }
    }))
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum RunKind {
    Initial,
    Rerun,
}

/// Handle of a registered reaction.
///
/// Dropping the handle disposes the reaction.
#[must_use]
pub struct ReactionHandle(Rc<ReactionNode>);

impl ReactionHandle {
    fn register(body: Box<dyn FnMut(RunKind)>) -> Result<Self, Error> {
        let node = Rc::new(ReactionNode {
            id: ReactionId::next(),
            state: Cell::new(ReactionState::Pending),
            is_scheduled: Cell::new(false),
            run_count: Cell::new(0),
            body: RefCell::new(body),
            sources: RefCell::new(SourceBindings::default()),
        });
        tracing::debug!(reaction = %node.id, "reaction created");
        let this = Self(node);
        this.0.run_in_batch(RunKind::Initial)?;
        Ok(this)
    }

    pub fn id(&self) -> ReactionId {
        self.0.id
    }
    pub fn state(&self) -> ReactionState {
        self.0.state.get()
    }
    pub fn is_disposed(&self) -> bool {
        self.0.is_disposed()
    }

    /// Number of completed runs, the initial one included.
    pub fn run_count(&self) -> u64 {
        self.0.run_count.get()
    }

    /// Number of observables read by the last run.
    pub fn dependency_count(&self) -> usize {
        self.0.sources.borrow().len()
    }
    pub fn dependencies(&self) -> Vec<NodeId> {
        self.0.sources.borrow().ids()
    }
    pub fn depends_on(&self, id: NodeId) -> bool {
        self.0.sources.borrow().contains(id)
    }

    /// Re-runs the reaction now, as if one of its dependencies had changed.
    ///
    /// Does nothing if the reaction is disposed.
    /// Fails with [`Error::ReentrantReaction`] when called from the reaction's own body.
    pub fn run(&self) -> Result<(), Error> {
        self.0.run_in_batch(RunKind::Rerun)
    }

    /// Unsubscribes from every dependency. The reaction never runs again. Idempotent.
    pub fn dispose(&self) {
        self.0.dispose();
    }
}
impl Drop for ReactionHandle {
    fn drop(&mut self) {
        self.0.dispose();
    }
}
impl std::fmt::Debug for ReactionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactionHandle")
            .field("id", &self.0.id)
            .field("state", &self.0.state.get())
            .field("run_count", &self.0.run_count.get())
            .finish()
    }
}

struct ReactionNode {
    id: ReactionId,
    state: Cell<ReactionState>,
    is_scheduled: Cell<bool>,
    run_count: Cell<u64>,
    body: RefCell<Box<dyn FnMut(RunKind)>>,
    sources: RefCell<SourceBindings>,
}

impl ReactionNode {
    fn is_disposed(&self) -> bool {
        self.state.get() == ReactionState::Disposed
    }

    /// Runs inside a batch, so writes made by the body are flushed after it returns.
    fn run_in_batch(self: &Rc<Self>, kind: RunKind) -> Result<(), Error> {
        let batch = Batch::enter();
        let ret = self.run(kind);
        let flushed = batch.exit();
        ret?;
        flushed
    }

    fn run(self: &Rc<Self>, kind: RunKind) -> Result<(), Error> {
        if self.is_disposed() {
            return Ok(());
        }
        let Ok(mut body) = self.body.try_borrow_mut() else {
            return Err(Error::ReentrantReaction(self.id));
        };
        self.is_scheduled.set(false);
        tracing::trace!(reaction = %self.id, ?kind, "run");
        let sink: Weak<dyn BindSink> = Rc::downgrade(self) as Weak<dyn BindSink>;
        track(sink, &self.sources, || (*body)(kind));
        drop(body);
        self.run_count.set(self.run_count.get() + 1);
        if self.is_disposed() {
            self.sources.borrow_mut().clear();
        } else {
            self.state.set(ReactionState::Active);
        }
        Ok(())
    }

    fn dispose(&self) {
        if self.state.replace(ReactionState::Disposed) == ReactionState::Disposed {
            return;
        }
        self.sources.borrow_mut().clear();
        tracing::debug!(reaction = %self.id, "reaction disposed");
    }
}

impl BindSink for ReactionNode {
    fn notify(self: Rc<Self>, nc: &mut NotifyContext) {
        if self.is_disposed() || self.is_scheduled.replace(true) {
            return;
        }
        let job = Rc::downgrade(&self) as Weak<dyn Job>;
        // The body is borrowed while it runs.
        if self.body.try_borrow().is_err() {
            nc.defer(job);
        } else {
            nc.schedule(job);
        }
    }
}

impl Job for ReactionNode {
    fn id(&self) -> ReactionId {
        self.id
    }
    fn is_disposed(&self) -> bool {
        ReactionNode::is_disposed(self)
    }
    fn run_scheduled(self: Rc<Self>) -> Result<(), Error> {
        self.run_in_batch(RunKind::Rerun)
    }
    fn cancel_schedule(&self) {
        self.is_scheduled.set(false);
    }
}
