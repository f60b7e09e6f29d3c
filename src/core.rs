//! Runtime plumbing: thread-local globals, dependency tracking and batching.

use std::{
    cell::RefCell,
    marker::PhantomData,
    mem::{replace, take},
    rc::{Rc, Weak},
    sync::atomic::{AtomicU64, Ordering},
    thread::AccessError,
};

use derive_ex::derive_ex;
use parse_display::Display;

use crate::{Error, RuntimeConfig, WritePolicy};

mod batch;
mod bindings;
mod tracker;

pub use batch::{in_action, ActionScope};
pub(crate) use batch::{Batch, Write};
pub(crate) use bindings::{BindSink, NotifyContext, SourceBindings, SourceNode};
pub use tracker::{is_tracking, untracked};
pub(crate) use tracker::track;

#[cfg(test)]
mod tests;

thread_local! {
    static GLOBALS: RefCell<Globals> = RefCell::new(Globals::new());
}

struct Globals {
    is_runtime_exists: bool,
    config: RuntimeConfig,
    action_depth: usize,
    batch_depth: usize,
    is_flushing: bool,
    frames: Vec<tracker::Frame>,
    pending: Vec<Weak<dyn Job>>,
    deferred: Vec<Weak<dyn Job>>,
}
impl Globals {
    fn new() -> Self {
        Self {
            is_runtime_exists: false,
            config: RuntimeConfig::default(),
            action_depth: 0,
            batch_depth: 0,
            is_flushing: false,
            frames: Vec::new(),
            pending: Vec::new(),
            deferred: Vec::new(),
        }
    }
    fn with<T>(f: impl FnOnce(&mut Self) -> T) -> T {
        GLOBALS.with(|g| f(&mut g.borrow_mut()))
    }
    fn try_with<T>(f: impl FnOnce(&mut Self) -> T) -> Result<T, AccessError> {
        GLOBALS.try_with(|g| f(&mut g.borrow_mut()))
    }
    fn assert_exists(&self) {
        if !self.is_runtime_exists {
            panic!("`Runtime` is not created.");
        }
    }
    fn finish_runtime(&mut self) -> Vec<Weak<dyn Job>> {
        self.is_runtime_exists = false;
        self.config = RuntimeConfig::default();
        self.action_depth = 0;
        self.batch_depth = 0;
        self.is_flushing = false;
        let mut jobs = take(&mut self.pending);
        jobs.append(&mut self.deferred);
        jobs
    }
}

/// Something the batch flush can run: in practice, a reaction.
pub(crate) trait Job: 'static {
    fn id(&self) -> ReactionId;
    fn is_disposed(&self) -> bool;
    fn run_scheduled(self: Rc<Self>) -> Result<(), Error>;
    fn cancel_schedule(&self);
}

/// Stable identity of an observable value, collection or computed value.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Display)]
#[display("node#{0}")]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Stable identity of a reaction, assigned at registration.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Display)]
#[display("reaction#{0}")]
pub struct ReactionId(u64);

impl ReactionId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Reactive runtime.
///
/// Owns the dependency tracker and the batching state of the current thread.
/// Only one `Runtime` can exist per thread at a time; dropping it resets that state.
#[derive_ex(Default)]
#[default(Self::new())]
pub struct Runtime {
    _not_send: PhantomData<Rc<()>>,
}
impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }
    pub fn with_config(config: RuntimeConfig) -> Self {
        if Globals::with(|g| replace(&mut g.is_runtime_exists, true)) {
            panic!("Only one `Runtime` can exist in the same thread at the same time.");
        };
        tracing::debug!(
            write_policy = %config.write_policy,
            max_flush_rounds = config.max_flush_rounds,
            "runtime created"
        );
        Globals::with(|g| g.config = config);
        Self {
            _not_send: PhantomData,
        }
    }

    pub fn config(&self) -> RuntimeConfig {
        Globals::with(|g| g.config.clone())
    }

    /// Changes the write policy for every subsequent write on this thread.
    pub fn set_write_policy(&mut self, write_policy: WritePolicy) {
        Globals::with(|g| g.config.write_policy = write_policy);
    }

    /// Number of reactions waiting for the outermost action scope to exit.
    ///
    /// Includes reactions that changed their own dependencies and wait for the next flush.
    pub fn pending_reactions(&self) -> usize {
        Globals::with(|g| g.pending.len() + g.deferred.len())
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        if let Ok(pending) = Globals::try_with(|g| g.finish_runtime()) {
            for job in pending.iter().filter_map(Weak::upgrade) {
                job.cancel_schedule();
            }
        }
        tracing::debug!("runtime dropped");
    }
}
