use std::{
    any::Any,
    marker::PhantomData,
    mem::{forget, swap, take},
    panic::{catch_unwind, resume_unwind, AssertUnwindSafe},
};

use super::Globals;
use crate::{Error, WritePolicy};

/// Defers reaction runs until the outermost batch exits.
///
/// Every [`ActionScope`] is a batch. Registering or re-running a reaction opens a batch
/// that does not count as an action, so writes inside a reaction body still follow the write policy.
pub(crate) struct Batch {
    is_action: bool,
    _not_send: PhantomData<*const ()>,
}
impl Batch {
    pub fn enter() -> Self {
        Self::enter_with(false)
    }
    fn enter_with(is_action: bool) -> Self {
        Globals::with(|g| {
            g.assert_exists();
            if is_action {
                g.action_depth += 1;
            }
            g.batch_depth += 1;
        });
        Self {
            is_action,
            _not_send: PhantomData,
        }
    }

    /// Leaves the batch and, if it was the outermost one, runs the pending reactions.
    pub fn exit(self) -> Result<(), Error> {
        let need_flush = self.leave();
        forget(self);
        if need_flush {
            flush()
        } else {
            Ok(())
        }
    }
    fn leave(&self) -> bool {
        Globals::try_with(|g| {
            if self.is_action {
                g.action_depth -= 1;
            }
            g.batch_depth -= 1;
            g.batch_depth == 0
                && !g.is_flushing
                && !(g.pending.is_empty() && g.deferred.is_empty())
        })
        .unwrap_or(false)
    }
}
impl Drop for Batch {
    fn drop(&mut self) {
        // Reached only on unwind: the pending reactions wait for the next outermost exit.
        self.leave();
    }
}

/// A batching boundary around mutations.
///
/// Writes inside the scope only mark their dependents; reactions run once each when the
/// outermost scope exits. Scopes nest: inner exits extend the same batch.
///
/// Prefer [`action`](crate::action), which pairs `enter` and `exit` automatically.
#[must_use]
pub struct ActionScope(Option<Batch>);

impl ActionScope {
    pub fn enter() -> Self {
        let batch = Batch::enter_with(true);
        tracing::trace!("action scope entered");
        Self(Some(batch))
    }

    /// Leaves the scope and, if it was the outermost one, runs the affected reactions.
    ///
    /// A scope dropped without `exit` still leaves; if it was the outermost one and the
    /// thread is not panicking, the flush runs and an error is logged instead of returned.
    pub fn exit(mut self) -> Result<(), Error> {
        match self.0.take() {
            Some(batch) => batch.exit(),
            None => Ok(()),
        }
    }
}
impl Drop for ActionScope {
    fn drop(&mut self) {
        let Some(batch) = self.0.take() else {
            return;
        };
        if std::thread::panicking() {
            return;
        }
        if let Err(e) = batch.exit() {
            tracing::error!(error = %e, "action scope dropped without exit failed to flush");
        }
    }
}

/// Returns `true` while an action scope is open on the current thread.
pub fn in_action() -> bool {
    Globals::with(|g| g.action_depth > 0)
}

/// Admission of one write according to the write policy.
///
/// Under [`WritePolicy::Lenient`], a write outside any action gets an implicit one-mutation scope.
pub(crate) struct Write(Option<ActionScope>);

impl Write {
    pub fn begin() -> Result<Self, Error> {
        let implicit = Globals::with(|g| {
            g.assert_exists();
            if g.action_depth > 0 {
                return Ok(false);
            }
            match g.config.write_policy {
                WritePolicy::Strict => Err(Error::NotInAction),
                WritePolicy::Lenient => Ok(true),
            }
        })?;
        Ok(Self(implicit.then(ActionScope::enter)))
    }
    pub fn finish(self) -> Result<(), Error> {
        match self.0 {
            Some(scope) => scope.exit(),
            None => Ok(()),
        }
    }
}

struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        let _ = Globals::try_with(|g| g.is_flushing = false);
    }
}

/// Runs pending reactions until none are left.
///
/// Writes made by a reaction to what other reactions read are picked up by the next round.
/// A reaction that changes its own dependencies is deferred to the next flush, so every flush ends.
/// A panicking reaction does not stop the others; the first panic is resumed after the flush.
fn flush() -> Result<(), Error> {
    let max_rounds = Globals::with(|g| {
        g.is_flushing = true;
        let mut jobs = take(&mut g.deferred);
        jobs.append(&mut g.pending);
        g.pending = jobs;
        g.config.max_flush_rounds.max(1)
    });
    let guard = FlushGuard;
    let mut rounds = 0;
    let mut error = None;
    let mut panic: Option<Box<dyn Any + Send>> = None;
    let mut jobs = Vec::new();
    while Globals::with(|g| {
        swap(&mut jobs, &mut g.pending);
        !jobs.is_empty()
    }) {
        if rounds == max_rounds {
            tracing::error!(rounds, "reactions did not settle, discarding pending reactions");
            for job in jobs.drain(..).filter_map(|job| job.upgrade()) {
                job.cancel_schedule();
            }
            error.get_or_insert(Error::FlushLimitExceeded(max_rounds));
            break;
        }
        rounds += 1;
        tracing::debug!(round = rounds, reactions = jobs.len(), "flush");
        for job in jobs.drain(..) {
            let Some(job) = job.upgrade() else {
                continue;
            };
            if job.is_disposed() {
                tracing::warn!(reaction = %job.id(), "notification skipped for disposed reaction");
                continue;
            }
            let id = job.id();
            match catch_unwind(AssertUnwindSafe(|| job.run_scheduled())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error.get_or_insert(e);
                }
                Err(payload) => {
                    tracing::warn!(reaction = %id, "reaction panicked during flush");
                    panic.get_or_insert(payload);
                }
            }
        }
    }
    drop(guard);
    if let Some(payload) = panic {
        resume_unwind(payload);
    }
    match error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
