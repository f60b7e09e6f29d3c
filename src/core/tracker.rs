use std::{
    cell::RefCell,
    collections::HashSet,
    mem::take,
    rc::{Rc, Weak},
};

use super::{BindSink, Globals, NodeId, SourceBindings, SourceNode};

/// One entry of the tracking stack.
///
/// `sink` is `None` for frames pushed by [`untracked`], which hide every outer frame.
pub(super) struct Frame {
    sink: Option<Weak<dyn BindSink>>,
    old: SourceBindings,
    new: SourceBindings,
    bound: HashSet<NodeId>,
}
impl Frame {
    fn new(sink: Option<Weak<dyn BindSink>>, mut old: SourceBindings) -> Self {
        old.reverse();
        Self {
            sink,
            old,
            new: SourceBindings::default(),
            bound: HashSet::new(),
        }
    }
    fn bind(&mut self, source: &Rc<SourceNode>) {
        if let Some(sink) = &self.sink {
            if self.bound.insert(source.id()) {
                self.new.bind_from(&mut self.old, source, sink);
            }
        }
    }
}

pub(super) fn bind(source: &Rc<SourceNode>) {
    Globals::with(|g| {
        if let Some(frame) = g.frames.last_mut() {
            frame.bind(source);
        }
    })
}

struct FrameGuard<'a> {
    sources: Option<&'a RefCell<SourceBindings>>,
}
impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        let Ok(Some(frame)) = Globals::try_with(|g| g.frames.pop()) else {
            return;
        };
        let Frame { old, new, .. } = frame;
        if let Some(sources) = self.sources {
            *sources.borrow_mut() = new;
        }
        drop(old);
    }
}

/// Runs `f` as the computation of `sink`, replacing `sources` with exactly the sources `f` reads.
///
/// Sources read on the previous run but not on this one are unsubscribed when `f` returns or unwinds.
pub(crate) fn track<T>(
    sink: Weak<dyn BindSink>,
    sources: &RefCell<SourceBindings>,
    f: impl FnOnce() -> T,
) -> T {
    let old = take(&mut *sources.borrow_mut());
    Globals::with(|g| g.frames.push(Frame::new(Some(sink), old)));
    let _guard = FrameGuard {
        sources: Some(sources),
    };
    f()
}

/// Calls a function without tracking dependencies.
///
/// Reads inside `f` do not become dependencies of the surrounding reaction or computed value.
pub fn untracked<T>(f: impl FnOnce() -> T) -> T {
    Globals::with(|g| g.frames.push(Frame::new(None, SourceBindings::default())));
    let _guard = FrameGuard { sources: None };
    f()
}

/// Returns `true` if reads on the current thread are being recorded as dependencies.
pub fn is_tracking() -> bool {
    Globals::with(|g| g.frames.last().is_some_and(|frame| frame.sink.is_some()))
}
