//! Observable collections.
//!
//! A collection is one observable: any structural mutation (insert, remove, clear, ...)
//! counts as a single change of the whole collection, and elements need not be observable.
//! Every mutator call counts as a change, even one that leaves the contents as they were
//! (removing an absent item, clearing an empty collection).

use std::{
    cell::{Ref, RefCell},
    rc::Rc,
};

use serde::{Serialize, Serializer};

use crate::{
    core::{NodeId, SourceNode, Write},
    Error,
};

mod map;
mod set;
mod vec;

pub use map::ObservableMap;
pub use set::ObservableSet;
pub use vec::ObservableVec;

struct CollectionNode<C> {
    source: Rc<SourceNode>,
    items: RefCell<C>,
}

impl<C: 'static> CollectionNode<C> {
    fn new(items: C) -> Rc<Self> {
        Rc::new(Self {
            source: SourceNode::new(),
            items: RefCell::new(items),
        })
    }
    fn id(&self) -> NodeId {
        self.source.id()
    }
    fn version(&self) -> u64 {
        self.source.version()
    }
    fn observer_count(&self) -> usize {
        self.source.observer_count()
    }
    fn borrow(&self) -> Ref<'_, C> {
        self.source.bind();
        self.items.borrow()
    }
    fn mutate<R>(&self, f: impl FnOnce(&mut C) -> R) -> Result<R, Error> {
        let write = Write::begin()?;
        let ret = f(&mut self.items.borrow_mut());
        self.source.mark_changed();
        write.finish()?;
        Ok(ret)
    }
    fn fmt_debug(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    where
        C: std::fmt::Debug,
    {
        match self.items.try_borrow() {
            Ok(items) => std::fmt::Debug::fmt(&*items, f),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        C: Serialize,
    {
        match self.items.try_borrow() {
            Ok(items) => C::serialize(&*items, serializer),
            Err(_) => Err(serde::ser::Error::custom("borrowed")),
        }
    }
}
