use std::{
    cell::{Ref, RefCell},
    rc::Rc,
};

use derive_ex::derive_ex;
use serde::{Deserialize, Serialize};

use crate::{
    core::{NodeId, SourceNode, Write},
    Error,
};


/// Similar to `Rc<RefCell<T>>`, but reads are tracked and writes notify dependents.
///
/// Clones share the same value.
#[derive_ex(Clone, bound())]
pub struct Observable<T: 'static>(Rc<ObservableNode<T>>);

impl<T: 'static> Observable<T> {
    /// Create a new `Observable` with the given initial value.
    pub fn new(value: T) -> Self {
        Self(Rc::new(ObservableNode {
            source: SourceNode::new(),
            value: RefCell::new(value),
        }))
    }

    pub fn id(&self) -> NodeId {
        self.0.source.id()
    }

    /// Number of applied writes so far. Reading the version is not tracked.
    pub fn version(&self) -> u64 {
        self.0.source.version()
    }

    /// Number of reactions and computed values currently depending on this observable.
    pub fn observer_count(&self) -> usize {
        self.0.source.observer_count()
    }

    /// Borrows the current value and adds a dependency on this `Observable` to the running computation.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.source.bind();
        self.0.value.borrow()
    }

    /// Gets the current value and adds a dependency on this `Observable` to the running computation.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.borrow().clone()
    }

    pub fn with<U>(&self, f: impl FnOnce(&T) -> U) -> U {
        f(&self.borrow())
    }

    /// Sets the value and notifies the dependents.
    ///
    /// Setting a value equal to the current one still counts as a change.
    pub fn set(&self, value: T) -> Result<(), Error> {
        self.replace(value).map(drop)
    }

    /// Sets the value, returning the old one.
    pub fn replace(&self, value: T) -> Result<T, Error> {
        self.update(|v| std::mem::replace(v, value))
    }

    /// Mutates the value in place; the mutation counts as one change.
    pub fn update<U>(&self, f: impl FnOnce(&mut T) -> U) -> Result<U, Error> {
        let write = Write::begin()?;
        let ret = f(&mut self.0.value.borrow_mut());
        self.0.source.mark_changed();
        write.finish()?;
        Ok(ret)
    }

    /// Sets the value and notifies the dependents only if it differs from the current value.
    ///
    /// Returns whether the value changed.
    pub fn set_dedup(&self, value: T) -> Result<bool, Error>
    where
        T: PartialEq,
    {
        let write = Write::begin()?;
        let changed = {
            let mut current = self.0.value.borrow_mut();
            if *current != value {
                *current = value;
                true
            } else {
                false
            }
        };
        if changed {
            self.0.source.mark_changed();
        }
        write.finish()?;
        Ok(changed)
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.value.try_borrow() {
            Ok(value) => std::fmt::Debug::fmt(&*value, f),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}
impl<T> Serialize for Observable<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        match self.0.value.try_borrow() {
            Ok(value) => T::serialize(&*value, serializer),
            Err(_) => Err(serde::ser::Error::custom("borrowed")),
        }
    }
}
impl<'de, T> Deserialize<'de> for Observable<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Observable<T>, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Observable::new)
    }
}

struct ObservableNode<T: 'static> {
    source: Rc<SourceNode>,
    value: RefCell<T>,
}
