use std::{cell::Ref, collections::BTreeSet, fmt, rc::Rc};

use derive_ex::derive_ex;
use serde::{Deserialize, Serialize};

use super::CollectionNode;
use crate::{core::NodeId, Error};

#[cfg(test)]
mod tests;

/// An ordered set whose structural mutations are observed as a whole.
#[derive_ex(Clone, bound())]
pub struct ObservableSet<T: 'static>(Rc<CollectionNode<BTreeSet<T>>>);

impl<T: Ord + 'static> ObservableSet<T> {
    pub fn new() -> Self {
        Self::from(BTreeSet::new())
    }

    pub fn id(&self) -> NodeId {
        self.0.id()
    }
    pub fn version(&self) -> u64 {
        self.0.version()
    }
    pub fn observer_count(&self) -> usize {
        self.0.observer_count()
    }

    pub fn borrow(&self) -> Ref<'_, BTreeSet<T>> {
        self.0.borrow()
    }
    pub fn snapshot(&self) -> BTreeSet<T>
    where
        T: Clone,
    {
        self.borrow().clone()
    }
    pub fn len(&self) -> usize {
        self.borrow().len()
    }
    pub fn is_empty(&self) -> bool {
        self.borrow().is_empty()
    }
    pub fn contains(&self, value: &T) -> bool {
        self.borrow().contains(value)
    }

    /// Adds a value, returning whether it was newly inserted.
    pub fn insert(&self, value: T) -> Result<bool, Error> {
        self.0.mutate(|items| items.insert(value))
    }

    /// Removes a value, returning whether it was present.
    pub fn remove(&self, value: &T) -> Result<bool, Error> {
        self.0.mutate(|items| items.remove(value))
    }
    pub fn clear(&self) -> Result<(), Error> {
        self.0.mutate(BTreeSet::clear)
    }
    pub fn modify<U>(&self, f: impl FnOnce(&mut BTreeSet<T>) -> U) -> Result<U, Error> {
        self.0.mutate(f)
    }
}

impl<T: Ord + 'static> Default for ObservableSet<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T: Ord + 'static> From<BTreeSet<T>> for ObservableSet<T> {
    fn from(items: BTreeSet<T>) -> Self {
        Self(CollectionNode::new(items))
    }
}
impl<T: Ord + 'static> FromIterator<T> for ObservableSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<BTreeSet<_>>())
    }
}
impl<T: fmt::Debug + 'static> fmt::Debug for ObservableSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_debug(f)
    }
}
impl<T: Serialize + 'static> Serialize for ObservableSet<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}
impl<'de, T: Deserialize<'de> + Ord + 'static> Deserialize<'de> for ObservableSet<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        BTreeSet::<T>::deserialize(deserializer).map(Self::from)
    }
}
