use std::{cell::Ref, fmt, rc::Rc};

use derive_ex::derive_ex;
use serde::{Deserialize, Serialize};

use super::CollectionNode;
use crate::{core::NodeId, Error};


/// An ordered list whose structural mutations are observed as a whole.
#[derive_ex(Clone, bound())]
pub struct ObservableVec<T: 'static>(Rc<CollectionNode<Vec<T>>>);

impl<T: 'static> ObservableVec<T> {
    pub fn new() -> Self {
        Self::from(Vec::new())
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

    /// Borrows the items and adds a dependency on this list to the running computation.
    pub fn borrow(&self) -> Ref<'_, Vec<T>> {
        self.0.borrow()
    }
    pub fn with<U>(&self, f: impl FnOnce(&[T]) -> U) -> U {
        f(&self.borrow())
    }

    /// Copies the items. The read is tracked like [`borrow`](Self::borrow).
    pub fn snapshot(&self) -> Vec<T>
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
    pub fn get(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.borrow().get(index).cloned()
    }
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.borrow().contains(value)
    }

    pub fn push(&self, value: T) -> Result<(), Error> {
        self.0.mutate(|items| items.push(value))
    }

    /// Inserts an item at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&self, index: usize, value: T) -> Result<(), Error> {
        self.0.mutate(|items| items.insert(index, value))
    }

    /// Replaces the item at `index`, returning the old one, or `None` if `index` is out of bounds.
    pub fn set(&self, index: usize, value: T) -> Result<Option<T>, Error> {
        self.0.mutate(|items| {
            items
                .get_mut(index)
                .map(|item| std::mem::replace(item, value))
        })
    }

    /// Removes the item at `index`, or returns `None` if `index` is out of bounds.
    pub fn remove_at(&self, index: usize) -> Result<Option<T>, Error> {
        self.0
            .mutate(|items| (index < items.len()).then(|| items.remove(index)))
    }

    /// Removes the first item equal to `value`.
    ///
    /// Returns whether an item was removed.
    pub fn remove_item(&self, value: &T) -> Result<bool, Error>
    where
        T: PartialEq,
    {
        self.0.mutate(|items| match items.iter().position(|x| x == value) {
            Some(index) => {
                items.remove(index);
                true
            }
            None => false,
        })
    }

    /// Removes every item matching `f`, returning how many were removed.
    pub fn remove_matching(&self, mut f: impl FnMut(&T) -> bool) -> Result<usize, Error> {
        self.0.mutate(|items| {
            let len = items.len();
            items.retain(|x| !f(x));
            len - items.len()
        })
    }

    pub fn extend(&self, iter: impl IntoIterator<Item = T>) -> Result<(), Error> {
        self.0.mutate(|items| items.extend(iter))
    }

    pub fn clear(&self) -> Result<(), Error> {
        self.0.mutate(Vec::clear)
    }

    /// Applies arbitrary edits to the items; the whole closure counts as one change.
    pub fn modify<U>(&self, f: impl FnOnce(&mut Vec<T>) -> U) -> Result<U, Error> {
        self.0.mutate(f)
    }
}

impl<T: 'static> Default for ObservableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T: 'static> From<Vec<T>> for ObservableVec<T> {
    fn from(items: Vec<T>) -> Self {
        Self(CollectionNode::new(items))
    }
}
impl<T: 'static> FromIterator<T> for ObservableVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}
impl<T: fmt::Debug + 'static> fmt::Debug for ObservableVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_debug(f)
    }
}
impl<T: Serialize + 'static> Serialize for ObservableVec<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}
impl<'de, T: Deserialize<'de> + 'static> Deserialize<'de> for ObservableVec<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Vec::<T>::deserialize(deserializer).map(Self::from)
    }
}
