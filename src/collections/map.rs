use std::{cell::Ref, collections::BTreeMap, fmt, rc::Rc};

use derive_ex::derive_ex;
use serde::{Deserialize, Serialize};

use super::CollectionNode;
use crate::{core::NodeId, Error};


/// A keyed map whose structural mutations are observed as a whole.
///
/// Keys are kept in order so iteration inside reactions is deterministic.
#[derive_ex(Clone, bound())]
pub struct ObservableMap<K: 'static, V: 'static>(Rc<CollectionNode<BTreeMap<K, V>>>);

impl<K: Ord + 'static, V: 'static> ObservableMap<K, V> {
    pub fn new() -> Self {
        Self::from(BTreeMap::new())
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

    /// Borrows the entries and adds a dependency on this map to the running computation.
    pub fn borrow(&self) -> Ref<'_, BTreeMap<K, V>> {
        self.0.borrow()
    }
    pub fn snapshot(&self) -> BTreeMap<K, V>
    where
        K: Clone,
        V: Clone,
    {
        self.borrow().clone()
    }
    pub fn len(&self) -> usize {
        self.borrow().len()
    }
    pub fn is_empty(&self) -> bool {
        self.borrow().is_empty()
    }
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.borrow().get(key).cloned()
    }
    pub fn contains_key(&self, key: &K) -> bool {
        self.borrow().contains_key(key)
    }
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.borrow().keys().cloned().collect()
    }

    /// Inserts an entry, returning the value previously stored under `key`.
    pub fn insert(&self, key: K, value: V) -> Result<Option<V>, Error> {
        self.0.mutate(|items| items.insert(key, value))
    }
    pub fn remove(&self, key: &K) -> Result<Option<V>, Error> {
        self.0.mutate(|items| items.remove(key))
    }

    /// Removes every entry matching `f`, returning how many were removed.
    pub fn remove_matching(&self, mut f: impl FnMut(&K, &V) -> bool) -> Result<usize, Error> {
        self.0.mutate(|items| {
            let len = items.len();
            items.retain(|k, v| !f(k, v));
            len - items.len()
        })
    }
    pub fn clear(&self) -> Result<(), Error> {
        self.0.mutate(BTreeMap::clear)
    }

    /// Applies arbitrary edits to the entries; the whole closure counts as one change.
    pub fn modify<U>(&self, f: impl FnOnce(&mut BTreeMap<K, V>) -> U) -> Result<U, Error> {
        self.0.mutate(f)
    }
}

impl<K: Ord + 'static, V: 'static> Default for ObservableMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
impl<K: Ord + 'static, V: 'static> From<BTreeMap<K, V>> for ObservableMap<K, V> {
    fn from(items: BTreeMap<K, V>) -> Self {
        Self(CollectionNode::new(items))
    }
}
impl<K: Ord + 'static, V: 'static> FromIterator<(K, V)> for ObservableMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<BTreeMap<_, _>>())
    }
}
impl<K: fmt::Debug + 'static, V: fmt::Debug + 'static> fmt::Debug for ObservableMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_debug(f)
    }
}
impl<K: Serialize + 'static, V: Serialize + 'static> Serialize for ObservableMap<K, V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}
impl<'de, K, V> Deserialize<'de> for ObservableMap<K, V>
where
    K: Deserialize<'de> + Ord + 'static,
    V: Deserialize<'de> + 'static,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        BTreeMap::<K, V>::deserialize(deserializer).map(Self::from)
    }
}
