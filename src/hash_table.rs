use std::{
    borrow::Borrow,
    fmt,
    hash::{BuildHasher, Hash},
    iter::FusedIterator,
    mem,
};

use tracing::{debug, trace};

use crate::{
    binary_search_tree::{BinarySearchTree, ForwardIter, Node},
    error::{Error, Result},
    hasher::BuildIdentityHasher,
};

/// An original key together with its value, stored as the payload of a tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValuePair<K, V> {
    /// The key as supplied by the caller
    pub key: K,
    /// The value associated with the key
    pub value: V,
}

impl<K, V> KeyValuePair<K, V> {
    /// Pairs a key with its value
    #[must_use]
    pub const fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

/// A map built on a [`BinarySearchTree`] ordered by the hash of each key.
///
/// Every operation hashes the key, runs the matching tree operation on the hash, and unwraps the
/// stored [`KeyValuePair`]. Keys are told apart by hash only: two keys with the same hash share
/// one slot, and a later [`set`](Self::set) replaces both the stored key and its value.
///
/// Iteration follows the tree's structural forward walk. With the default
/// [`BuildIdentityHasher`], integer keys inserted in ascending order come back in that order;
/// for other shapes the walk does not reach every entry.
///
/// Note: This implementation is not thread-safe. Guard a shared table with a single lock.
pub struct HashTable<K, V, S = BuildIdentityHasher> {
    /// Entries ordered by the hash of their key
    tree: BinarySearchTree<u64, KeyValuePair<K, V>>,
    /// Current number of entries, kept equal to the number of tree nodes
    size: usize,
    /// Builds the hasher that turns keys into order keys
    hash_builder: S,
}

impl<K, V> HashTable<K, V> {
    /// Creates an empty table using the default deterministic hasher
    #[must_use]
    pub fn new() -> Self {
        Self::with_hasher(BuildIdentityHasher::default())
    }
}

impl<K, V> Default for HashTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> HashTable<K, V, S> {
    /// Creates an empty table that hashes keys with `hash_builder`.
    ///
    /// Tables only compare equal when they hash keys identically, so `hash_builder` should be
    /// deterministic.
    #[must_use]
    pub const fn with_hasher(hash_builder: S) -> Self {
        Self { tree: BinarySearchTree::new(), size: 0, hash_builder }
    }

    /// Returns the number of entries in the table
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns a reference to the table's hash builder
    #[must_use]
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns an iterator over the stored pairs, in the tree's forward walk order
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { nodes: self.tree.forward_iter() }
    }

    /// Returns an iterator over the keys, in the same order as [`iter`](Self::iter)
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values, in the same order as [`iter`](Self::iter)
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over `(key, value)` tuples, in the same order as [`iter`](Self::iter)
    #[must_use]
    pub fn items(&self) -> Items<'_, K, V> {
        Items { inner: self.iter() }
    }

    /// Removes every entry.
    ///
    /// Each pass snapshots the order keys visible to the forward walk and deletes them; passes
    /// repeat until the tree is empty, since one walk need not reach every node.
    pub fn clear(&mut self) {
        let mut passes: usize = 0;
        while !self.tree.is_empty() {
            let hashes: Vec<u64> = self.tree.forward_iter().map(|node| *node.key()).collect();
            for hash in &hashes {
                if self.tree.remove(hash).is_some() {
                    self.size = self.size.saturating_sub(1);
                }
            }
            passes = passes.saturating_add(1);
        }
        debug!(passes, remaining = self.size, "cleared hash table");
    }
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates a table holding `pairs`, applied in order with [`set`](Self::set)
    #[must_use]
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        S: Default,
    {
        let mut table = Self::with_hasher(S::default());
        table.extend(pairs);
        table
    }

    /// Computes the order key for a key
    fn hash<Q: ?Sized + Hash>(&self, key: &Q) -> u64 {
        self.hash_builder.hash_one(key)
    }

    /// Returns the value stored for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if no entry has the key's hash.
    pub fn get<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Hash + ?Sized,
    {
        self.tree
            .search(&self.hash(key))
            .map(|node| &node.value().value)
            .ok_or(Error::KeyNotFound)
    }

    /// Returns a mutable reference to the value stored for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if no entry has the key's hash.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + ?Sized,
    {
        let hash = self.hash(key);
        self.tree
            .search_mut(&hash)
            .map(|node| &mut node.value_mut().value)
            .ok_or(Error::KeyNotFound)
    }

    /// Stores `value` under `key` and returns the value previously held in that slot.
    ///
    /// If the key's hash is already present, the stored pair is replaced, original key
    /// included. Otherwise a new node is inserted and the length grows by one.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash(&key);
        if let Some(node) = self.tree.search_mut(&hash) {
            let stored = node.value_mut();
            if stored.key != key {
                debug!(hash, "hash collision, replacing the stored key");
            }
            trace!(hash, "updated entry");
            return Some(mem::replace(stored, KeyValuePair::new(key, value)).value);
        }

        self.tree.insert(hash, KeyValuePair::new(key, value));
        self.size = self.size.saturating_add(1);
        trace!(hash, size = self.size, "inserted entry");
        None
    }

    /// Removes `key` and returns its value, or `None` if the key is absent.
    ///
    /// Deleting an absent key leaves the length unchanged.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + ?Sized,
    {
        let hash = self.hash(key);
        let Some((_, pair)) = self.tree.remove(&hash) else {
            trace!(hash, "delete of absent key");
            return None;
        };
        self.size = self.size.saturating_sub(1);
        trace!(hash, size = self.size, "deleted entry");
        Some(pair.value)
    }

    /// Returns true if an entry has the key's hash
    #[must_use]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + ?Sized,
    {
        self.tree.search(&self.hash(key)).is_some()
    }
}

impl<K, V, S> Extend<(K, V)> for HashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for HashTable<K, V>
where
    K: Hash + Eq,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self::from_pairs(pairs)
    }
}

/// Tables are equal when their trees are structurally equal. The same entries inserted in a
/// different order can produce a different shape and compare unequal.
impl<K: PartialEq, V: PartialEq, S> PartialEq for HashTable<K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl<K: Eq, V: Eq, S> Eq for HashTable<K, V, S> {}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for HashTable<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.items()).finish()
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashTable<K, V, S> {
    type Item = &'a KeyValuePair<K, V>;
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the stored pairs of a [`HashTable`]
#[derive(Debug)]
pub struct Iter<'a, K, V> {
    /// Forward walk of the underlying tree
    nodes: ForwardIter<'a, u64, KeyValuePair<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = &'a KeyValuePair<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        self.nodes.next().map(Node::value)
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over the keys of a [`HashTable`]
#[derive(Debug)]
pub struct Keys<'a, K, V> {
    /// Pair iterator being projected
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|pair| &pair.key)
    }
}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// Iterator over the values of a [`HashTable`]
#[derive(Debug)]
pub struct Values<'a, K, V> {
    /// Pair iterator being projected
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|pair| &pair.value)
    }
}

impl<K, V> FusedIterator for Values<'_, K, V> {}

/// Iterator over `(key, value)` tuples of a [`HashTable`]
#[derive(Debug)]
pub struct Items<'a, K, V> {
    /// Pair iterator being projected
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Items<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|pair| (&pair.key, &pair.value))
    }
}

impl<K, V> FusedIterator for Items<'_, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::{
        collections::HashMap,
        hash::{BuildHasherDefault, Hasher},
    };

    /// Hasher that sends every key to the same order key
    #[derive(Debug, Default)]
    struct ConstantHasher;

    impl Hasher for ConstantHasher {
        fn finish(&self) -> u64 {
            7
        }

        fn write(&mut self, _bytes: &[u8]) {}
    }

    fn sample() -> HashTable<i32, i32> {
        let mut table = HashTable::new();
        table.set(1, 5);
        table.set(2, 6);
        table.set(3, 7);
        table
    }

    fn keys_of<V>(table: &HashTable<i32, V>) -> Vec<i32> {
        table.keys().copied().collect()
    }

    fn values_of<K>(table: &HashTable<K, i32>) -> Vec<i32> {
        table.values().copied().collect()
    }

    #[test]
    fn test_initialization() {
        let table: HashTable<i32, i32> = HashTable::new();
        assert!(keys_of(&table).is_empty());
        assert!(values_of(&table).is_empty());
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_insert() {
        let mut table = HashTable::new();
        assert_eq!(table.set(1, 5), None);
        assert_eq!(keys_of(&table), vec![1]);
        assert_eq!(values_of(&table), vec![5]);
        assert_eq!(table.get(&1), Ok(&5));
    }

    #[test]
    fn test_insert_multiple() {
        let table = sample();
        assert_eq!(keys_of(&table), vec![1, 2, 3]);
        assert_eq!(values_of(&table), vec![5, 6, 7]);
        assert_eq!(table.get(&1), Ok(&5));
        assert_eq!(table.get(&2), Ok(&6));
        assert_eq!(table.get(&3), Ok(&7));
    }

    #[test]
    fn test_update() {
        let mut table = sample();
        assert_eq!(table.set(1, 11), Some(5));
        assert_eq!(keys_of(&table), vec![1, 2, 3]);
        assert_eq!(values_of(&table), vec![11, 6, 7]);
        assert_eq!(table.get(&1), Ok(&11));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_set_twice_is_idempotent() {
        let mut table = HashTable::new();
        table.set("k", 1);
        let len = table.len();
        table.set("k", 1);
        assert_eq!(table.len(), len);
        assert_eq!(table.get("k"), Ok(&1));
    }

    #[test]
    fn test_set_existing_key_replaces_in_place() {
        let mut table = HashTable::from([(2, "b"), (1, "a"), (3, "c")]);
        let keys_before: Vec<i32> = table.keys().copied().collect();

        assert_eq!(table.set(1, "z"), Some("a"));
        assert_eq!(table.len(), 3);
        assert_eq!(table.tree.node_count(), 3);
        assert_eq!(table.keys().copied().collect::<Vec<_>>(), keys_before);
        assert_eq!(table.get(&1), Ok(&"z"));
    }

    #[test]
    fn test_get_missing_key() {
        let table = sample();
        assert_eq!(table.get(&4), Err(Error::KeyNotFound));
    }

    #[test]
    fn test_get_mut() {
        let mut table = sample();
        if let Ok(value) = table.get_mut(&2) {
            *value += 10;
        }
        assert_eq!(table.get(&2), Ok(&16));
        assert_eq!(table.get_mut(&9).map(|_| ()), Err(Error::KeyNotFound));
    }

    #[test]
    fn test_delete() {
        let mut table = sample();
        assert_eq!(table.delete(&2), Some(6));
        assert_eq!(keys_of(&table), vec![1, 3]);
        assert_eq!(values_of(&table), vec![5, 7]);
        assert_eq!(table.get(&1), Ok(&5));
        assert_eq!(table.get(&3), Ok(&7));
        assert!(!table.contains(&2));
        assert_eq!(table.get(&2), Err(Error::KeyNotFound));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_delete_absent_key_keeps_length() {
        let mut table = sample();
        assert_eq!(table.delete(&42), None);
        assert_eq!(table.len(), 3);

        let mut empty: HashTable<i32, i32> = HashTable::new();
        assert_eq!(empty.delete(&1), None);
        assert_eq!(empty.len(), 0);
    }

    #[test]
    fn test_iteration() {
        let table = sample();
        let items: Vec<_> = table.items().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(items, vec![(1, 5), (2, 6), (3, 7)]);

        let pairs: Vec<_> = (&table).into_iter().cloned().collect();
        assert_eq!(pairs, vec![
            KeyValuePair::new(1, 5),
            KeyValuePair::new(2, 6),
            KeyValuePair::new(3, 7)
        ]);
    }

    #[test]
    fn test_equality() {
        assert_eq!(sample(), sample());
    }

    #[test]
    fn test_inequality() {
        let mut other = HashTable::new();
        other.set(1, 5);
        other.set(2, 6);
        other.set(3, 8);
        assert_ne!(sample(), other);
    }

    #[test]
    fn test_equality_depends_on_insertion_order() {
        let forward = HashTable::from([(1, 1), (2, 2), (3, 3), (4, 4)]);
        let same = HashTable::from([(1, 1), (2, 2), (3, 3), (4, 4)]);
        let replaced = HashTable::from([(1, 1), (2, 2), (5, 5), (4, 4)]);
        let shuffled = HashTable::from([(2, 2), (1, 1), (3, 3), (4, 4)]);

        assert_eq!(forward, same);
        assert_ne!(forward, replaced);
        assert_ne!(forward, shuffled);
        assert_eq!(forward.len(), shuffled.len());
    }

    #[test]
    fn test_initial_elements() {
        let table: HashTable<i32, i32> = HashTable::from_pairs(vec![(1, 5), (2, 6), (3, 7)]);
        assert_eq!(keys_of(&table), vec![1, 2, 3]);
        assert_eq!(values_of(&table), vec![5, 6, 7]);
        assert_eq!(table.get(&1), Ok(&5));
    }

    #[test]
    fn test_initial_elements_with_duplicates() {
        let table: HashTable<i32, i32> = [(1, 5), (2, 6), (3, 7), (1, 11)].into_iter().collect();
        assert_eq!(keys_of(&table), vec![1, 2, 3]);
        assert_eq!(values_of(&table), vec![11, 6, 7]);
        assert_eq!(table.get(&1), Ok(&11));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_contains() {
        let table = sample();
        assert!(table.contains(&1));
        assert!(table.contains(&2));
        assert!(table.contains(&3));
        assert!(!table.contains(&4));
    }

    #[test]
    fn test_len() {
        assert_eq!(sample().len(), 3);
    }

    #[test]
    fn test_string_keys() {
        let mut table = HashTable::new();
        table.set("1".to_string(), 5);
        table.set("2".to_string(), 6);
        table.set("3".to_string(), 7);
        assert!(table.contains("1"));
        assert!(table.contains("2"));
        assert_eq!(table.get("3"), Ok(&7));
        assert!(!table.contains("4"));
    }

    #[test]
    fn test_tuple_keys() {
        let mut table = HashTable::new();
        table.set((1, 0), 5);
        table.set((2, 3), 6);
        table.set((3, 0), 7);
        assert!(table.contains(&(1, 0)));
        assert!(table.contains(&(2, 3)));
        assert!(!table.contains(&(3, 2)));
    }

    #[test]
    fn test_heterogeneous_keys() {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        enum Key {
            Int(i64),
            Text(&'static str),
            Pair(i64, i64),
        }

        let mut table = HashTable::new();
        table.set(Key::Int(1), 5);
        table.set(Key::Text("2"), 6);
        table.set(Key::Pair(2, 3), 7);
        assert_eq!(table.get(&Key::Int(1)), Ok(&5));
        assert_eq!(table.get(&Key::Text("2")), Ok(&6));
        assert_eq!(table.get(&Key::Pair(2, 3)), Ok(&7));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_clear() {
        let mut table = sample();
        table.clear();
        assert!(keys_of(&table).is_empty());
        assert!(values_of(&table).is_empty());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_clear_reaches_nodes_off_the_walk() {
        let mut table = HashTable::new();
        for key in [50, 20, 80, 30, 70, 10, 90, 60] {
            table.set(key, key);
        }
        assert!(table.keys().count() < table.len());

        table.clear();
        assert_eq!(table.len(), 0);
        assert!(table.is_empty());
        assert_eq!(table.keys().count(), 0);
        for key in [50, 20, 80, 30, 70, 10, 90, 60] {
            assert!(!table.contains(&key));
        }
    }

    #[test]
    fn test_collision_replaces_stored_key() {
        let mut table: HashTable<&str, i32, BuildHasherDefault<ConstantHasher>> =
            HashTable::with_hasher(BuildHasherDefault::default());
        table.set("first", 1);
        assert_eq!(table.set("second", 2), Some(1));

        assert_eq!(table.len(), 1);
        assert_eq!(table.keys().copied().collect::<Vec<_>>(), vec!["second"]);
        assert_eq!(table.get("first"), Ok(&2));
    }

    #[test]
    fn test_debug_as_map() {
        assert_eq!(format!("{:?}", sample()), "{1: 5, 2: 6, 3: 7}");
    }

    proptest! {
        #[test]
        fn prop_get_returns_last_set(ops in prop::collection::vec((0u16..64, any::<i32>()), 0..128)) {
            let mut table = HashTable::new();
            let mut model = HashMap::new();
            for (key, value) in &ops {
                table.set(*key, *value);
                model.insert(*key, *value);
            }

            prop_assert_eq!(table.len(), model.len());
            for (key, value) in &model {
                prop_assert_eq!(table.get(key), Ok(value));
            }
        }

        #[test]
        fn prop_set_then_get_round_trips(key in any::<String>(), value in any::<u64>()) {
            let mut table = HashTable::new();
            table.set(key.clone(), value);
            prop_assert_eq!(table.get(&key), Ok(&value));
            prop_assert!(table.contains(&key));
        }

        #[test]
        fn prop_delete_tracks_model(
            inserts in prop::collection::vec(0u32..100, 0..64),
            deletes in prop::collection::vec(0u32..100, 0..64),
        ) {
            let mut table = HashTable::new();
            let mut model = HashMap::new();
            for key in &inserts {
                table.set(*key, key.wrapping_mul(3));
                model.insert(*key, key.wrapping_mul(3));
            }
            for key in &deletes {
                prop_assert_eq!(table.delete(key), model.remove(key));
                prop_assert!(!table.contains(key));
                prop_assert_eq!(table.get(key), Err(Error::KeyNotFound));
            }

            prop_assert_eq!(table.len(), model.len());
            prop_assert_eq!(table.tree.node_count(), model.len());
        }
    }
}
