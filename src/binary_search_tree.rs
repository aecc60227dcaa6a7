//! Unbalanced binary search tree.
//!
//! Every node exclusively owns its children. Keys strictly less than a node's key live in its
//! left subtree, keys greater than or equal to it live in its right subtree, so equal keys are
//! never merged by [`BinarySearchTree::insert`]. No rebalancing is ever performed: the depth of
//! the tree depends only on insertion order, and ascending insertion yields a single chain.
//!
//! All operations walk the tree with explicit loops over the owning links instead of recursion,
//! which keeps degenerate chains from exhausting the call stack.

use std::{cmp::Ordering, fmt, iter::FusedIterator, mem, vec};

use crate::error::{Error, Result};

/// Owning link from a parent to one of its children
type Link<K, V> = Option<Box<Node<K, V>>>;

/// A single entry of a [`BinarySearchTree`].
pub struct Node<K, V> {
    /// The order key
    key: K,
    /// The payload attached to the key
    value: V,
    /// Subtree with keys strictly less than `key`
    left: Link<K, V>,
    /// Subtree with keys greater than or equal to `key`
    right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    /// Creates a leaf node
    fn new(key: K, value: V) -> Self {
        Self { key, value, left: None, right: None }
    }

    /// Returns the order key of this node
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns the payload of this node
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns a mutable reference to the payload. The key stays fixed.
    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// Returns the left child, if any
    #[must_use]
    pub fn left(&self) -> Option<&Self> {
        self.left.as_deref()
    }

    /// Returns the right child, if any
    #[must_use]
    pub fn right(&self) -> Option<&Self> {
        self.right.as_deref()
    }

    /// Returns the node with the smallest key in the subtree rooted here
    #[must_use]
    pub fn leftmost(&self) -> &Self {
        let mut node = self;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        node
    }

    /// Returns the node with the largest key in the subtree rooted here
    #[must_use]
    pub fn rightmost(&self) -> &Self {
        let mut node = self;
        while let Some(right) = node.right.as_deref() {
            node = right;
        }
        node
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Node<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

/// An unbalanced binary search tree.
///
/// ```rust
/// use treetable::BinarySearchTree;
///
/// let mut tree = BinarySearchTree::new();
/// for key in [2, 1, 3, 4] {
///     tree.insert(key, key * 10);
/// }
///
/// assert_eq!(tree.search(&3).map(|node| *node.value()), Some(30));
/// assert_eq!(tree.min().map(|node| *node.key()), Ok(1));
///
/// tree.delete(&2);
/// assert!(tree.search(&2).is_none());
/// assert_eq!(tree.root().map(|node| *node.key()), Some(3));
/// ```
pub struct BinarySearchTree<K, V> {
    /// The root node, absent when the tree is empty
    root: Link<K, V>,
}

impl<K, V> Default for BinarySearchTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> BinarySearchTree<K, V> {
    /// Creates an empty tree
    #[must_use]
    pub const fn new() -> Self {
        Self { root: None }
    }

    /// Returns true if the tree holds no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the root node, if any
    #[must_use]
    pub fn root(&self) -> Option<&Node<K, V>> {
        self.root.as_deref()
    }

    /// Returns the node with the smallest key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyTree`] if the tree has no nodes.
    pub fn min(&self) -> Result<&Node<K, V>> {
        self.root.as_deref().map(Node::leftmost).ok_or(Error::EmptyTree)
    }

    /// Returns the node with the largest key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyTree`] if the tree has no nodes.
    pub fn max(&self) -> Result<&Node<K, V>> {
        self.root.as_deref().map(Node::rightmost).ok_or(Error::EmptyTree)
    }

    /// Counts the nodes by walking the whole tree
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.in_order().count()
    }

    /// Returns the structural forward walk: the root, then every node down the root's left
    /// spine, then every node down the root's right spine.
    ///
    /// This is sorted only when the tree is a single chain. Nodes off both spines are never
    /// visited.
    #[must_use]
    pub fn forward_iter(&self) -> ForwardIter<'_, K, V> {
        ForwardIter::new(self.root.as_deref())
    }

    /// Same walk as [`forward_iter`](Self::forward_iter), used by `for node in &tree`
    #[must_use]
    pub fn iter(&self) -> ForwardIter<'_, K, V> {
        self.forward_iter()
    }

    /// Returns the forward walk in reverse order
    #[must_use]
    pub fn backward_iter(&self) -> BackwardIter<'_, K, V> {
        let nodes: Vec<_> = self.forward_iter().collect();
        BackwardIter { nodes: nodes.into_iter().rev() }
    }

    /// Returns every node in ascending key order
    #[must_use]
    pub fn in_order(&self) -> InOrderIter<'_, K, V> {
        let mut iter = InOrderIter { stack: Vec::new() };
        iter.push_left_spine(self.root.as_deref());
        iter
    }

    /// Detaches the minimum node of the subtree behind `link`, splicing its right child into
    /// its place
    fn take_min(mut link: &mut Link<K, V>) -> Option<Box<Node<K, V>>> {
        while link.as_deref()?.left.is_some() {
            link = &mut link.as_mut()?.left;
        }
        let mut min = link.take()?;
        *link = min.right.take();
        Some(min)
    }

    /// Removes the node behind `link` and returns its entry.
    ///
    /// A node with two children takes over the key and value of its in-order successor, which
    /// is then detached from the right subtree.
    fn unlink(link: &mut Link<K, V>) -> Option<(K, V)> {
        let node = link.as_deref_mut()?;
        if node.left.is_some() && node.right.is_some() {
            let successor = Self::take_min(&mut node.right)?;
            let Node { key, value, .. } = *successor;
            return Some((mem::replace(&mut node.key, key), mem::replace(&mut node.value, value)));
        }

        let mut removed = link.take()?;
        *link = removed.left.take().or_else(|| removed.right.take());
        let Node { key, value, .. } = *removed;
        Some((key, value))
    }
}

impl<K: Ord, V> BinarySearchTree<K, V> {
    /// Inserts a new node and returns the root of the tree.
    ///
    /// An existing equal key is never overwritten: the new node is attached inside the right
    /// subtree of the existing one, where [`search`](Self::search) will not reach it. Use
    /// [`update`](Self::update) to change the value stored under a present key.
    pub fn insert(&mut self, key: K, value: V) -> &Node<K, V> {
        let node = Box::new(Node::new(key, value));
        let Some(mut root) = self.root.take() else {
            return self.root.insert(node);
        };
        Self::attach(&mut root, node);
        self.root.insert(root)
    }

    /// Hangs `node` off the first free link on its search path below `root`
    fn attach(root: &mut Node<K, V>, node: Box<Node<K, V>>) {
        let mut link = if node.key < root.key { &mut root.left } else { &mut root.right };
        while let Some(current) = link {
            link = if node.key < current.key { &mut current.left } else { &mut current.right };
        }
        *link = Some(node);
    }

    /// Returns the first node met on the way down whose key equals `key`
    #[must_use]
    pub fn search(&self, key: &K) -> Option<&Node<K, V>> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match key.cmp(&node.key) {
                Ordering::Equal => return Some(node),
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
            };
        }
        None
    }

    /// Mutable counterpart of [`search`](Self::search)
    pub fn search_mut(&mut self, key: &K) -> Option<&mut Node<K, V>> {
        Self::find_link(&mut self.root, key)?.as_deref_mut()
    }

    /// Replaces the value of the node holding `key` and returns that node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if no node holds `key`.
    pub fn update(&mut self, key: &K, value: V) -> Result<&Node<K, V>> {
        let node = self.search_mut(key).ok_or(Error::KeyNotFound)?;
        node.value = value;
        Ok(&*node)
    }

    /// Replaces the value of the node holding `key` and returns the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if no node holds `key`.
    pub fn replace(&mut self, key: &K, value: V) -> Result<V> {
        let node = self.search_mut(key).ok_or(Error::KeyNotFound)?;
        Ok(mem::replace(&mut node.value, value))
    }

    /// Deletes the node holding `key` and returns the updated root.
    ///
    /// Deleting an absent key leaves the tree untouched.
    pub fn delete(&mut self, key: &K) -> Option<&Node<K, V>> {
        self.remove(key);
        self.root.as_deref()
    }

    /// Deletes the node holding `key` and returns its entry, or `None` if the key is absent
    pub fn remove(&mut self, key: &K) -> Option<(K, V)> {
        Self::find_link(&mut self.root, key).and_then(Self::unlink)
    }

    /// Returns the link whose node holds `key`, descending from `link`
    fn find_link<'a>(mut link: &'a mut Link<K, V>, key: &K) -> Option<&'a mut Link<K, V>> {
        loop {
            match key.cmp(&link.as_deref()?.key) {
                Ordering::Equal => return Some(link),
                Ordering::Less => link = &mut link.as_mut()?.left,
                Ordering::Greater => link = &mut link.as_mut()?.right,
            }
        }
    }
}

impl<K, V> Drop for BinarySearchTree<K, V> {
    fn drop(&mut self) {
        // Unbalanced trees can be arbitrarily deep, so nodes are torn down one at a time
        let mut pending: Vec<Box<Node<K, V>>> = self.root.take().into_iter().collect();
        while let Some(mut node) = pending.pop() {
            pending.extend(node.left.take());
            pending.extend(node.right.take());
        }
    }
}

/// Two trees are equal when they have the same shape and the same key and value at every
/// position. Holding the same entries in a different shape is not enough.
impl<K: PartialEq, V: PartialEq> PartialEq for BinarySearchTree<K, V> {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self.root.as_deref(), other.root.as_deref())];
        while let Some(pair) = pending.pop() {
            match pair {
                (None, None) => {}
                (Some(lhs), Some(rhs)) => {
                    if lhs.key != rhs.key || lhs.value != rhs.value {
                        return false;
                    }
                    pending.push((lhs.left.as_deref(), rhs.left.as_deref()));
                    pending.push((lhs.right.as_deref(), rhs.right.as_deref()));
                }
                _ => return false,
            }
        }
        true
    }
}

impl<K: Eq, V: Eq> Eq for BinarySearchTree<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BinarySearchTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.in_order().map(|node| (&node.key, &node.value))).finish()
    }
}

impl<'a, K, V> IntoIterator for &'a BinarySearchTree<K, V> {
    type Item = &'a Node<K, V>;
    type IntoIter = ForwardIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy structural walk returned by [`BinarySearchTree::forward_iter`]
#[derive(Debug)]
pub struct ForwardIter<'a, K, V> {
    /// The root, until it has been yielded
    root: Option<&'a Node<K, V>>,
    /// Next node down the left spine
    left: Option<&'a Node<K, V>>,
    /// Next node down the right spine
    right: Option<&'a Node<K, V>>,
}

impl<'a, K, V> ForwardIter<'a, K, V> {
    /// Starts a walk at `root`
    fn new(root: Option<&'a Node<K, V>>) -> Self {
        Self {
            root,
            left: root.and_then(|node| node.left.as_deref()),
            right: root.and_then(|node| node.right.as_deref()),
        }
    }
}

impl<'a, K, V> Iterator for ForwardIter<'a, K, V> {
    type Item = &'a Node<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            return Some(root);
        }
        if let Some(node) = self.left {
            self.left = node.left.as_deref();
            return Some(node);
        }
        let node = self.right?;
        self.right = node.right.as_deref();
        Some(node)
    }
}

impl<K, V> FusedIterator for ForwardIter<'_, K, V> {}

/// Reversed forward walk returned by [`BinarySearchTree::backward_iter`]
#[derive(Debug)]
pub struct BackwardIter<'a, K, V> {
    /// The materialized forward walk, consumed from the back
    nodes: std::iter::Rev<vec::IntoIter<&'a Node<K, V>>>,
}

impl<'a, K, V> Iterator for BackwardIter<'a, K, V> {
    type Item = &'a Node<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        self.nodes.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.nodes.size_hint()
    }
}

impl<K, V> ExactSizeIterator for BackwardIter<'_, K, V> {}

impl<K, V> FusedIterator for BackwardIter<'_, K, V> {}

/// Sorted walk returned by [`BinarySearchTree::in_order`]
#[derive(Debug)]
pub struct InOrderIter<'a, K, V> {
    /// Ancestors whose own node and right subtree are still to be visited
    stack: Vec<&'a Node<K, V>>,
}

impl<'a, K, V> InOrderIter<'a, K, V> {
    /// Pushes `node` and all of its left descendants
    fn push_left_spine(&mut self, mut node: Option<&'a Node<K, V>>) {
        while let Some(current) = node {
            self.stack.push(current);
            node = current.left.as_deref();
        }
    }
}

impl<'a, K, V> Iterator for InOrderIter<'a, K, V> {
    type Item = &'a Node<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.as_deref());
        Some(node)
    }
}

impl<K, V> FusedIterator for InOrderIter<'_, K, V> {}
