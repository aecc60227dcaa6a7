//! # Tree Table
//!
//! An unbalanced binary search tree and a hash-keyed table built on top of it.
//!
//! This crate provides two containers:
//!
//! - `BinarySearchTree`: an ordered store with insert, search, update, delete, min and max.
//!   It never rebalances, so its depth follows insertion order.
//! - `HashTable`: a map over arbitrary hashable keys. Each key is hashed to a `u64` order key and
//!   the `(key, value)` pair is stored in a `BinarySearchTree` under that hash.
//!
//! Neither container is thread-safe. Share one behind a single lock, or give each thread its
//! own table.
//!
//! ## Basic Usage
//!
//! ```rust
//! use treetable::{Error, HashTable};
//!
//! // Create a new table
//! let mut table = HashTable::new();
//!
//! // Insert values
//! table.set("apple".to_string(), 1);
//! table.set("banana".to_string(), 2);
//!
//! // Retrieve values
//! assert_eq!(table.get("apple"), Ok(&1));
//!
//! // Update values
//! table.set("apple".to_string(), 10);
//! assert_eq!(table.get("apple"), Ok(&10));
//!
//! // Remove values
//! assert_eq!(table.delete("apple"), Some(10));
//! assert_eq!(table.get("apple"), Err(Error::KeyNotFound));
//! assert_eq!(table.len(), 1);
//! ```
//!
//! ## Iteration Order
//!
//! Iteration follows the tree's structural walk rather than sorted order. With the default
//! hasher, integer keys hash to themselves, so ascending integer keys come back in order:
//!
//! ```rust
//! use treetable::HashTable;
//!
//! let table = HashTable::from([(1, "a"), (2, "b"), (3, "c")]);
//! assert_eq!(table.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
//! assert_eq!(table.values().copied().collect::<Vec<_>>(), vec!["a", "b", "c"]);
//! ```

/// Module implementing the unbalanced binary search tree
mod binary_search_tree;
/// Error type shared by the tree and the table
mod error;
/// Module implementing the hash-keyed table on top of the tree
mod hash_table;
/// Deterministic key hashing for the table
mod hasher;

pub use binary_search_tree::{BackwardIter, BinarySearchTree, ForwardIter, InOrderIter, Node};
pub use error::{Error, Result};
pub use hash_table::{HashTable, Items, Iter, KeyValuePair, Keys, Values};
pub use hasher::{BuildIdentityHasher, IdentityHasher};
