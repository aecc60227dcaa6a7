//! Error type shared by the tree and the table.

use thiserror::Error;

/// Errors surfaced by [`BinarySearchTree`](crate::BinarySearchTree) and
/// [`HashTable`](crate::HashTable) operations.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// No entry is stored under the requested key
    #[error("key not found")]
    KeyNotFound,

    /// `min`/`max` was asked of a tree with no nodes
    #[error("tree is empty")]
    EmptyTree,
}

impl Error {
    /// Check if this error indicates a missing key
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound)
    }

    /// Check if this error indicates an empty tree
    #[must_use]
    pub fn is_empty_tree(&self) -> bool {
        matches!(self, Self::EmptyTree)
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
