//! Deterministic hashing used to turn table keys into tree order keys.
//!
//! Table equality compares the shape of the hash-ordered trees, so two tables only compare
//! equal if they hash the same key to the same value. A randomly seeded hasher would break
//! that, which is why [`HashTable`](crate::HashTable) defaults to [`BuildIdentityHasher`].

use std::hash::{BuildHasherDefault, Hasher};

/// FNV-1a offset basis, the starting state for byte-oriented input
const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
/// FNV-1a prime, used both for bytes and for mixing multi-word keys
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// A hasher that maps a single integer to itself.
///
/// A key written as exactly one integer hashes to that integer, so ascending integer keys get
/// ascending order keys. Byte input such as strings is folded with FNV-1a, and every further
/// word written after the first is mixed into the running state.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityHasher {
    /// The running hash
    state: u64,
    /// Whether anything has been written yet
    written: bool,
}

impl IdentityHasher {
    /// Feeds one integer word
    fn write_word(&mut self, word: u64) {
        self.state = if self.written { self.state.wrapping_mul(FNV_PRIME) ^ word } else { word };
        self.written = true;
    }
}

impl Hasher for IdentityHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        let mut state = if self.written { self.state } else { FNV_OFFSET_BASIS };
        for &byte in bytes {
            state = (state ^ u64::from(byte)).wrapping_mul(FNV_PRIME);
        }
        self.state = state;
        self.written = true;
    }

    fn write_u8(&mut self, i: u8) {
        self.write_word(u64::from(i));
    }

    fn write_u16(&mut self, i: u16) {
        self.write_word(u64::from(i));
    }

    fn write_u32(&mut self, i: u32) {
        self.write_word(u64::from(i));
    }

    fn write_u64(&mut self, i: u64) {
        self.write_word(i);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_u128(&mut self, i: u128) {
        self.write_word(i as u64);
        self.write_word((i >> 64) as u64);
    }

    fn write_usize(&mut self, i: usize) {
        self.write_word(i as u64);
    }

    #[allow(clippy::cast_sign_loss)]
    fn write_i8(&mut self, i: i8) {
        self.write_word(i64::from(i) as u64);
    }

    #[allow(clippy::cast_sign_loss)]
    fn write_i16(&mut self, i: i16) {
        self.write_word(i64::from(i) as u64);
    }

    #[allow(clippy::cast_sign_loss)]
    fn write_i32(&mut self, i: i32) {
        self.write_word(i64::from(i) as u64);
    }

    #[allow(clippy::cast_sign_loss)]
    fn write_i64(&mut self, i: i64) {
        self.write_word(i as u64);
    }

    #[allow(clippy::cast_sign_loss)]
    fn write_i128(&mut self, i: i128) {
        self.write_u128(i as u128);
    }

    #[allow(clippy::cast_sign_loss)]
    fn write_isize(&mut self, i: isize) {
        self.write_word(i as u64);
    }
}

/// `BuildHasher` producing [`IdentityHasher`]s, the default for [`HashTable`](crate::HashTable)
pub type BuildIdentityHasher = BuildHasherDefault<IdentityHasher>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::{BuildHasher, Hash};

    fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
        BuildIdentityHasher::default().hash_one(value)
    }

    #[test]
    fn test_integers_hash_to_themselves() {
        assert_eq!(hash_of(&0u8), 0);
        assert_eq!(hash_of(&7u32), 7);
        assert_eq!(hash_of(&42i32), 42);
        assert_eq!(hash_of(&1_000_000u64), 1_000_000);
        assert_eq!(hash_of(&9usize), 9);
        assert_eq!(hash_of(&'a'), 97);
    }

    #[test]
    fn test_ascending_integers_keep_their_order() {
        let hashes: Vec<u64> = (0i64..100).map(|i| hash_of(&i)).collect();
        assert!(hashes.windows(2).all(|pair| pair.first() < pair.last()));
    }

    #[test]
    fn test_negative_integers_are_sign_extended() {
        assert_eq!(hash_of(&-1i32), u64::MAX);
        assert_eq!(hash_of(&-1i8), hash_of(&-1i64));
    }

    #[test]
    fn test_hashing_is_deterministic() {
        assert_eq!(hash_of("apple"), hash_of("apple"));
        assert_eq!(hash_of(&(2, 3)), hash_of(&(2, 3)));
        assert_ne!(hash_of("apple"), hash_of("banana"));
        assert_ne!(hash_of(&(2, 3)), hash_of(&(3, 2)));
    }

    #[test]
    fn test_string_and_integer_do_not_collide() {
        assert_ne!(hash_of("2"), hash_of(&2));
        assert_ne!(hash_of(&(2, 3)), hash_of(&2));
    }
}
