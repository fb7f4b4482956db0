//! # Contract Storage
//!
//! Key-value slots for one execution. Created with the machine state and
//! dropped with it; nothing persists across calls.

use crate::domain::services::{decode_stored_word, word_to_be_bytes};
use crate::domain::value_objects::{StorageKey, Word};
use std::collections::HashMap;

/// Storage slots keyed by canonical hex keys.
#[derive(Clone, Debug, Default)]
pub struct ContractStorage {
    slots: HashMap<StorageKey, Vec<u8>>,
}

impl ContractStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a slot.
    pub fn set(&mut self, key: StorageKey, value: Vec<u8>) {
        self.slots.insert(key, value);
    }

    /// Reads a slot. `None` means the key was never written.
    #[must_use]
    pub fn get(&self, key: &StorageKey) -> Option<&[u8]> {
        self.slots.get(key).map(Vec::as_slice)
    }

    /// Number of written slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// SSTORE: writes `value` as 8 big-endian bytes under the canonical key.
    pub fn store_word(&mut self, key: Word, value: Word) {
        self.set(StorageKey::from_word(key), word_to_be_bytes(value).to_vec());
    }

    /// SLOAD: reads the slot as a word; a miss reads as 0.
    #[must_use]
    pub fn load_word(&self, key: Word) -> Word {
        self.get(&StorageKey::from_word(key))
            .map_or(0, decode_stored_word)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_set_get() {
        let mut storage = ContractStorage::new();
        let key = StorageKey::from_word(1);
        assert!(storage.get(&key).is_none());

        storage.set(key.clone(), vec![0xAA]);
        assert_eq!(storage.get(&key), Some(&[0xAA][..]));

        storage.set(key.clone(), vec![0xBB, 0xCC]);
        assert_eq!(storage.get(&key), Some(&[0xBB, 0xCC][..]));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_store_word_layout() {
        let mut storage = ContractStorage::new();
        storage.store_word(0xff, 5);
        assert_eq!(
            storage.get(&StorageKey::from_word(255)),
            Some(&[0, 0, 0, 0, 0, 0, 0, 5][..])
        );
    }

    #[test]
    fn test_load_miss_is_zero() {
        let storage = ContractStorage::new();
        assert_eq!(storage.load_word(42), 0);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_load_narrow_and_wide_values() {
        let mut storage = ContractStorage::new();
        storage.set(StorageKey::from_word(1), vec![0x01, 0x02]);
        storage.set(StorageKey::from_word(2), vec![0x11; 12]);

        assert_eq!(storage.load_word(1), 0x0102);
        assert_eq!(storage.load_word(2), 0x1111_1111_1111_1111);
    }

    proptest! {
        #[test]
        fn prop_store_load_round_trip(key in any::<u64>(), value in any::<u64>()) {
            let mut storage = ContractStorage::new();
            storage.store_word(key, value);
            prop_assert_eq!(storage.load_word(key), value);
        }
    }
}
