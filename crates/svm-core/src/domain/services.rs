//! # Domain Services
//!
//! Pure functions shared by the dispatcher, storage and result builders.
//! Deterministic, no I/O.

use crate::domain::value_objects::{Hash, Word, WORD_BYTES};
use sha3::{Digest, Keccak256};

// =============================================================================
// HASHING
// =============================================================================

/// Computes Keccak-256 of `data`.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    let hash = Keccak256::digest(data);
    Hash::new(hash.into())
}

// =============================================================================
// WORD ENCODING
// =============================================================================

/// Encodes a word as 8 big-endian bytes.
#[must_use]
pub fn word_to_be_bytes(word: Word) -> [u8; WORD_BYTES] {
    word.to_be_bytes()
}

/// Decodes a PUSH immediate (1..=32 bytes, big-endian).
///
/// Bytes beyond the word width are shifted out from the most-significant side,
/// so only the trailing 8 bytes survive.
#[must_use]
pub fn decode_immediate(bytes: &[u8]) -> Word {
    bytes
        .iter()
        .fold(0, |acc: Word, &byte| (acc << 8) | Word::from(byte))
}

/// Decodes a stored value: the first (at most) 8 bytes, big-endian.
///
/// Shorter values decode as-is (`[0x01, 0x02]` is `0x0102`); bytes past the
/// eighth are ignored.
#[must_use]
pub fn decode_stored_word(bytes: &[u8]) -> Word {
    decode_immediate(&bytes[..bytes.len().min(WORD_BYTES)])
}

// =============================================================================
// TESTS
// =============================================================================
