//! # Operand Stack
//!
//! Bounded LIFO of 64-bit words. Default bound is 1024 elements.

use crate::domain::value_objects::Word;
use crate::errors::VmError;

/// Default maximum stack size.
pub const MAX_STACK_SIZE: usize = 1024;

/// Operand stack.
///
/// A LIFO holding [`Word`]s, never longer than its limit. A failed push or pop
/// leaves the contents untouched.
#[derive(Clone, Debug)]
pub struct Stack {
    data: Vec<Word>,
    limit: usize,
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

impl Stack {
    /// Creates an empty stack with the default limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(MAX_STACK_SIZE)
    }

    /// Creates an empty stack holding at most `limit` elements.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            data: Vec::with_capacity(limit.min(64)), // Pre-allocate for common case
            limit,
        }
    }

    /// Returns the number of elements on the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the configured bound.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Push a value onto the stack.
    ///
    /// # Errors
    ///
    /// Returns `StackOverflow` if the stack is full.
    pub fn push(&mut self, value: Word) -> Result<(), VmError> {
        if self.data.len() >= self.limit {
            return Err(VmError::StackOverflow { limit: self.limit });
        }
        self.data.push(value);
        Ok(())
    }

    /// Pop a value from the stack.
    ///
    /// # Errors
    ///
    /// Returns `StackUnderflow` if the stack is empty.
    pub fn pop(&mut self) -> Result<Word, VmError> {
        self.data.pop().ok_or(VmError::StackUnderflow)
    }

    /// Peek at the top value without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<Word> {
        self.data.last().copied()
    }

    /// Bottom-to-top view of the contents.
    #[must_use]
    pub fn as_slice(&self) -> &[Word] {
        &self.data
    }
}

// =============================================================================
// TESTS
// =============================================================================
