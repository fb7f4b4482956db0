//! # Execution Memory
//!
//! Fixed-capacity linear byte buffer. Allocated once per call, never resized.

use crate::errors::VmError;

/// Default memory size (4 MiB): room for the bytecode image plus scratch.
pub const DEFAULT_MEMORY_SIZE: usize = 2048 * 2048;

/// Largest memory a machine may be configured with (64 MiB).
pub const MAX_MEMORY_SIZE: usize = 64 * 1024 * 1024;

/// Fixed-size, bounds-checked byte buffer.
#[derive(Clone, Debug)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Creates a zeroed buffer of `capacity` bytes.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if `capacity` exceeds [`MAX_MEMORY_SIZE`] or the
    /// allocation cannot be reserved.
    pub fn new(capacity: usize) -> Result<Self, VmError> {
        let too_large = VmError::OutOfBounds {
            offset: 0,
            size: capacity,
            capacity: MAX_MEMORY_SIZE,
        };
        if capacity > MAX_MEMORY_SIZE {
            return Err(too_large);
        }

        let mut data = Vec::new();
        data.try_reserve_exact(capacity).map_err(|_| too_large)?;
        data.resize(capacity, 0);
        Ok(Self { data })
    }

    /// Returns the capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Copies `data` in at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if the write would overrun the buffer.
    pub fn store(&mut self, offset: usize, data: &[u8]) -> Result<(), VmError> {
        let end = self.checked_end(offset, data.len())?;
        self.data[offset..end].copy_from_slice(data);
        Ok(())
    }

    /// Returns a copy of `length` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if the range overruns the buffer.
    pub fn load(&self, offset: usize, length: usize) -> Result<Vec<u8>, VmError> {
        let end = self.checked_end(offset, length)?;
        Ok(self.data[offset..end].to_vec())
    }

    /// Get a reference to the underlying data.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    fn checked_end(&self, offset: usize, size: usize) -> Result<usize, VmError> {
        offset
            .checked_add(size)
            .filter(|&end| end <= self.data.len())
            .ok_or(VmError::OutOfBounds {
                offset,
                size,
                capacity: self.data.len(),
            })
    }
}

// =============================================================================
// TESTS
// =============================================================================
