//! # Bump Allocator
//!
//! Hands out address ranges from the top of a fixed region downward.
//! Address bookkeeping only; it owns no bytes and is unrelated to the
//! execution [`Memory`](crate::evm::memory::Memory) buffer.

use crate::errors::VmError;

/// Downward bump allocator over `[0, capacity)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BumpAllocator {
    capacity: usize,
    /// Lowest address handed out so far; everything below is free.
    floor: usize,
}

impl BumpAllocator {
    /// Creates an allocator with nothing allocated.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            floor: capacity,
        }
    }

    /// Bytes still available.
    #[must_use]
    pub fn available(&self) -> usize {
        self.floor
    }

    /// Bytes currently handed out.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.capacity - self.floor
    }

    /// Reserves `size` bytes and returns the start address.
    ///
    /// # Errors
    ///
    /// Returns `AllocationExhausted` if fewer than `size` bytes remain.
    pub fn allocate(&mut self, size: usize) -> Result<usize, VmError> {
        let start = self
            .floor
            .checked_sub(size)
            .ok_or(VmError::AllocationExhausted {
                requested: size,
                available: self.floor,
            })?;
        self.floor = start;
        Ok(start)
    }

    /// Releases a block.
    ///
    /// Only the most recent block is reclaimed; releasing an older block is
    /// accepted but leaves the space reserved until everything below it goes.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if the range was never handed out.
    pub fn deallocate(&mut self, address: usize, size: usize) -> Result<(), VmError> {
        let in_range = address >= self.floor
            && address
                .checked_add(size)
                .is_some_and(|end| end <= self.capacity);
        if !in_range {
            return Err(VmError::OutOfBounds {
                offset: address,
                size,
                capacity: self.capacity,
            });
        }
        if address == self.floor {
            self.floor += size;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocates_downward() {
        let mut alloc = BumpAllocator::new(100);
        assert_eq!(alloc.allocate(10).unwrap(), 90);
        assert_eq!(alloc.allocate(20).unwrap(), 70);
        assert_eq!(alloc.available(), 70);
        assert_eq!(alloc.allocated(), 30);
    }

    #[test]
    fn test_exhaustion() {
        let mut alloc = BumpAllocator::new(16);
        alloc.allocate(16).unwrap();
        assert_eq!(
            alloc.allocate(1),
            Err(VmError::AllocationExhausted {
                requested: 1,
                available: 0
            })
        );
    }

    #[test]
    fn test_deallocate_most_recent() {
        let mut alloc = BumpAllocator::new(100);
        let a = alloc.allocate(10).unwrap();
        let b = alloc.allocate(5).unwrap();

        alloc.deallocate(b, 5).unwrap();
        assert_eq!(alloc.available(), 90);

        alloc.deallocate(a, 10).unwrap();
        assert_eq!(alloc.available(), 100);
    }

    #[test]
    fn test_deallocate_older_block_keeps_space() {
        let mut alloc = BumpAllocator::new(100);
        let a = alloc.allocate(10).unwrap();
        alloc.allocate(5).unwrap();

        alloc.deallocate(a, 10).unwrap();
        assert_eq!(alloc.available(), 85);
    }

    #[test]
    fn test_deallocate_out_of_bounds() {
        let mut alloc = BumpAllocator::new(100);
        alloc.allocate(10).unwrap();
        assert!(alloc.deallocate(0, 10).is_err()); // never handed out
        assert!(alloc.deallocate(95, 10).is_err()); // past capacity
    }
}
