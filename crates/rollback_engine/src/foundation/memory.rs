//! Memory management utilities
//!
//! Byte-budget allocators used to size containers up front. An allocation is a
//! `(offset, size)` record inside the allocator's managed range; the owner of a
//! container reserves against the budget once and then keeps its `Vec`s at that
//! capacity, so exhaustion is detected at setup instead of growing on the hot path.

use thiserror::Error;

/// Alignment applied to every allocation, in bytes
pub const DEFAULT_ALIGNMENT: usize = 8;

/// Allocator failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// Not enough room left for the request
    #[error("out of memory: requested {requested} bytes, {available} available")]
    OutOfMemory {
        /// Bytes requested (after alignment)
        requested: usize,
        /// Bytes still available
        available: usize,
    },

    /// The allocation was not issued by this allocator, or was already freed
    #[error("invalid allocation")]
    InvalidAllocation,

    /// The allocator does not support this operation
    #[error("operation not supported by this allocator")]
    Unsupported,
}

/// A reserved byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Allocation {
    /// Start of the range, relative to the allocator's base
    pub offset: usize,
    /// Size of the range in bytes
    pub size: usize,
}

/// Common allocator interface
pub trait Allocator {
    /// Reserve room for `count` elements of `element_size` bytes each
    fn allocate(&mut self, count: usize, element_size: usize) -> Result<Allocation, AllocError>;

    /// Return a previously issued allocation
    fn deallocate(&mut self, allocation: Allocation) -> Result<(), AllocError>;

    /// Bytes currently in use
    fn used(&self) -> usize;

    /// Total bytes managed
    fn capacity(&self) -> usize;

    /// Bytes still available
    fn available(&self) -> usize {
        self.capacity() - self.used()
    }
}

fn align_up(size: usize, alignment: usize) -> usize {
    (size + alignment - 1) / alignment * alignment
}

fn request_size(count: usize, element_size: usize) -> Result<usize, AllocError> {
    count
        .checked_mul(element_size)
        .map(|size| align_up(size, DEFAULT_ALIGNMENT))
        .ok_or(AllocError::OutOfMemory {
            requested: usize::MAX,
            available: 0,
        })
}

/// Bump allocator: allocations are carved sequentially and released all at once
#[derive(Debug, Clone)]
pub struct LinearAllocator {
    capacity: usize,
    cursor: usize,
    allocation_count: usize,
}

impl LinearAllocator {
    /// Create a linear allocator managing `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            cursor: 0,
            allocation_count: 0,
        }
    }

    /// Release every allocation
    pub fn clear(&mut self) {
        self.cursor = 0;
        self.allocation_count = 0;
    }

    /// Number of live allocations
    pub fn allocation_count(&self) -> usize {
        self.allocation_count
    }
}

impl Allocator for LinearAllocator {
    fn allocate(&mut self, count: usize, element_size: usize) -> Result<Allocation, AllocError> {
        let size = request_size(count, element_size)?;
        if size > self.available() {
            return Err(AllocError::OutOfMemory {
                requested: size,
                available: self.available(),
            });
        }
        let allocation = Allocation {
            offset: self.cursor,
            size,
        };
        self.cursor += size;
        self.allocation_count += 1;
        Ok(allocation)
    }

    fn deallocate(&mut self, _allocation: Allocation) -> Result<(), AllocError> {
        Err(AllocError::Unsupported)
    }

    fn used(&self) -> usize {
        self.cursor
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Fixed-size block allocator with a LIFO free list
#[derive(Debug, Clone)]
pub struct PoolAllocator {
    block_size: usize,
    block_count: usize,
    free_blocks: Vec<usize>,
}

impl PoolAllocator {
    /// Create a pool of `block_count` blocks able to hold one `block_size` object each
    pub fn new(block_size: usize, block_count: usize) -> Self {
        let block_size = align_up(block_size.max(1), DEFAULT_ALIGNMENT);
        Self {
            block_size,
            block_count,
            // Reverse order so the first allocation gets block 0
            free_blocks: (0..block_count).rev().collect(),
        }
    }

    /// Size of one block in bytes
    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

impl Allocator for PoolAllocator {
    fn allocate(&mut self, count: usize, element_size: usize) -> Result<Allocation, AllocError> {
        let size = request_size(count, element_size)?;
        if size > self.block_size {
            return Err(AllocError::Unsupported);
        }
        let block = self.free_blocks.pop().ok_or(AllocError::OutOfMemory {
            requested: self.block_size,
            available: 0,
        })?;
        Ok(Allocation {
            offset: block * self.block_size,
            size: self.block_size,
        })
    }

    fn deallocate(&mut self, allocation: Allocation) -> Result<(), AllocError> {
        if allocation.size != self.block_size || allocation.offset % self.block_size != 0 {
            return Err(AllocError::InvalidAllocation);
        }
        let block = allocation.offset / self.block_size;
        if block >= self.block_count || self.free_blocks.contains(&block) {
            return Err(AllocError::InvalidAllocation);
        }
        self.free_blocks.push(block);
        Ok(())
    }

    fn used(&self) -> usize {
        (self.block_count - self.free_blocks.len()) * self.block_size
    }

    fn capacity(&self) -> usize {
        self.block_count * self.block_size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FreeBlock {
    offset: usize,
    size: usize,
}

/// First-fit allocator over a free list kept sorted by offset
///
/// Adjacent free blocks are coalesced on deallocation.
#[derive(Debug, Clone)]
pub struct FreeListAllocator {
    capacity: usize,
    used: usize,
    free_blocks: Vec<FreeBlock>,
    live: Vec<Allocation>,
}

impl FreeListAllocator {
    /// Create a free-list allocator managing `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            used: 0,
            free_blocks: vec![FreeBlock {
                offset: 0,
                size: capacity,
            }],
            live: Vec::new(),
        }
    }

    /// Number of disjoint free regions (1 when fully coalesced)
    pub fn fragment_count(&self) -> usize {
        self.free_blocks.len()
    }
}

impl Allocator for FreeListAllocator {
    fn allocate(&mut self, count: usize, element_size: usize) -> Result<Allocation, AllocError> {
        let size = request_size(count, element_size)?;
        let index = self
            .free_blocks
            .iter()
            .position(|block| block.size >= size)
            .ok_or(AllocError::OutOfMemory {
                requested: size,
                available: self.capacity - self.used,
            })?;

        let block = &mut self.free_blocks[index];
        let allocation = Allocation {
            offset: block.offset,
            size,
        };
        if block.size == size {
            self.free_blocks.remove(index);
        } else {
            block.offset += size;
            block.size -= size;
        }

        self.used += size;
        self.live.push(allocation);
        Ok(allocation)
    }

    fn deallocate(&mut self, allocation: Allocation) -> Result<(), AllocError> {
        let live_index = self
            .live
            .iter()
            .position(|live| *live == allocation)
            .ok_or(AllocError::InvalidAllocation)?;
        self.live.swap_remove(live_index);
        self.used -= allocation.size;

        let insert_at = self
            .free_blocks
            .iter()
            .position(|block| block.offset > allocation.offset)
            .unwrap_or(self.free_blocks.len());
        self.free_blocks.insert(
            insert_at,
            FreeBlock {
                offset: allocation.offset,
                size: allocation.size,
            },
        );

        // Merge with the following block, then with the preceding one
        if insert_at + 1 < self.free_blocks.len() {
            let next = self.free_blocks[insert_at + 1];
            let current = &mut self.free_blocks[insert_at];
            if current.offset + current.size == next.offset {
                current.size += next.size;
                self.free_blocks.remove(insert_at + 1);
            }
        }
        if insert_at > 0 {
            let current = self.free_blocks[insert_at];
            let previous = &mut self.free_blocks[insert_at - 1];
            if previous.offset + previous.size == current.offset {
                previous.size += current.size;
                self.free_blocks.remove(insert_at);
            }
        }
        Ok(())
    }

    fn used(&self) -> usize {
        self.used
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_allocator_exhaustion() {
        let mut allocator = LinearAllocator::new(64);
        let first = allocator.allocate(4, 8).unwrap();
        assert_eq!(first.offset, 0);
        assert_eq!(first.size, 32);

        let second = allocator.allocate(3, 3).unwrap();
        assert_eq!(second.offset, 32);
        assert_eq!(second.size, 16); // 9 rounded up to the alignment

        assert!(matches!(
            allocator.allocate(3, 8),
            Err(AllocError::OutOfMemory { requested: 24, available: 16 })
        ));
        assert_eq!(allocator.deallocate(first), Err(AllocError::Unsupported));

        allocator.clear();
        assert_eq!(allocator.used(), 0);
    }

    #[test]
    fn test_pool_allocator_reuses_blocks() {
        let mut pool = PoolAllocator::new(16, 2);
        let a = pool.allocate(1, 16).unwrap();
        let b = pool.allocate(1, 12).unwrap();
        assert_ne!(a.offset, b.offset);
        assert!(pool.allocate(1, 16).is_err());

        pool.deallocate(a).unwrap();
        assert_eq!(pool.deallocate(a), Err(AllocError::InvalidAllocation));
        let c = pool.allocate(1, 16).unwrap();
        assert_eq!(c, a);
        assert_eq!(pool.allocate(1, 32), Err(AllocError::Unsupported));
    }

    #[test]
    fn test_free_list_coalesces() {
        let mut allocator = FreeListAllocator::new(96);
        let a = allocator.allocate(1, 32).unwrap();
        let b = allocator.allocate(1, 32).unwrap();
        let c = allocator.allocate(1, 32).unwrap();
        assert_eq!(allocator.available(), 0);

        allocator.deallocate(a).unwrap();
        allocator.deallocate(c).unwrap();
        assert_eq!(allocator.fragment_count(), 2);

        allocator.deallocate(b).unwrap();
        assert_eq!(allocator.fragment_count(), 1);
        assert_eq!(allocator.used(), 0);

        let big = allocator.allocate(12, 8).unwrap();
        assert_eq!(big.offset, 0);
        assert_eq!(big.size, 96);
    }
}
