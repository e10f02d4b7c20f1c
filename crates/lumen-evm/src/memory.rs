//! EVM memory
//!
//! Byte-addressable buffer that only grows in whole 32-byte words. Growth is
//! metered by the caller (`instructions::check_memory`); this type only manages
//! the allocation.

use std::ops::{Index, IndexMut, Range};

/// Allocation granularity
pub const PAGE_SIZE: usize = 4 * 1024;

/// EVM memory (byte-addressable, expandable)
#[derive(Clone, Debug)]
pub struct Memory {
    data: Vec<u8>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    /// Create new empty memory with one page reserved
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(PAGE_SIZE),
        }
    }

    /// Get current memory size in bytes
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Whether no memory has been touched yet
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reserved capacity
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Grow to `new_size` bytes, zero-filling the new region.
    ///
    /// `new_size` must be a multiple of 32 and larger than the current size.
    pub fn grow(&mut self, new_size: usize) {
        debug_assert_eq!(new_size % 32, 0, "memory grows in whole words");
        debug_assert!(new_size > self.data.len(), "memory only grows");

        let capacity = self.data.capacity();
        if new_size > capacity {
            let doubled = capacity * 2;
            let target = if new_size <= doubled {
                doubled
            } else {
                new_size.div_ceil(PAGE_SIZE) * PAGE_SIZE
            };
            self.data.reserve_exact(target - self.data.len());
        }
        self.data.resize(new_size, 0);
    }

    /// Reset the size to zero, keeping the allocation
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Load a 32-byte word
    #[inline]
    pub fn load_word(&self, offset: usize) -> [u8; 32] {
        let mut word = [0u8; 32];
        word.copy_from_slice(&self.data[offset..offset + 32]);
        word
    }

    /// Store a 32-byte word
    #[inline]
    pub fn store_word(&mut self, offset: usize, word: &[u8; 32]) {
        self.data[offset..offset + 32].copy_from_slice(word);
    }

    /// Slice `[offset, offset + size)`; empty for `size == 0` whatever the offset
    #[inline]
    pub fn slice(&self, offset: usize, size: usize) -> &[u8] {
        if size == 0 {
            return &[];
        }
        &self.data[offset..offset + size]
    }

    /// Mutable slice `[offset, offset + size)`; empty for `size == 0`
    #[inline]
    pub fn slice_mut(&mut self, offset: usize, size: usize) -> &mut [u8] {
        if size == 0 {
            return &mut [];
        }
        &mut self.data[offset..offset + size]
    }

    /// All of memory
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl Index<usize> for Memory {
    type Output = u8;

    fn index(&self, index: usize) -> &u8 {
        &self.data[index]
    }
}

impl IndexMut<usize> for Memory {
    fn index_mut(&mut self, index: usize) -> &mut u8 {
        &mut self.data[index]
    }
}

impl Index<Range<usize>> for Memory {
    type Output = [u8];

    fn index(&self, range: Range<usize>) -> &[u8] {
        &self.data[range]
    }
}

impl IndexMut<Range<usize>> for Memory {
    fn index_mut(&mut self, range: Range<usize>) -> &mut [u8] {
        &mut self.data[range]
    }
}
