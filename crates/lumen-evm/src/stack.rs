//! EVM operand stack
//!
//! Depth checks happen once per instruction (baseline) or once per block
//! (advanced) before any handler runs, so the accessors here only assert in
//! debug builds.

use crate::gas::cost::MAX_STACK_SIZE;
use lumen_primitives::U256;

/// EVM stack (max 1024 items, 256-bit each)
#[derive(Clone, Debug)]
pub struct Stack {
    data: Box<[U256; MAX_STACK_SIZE]>,
    len: usize,
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

impl Stack {
    /// Create a new empty stack
    pub fn new() -> Self {
        Self {
            data: Box::new([U256::zero(); MAX_STACK_SIZE]),
            len: 0,
        }
    }

    /// Number of items
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the stack is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Push a value onto the stack
    #[inline]
    pub fn push(&mut self, value: U256) {
        debug_assert!(self.len < MAX_STACK_SIZE, "stack overflow");
        self.data[self.len] = value;
        self.len += 1;
    }

    /// Pop a value from the stack
    #[inline]
    pub fn pop(&mut self) -> U256 {
        debug_assert!(self.len > 0, "stack underflow");
        self.len -= 1;
        self.data[self.len]
    }

    /// Item at `depth` (0 = top)
    #[inline]
    pub fn get(&self, depth: usize) -> &U256 {
        debug_assert!(depth < self.len, "stack underflow");
        &self.data[self.len - 1 - depth]
    }

    /// Mutable item at `depth` (0 = top)
    #[inline]
    pub fn get_mut(&mut self, depth: usize) -> &mut U256 {
        debug_assert!(depth < self.len, "stack underflow");
        &mut self.data[self.len - 1 - depth]
    }

    /// Top item
    #[inline]
    pub fn top(&mut self) -> &mut U256 {
        self.get_mut(0)
    }

    /// Duplicate item at depth to top (1 = dup top)
    #[inline]
    pub fn dup(&mut self, depth: usize) {
        let value = *self.get(depth - 1);
        self.push(value);
    }

    /// Swap top with item at depth (1 = swap with second item)
    #[inline]
    pub fn swap(&mut self, depth: usize) {
        debug_assert!(depth < self.len, "stack underflow");
        let top = self.len - 1;
        self.data.swap(top, top - depth);
    }

    /// Items from bottom to top
    pub fn as_slice(&self) -> &[U256] {
        &self.data[..self.len]
    }

    /// Drop all items, keeping the allocation
    pub fn clear(&mut self) {
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop() {
        let mut stack = Stack::new();
        assert!(stack.is_empty());
        stack.push(U256::from(1));
        stack.push(U256::from(2));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop(), U256::from(2));
        assert_eq!(stack.pop(), U256::from(1));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_get_and_top() {
        let mut stack = Stack::new();
        for i in 0..4u64 {
            stack.push(U256::from(i));
        }
        assert_eq!(*stack.get(0), U256::from(3));
        assert_eq!(*stack.get(3), U256::from(0));
        *stack.top() = U256::from(42);
        assert_eq!(stack.as_slice().last(), Some(&U256::from(42)));
    }

    #[test]
    fn test_dup_swap() {
        let mut stack = Stack::new();
        stack.push(U256::from(1));
        stack.push(U256::from(2));
        stack.push(U256::from(3));

        stack.dup(3);
        assert_eq!(*stack.get(0), U256::from(1));
        assert_eq!(stack.len(), 4);

        stack.swap(2);
        assert_eq!(*stack.get(0), U256::from(2));
        assert_eq!(*stack.get(2), U256::from(1));
    }

    #[test]
    fn test_fill_to_limit() {
        let mut stack = Stack::new();
        for i in 0..MAX_STACK_SIZE {
            stack.push(U256::from(i));
        }
        assert_eq!(stack.len(), MAX_STACK_SIZE);
        stack.clear();
        assert!(stack.is_empty());
    }
}
