//! Per-call execution state shared by both interpreters

use crate::context::{ExecutionResult, Message, TxContext};
use crate::error::StatusCode;
use crate::host::Host;
use crate::memory::Memory;
use crate::revision::Revision;
use crate::stack::Stack;
use bytes::Bytes;

/// Stack and memory allocations that can outlive a single call
#[derive(Debug, Default)]
pub struct Buffers {
    /// Operand stack storage
    pub stack: Stack,
    /// Memory storage
    pub memory: Memory,
}

/// Mutable context of one execution.
///
/// `gas_left` is signed: handlers subtract first and treat a negative value as
/// out of gas.
pub struct ExecutionState<'a> {
    /// Gas left
    pub gas_left: i64,
    /// Accumulated refund
    pub gas_refund: i64,
    /// Operand stack
    pub stack: Stack,
    /// Memory
    pub memory: Memory,
    /// Input message
    pub msg: &'a Message,
    /// Host callbacks
    pub host: &'a mut dyn Host,
    /// Active revision
    pub rev: Revision,
    /// Output of the last nested call or create
    pub return_data: Bytes,
    /// Code as given by the caller, before any padding
    pub original_code: &'a [u8],
    /// Terminal status
    pub status: StatusCode,
    /// Start of the output window in memory
    pub output_offset: usize,
    /// Length of the output window
    pub output_size: usize,
    /// Gas cost of the current block (advanced interpreter)
    pub current_block_cost: u32,
    tx_context: Option<TxContext>,
}

impl<'a> ExecutionState<'a> {
    /// Create a fresh state
    pub fn new(
        msg: &'a Message,
        rev: Revision,
        host: &'a mut dyn Host,
        code: &'a [u8],
    ) -> Self {
        Self::with_buffers(Buffers::default(), msg, rev, host, code)
    }

    /// Create a fresh state on top of existing allocations
    pub fn with_buffers(
        buffers: Buffers,
        msg: &'a Message,
        rev: Revision,
        host: &'a mut dyn Host,
        code: &'a [u8],
    ) -> Self {
        let Buffers { mut stack, mut memory } = buffers;
        stack.clear();
        memory.clear();
        Self {
            gas_left: msg.gas,
            gas_refund: 0,
            stack,
            memory,
            msg,
            host,
            rev,
            return_data: Bytes::new(),
            original_code: code,
            status: StatusCode::Success,
            output_offset: 0,
            output_size: 0,
            current_block_cost: 0,
            tx_context: None,
        }
    }

    /// Restore a freshly constructed equivalent, keeping the allocations
    pub fn reset(
        &mut self,
        msg: &'a Message,
        rev: Revision,
        host: &'a mut dyn Host,
        code: &'a [u8],
    ) {
        self.gas_left = msg.gas;
        self.gas_refund = 0;
        self.stack.clear();
        self.memory.clear();
        self.msg = msg;
        self.host = host;
        self.rev = rev;
        self.return_data = Bytes::new();
        self.original_code = code;
        self.status = StatusCode::Success;
        self.output_offset = 0;
        self.output_size = 0;
        self.current_block_cost = 0;
        self.tx_context = None;
    }

    /// Release the stack and memory allocations
    pub fn into_buffers(self) -> Buffers {
        Buffers {
            stack: self.stack,
            memory: self.memory,
        }
    }

    /// Transaction context, fetched from the host on first use
    pub fn tx_context(&mut self) -> &TxContext {
        let host = &self.host;
        self.tx_context.get_or_insert_with(|| host.get_tx_context())
    }

    /// Subtract `cost` from the gas left
    #[inline]
    pub fn consume_gas(&mut self, cost: i64) -> Result<(), StatusCode> {
        self.gas_left -= cost;
        if self.gas_left < 0 {
            Err(StatusCode::OutOfGas)
        } else {
            Ok(())
        }
    }

    /// Output window contents
    pub fn output(&self) -> &[u8] {
        self.memory.slice(self.output_offset, self.output_size)
    }

    /// Build the final result for `status`
    pub fn result(&self, status: StatusCode) -> ExecutionResult {
        let gas_left = if status.keeps_gas() { self.gas_left } else { 0 };
        let gas_refund = if status.is_success() { self.gas_refund } else { 0 };
        let output = if status.keeps_gas() {
            Bytes::copy_from_slice(self.output())
        } else {
            Bytes::new()
        };
        ExecutionResult {
            status,
            gas_left,
            gas_refund,
            output,
            create_address: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocked_host::MockedHost;
    use lumen_primitives::{Address, U256};

    #[test]
    fn test_new_state() {
        let msg = Message::new(Address::ZERO, Address::ZERO, Bytes::new(), 1000);
        let mut host = MockedHost::new();
        let state = ExecutionState::new(&msg, Revision::London, &mut host, &[0x00]);
        assert_eq!(state.gas_left, 1000);
        assert!(state.stack.is_empty());
        assert_eq!(state.memory.size(), 0);
        assert_eq!(state.status, StatusCode::Success);
    }

    #[test]
    fn test_tx_context_is_cached() {
        let msg = Message::default();
        let mut host = MockedHost::new();
        host.tx_context.number = 42;
        let mut state = ExecutionState::new(&msg, Revision::London, &mut host, &[]);
        assert_eq!(state.tx_context().number, 42);
        assert_eq!(state.tx_context().number, 42);
    }

    #[test]
    fn test_consume_gas() {
        let msg = Message::new(Address::ZERO, Address::ZERO, Bytes::new(), 10);
        let mut host = MockedHost::new();
        let mut state = ExecutionState::new(&msg, Revision::London, &mut host, &[]);
        assert_eq!(state.consume_gas(10), Ok(()));
        assert_eq!(state.gas_left, 0);
        assert_eq!(state.consume_gas(1), Err(StatusCode::OutOfGas));
    }

    #[test]
    fn test_reset_and_buffers() {
        let msg = Message::new(Address::ZERO, Address::ZERO, Bytes::new(), 10);
        let other = Message::new(Address::ZERO, Address::ZERO, Bytes::new(), 77);
        let mut host = MockedHost::new();
        let mut second_host = MockedHost::new();

        let mut state = ExecutionState::new(&msg, Revision::Berlin, &mut host, &[]);
        state.stack.push(U256::one());
        state.memory.grow(64);
        state.gas_refund = 5;
        state.output_size = 3;

        state.reset(&other, Revision::Cancun, &mut second_host, &[0x00]);
        assert_eq!(state.gas_left, 77);
        assert_eq!(state.gas_refund, 0);
        assert!(state.stack.is_empty());
        assert_eq!(state.memory.size(), 0);
        assert_eq!(state.output_size, 0);
        assert_eq!(state.rev, Revision::Cancun);

        let buffers = state.into_buffers();
        assert!(buffers.memory.capacity() >= 64);
    }

    #[test]
    fn test_result_drops_gas_on_failure() {
        let msg = Message::new(Address::ZERO, Address::ZERO, Bytes::new(), 100);
        let mut host = MockedHost::new();
        let mut state = ExecutionState::new(&msg, Revision::London, &mut host, &[]);
        state.gas_refund = 9;

        let failed = state.result(StatusCode::OutOfGas);
        assert_eq!(failed.gas_left, 0);
        assert_eq!(failed.gas_refund, 0);

        let reverted = state.result(StatusCode::Revert);
        assert_eq!(reverted.gas_left, 100);
        assert_eq!(reverted.gas_refund, 0);

        let ok = state.result(StatusCode::Success);
        assert_eq!(ok.gas_refund, 9);
    }
}
