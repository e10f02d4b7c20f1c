//! Message, transaction context and execution result

use crate::error::StatusCode;
use bytes::Bytes;
use lumen_primitives::{Address, H256, U256};

/// Kind of a call or create message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallKind {
    /// CALL (and STATICCALL, which sets the static flag)
    #[default]
    Call,
    /// DELEGATECALL
    DelegateCall,
    /// CALLCODE
    CallCode,
    /// CREATE
    Create,
    /// CREATE2
    Create2,
}

/// Input message of one execution. Immutable while the code runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    /// Call kind
    pub kind: CallKind,
    /// Whether state modifications are forbidden
    pub is_static: bool,
    /// Call depth (0 for the outermost call)
    pub depth: i32,
    /// Gas limit
    pub gas: i64,
    /// Account whose storage and balance the code operates on
    pub recipient: Address,
    /// Caller address
    pub sender: Address,
    /// Call data
    pub input: Bytes,
    /// Call value
    pub value: U256,
    /// CREATE2 salt
    pub create2_salt: H256,
    /// Account the code was loaded from
    pub code_address: Address,
}

impl Message {
    /// Create a plain call message
    pub fn new(recipient: Address, sender: Address, input: impl Into<Bytes>, gas: i64) -> Self {
        Self {
            recipient,
            sender,
            input: input.into(),
            gas,
            code_address: recipient,
            ..Default::default()
        }
    }

    /// Create a static call message
    pub fn new_static(
        recipient: Address,
        sender: Address,
        input: impl Into<Bytes>,
        gas: i64,
    ) -> Self {
        Self {
            is_static: true,
            ..Self::new(recipient, sender, input, gas)
        }
    }

    /// Set the call value
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Set the call depth
    pub fn with_depth(mut self, depth: i32) -> Self {
        self.depth = depth;
        self
    }
}

/// Transaction and block environment, fetched from the host on first use
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxContext {
    /// Gas price
    pub gas_price: U256,
    /// Transaction origin (original sender)
    pub origin: Address,
    /// Block coinbase (miner/validator)
    pub coinbase: Address,
    /// Block number
    pub number: i64,
    /// Block timestamp
    pub timestamp: i64,
    /// Block gas limit
    pub gas_limit: i64,
    /// Block prevrandao (difficulty before Paris)
    pub prev_randao: H256,
    /// Chain ID
    pub chain_id: U256,
    /// Base fee (EIP-1559)
    pub base_fee: U256,
}

impl Default for TxContext {
    fn default() -> Self {
        Self {
            gas_price: U256::zero(),
            origin: Address::ZERO,
            coinbase: Address::ZERO,
            number: 0,
            timestamp: 0,
            gas_limit: 30_000_000,
            prev_randao: H256::ZERO,
            chain_id: U256::one(),
            base_fee: U256::zero(),
        }
    }
}

/// Result of one execution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Terminal status
    pub status: StatusCode,
    /// Gas left; zero unless the status is success or revert
    pub gas_left: i64,
    /// Gas refund; zero unless the status is success
    pub gas_refund: i64,
    /// Return or revert data
    pub output: Bytes,
    /// Address of the created account (create results only)
    pub create_address: Option<Address>,
}

impl ExecutionResult {
    /// Create a result with no output
    pub fn new(status: StatusCode, gas_left: i64) -> Self {
        Self {
            status,
            gas_left,
            gas_refund: 0,
            output: Bytes::new(),
            create_address: None,
        }
    }

    /// Create a successful result
    pub fn success(gas_left: i64, output: impl Into<Bytes>) -> Self {
        Self {
            output: output.into(),
            ..Self::new(StatusCode::Success, gas_left)
        }
    }

    /// Create a failed result; all gas is consumed
    pub fn failure(status: StatusCode) -> Self {
        Self::new(status, 0)
    }

    /// Create a revert result
    pub fn revert(gas_left: i64, output: impl Into<Bytes>) -> Self {
        Self {
            output: output.into(),
            ..Self::new(StatusCode::Revert, gas_left)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_new() {
        let to = Address::from_bytes([1; 20]);
        let from = Address::from_bytes([2; 20]);
        let msg = Message::new(to, from, vec![0xAA], 1000);
        assert_eq!(msg.kind, CallKind::Call);
        assert!(!msg.is_static);
        assert_eq!(msg.code_address, to);
        assert_eq!(msg.input.as_ref(), &[0xAA]);
        assert_eq!(msg.value, U256::zero());
    }

    #[test]
    fn test_message_static() {
        let msg = Message::new_static(Address::ZERO, Address::ZERO, Bytes::new(), 10)
            .with_depth(3)
            .with_value(U256::from(7));
        assert!(msg.is_static);
        assert_eq!(msg.depth, 3);
        assert_eq!(msg.value, U256::from(7));
    }

    #[test]
    fn test_execution_result_constructors() {
        let ok = ExecutionResult::success(100, vec![1, 2, 3]);
        assert_eq!(ok.status, StatusCode::Success);
        assert_eq!(ok.gas_left, 100);
        assert_eq!(ok.output.as_ref(), &[1, 2, 3]);

        let failed = ExecutionResult::failure(StatusCode::OutOfGas);
        assert_eq!(failed.gas_left, 0);
        assert!(failed.output.is_empty());

        let reverted = ExecutionResult::revert(7, vec![9]);
        assert_eq!(reverted.status, StatusCode::Revert);
        assert_eq!(reverted.gas_left, 7);
    }

    #[test]
    fn test_tx_context_default() {
        let ctx = TxContext::default();
        assert_eq!(ctx.chain_id, U256::one());
        assert_eq!(ctx.gas_limit, 30_000_000);
    }
}
