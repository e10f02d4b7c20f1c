//! In-memory [`Host`] for tests, benchmarks and tooling

use crate::context::{ExecutionResult, Message, TxContext};
use crate::error::StatusCode;
use crate::host::{AccessStatus, Host, StorageStatus};
use bytes::Bytes;
use lumen_crypto::keccak256;
use lumen_primitives::{Address, H256, U256};
use std::collections::HashMap;

/// Storage slot with its value at the start of the transaction
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorageValue {
    /// Current value
    pub value: H256,
    /// Value before the transaction
    pub original: H256,
    /// Warm/cold status
    pub access_status: AccessStatus,
}

impl StorageValue {
    /// A clean slot holding `value`
    pub fn new(value: H256) -> Self {
        Self {
            value,
            original: value,
            access_status: AccessStatus::Cold,
        }
    }
}

/// Account state
#[derive(Clone, Debug, Default)]
pub struct MockedAccount {
    /// Nonce
    pub nonce: u64,
    /// Code
    pub code: Bytes,
    /// Hash of `code`
    pub code_hash: H256,
    /// Balance
    pub balance: U256,
    /// Storage
    pub storage: HashMap<H256, StorageValue>,
}

impl MockedAccount {
    /// Account with the given code; the code hash is computed
    pub fn with_code(code: impl Into<Bytes>) -> Self {
        let code = code.into();
        Self {
            code_hash: keccak256(&code),
            code,
            ..Default::default()
        }
    }

    /// Set the balance
    pub fn with_balance(mut self, balance: U256) -> Self {
        self.balance = balance;
        self
    }
}

/// Log emitted through the host
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    /// Emitting account
    pub creator: Address,
    /// Log data
    pub data: Bytes,
    /// Log topics (0-4)
    pub topics: Vec<H256>,
}

/// SELFDESTRUCT registered through the host
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelfdestructRecord {
    /// Destroyed account
    pub selfdestructed: Address,
    /// Receiver of the remaining balance
    pub beneficiary: Address,
}

/// Host keeping all state in memory and recording every side effect
#[derive(Clone, Debug)]
pub struct MockedHost {
    /// Accounts
    pub accounts: HashMap<Address, MockedAccount>,
    /// Transaction context returned by `get_tx_context`
    pub tx_context: TxContext,
    /// Hash returned by `get_block_hash`
    pub block_hash: H256,
    /// Result returned by every nested call
    pub call_result: ExecutionResult,
    /// Nested call messages in order
    pub recorded_calls: Vec<Message>,
    /// Logs in order
    pub recorded_logs: Vec<LogRecord>,
    /// Selfdestructs in order
    pub recorded_selfdestructs: Vec<SelfdestructRecord>,
    /// Account accesses in order
    pub recorded_account_accesses: Vec<Address>,
}

impl Default for MockedHost {
    fn default() -> Self {
        Self {
            accounts: HashMap::new(),
            tx_context: TxContext::default(),
            block_hash: H256::ZERO,
            call_result: ExecutionResult::new(StatusCode::Success, 0),
            recorded_calls: Vec::new(),
            recorded_logs: Vec::new(),
            recorded_selfdestructs: Vec::new(),
            recorded_account_accesses: Vec::new(),
        }
    }
}

impl MockedHost {
    /// Create an empty host
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an account
    pub fn insert_account(&mut self, address: Address, account: MockedAccount) {
        self.accounts.insert(address, account);
    }

    /// Seed a clean storage slot
    pub fn set_initial_storage(&mut self, address: Address, key: H256, value: H256) {
        self.accounts
            .entry(address)
            .or_default()
            .storage
            .insert(key, StorageValue::new(value));
    }

    /// Current value of a slot, zero when absent
    pub fn storage_value(&self, address: &Address, key: &H256) -> H256 {
        self.accounts
            .get(address)
            .and_then(|acc| acc.storage.get(key))
            .map(|slot| slot.value)
            .unwrap_or(H256::ZERO)
    }

    /// Forget recorded side effects and warm/cold marks
    pub fn clear_records(&mut self) {
        self.recorded_calls.clear();
        self.recorded_logs.clear();
        self.recorded_selfdestructs.clear();
        self.recorded_account_accesses.clear();
        for account in self.accounts.values_mut() {
            for slot in account.storage.values_mut() {
                slot.access_status = AccessStatus::Cold;
            }
        }
    }
}

impl Host for MockedHost {
    fn account_exists(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
    }

    fn get_storage(&self, address: &Address, key: &H256) -> H256 {
        self.storage_value(address, key)
    }

    fn set_storage(&mut self, address: &Address, key: &H256, value: &H256) -> StorageStatus {
        let slot = self
            .accounts
            .entry(*address)
            .or_default()
            .storage
            .entry(*key)
            .or_default();

        if slot.value == *value {
            return StorageStatus::Unchanged;
        }

        let status = if slot.value != slot.original {
            StorageStatus::ModifiedAgain
        } else if slot.original.is_zero() {
            StorageStatus::Added
        } else if value.is_zero() {
            StorageStatus::Deleted
        } else {
            StorageStatus::Modified
        };
        slot.value = *value;
        status
    }

    fn get_balance(&self, address: &Address) -> U256 {
        self.accounts
            .get(address)
            .map(|acc| acc.balance)
            .unwrap_or_default()
    }

    fn get_code_size(&self, address: &Address) -> usize {
        self.accounts.get(address).map(|acc| acc.code.len()).unwrap_or(0)
    }

    fn get_code_hash(&self, address: &Address) -> H256 {
        self.accounts
            .get(address)
            .map(|acc| acc.code_hash)
            .unwrap_or(H256::ZERO)
    }

    fn copy_code(&self, address: &Address, offset: usize, buffer: &mut [u8]) -> usize {
        let Some(acc) = self.accounts.get(address) else {
            return 0;
        };
        if offset >= acc.code.len() {
            return 0;
        }
        let n = buffer.len().min(acc.code.len() - offset);
        buffer[..n].copy_from_slice(&acc.code[offset..offset + n]);
        n
    }

    fn selfdestruct(&mut self, address: &Address, beneficiary: &Address) -> bool {
        let first = !self
            .recorded_selfdestructs
            .iter()
            .any(|r| r.selfdestructed == *address);
        self.recorded_selfdestructs.push(SelfdestructRecord {
            selfdestructed: *address,
            beneficiary: *beneficiary,
        });
        first
    }

    fn call(&mut self, msg: &Message) -> ExecutionResult {
        self.recorded_calls.push(msg.clone());
        self.call_result.clone()
    }

    fn get_tx_context(&self) -> TxContext {
        self.tx_context.clone()
    }

    fn get_block_hash(&self, _number: i64) -> H256 {
        self.block_hash
    }

    fn emit_log(&mut self, address: &Address, data: &[u8], topics: &[H256]) {
        self.recorded_logs.push(LogRecord {
            creator: *address,
            data: Bytes::copy_from_slice(data),
            topics: topics.to_vec(),
        });
    }

    fn access_account(&mut self, address: &Address) -> AccessStatus {
        let warm = self.recorded_account_accesses.contains(address);
        self.recorded_account_accesses.push(*address);
        if warm {
            AccessStatus::Warm
        } else {
            AccessStatus::Cold
        }
    }

    fn access_storage(&mut self, address: &Address, key: &H256) -> AccessStatus {
        let slot = self
            .accounts
            .entry(*address)
            .or_default()
            .storage
            .entry(*key)
            .or_default();
        std::mem::replace(&mut slot.access_status, AccessStatus::Warm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    fn word(v: u64) -> H256 {
        H256::from(U256::from(v))
    }

    #[test]
    fn test_storage_transitions() {
        let mut host = MockedHost::new();
        let a = addr(1);
        let key = word(1);

        assert_eq!(host.set_storage(&a, &key, &word(0)), StorageStatus::Unchanged);
        assert_eq!(host.set_storage(&a, &key, &word(5)), StorageStatus::Added);
        assert_eq!(host.set_storage(&a, &key, &word(6)), StorageStatus::ModifiedAgain);
        assert_eq!(host.get_storage(&a, &key), word(6));

        host.set_initial_storage(a, word(2), word(9));
        assert_eq!(host.set_storage(&a, &word(2), &word(8)), StorageStatus::Modified);
        host.set_initial_storage(a, word(3), word(9));
        assert_eq!(host.set_storage(&a, &word(3), &word(0)), StorageStatus::Deleted);
    }

    #[test]
    fn test_access_tracking() {
        let mut host = MockedHost::new();
        assert_eq!(host.access_account(&addr(1)), AccessStatus::Cold);
        assert_eq!(host.access_account(&addr(1)), AccessStatus::Warm);
        assert_eq!(host.access_account(&addr(2)), AccessStatus::Cold);
        assert_eq!(host.recorded_account_accesses.len(), 3);

        assert_eq!(host.access_storage(&addr(1), &word(1)), AccessStatus::Cold);
        assert_eq!(host.access_storage(&addr(1), &word(1)), AccessStatus::Warm);

        host.clear_records();
        assert_eq!(host.access_account(&addr(1)), AccessStatus::Cold);
        assert_eq!(host.access_storage(&addr(1), &word(1)), AccessStatus::Cold);
    }

    #[test]
    fn test_copy_code() {
        let mut host = MockedHost::new();
        host.insert_account(addr(1), MockedAccount::with_code(vec![1, 2, 3, 4]));
        let mut buf = [0u8; 3];
        assert_eq!(host.copy_code(&addr(1), 2, &mut buf), 2);
        assert_eq!(buf, [3, 4, 0]);
        assert_eq!(host.copy_code(&addr(1), 10, &mut buf), 0);
        assert_eq!(host.copy_code(&addr(9), 0, &mut buf), 0);
        assert_eq!(host.get_code_size(&addr(1)), 4);
        assert_eq!(host.get_code_hash(&addr(1)), keccak256(&[1, 2, 3, 4]));
    }

    #[test]
    fn test_selfdestruct_first_registration() {
        let mut host = MockedHost::new();
        assert!(host.selfdestruct(&addr(1), &addr(2)));
        assert!(!host.selfdestruct(&addr(1), &addr(3)));
        assert_eq!(host.recorded_selfdestructs.len(), 2);
    }

    #[test]
    fn test_call_records_message() {
        let mut host = MockedHost::new();
        host.call_result = ExecutionResult::success(50, vec![7]);
        let msg = Message::new(addr(1), addr(2), vec![1], 100);
        let result = host.call(&msg);
        assert_eq!(result.gas_left, 50);
        assert_eq!(host.recorded_calls, vec![msg]);
    }
}
