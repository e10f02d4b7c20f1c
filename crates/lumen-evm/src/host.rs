//! Host interface
//!
//! The engine never owns account state. Every balance, storage slot, nested
//! call and log goes through a [`Host`] supplied by the embedder.

use crate::context::{ExecutionResult, Message, TxContext};
use lumen_primitives::{Address, H256, U256};

/// Warm/cold classification of an account or storage slot (EIP-2929)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessStatus {
    /// First access in the transaction
    #[default]
    Cold,
    /// Accessed before
    Warm,
}

/// Effect of a storage write, reported by the host (EIP-1283 classes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageStatus {
    /// The value did not change
    Unchanged,
    /// A clean slot was changed to another non-zero value
    Modified,
    /// A slot already modified in this transaction was changed again
    ModifiedAgain,
    /// A clean zero slot was set to a non-zero value
    Added,
    /// A clean non-zero slot was set to zero
    Deleted,
}

/// Callbacks into the embedding environment
pub trait Host {
    /// Whether the account exists
    fn account_exists(&self, address: &Address) -> bool;

    /// Read a storage slot of `address`
    fn get_storage(&self, address: &Address, key: &H256) -> H256;

    /// Write a storage slot of `address`
    fn set_storage(&mut self, address: &Address, key: &H256, value: &H256) -> StorageStatus;

    /// Balance of the account
    fn get_balance(&self, address: &Address) -> U256;

    /// Code size of the account
    fn get_code_size(&self, address: &Address) -> usize;

    /// Code hash of the account; zero for non-existent accounts
    fn get_code_hash(&self, address: &Address) -> H256;

    /// Copy the account's code starting at `offset` into `buffer`.
    /// Returns the number of bytes copied.
    fn copy_code(&self, address: &Address, offset: usize, buffer: &mut [u8]) -> usize;

    /// Register `address` for destruction. Returns `true` on the first registration.
    fn selfdestruct(&mut self, address: &Address, beneficiary: &Address) -> bool;

    /// Execute a nested call or create
    fn call(&mut self, msg: &Message) -> ExecutionResult;

    /// Transaction and block environment
    fn get_tx_context(&self) -> TxContext;

    /// Hash of the block `number`
    fn get_block_hash(&self, number: i64) -> H256;

    /// Emit a log record
    fn emit_log(&mut self, address: &Address, data: &[u8], topics: &[H256]);

    /// Mark the account as accessed, returning its previous status
    fn access_account(&mut self, address: &Address) -> AccessStatus;

    /// Mark the storage slot as accessed, returning its previous status
    fn access_storage(&mut self, address: &Address, key: &H256) -> AccessStatus;
}
