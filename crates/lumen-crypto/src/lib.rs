//! # lumen-crypto
//!
//! Keccak-256, the only hash the interpreter needs: the KECCAK256
//! instruction, CREATE2 init-code accounting in hosts, and code identity
//! for the analysis cache.

#![warn(missing_docs)]
#![warn(clippy::all)]

use lumen_primitives::H256;
use sha3::{Digest, Keccak256};

/// Hash of the empty byte string.
pub const EMPTY_KECCAK: H256 = H256::from_bytes([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
]);

/// Compute Keccak-256 hash of the input data
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    H256::from_bytes(hasher.finalize().into())
}
