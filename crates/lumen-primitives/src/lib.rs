//! # lumen-primitives
//!
//! Primitive types shared by the Lumen EVM crates.
//!
//! Addresses and 32-byte words travel on the EVM stack as `U256`, so both
//! fixed-size types here convert to and from stack words.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod hash;

pub use address::Address;
pub use hash::H256;

// Re-export primitive-types for 256/512-bit arithmetic
pub use primitive_types::{U256, U512};
