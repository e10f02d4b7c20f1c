//! Memory instructions: MLOAD, MSTORE, MSTORE8, MSIZE, KECCAK256

use super::{check_memory, check_memory_fixed, window, InstructionResult};
use crate::gas::{cost, num_words};
use crate::state::ExecutionState;
use lumen_crypto::keccak256 as keccak;
use lumen_primitives::U256;

/// MLOAD
pub fn mload(state: &mut ExecutionState<'_>) -> InstructionResult {
    let offset = *state.stack.get(0);
    check_memory_fixed(state, &offset, 32)?;
    let word = state.memory.load_word(offset.low_u64() as usize);
    *state.stack.top() = U256::from_big_endian(&word);
    Ok(())
}

/// MSTORE
pub fn mstore(state: &mut ExecutionState<'_>) -> InstructionResult {
    let offset = state.stack.pop();
    let value = state.stack.pop();
    check_memory_fixed(state, &offset, 32)?;
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    state.memory.store_word(offset.low_u64() as usize, &word);
    Ok(())
}

/// MSTORE8
pub fn mstore8(state: &mut ExecutionState<'_>) -> InstructionResult {
    let offset = state.stack.pop();
    let value = state.stack.pop();
    check_memory_fixed(state, &offset, 1)?;
    state.memory[offset.low_u64() as usize] = value.byte(0);
    Ok(())
}

/// MSIZE
pub fn msize(state: &mut ExecutionState<'_>) -> InstructionResult {
    let size = state.memory.size();
    state.stack.push(U256::from(size));
    Ok(())
}

/// KECCAK256; 6 gas per hashed word on top of memory expansion
pub fn keccak256(state: &mut ExecutionState<'_>) -> InstructionResult {
    let offset = state.stack.pop();
    let size = *state.stack.get(0);
    check_memory(state, &offset, &size)?;

    let (offset, size) = window(&offset, &size);
    state.consume_gas(num_words(size as u64) * cost::KECCAK256_WORD)?;

    let hash = keccak(state.memory.slice(offset, size));
    *state.stack.top() = hash.to_word();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatusCode;
    use crate::instructions::test_utils::*;
    use crate::mocked_host::MockedHost;
    use crate::revision::Revision;
    use lumen_crypto::EMPTY_KECCAK;

    #[test]
    fn test_mstore_mload() {
        let mut host = MockedHost::new();
        let msg = message();
        // MSTORE pops offset first, so the offset is on top
        with_state(&mut host, &msg, Revision::LATEST, &[u(0xABCD), u(32)], |state| {
            mstore(state).unwrap();
            assert_eq!(state.memory.size(), 64);
            assert_eq!(state.gas_left, GAS - 6);

            state.stack.push(u(32));
            mload(state).unwrap();
            assert_eq!(*state.stack.get(0), u(0xABCD));

            msize(state).unwrap();
            assert_eq!(*state.stack.get(0), u(64));
        });
    }

    #[test]
    fn test_mstore8_writes_low_byte() {
        let mut host = MockedHost::new();
        let msg = message();
        with_state(&mut host, &msg, Revision::LATEST, &[u(0x1234), u(3)], |state| {
            mstore8(state).unwrap();
            assert_eq!(state.memory.size(), 32);
            assert_eq!(state.memory[3], 0x34);
        });
    }

    #[test]
    fn test_mload_huge_offset() {
        let mut host = MockedHost::new();
        let msg = message();
        with_state(&mut host, &msg, Revision::LATEST, &[U256::MAX], |state| {
            assert_eq!(mload(state), Err(StatusCode::OutOfGas));
        });
    }

    #[test]
    fn test_keccak256() {
        let mut host = MockedHost::new();
        let msg = message();
        with_state(&mut host, &msg, Revision::LATEST, &[u(0), U256::MAX], |state| {
            keccak256(state).unwrap();
            assert_eq!(*state.stack.get(0), EMPTY_KECCAK.to_word());
            assert_eq!(state.gas_left, GAS);
        });

        // 32 zero bytes
        with_state(&mut host, &msg, Revision::LATEST, &[u(32), u(0)], |state| {
            keccak256(state).unwrap();
            assert_eq!(*state.stack.get(0), keccak(&[0u8; 32]).to_word());
            assert_eq!(state.gas_left, GAS - 3 - 6);
        });
    }
}
