//! Environment and block information instructions

use super::{as_u64_saturated, check_memory, window, InstructionResult, MAX_BUFFER_SIZE};
use crate::error::StatusCode;
use crate::gas::{cost, num_words};
use crate::host::AccessStatus;
use crate::revision::Revision;
use crate::state::ExecutionState;
use lumen_primitives::{Address, H256, U256};

/// Charge the EIP-2929 surcharge when `address` is cold
#[inline]
fn access_account(state: &mut ExecutionState<'_>, address: &Address) -> InstructionResult {
    if state.rev >= Revision::Berlin && state.host.access_account(address) == AccessStatus::Cold {
        state.consume_gas(cost::ADDITIONAL_COLD_ACCOUNT_ACCESS)?;
    }
    Ok(())
}

/// Copy `source[src..]` into memory at `dst`, zero-filling past the end of `source`
fn copy_padded(memory: &mut [u8], source: &[u8], src: u64) {
    let src = src.min(source.len() as u64) as usize;
    let available = &source[src..];
    let n = available.len().min(memory.len());
    memory[..n].copy_from_slice(&available[..n]);
    memory[n..].fill(0);
}

/// Shared body of CALLDATACOPY and CODECOPY
fn copy_to_memory(state: &mut ExecutionState<'_>, source: &[u8]) -> InstructionResult {
    let mem_offset = state.stack.pop();
    let src_offset = state.stack.pop();
    let size = state.stack.pop();
    check_memory(state, &mem_offset, &size)?;

    let (dst, size) = window(&mem_offset, &size);
    state.consume_gas(num_words(size as u64) * cost::COPY_WORD)?;

    if size > 0 {
        copy_padded(
            state.memory.slice_mut(dst, size),
            source,
            as_u64_saturated(&src_offset),
        );
    }
    Ok(())
}

/// ADDRESS
pub fn address(state: &mut ExecutionState<'_>) -> InstructionResult {
    let word = state.msg.recipient.to_word();
    state.stack.push(word);
    Ok(())
}

/// BALANCE
pub fn balance(state: &mut ExecutionState<'_>) -> InstructionResult {
    let address = Address::from_word(state.stack.get(0));
    access_account(state, &address)?;
    *state.stack.top() = state.host.get_balance(&address);
    Ok(())
}

/// ORIGIN
pub fn origin(state: &mut ExecutionState<'_>) -> InstructionResult {
    let word = state.tx_context().origin.to_word();
    state.stack.push(word);
    Ok(())
}

/// CALLER
pub fn caller(state: &mut ExecutionState<'_>) -> InstructionResult {
    let word = state.msg.sender.to_word();
    state.stack.push(word);
    Ok(())
}

/// CALLVALUE
pub fn callvalue(state: &mut ExecutionState<'_>) -> InstructionResult {
    let value = state.msg.value;
    state.stack.push(value);
    Ok(())
}

/// CALLDATALOAD; bytes past the end of the input read as zero
pub fn calldataload(state: &mut ExecutionState<'_>) -> InstructionResult {
    let input = &state.msg.input;
    let index = state.stack.top();
    *index = if *index >= U256::from(input.len()) {
        U256::zero()
    } else {
        let begin = index.low_u64() as usize;
        let end = input.len().min(begin + 32);
        let mut word = [0u8; 32];
        word[..end - begin].copy_from_slice(&input[begin..end]);
        U256::from_big_endian(&word)
    };
    Ok(())
}

/// CALLDATASIZE
pub fn calldatasize(state: &mut ExecutionState<'_>) -> InstructionResult {
    let size = state.msg.input.len();
    state.stack.push(U256::from(size));
    Ok(())
}

/// CALLDATACOPY
pub fn calldatacopy(state: &mut ExecutionState<'_>) -> InstructionResult {
    let msg = state.msg;
    copy_to_memory(state, &msg.input)
}

/// CODESIZE
pub fn codesize(state: &mut ExecutionState<'_>) -> InstructionResult {
    let size = state.original_code.len();
    state.stack.push(U256::from(size));
    Ok(())
}

/// CODECOPY; copies from the code as given, never from padding
pub fn codecopy(state: &mut ExecutionState<'_>) -> InstructionResult {
    let code = state.original_code;
    copy_to_memory(state, code)
}

/// GASPRICE
pub fn gasprice(state: &mut ExecutionState<'_>) -> InstructionResult {
    let price = state.tx_context().gas_price;
    state.stack.push(price);
    Ok(())
}

/// EXTCODESIZE
pub fn extcodesize(state: &mut ExecutionState<'_>) -> InstructionResult {
    let address = Address::from_word(state.stack.get(0));
    access_account(state, &address)?;
    *state.stack.top() = U256::from(state.host.get_code_size(&address));
    Ok(())
}

/// EXTCODECOPY; the cold surcharge is applied after memory and copy costs
pub fn extcodecopy(state: &mut ExecutionState<'_>) -> InstructionResult {
    let address = Address::from_word(&state.stack.pop());
    let mem_offset = state.stack.pop();
    let src_offset = state.stack.pop();
    let size = state.stack.pop();
    check_memory(state, &mem_offset, &size)?;

    let (dst, size) = window(&mem_offset, &size);
    state.consume_gas(num_words(size as u64) * cost::COPY_WORD)?;
    access_account(state, &address)?;

    if size > 0 {
        let src = as_u64_saturated(&src_offset).min(MAX_BUFFER_SIZE) as usize;
        let buffer = state.memory.slice_mut(dst, size);
        let copied = state.host.copy_code(&address, src, buffer);
        buffer[copied..].fill(0);
    }
    Ok(())
}

/// RETURNDATASIZE
pub fn returndatasize(state: &mut ExecutionState<'_>) -> InstructionResult {
    let size = state.return_data.len();
    state.stack.push(U256::from(size));
    Ok(())
}

/// RETURNDATACOPY; reading past the return buffer is an invalid memory access
pub fn returndatacopy(state: &mut ExecutionState<'_>) -> InstructionResult {
    let mem_offset = state.stack.pop();
    let src_offset = state.stack.pop();
    let size = state.stack.pop();
    check_memory(state, &mem_offset, &size)?;

    let (dst, size) = window(&mem_offset, &size);
    let available = state.return_data.len();
    if src_offset > U256::from(available) {
        return Err(StatusCode::InvalidMemoryAccess);
    }
    let src = src_offset.low_u64() as usize;
    if src + size > available {
        return Err(StatusCode::InvalidMemoryAccess);
    }

    state.consume_gas(num_words(size as u64) * cost::COPY_WORD)?;

    if size > 0 {
        state
            .memory
            .slice_mut(dst, size)
            .copy_from_slice(&state.return_data[src..src + size]);
    }
    Ok(())
}

/// EXTCODEHASH
pub fn extcodehash(state: &mut ExecutionState<'_>) -> InstructionResult {
    let address = Address::from_word(state.stack.get(0));
    access_account(state, &address)?;
    *state.stack.top() = state.host.get_code_hash(&address).to_word();
    Ok(())
}

/// BLOCKHASH; zero outside the 256 most recent complete blocks
pub fn blockhash(state: &mut ExecutionState<'_>) -> InstructionResult {
    let number = *state.stack.get(0);
    let upper = state.tx_context().number.max(0) as u64;
    let lower = upper.saturating_sub(256);

    let hash = if number < U256::from(upper) && number.low_u64() >= lower {
        state.host.get_block_hash(number.low_u64() as i64)
    } else {
        H256::ZERO
    };
    *state.stack.top() = hash.to_word();
    Ok(())
}

/// COINBASE
pub fn coinbase(state: &mut ExecutionState<'_>) -> InstructionResult {
    let word = state.tx_context().coinbase.to_word();
    state.stack.push(word);
    Ok(())
}

/// TIMESTAMP
pub fn timestamp(state: &mut ExecutionState<'_>) -> InstructionResult {
    let value = state.tx_context().timestamp as u64;
    state.stack.push(U256::from(value));
    Ok(())
}

/// NUMBER
pub fn number(state: &mut ExecutionState<'_>) -> InstructionResult {
    let value = state.tx_context().number as u64;
    state.stack.push(U256::from(value));
    Ok(())
}

/// PREVRANDAO (DIFFICULTY before Paris)
pub fn prevrandao(state: &mut ExecutionState<'_>) -> InstructionResult {
    let word = state.tx_context().prev_randao.to_word();
    state.stack.push(word);
    Ok(())
}

/// GASLIMIT
pub fn gaslimit(state: &mut ExecutionState<'_>) -> InstructionResult {
    let value = state.tx_context().gas_limit as u64;
    state.stack.push(U256::from(value));
    Ok(())
}

/// CHAINID
pub fn chainid(state: &mut ExecutionState<'_>) -> InstructionResult {
    let id = state.tx_context().chain_id;
    state.stack.push(id);
    Ok(())
}

/// SELFBALANCE
pub fn selfbalance(state: &mut ExecutionState<'_>) -> InstructionResult {
    let balance = state.host.get_balance(&state.msg.recipient);
    state.stack.push(balance);
    Ok(())
}

/// BASEFEE
pub fn basefee(state: &mut ExecutionState<'_>) -> InstructionResult {
    let fee = state.tx_context().base_fee;
    state.stack.push(fee);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Message;
    use crate::instructions::test_utils::*;
    use crate::mocked_host::{MockedAccount, MockedHost};
    use bytes::Bytes;

    fn other() -> Address {
        Address::from_bytes([0x0E; 20])
    }

    #[test]
    fn test_calldataload_pads_with_zeros() {
        let mut host = MockedHost::new();
        let mut msg = message();
        msg.input = Bytes::from(vec![0xAA, 0xBB]);
        with_state(&mut host, &msg, Revision::LATEST, &[u(1)], |state| {
            calldataload(state).unwrap();
            assert_eq!(*state.stack.get(0), u(0xBB) << 248);
        });
        with_state(&mut host, &msg, Revision::LATEST, &[U256::MAX], |state| {
            calldataload(state).unwrap();
            assert_eq!(*state.stack.get(0), u(0));
        });
    }

    #[test]
    fn test_calldatacopy_zero_fills() {
        let mut host = MockedHost::new();
        let mut msg = message();
        msg.input = Bytes::from(vec![1, 2, 3]);
        // size 8, source offset 1, memory offset 0
        with_state(&mut host, &msg, Revision::LATEST, &[u(8), u(1), u(0)], |state| {
            state.memory.grow(32);
            state.memory[5] = 0xFF;
            calldatacopy(state).unwrap();
            assert_eq!(state.memory.slice(0, 8), &[2, 3, 0, 0, 0, 0, 0, 0]);
            assert_eq!(state.gas_left, GAS - 3);
        });
    }

    #[test]
    fn test_codecopy_uses_original_code() {
        let mut host = MockedHost::new();
        let msg = message();
        let code = [0x60, 0x01, 0x00];
        let mut state = ExecutionState::new(&msg, Revision::LATEST, &mut host, &code);
        state.stack.push(u(4));
        state.stack.push(u(0));
        state.stack.push(u(0));
        codecopy(&mut state).unwrap();
        assert_eq!(state.memory.slice(0, 4), &[0x60, 0x01, 0x00, 0x00]);

        codesize(&mut state).unwrap();
        assert_eq!(*state.stack.get(0), u(3));
    }

    #[test]
    fn test_balance_cold_surcharge() {
        let mut host = MockedHost::new();
        host.insert_account(other(), MockedAccount::default().with_balance(u(1234)));
        let msg = message();
        let word = other().to_word();

        with_state(&mut host, &msg, Revision::Berlin, &[word, word], |state| {
            balance(state).unwrap();
            assert_eq!(*state.stack.get(0), u(1234));
            assert_eq!(state.gas_left, GAS - 2500);
            state.stack.pop();
            balance(state).unwrap();
            assert_eq!(state.gas_left, GAS - 2500);
        });

        let mut host = MockedHost::new();
        with_state(&mut host, &msg, Revision::Istanbul, &[word], |state| {
            balance(state).unwrap();
            assert_eq!(state.gas_left, GAS);
        });
        assert!(host.recorded_account_accesses.is_empty());
    }

    #[test]
    fn test_extcodecopy() {
        let mut host = MockedHost::new();
        host.insert_account(other(), MockedAccount::with_code(vec![0xDE, 0xAD]));
        let msg = message();
        // size 4, code offset 1, memory offset 0, address
        let stack = [u(4), u(1), u(0), other().to_word()];
        with_state(&mut host, &msg, Revision::Berlin, &stack, |state| {
            extcodecopy(state).unwrap();
            assert_eq!(state.memory.slice(0, 4), &[0xAD, 0, 0, 0]);
            assert_eq!(state.gas_left, GAS - 3 - 3 - 2500);
        });
    }

    #[test]
    fn test_returndatacopy_bounds() {
        let mut host = MockedHost::new();
        let msg = message();
        with_state(&mut host, &msg, Revision::LATEST, &[u(3), u(0), u(0)], |state| {
            state.return_data = Bytes::from(vec![1, 2]);
            assert_eq!(returndatacopy(state), Err(StatusCode::InvalidMemoryAccess));
        });
        with_state(&mut host, &msg, Revision::LATEST, &[u(0), u(3), u(0)], |state| {
            state.return_data = Bytes::from(vec![1, 2]);
            assert_eq!(returndatacopy(state), Err(StatusCode::InvalidMemoryAccess));
        });
        with_state(&mut host, &msg, Revision::LATEST, &[u(2), u(0), u(0)], |state| {
            state.return_data = Bytes::from(vec![1, 2]);
            returndatacopy(state).unwrap();
            assert_eq!(state.memory.slice(0, 2), &[1, 2]);
        });
    }

    #[test]
    fn test_blockhash_window() {
        let mut host = MockedHost::new();
        host.tx_context.number = 1000;
        host.block_hash = H256::from_bytes([7; 32]);
        let msg = message();
        let expected = H256::from_bytes([7; 32]).to_word();

        for (n, hit) in [(999, true), (744, true), (743, false), (1000, false), (0, false)] {
            let top = with_state(&mut host, &msg, Revision::LATEST, &[u(n)], |state| {
                blockhash(state).unwrap();
                *state.stack.get(0)
            });
            assert_eq!(top == expected, hit, "block {n}");
        }
    }

    #[test]
    fn test_tx_context_values() {
        let mut host = MockedHost::new();
        host.tx_context.chain_id = u(5);
        host.tx_context.number = 17;
        host.tx_context.origin = other();
        let msg = Message::new(recipient(), other(), vec![], GAS).with_value(u(9));
        with_state(&mut host, &msg, Revision::LATEST, &[], |state| {
            chainid(state).unwrap();
            number(state).unwrap();
            origin(state).unwrap();
            callvalue(state).unwrap();
            caller(state).unwrap();
            address(state).unwrap();
            assert_eq!(*state.stack.get(0), recipient().to_word());
            assert_eq!(*state.stack.get(1), other().to_word());
            assert_eq!(*state.stack.get(2), u(9));
            assert_eq!(*state.stack.get(3), other().to_word());
            assert_eq!(*state.stack.get(4), u(17));
            assert_eq!(*state.stack.get(5), u(5));
        });
    }
}
