//! Stack manipulation: POP, PUSH0, DUPn, SWAPn

use super::InstructionResult;
use crate::state::ExecutionState;
use lumen_primitives::U256;

/// POP
pub fn pop(state: &mut ExecutionState<'_>) -> InstructionResult {
    state.stack.pop();
    Ok(())
}

/// PUSH0
pub fn push0(state: &mut ExecutionState<'_>) -> InstructionResult {
    state.stack.push(U256::zero());
    Ok(())
}

/// DUP1..DUP16
pub fn dup<const N: usize>(state: &mut ExecutionState<'_>) -> InstructionResult {
    state.stack.dup(N);
    Ok(())
}

/// SWAP1..SWAP16
pub fn swap<const N: usize>(state: &mut ExecutionState<'_>) -> InstructionResult {
    state.stack.swap(N);
    Ok(())
}

/// Big-endian immediate of a PUSH, zero-padded on the right when the code ends early
pub fn read_push_value(code: &[u8], len: usize) -> U256 {
    let mut buf = [0u8; 32];
    let available = code.len().min(len);
    buf[..available].copy_from_slice(&code[..available]);
    U256::from_big_endian(&buf[..len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::test_utils::*;
    use crate::mocked_host::MockedHost;
    use crate::revision::Revision;

    #[test]
    fn test_dup_swap_handlers() {
        let mut host = MockedHost::new();
        let msg = message();
        with_state(&mut host, &msg, Revision::LATEST, &[u(1), u(2), u(3)], |state| {
            dup::<3>(state).unwrap();
            assert_eq!(*state.stack.get(0), u(1));
            swap::<3>(state).unwrap();
            assert_eq!(*state.stack.get(0), u(1));
            assert_eq!(*state.stack.get(3), u(1));
            pop(state).unwrap();
            push0(state).unwrap();
            assert_eq!(*state.stack.get(0), u(0));
            assert_eq!(state.stack.len(), 4);
        });
    }

    #[test]
    fn test_read_push_value() {
        assert_eq!(read_push_value(&[0x12, 0x34], 2), u(0x1234));
        assert_eq!(read_push_value(&[0x12], 2), u(0x1200));
        assert_eq!(read_push_value(&[], 1), u(0));
        assert_eq!(read_push_value(&[0xFF; 40], 32), U256::MAX);
    }
}
