//! CALL family and CREATE family
//!
//! Both push 0 before doing anything that can fail softly: a call that is
//! skipped for depth or balance reasons still succeeds with 0 on the stack.

use super::{check_memory, window, InstructionResult};
use crate::context::{CallKind, Message};
use crate::error::StatusCode;
use crate::gas::{cost, num_words};
use crate::host::AccessStatus;
use crate::opcode::Opcode;
use crate::revision::Revision;
use crate::state::ExecutionState;
use bytes::Bytes;
use lumen_primitives::{Address, H256, U256};

/// CALL
pub fn call(state: &mut ExecutionState<'_>) -> InstructionResult {
    call_impl(state, Opcode::CALL)
}

/// CALLCODE
pub fn callcode(state: &mut ExecutionState<'_>) -> InstructionResult {
    call_impl(state, Opcode::CALLCODE)
}

/// DELEGATECALL
pub fn delegatecall(state: &mut ExecutionState<'_>) -> InstructionResult {
    call_impl(state, Opcode::DELEGATECALL)
}

/// STATICCALL
pub fn staticcall(state: &mut ExecutionState<'_>) -> InstructionResult {
    call_impl(state, Opcode::STATICCALL)
}

/// CREATE
pub fn create(state: &mut ExecutionState<'_>) -> InstructionResult {
    create_impl(state, Opcode::CREATE)
}

/// CREATE2
pub fn create2(state: &mut ExecutionState<'_>) -> InstructionResult {
    create_impl(state, Opcode::CREATE2)
}

fn memory_bytes(state: &ExecutionState<'_>, offset: usize, size: usize) -> Bytes {
    if size == 0 {
        Bytes::new()
    } else {
        Bytes::copy_from_slice(state.memory.slice(offset, size))
    }
}

fn call_impl(state: &mut ExecutionState<'_>, op: Opcode) -> InstructionResult {
    let gas = state.stack.pop();
    let dst = Address::from_word(&state.stack.pop());
    let value = match op {
        Opcode::STATICCALL | Opcode::DELEGATECALL => U256::zero(),
        _ => state.stack.pop(),
    };
    let has_value = !value.is_zero();
    let input_offset = state.stack.pop();
    let input_size = state.stack.pop();
    let output_offset = state.stack.pop();
    let output_size = state.stack.pop();

    // Assume failure
    state.stack.push(U256::zero());

    if state.rev >= Revision::Berlin && state.host.access_account(&dst) == AccessStatus::Cold {
        state.consume_gas(cost::ADDITIONAL_COLD_ACCOUNT_ACCESS)?;
    }

    check_memory(state, &input_offset, &input_size)?;
    check_memory(state, &output_offset, &output_size)?;
    let (input_offset, input_size) = window(&input_offset, &input_size);
    let (output_offset, output_size) = window(&output_offset, &output_size);

    let parent = state.msg;
    let mut msg = Message {
        kind: match op {
            Opcode::CALLCODE => CallKind::CallCode,
            Opcode::DELEGATECALL => CallKind::DelegateCall,
            _ => CallKind::Call,
        },
        is_static: op == Opcode::STATICCALL || parent.is_static,
        depth: parent.depth + 1,
        gas: 0,
        recipient: match op {
            Opcode::CALL | Opcode::STATICCALL => dst,
            _ => parent.recipient,
        },
        sender: if op == Opcode::DELEGATECALL {
            parent.sender
        } else {
            parent.recipient
        },
        input: memory_bytes(state, input_offset, input_size),
        value: if op == Opcode::DELEGATECALL {
            parent.value
        } else {
            value
        },
        create2_salt: H256::ZERO,
        code_address: dst,
    };

    let mut call_cost = if has_value { cost::CALL_VALUE } else { 0 };
    if op == Opcode::CALL {
        if has_value && parent.is_static {
            return Err(StatusCode::StaticModeViolation);
        }
        if (has_value || state.rev < Revision::SpuriousDragon) && !state.host.account_exists(&dst) {
            call_cost += cost::CALL_NEW_ACCOUNT;
        }
    }
    state.consume_gas(call_cost)?;

    msg.gas = if gas > U256::from(i64::MAX as u64) {
        i64::MAX
    } else {
        gas.low_u64() as i64
    };
    if state.rev >= Revision::TangerineWhistle {
        // EIP-150: all but one 64th
        msg.gas = msg.gas.min(state.gas_left - state.gas_left / 64);
    } else if msg.gas > state.gas_left {
        return Err(StatusCode::OutOfGas);
    }

    if has_value {
        msg.gas += cost::CALL_STIPEND;
        state.gas_left += cost::CALL_STIPEND;
    }

    state.return_data = Bytes::new();

    if parent.depth >= cost::MAX_CALL_DEPTH {
        return Ok(());
    }
    if has_value && state.host.get_balance(&parent.recipient) < value {
        return Ok(());
    }

    let result = state.host.call(&msg);
    state.return_data = result.output.clone();
    *state.stack.top() = if result.status.is_success() {
        U256::one()
    } else {
        U256::zero()
    };

    let copy_size = output_size.min(result.output.len());
    if copy_size > 0 {
        state
            .memory
            .slice_mut(output_offset, copy_size)
            .copy_from_slice(&result.output[..copy_size]);
    }

    state.gas_left -= msg.gas - result.gas_left;
    state.gas_refund += result.gas_refund;
    Ok(())
}

fn create_impl(state: &mut ExecutionState<'_>, op: Opcode) -> InstructionResult {
    if state.msg.is_static {
        return Err(StatusCode::StaticModeViolation);
    }

    let endowment = state.stack.pop();
    let init_code_offset = state.stack.pop();
    let init_code_size = state.stack.pop();
    check_memory(state, &init_code_offset, &init_code_size)?;
    let (init_code_offset, init_code_size) = window(&init_code_offset, &init_code_size);

    let mut salt = H256::ZERO;
    if op == Opcode::CREATE2 {
        salt = H256::from_word(&state.stack.pop());
        // init code is hashed to derive the address
        state.consume_gas(num_words(init_code_size as u64) * cost::KECCAK256_WORD)?;
    }

    state.stack.push(U256::zero());
    state.return_data = Bytes::new();

    let parent = state.msg;
    if parent.depth >= cost::MAX_CALL_DEPTH {
        return Ok(());
    }
    if !endowment.is_zero() && state.host.get_balance(&parent.recipient) < endowment {
        return Ok(());
    }

    let mut gas = state.gas_left;
    if state.rev >= Revision::TangerineWhistle {
        gas -= gas / 64;
    }

    let msg = Message {
        kind: if op == Opcode::CREATE2 {
            CallKind::Create2
        } else {
            CallKind::Create
        },
        is_static: false,
        depth: parent.depth + 1,
        gas,
        recipient: Address::ZERO,
        sender: parent.recipient,
        input: memory_bytes(state, init_code_offset, init_code_size),
        value: endowment,
        create2_salt: salt,
        code_address: Address::ZERO,
    };

    let result = state.host.call(&msg);
    state.gas_left -= msg.gas - result.gas_left;
    state.gas_refund += result.gas_refund;
    state.return_data = result.output;

    if result.status.is_success() {
        *state.stack.top() = result.create_address.unwrap_or(Address::ZERO).to_word();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionResult;
    use crate::instructions::test_utils::*;
    use crate::mocked_host::{MockedAccount, MockedHost};

    fn dst() -> Address {
        Address::from_bytes([0xDD; 20])
    }

    /// CALL operands bottom first, so `gas` ends up on top
    fn call_stack(gas: u64, value: u64, out_size: u64) -> Vec<U256> {
        vec![u(out_size), u(0), u(0), u(0), u(value), dst().to_word(), u(gas)]
    }

    #[test]
    fn test_call_forwards_message() {
        let mut host = MockedHost::new();
        host.insert_account(dst(), MockedAccount::default());
        host.call_result = ExecutionResult::success(600, vec![0xAB, 0xCD]);
        let msg = message();

        let (top, gas_left, return_data) =
            with_state(&mut host, &msg, Revision::London, &call_stack(1000, 0, 1), |state| {
                call(state).unwrap();
                assert_eq!(state.memory[0], 0xAB);
                (*state.stack.get(0), state.gas_left, state.return_data.clone())
            });

        assert_eq!(top, u(1));
        assert_eq!(return_data.as_ref(), &[0xAB, 0xCD]);
        // cold account, memory for the output word, 400 gas used by the callee
        assert_eq!(gas_left, GAS - 2500 - 3 - 400);

        let sent = &host.recorded_calls[0];
        assert_eq!(sent.kind, CallKind::Call);
        assert_eq!(sent.recipient, dst());
        assert_eq!(sent.sender, recipient());
        assert_eq!(sent.depth, 1);
        assert_eq!(sent.gas, 1000);
    }

    #[test]
    fn test_call_gas_is_capped() {
        let mut host = MockedHost::new();
        host.insert_account(dst(), MockedAccount::default());
        host.call_result = ExecutionResult::failure(StatusCode::OutOfGas);
        let msg = message();

        let top = with_state(&mut host, &msg, Revision::London, &call_stack(u64::MAX, 0, 0), |state| {
            call(state).unwrap();
            *state.stack.get(0)
        });
        assert_eq!(top, u(0));
        let available = GAS - 2500;
        assert_eq!(host.recorded_calls[0].gas, available - available / 64);
    }

    #[test]
    fn test_call_pre_tangerine_whistle_requires_gas() {
        let mut host = MockedHost::new();
        host.insert_account(dst(), MockedAccount::default());
        let msg = message();
        let res = with_state(&mut host, &msg, Revision::Homestead, &call_stack(GAS as u64 + 1, 0, 0), call);
        assert_eq!(res, Err(StatusCode::OutOfGas));
    }

    #[test]
    fn test_call_with_value() {
        let mut host = MockedHost::new();
        host.insert_account(recipient(), MockedAccount::default().with_balance(u(100)));
        host.call_result = ExecutionResult::success(2300, vec![]);
        let msg = message();

        let gas_left = with_state(&mut host, &msg, Revision::London, &call_stack(0, 10, 0), |state| {
            call(state).unwrap();
            state.gas_left
        });
        let sent = &host.recorded_calls[0];
        assert_eq!(sent.value, u(10));
        assert_eq!(sent.gas, 2300);
        // cold, value transfer, new account; the unused stipend comes back
        assert_eq!(gas_left, GAS - 2500 - 9000 - 25000 + 2300);
    }

    #[test]
    fn test_call_value_in_static_context() {
        let mut host = MockedHost::new();
        let msg = Message::new_static(recipient(), Address::ZERO, vec![], GAS);
        let res = with_state(&mut host, &msg, Revision::London, &call_stack(0, 1, 0), call);
        assert_eq!(res, Err(StatusCode::StaticModeViolation));
    }

    #[test]
    fn test_call_insufficient_balance_pushes_zero() {
        let mut host = MockedHost::new();
        host.insert_account(dst(), MockedAccount::default());
        let msg = message();
        let top = with_state(&mut host, &msg, Revision::London, &call_stack(0, 10, 0), |state| {
            call(state).unwrap();
            *state.stack.get(0)
        });
        assert_eq!(top, u(0));
        assert!(host.recorded_calls.is_empty());
    }

    #[test]
    fn test_call_depth_limit() {
        let mut host = MockedHost::new();
        host.insert_account(dst(), MockedAccount::default());
        let msg = message().with_depth(1024);
        with_state(&mut host, &msg, Revision::London, &call_stack(0, 0, 0), |state| {
            call(state).unwrap();
            assert_eq!(*state.stack.get(0), u(0));
        });
        assert!(host.recorded_calls.is_empty());
    }

    #[test]
    fn test_delegatecall_keeps_context() {
        let mut host = MockedHost::new();
        let msg = message().with_value(u(77));
        // gas, address, in offset, in size, out offset, out size (no value operand)
        let stack = vec![u(0), u(0), u(0), u(0), dst().to_word(), u(100)];
        with_state(&mut host, &msg, Revision::London, &stack, delegatecall).unwrap();
        let sent = &host.recorded_calls[0];
        assert_eq!(sent.kind, CallKind::DelegateCall);
        assert_eq!(sent.recipient, recipient());
        assert_eq!(sent.sender, msg.sender);
        assert_eq!(sent.value, u(77));
        assert_eq!(sent.code_address, dst());
    }

    #[test]
    fn test_staticcall_sets_flag() {
        let mut host = MockedHost::new();
        let msg = message();
        let stack = vec![u(0), u(0), u(0), u(0), dst().to_word(), u(100)];
        with_state(&mut host, &msg, Revision::London, &stack, staticcall).unwrap();
        assert!(host.recorded_calls[0].is_static);
        assert_eq!(host.recorded_calls[0].recipient, dst());
    }

    #[test]
    fn test_create_pushes_address() {
        let mut host = MockedHost::new();
        let created = Address::from_bytes([0x42; 20]);
        host.call_result = ExecutionResult {
            create_address: Some(created),
            ..ExecutionResult::success(0, vec![])
        };
        let msg = message();
        // size, offset, endowment
        let top = with_state(&mut host, &msg, Revision::London, &[u(0), u(0), u(0)], |state| {
            create(state).unwrap();
            *state.stack.get(0)
        });
        assert_eq!(top, created.to_word());
        let sent = &host.recorded_calls[0];
        assert_eq!(sent.kind, CallKind::Create);
        assert_eq!(sent.gas, GAS - GAS / 64);
    }

    #[test]
    fn test_create2_charges_hashing() {
        let mut host = MockedHost::new();
        host.call_result = ExecutionResult::new(StatusCode::Revert, 0);
        let msg = message();
        // salt, size, offset, endowment
        let stack = [u(9), u(64), u(0), u(0)];
        let gas_left = with_state(&mut host, &msg, Revision::London, &stack, |state| {
            create2(state).unwrap();
            assert_eq!(*state.stack.get(0), u(0));
            state.gas_left
        });
        let sent = &host.recorded_calls[0];
        assert_eq!(sent.kind, CallKind::Create2);
        assert_eq!(sent.create2_salt, H256::from(u(9)));
        assert_eq!(sent.input.len(), 64);
        let before_call = GAS - 6 - 12;
        assert_eq!(gas_left, before_call - (before_call - before_call / 64));
    }

    #[test]
    fn test_create_static_violation() {
        let mut host = MockedHost::new();
        let msg = Message::new_static(recipient(), Address::ZERO, vec![], GAS);
        let res = with_state(&mut host, &msg, Revision::London, &[u(0), u(0), u(0)], create);
        assert_eq!(res, Err(StatusCode::StaticModeViolation));
    }
}
