//! Storage and logging instructions

use super::{check_memory, window, InstructionResult};
use crate::error::StatusCode;
use crate::gas::cost;
use crate::host::{AccessStatus, StorageStatus};
use crate::revision::Revision;
use crate::state::ExecutionState;
use lumen_primitives::H256;

/// SLOAD
pub fn sload(state: &mut ExecutionState<'_>) -> InstructionResult {
    let key = H256::from_word(state.stack.get(0));
    let recipient = state.msg.recipient;

    if state.rev >= Revision::Berlin
        && state.host.access_storage(&recipient, &key) == AccessStatus::Cold
    {
        state.consume_gas(cost::ADDITIONAL_COLD_SLOAD)?;
    }

    *state.stack.top() = state.host.get_storage(&recipient, &key).to_word();
    Ok(())
}

/// SSTORE; the cost follows the storage transition reported by the host
pub fn sstore(state: &mut ExecutionState<'_>) -> InstructionResult {
    if state.msg.is_static {
        return Err(StatusCode::StaticModeViolation);
    }

    // EIP-2200 sentry
    if state.rev >= Revision::Istanbul && state.gas_left <= cost::SSTORE_SENTRY {
        return Err(StatusCode::OutOfGas);
    }

    let key = H256::from_word(&state.stack.pop());
    let value = H256::from_word(&state.stack.pop());
    let recipient = state.msg.recipient;

    let mut gas_cost = 0;
    if state.rev >= Revision::Berlin
        && state.host.access_storage(&recipient, &key) == AccessStatus::Cold
    {
        gas_cost = cost::COLD_SLOAD;
    }

    let status = state.host.set_storage(&recipient, &key, &value);
    gas_cost += match status {
        StorageStatus::Unchanged | StorageStatus::ModifiedAgain => {
            if state.rev >= Revision::Berlin {
                cost::WARM_STORAGE_READ
            } else if state.rev == Revision::Istanbul {
                cost::SSTORE_NOOP_ISTANBUL
            } else if state.rev == Revision::Constantinople {
                cost::SSTORE_NOOP_CONSTANTINOPLE
            } else {
                cost::SSTORE_RESET
            }
        }
        StorageStatus::Modified | StorageStatus::Deleted => {
            if state.rev >= Revision::Berlin {
                cost::SSTORE_RESET - cost::COLD_SLOAD
            } else {
                cost::SSTORE_RESET
            }
        }
        StorageStatus::Added => cost::SSTORE_SET,
    };

    state.consume_gas(gas_cost)
}

/// LOG0..LOG4; 8 gas per data byte on top of the static cost
pub fn log<const N: usize>(state: &mut ExecutionState<'_>) -> InstructionResult {
    if state.msg.is_static {
        return Err(StatusCode::StaticModeViolation);
    }

    let offset = state.stack.pop();
    let size = state.stack.pop();
    check_memory(state, &offset, &size)?;

    let (offset, size) = window(&offset, &size);
    state.consume_gas(size as i64 * cost::LOG_DATA)?;

    let mut topics = [H256::ZERO; N];
    for topic in topics.iter_mut() {
        *topic = H256::from_word(&state.stack.pop());
    }

    let data = state.memory.slice(offset, size);
    state.host.emit_log(&state.msg.recipient, data, &topics);
    Ok(())
}
