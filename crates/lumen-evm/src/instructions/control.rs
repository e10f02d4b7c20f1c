//! GAS, JUMPDEST and the terminating instructions
//!
//! Terminators return the final status of the call instead of an
//! [`InstructionResult`]; the interpreter stops on whatever they return.

use super::{check_memory, window, InstructionResult};
use crate::error::StatusCode;
use crate::gas::cost;
use crate::host::AccessStatus;
use crate::revision::Revision;
use crate::state::ExecutionState;
use lumen_primitives::{Address, U256};

/// GAS
pub fn gas(state: &mut ExecutionState<'_>) -> InstructionResult {
    let gas_left = state.gas_left;
    state.stack.push(U256::from(gas_left as u64));
    Ok(())
}

/// JUMPDEST
pub fn jumpdest(_state: &mut ExecutionState<'_>) -> InstructionResult {
    Ok(())
}

fn set_output(state: &mut ExecutionState<'_>, status: StatusCode) -> StatusCode {
    let offset = state.stack.pop();
    let size = state.stack.pop();
    if let Err(err) = check_memory(state, &offset, &size) {
        return err;
    }
    let (offset, size) = window(&offset, &size);
    state.output_offset = offset;
    state.output_size = size;
    status
}

/// RETURN
pub fn ret(state: &mut ExecutionState<'_>) -> StatusCode {
    set_output(state, StatusCode::Success)
}

/// REVERT
pub fn revert(state: &mut ExecutionState<'_>) -> StatusCode {
    set_output(state, StatusCode::Revert)
}

/// SELFDESTRUCT
pub fn selfdestruct(state: &mut ExecutionState<'_>) -> StatusCode {
    match selfdestruct_impl(state) {
        Ok(()) => StatusCode::Success,
        Err(err) => err,
    }
}

fn selfdestruct_impl(state: &mut ExecutionState<'_>) -> InstructionResult {
    if state.msg.is_static {
        return Err(StatusCode::StaticModeViolation);
    }

    let beneficiary = Address::from_word(&state.stack.pop());
    let recipient = state.msg.recipient;

    if state.rev >= Revision::Berlin
        && state.host.access_account(&beneficiary) == AccessStatus::Cold
    {
        state.consume_gas(cost::COLD_ACCOUNT_ACCESS)?;
    }

    if state.rev >= Revision::TangerineWhistle
        && (state.rev == Revision::TangerineWhistle
            || !state.host.get_balance(&recipient).is_zero())
        && !state.host.account_exists(&beneficiary)
    {
        state.consume_gas(cost::SELFDESTRUCT_NEW_ACCOUNT)?;
    }

    let first_registration = state.host.selfdestruct(&recipient, &beneficiary);
    if first_registration && state.rev < Revision::London {
        state.gas_refund += cost::SELFDESTRUCT_REFUND;
    }
    Ok(())
}
