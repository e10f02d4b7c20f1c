//! Advanced interpreter loop

use super::analysis::{AdvancedCodeAnalysis, BlockInfo, InstructionArgument};
use crate::baseline::check_requirements;
use crate::context::ExecutionResult;
use crate::error::StatusCode;
use crate::gas::{cost::MAX_STACK_SIZE, gas_table};
use crate::instructions::{control, InstructionResult, CORE_FNS};
use crate::opcode::Opcode;
use crate::state::ExecutionState;
use crate::tracer::Tracer;
use lumen_primitives::U256;

/// Whether the stack and gas cover the whole block described by `block`
fn block_requirements_met(state: &ExecutionState<'_>, block: &BlockInfo) -> bool {
    let stack_size = state.stack.len() as i32;
    stack_size >= block.stack_req as i32
        && stack_size + block.stack_max_growth as i32 <= MAX_STACK_SIZE as i32
        && state.gas_left >= block.gas_cost as i64
}

/// Enter the block whose requirements are stored in record `i`. `first` is
/// the first record of the block that costs gas.
///
/// A block that cannot be paid for up front is walked instruction by
/// instruction instead, so it fails at the same instruction and with the same
/// status as in the baseline interpreter.
fn begin_block(
    state: &mut ExecutionState<'_>,
    analysis: &AdvancedCodeAnalysis,
    i: usize,
    first: usize,
) -> Result<usize, StatusCode> {
    let InstructionArgument::Block(block) = analysis.instrs[i].arg else {
        return Err(StatusCode::InternalError);
    };
    if !block_requirements_met(state, &block) {
        return run_checked(state, analysis, first);
    }

    state.gas_left -= block.gas_cost as i64;
    state.current_block_cost = block.gas_cost;
    Ok(i + 1)
}

/// Run record `i`, which observes `gas_left`, with the rest of the block
/// handed back so it sees the same value as in the baseline interpreter
fn with_gas_correction(
    state: &mut ExecutionState<'_>,
    analysis: &AdvancedCodeAnalysis,
    i: usize,
    block_gas_so_far: i64,
) -> Result<usize, StatusCode> {
    let correction = state.current_block_cost as i64 - block_gas_so_far;

    state.gas_left += correction;
    CORE_FNS[analysis.instrs[i].opcode as usize](state)?;
    if state.gas_left < correction {
        // the rest of the block is no longer affordable
        return run_checked(state, analysis, i + 1);
    }
    state.gas_left -= correction;
    Ok(i + 1)
}

fn jump(analysis: &AdvancedCodeAnalysis, dst: &U256) -> Result<usize, StatusCode> {
    if dst.0[1] | dst.0[2] | dst.0[3] != 0 {
        return Err(StatusCode::BadJumpDestination);
    }
    usize::try_from(dst.0[0])
        .ok()
        .and_then(|offset| analysis.find_jumpdest(offset))
        .ok_or(StatusCode::BadJumpDestination)
}

/// Run the record of a plain instruction
#[inline]
fn step(
    state: &mut ExecutionState<'_>,
    analysis: &AdvancedCodeAnalysis,
    i: usize,
) -> InstructionResult {
    let instr = analysis.instrs[i];
    match instr.arg {
        InstructionArgument::SmallPush(value) => state.stack.push(U256::from(value)),
        InstructionArgument::PushValue(index) => state.stack.push(analysis.push_values[index]),
        InstructionArgument::Number(pc) if instr.opcode == Opcode::PC as u8 => {
            state.stack.push(U256::from(pc as u64))
        }
        _ => return CORE_FNS[instr.opcode as usize](state),
    }
    Ok(())
}

/// Run records from `start` with every instruction checked and charged on its
/// own, until the next block boundary. Returns the record to resume block-wise
/// execution at, or the final status.
fn run_checked(
    state: &mut ExecutionState<'_>,
    analysis: &AdvancedCodeAnalysis,
    start: usize,
) -> Result<usize, StatusCode> {
    let table = gas_table(state.rev);
    let mut i = start;
    loop {
        let instr = analysis.instrs[i];
        let op = Opcode::from_byte(instr.opcode);
        if i != start && op == Some(Opcode::JUMPDEST) {
            return Ok(i);
        }
        check_requirements(table, state, instr.opcode)?;

        match op {
            Some(Opcode::STOP) => return Err(StatusCode::Success),
            Some(Opcode::RETURN) => return Err(control::ret(state)),
            Some(Opcode::REVERT) => return Err(control::revert(state)),
            Some(Opcode::INVALID) => return Err(StatusCode::InvalidInstruction),
            Some(Opcode::SELFDESTRUCT) => return Err(control::selfdestruct(state)),
            Some(Opcode::JUMPDEST) => {}
            Some(Opcode::JUMP) => {
                let dst = state.stack.pop();
                return jump(analysis, &dst);
            }
            Some(Opcode::JUMPI) => {
                let dst = state.stack.pop();
                let condition = state.stack.pop();
                if !condition.is_zero() {
                    return jump(analysis, &dst);
                }
            }
            _ => step(state, analysis, i)?,
        }
        i += 1;
    }
}

fn run(state: &mut ExecutionState<'_>, analysis: &AdvancedCodeAnalysis) -> StatusCode {
    let mut i = 0;
    loop {
        let instr = analysis.instrs[i];
        if instr.arg == InstructionArgument::Undefined {
            return StatusCode::UndefinedInstruction;
        }

        let next = match Opcode::from_byte(instr.opcode) {
            // the entry sentinel is not an instruction of the code
            Some(Opcode::JUMPDEST) => begin_block(state, analysis, i, i.max(1)),
            Some(Opcode::STOP) => return StatusCode::Success,
            Some(Opcode::RETURN) => return control::ret(state),
            Some(Opcode::REVERT) => return control::revert(state),
            Some(Opcode::INVALID) => return StatusCode::InvalidInstruction,
            Some(Opcode::SELFDESTRUCT) => return control::selfdestruct(state),
            Some(Opcode::JUMP) => {
                let dst = state.stack.pop();
                jump(analysis, &dst)
            }
            Some(Opcode::JUMPI) => {
                let dst = state.stack.pop();
                let condition = state.stack.pop();
                if condition.is_zero() {
                    begin_block(state, analysis, i, i + 1)
                } else {
                    jump(analysis, &dst)
                }
            }
            _ => match instr.arg {
                InstructionArgument::Number(gas_so_far) if instr.opcode != Opcode::PC as u8 => {
                    with_gas_correction(state, analysis, i, gas_so_far)
                }
                _ => step(state, analysis, i).map(|()| i + 1),
            },
        };

        match next {
            Ok(next) => i = next,
            Err(status) => return status,
        }
    }
}

/// Execute `analysis` on `state`. Tracers see the start and the end only.
pub fn execute(
    state: &mut ExecutionState<'_>,
    analysis: &AdvancedCodeAnalysis,
    tracers: &[Box<dyn Tracer>],
) -> ExecutionResult {
    for tracer in tracers {
        tracer.on_execution_start(state.rev, state.msg, state.original_code);
    }

    let status = run(state, analysis);
    state.status = status;
    let result = state.result(status);

    for tracer in tracers {
        tracer.on_execution_end(&result);
    }
    result
}
