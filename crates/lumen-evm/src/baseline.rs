//! Baseline interpreter
//!
//! Runs the code bytes directly. The only preprocessing is a jump destination
//! map; stack depth and static gas are checked before every instruction.

use crate::context::ExecutionResult;
use crate::eof::{is_eof_code, is_enabled, read_valid_eof1_header};
use crate::error::StatusCode;
use crate::gas::{cost::MAX_STACK_SIZE, gas_table, GasTable};
use crate::instructions::stack::read_push_value;
use crate::instructions::{control, CORE_FNS};
use crate::opcode::{immediate_size, traits, Opcode};
use crate::revision::Revision;
use crate::state::ExecutionState;
use crate::tracer::Tracer;
use lumen_primitives::U256;
use std::borrow::Cow;

/// STOP bytes appended to legacy code; enough to cover a truncated PUSH32
pub const CODE_PADDING: usize = 33;

/// Executable code plus its valid jump destinations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAnalysis<'c> {
    executable_code: Cow<'c, [u8]>,
    jumpdest_map: Vec<bool>,
}

impl<'c> CodeAnalysis<'c> {
    /// Code the interpreter walks, padded for legacy code
    pub fn executable_code(&self) -> &[u8] {
        &self.executable_code
    }

    /// Jump destination map, one entry per byte of the unpadded code
    pub fn jumpdest_map(&self) -> &[bool] {
        &self.jumpdest_map
    }

    /// Whether `offset` is a JUMPDEST instruction
    pub fn is_jumpdest(&self, offset: usize) -> bool {
        self.jumpdest_map.get(offset).copied().unwrap_or(false)
    }

    /// Detach from the analyzed code
    pub fn into_owned(self) -> CodeAnalysis<'static> {
        CodeAnalysis {
            executable_code: Cow::Owned(self.executable_code.into_owned()),
            jumpdest_map: self.jumpdest_map,
        }
    }
}

fn jumpdest_map(code: &[u8]) -> Vec<bool> {
    let mut map = vec![false; code.len()];
    let mut pos = 0;
    while pos < code.len() {
        let op = code[pos];
        if op == Opcode::JUMPDEST as u8 {
            map[pos] = true;
        }
        pos += 1 + immediate_size(op);
    }
    map
}

/// Analyze `code`. Containers must have passed validation already.
pub fn analyze(rev: Revision, code: &[u8]) -> CodeAnalysis<'_> {
    if is_enabled(rev) && is_eof_code(code) {
        let section = read_valid_eof1_header(code).code(code);
        return CodeAnalysis {
            executable_code: Cow::Borrowed(section),
            jumpdest_map: jumpdest_map(section),
        };
    }

    let mut padded = Vec::with_capacity(code.len() + CODE_PADDING);
    padded.extend_from_slice(code);
    padded.resize(code.len() + CODE_PADDING, Opcode::STOP as u8);
    CodeAnalysis {
        executable_code: Cow::Owned(padded),
        jumpdest_map: jumpdest_map(code),
    }
}

/// Undefined, stack underflow, stack overflow, then static gas
#[inline]
pub(crate) fn check_requirements(
    table: &GasTable,
    state: &mut ExecutionState<'_>,
    op: u8,
) -> Result<(), StatusCode> {
    let (Some(gas), Some(info)) = (table[op as usize], traits(op)) else {
        return Err(StatusCode::UndefinedInstruction);
    };

    let stack_size = state.stack.len();
    if stack_size < info.stack_height_required as usize {
        return Err(StatusCode::StackUnderflow);
    }
    if info.stack_height_change > 0 && stack_size == MAX_STACK_SIZE {
        return Err(StatusCode::StackOverflow);
    }

    state.consume_gas(gas as i64)
}

fn jump_target(analysis: &CodeAnalysis<'_>, dst: &U256) -> Result<usize, StatusCode> {
    let fits = dst.0[1] | dst.0[2] | dst.0[3] == 0;
    match usize::try_from(dst.0[0]) {
        Ok(dst) if fits && analysis.is_jumpdest(dst) => Ok(dst),
        _ => Err(StatusCode::BadJumpDestination),
    }
}

fn run(
    state: &mut ExecutionState<'_>,
    analysis: &CodeAnalysis<'_>,
    tracers: &[Box<dyn Tracer>],
) -> StatusCode {
    let code = analysis.executable_code();
    let table = gas_table(state.rev);
    let mut pc = 0;

    loop {
        let op = code[pc];
        for tracer in tracers {
            tracer.on_instruction_start(pc, op, state);
        }

        if let Err(status) = check_requirements(table, state, op) {
            return status;
        }

        let next = match Opcode::from_byte(op) {
            Some(Opcode::STOP) => return StatusCode::Success,
            Some(Opcode::RETURN) => return control::ret(state),
            Some(Opcode::REVERT) => return control::revert(state),
            Some(Opcode::INVALID) => return StatusCode::InvalidInstruction,
            Some(Opcode::SELFDESTRUCT) => return control::selfdestruct(state),
            Some(Opcode::JUMP) => {
                let dst = state.stack.pop();
                jump_target(analysis, &dst)
            }
            Some(Opcode::JUMPI) => {
                let dst = state.stack.pop();
                let condition = state.stack.pop();
                if condition.is_zero() {
                    Ok(pc + 1)
                } else {
                    jump_target(analysis, &dst)
                }
            }
            Some(Opcode::PC) => {
                state.stack.push(U256::from(pc));
                Ok(pc + 1)
            }
            Some(push) if push.push_size() > 0 => {
                let len = push.push_size();
                state.stack.push(read_push_value(&code[pc + 1..], len));
                Ok(pc + 1 + len)
            }
            _ => CORE_FNS[op as usize](state).map(|()| pc + 1),
        };

        match next {
            Ok(next) => pc = next,
            Err(status) => return status,
        }
    }
}

/// Execute `analysis` on `state`, notifying `tracers` about every instruction
pub fn execute(
    state: &mut ExecutionState<'_>,
    analysis: &CodeAnalysis<'_>,
    tracers: &[Box<dyn Tracer>],
) -> ExecutionResult {
    for tracer in tracers {
        tracer.on_execution_start(state.rev, state.msg, state.original_code);
    }

    let status = run(state, analysis, tracers);
    state.status = status;
    let result = state.result(status);

    for tracer in tracers {
        tracer.on_execution_end(&result);
    }
    result
}
