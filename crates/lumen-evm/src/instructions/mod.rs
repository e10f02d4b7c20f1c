//! Instruction semantics
//!
//! Ordinary instructions live in [`CORE_FNS`], a table indexed by opcode that
//! both interpreters dispatch through. Control flow, PUSH and the terminating
//! instructions are driven by each interpreter directly because they depend on
//! the code representation.
//!
//! Handlers assume the interpreter already validated stack depth and charged
//! the static gas of the instruction.

pub mod arithmetic;
pub mod bitwise;
pub mod call;
pub mod control;
pub mod environment;
pub mod memory;
pub mod stack;
pub mod storage;

use crate::error::StatusCode;
use crate::gas::{memory_cost, num_words};
use crate::opcode::Opcode;
use crate::state::ExecutionState;
use lumen_primitives::U256;

/// Result of an ordinary instruction
pub type InstructionResult = Result<(), StatusCode>;

/// Ordinary instruction handler
pub type CoreFn = fn(&mut ExecutionState<'_>) -> InstructionResult;

/// Largest memory offset or size that is not treated as out of gas
pub const MAX_BUFFER_SIZE: u64 = u32::MAX as u64;

/// Value of `v` if it fits a memory offset or size
#[inline]
pub(crate) fn as_buffer_size(v: &U256) -> Option<u64> {
    if v.0[1] | v.0[2] | v.0[3] != 0 || v.0[0] > MAX_BUFFER_SIZE {
        None
    } else {
        Some(v.0[0])
    }
}

/// Low 64 bits saturated to `u64::MAX`
#[inline]
pub(crate) fn as_u64_saturated(v: &U256) -> u64 {
    if v.0[1] | v.0[2] | v.0[3] != 0 {
        u64::MAX
    } else {
        v.0[0]
    }
}

#[cold]
fn grow_memory(state: &mut ExecutionState<'_>, new_size: u64) -> InstructionResult {
    let new_words = num_words(new_size);
    let current_words = (state.memory.size() / 32) as i64;
    let cost = memory_cost(new_words) - memory_cost(current_words);
    state.consume_gas(cost)?;
    state.memory.grow(new_words as usize * 32);
    Ok(())
}

/// Make `[offset, offset + size)` addressable, charging the expansion cost
#[inline]
pub fn check_memory_fixed(
    state: &mut ExecutionState<'_>,
    offset: &U256,
    size: u64,
) -> InstructionResult {
    let offset = as_buffer_size(offset).ok_or(StatusCode::OutOfGas)?;
    let new_size = offset + size;
    if new_size > state.memory.size() as u64 {
        grow_memory(state, new_size)?;
    }
    Ok(())
}

/// Like [`check_memory_fixed`] with a stack-provided size. A zero size never
/// touches memory, whatever the offset.
#[inline]
pub fn check_memory(state: &mut ExecutionState<'_>, offset: &U256, size: &U256) -> InstructionResult {
    if size.is_zero() {
        return Ok(());
    }
    let size = as_buffer_size(size).ok_or(StatusCode::OutOfGas)?;
    check_memory_fixed(state, offset, size)
}

/// Memory window `(offset, size)` of operands that passed [`check_memory`]
#[inline]
pub(crate) fn window(offset: &U256, size: &U256) -> (usize, usize) {
    if size.is_zero() {
        (0, 0)
    } else {
        (offset.low_u64() as usize, size.low_u64() as usize)
    }
}

/// Placeholder for bytes that are undefined or driven by the interpreter
fn undefined(_state: &mut ExecutionState<'_>) -> InstructionResult {
    Err(StatusCode::UndefinedInstruction)
}

/// Handlers of ordinary instructions, indexed by opcode
pub static CORE_FNS: [CoreFn; 256] = build_core_fns();

const fn build_core_fns() -> [CoreFn; 256] {
    use self::{arithmetic as a, bitwise as b, call as c, control as ctl, environment as e};
    use self::{memory as m, stack as s, storage as st};

    let mut t: [CoreFn; 256] = [undefined as CoreFn; 256];

    t[Opcode::ADD as usize] = a::add;
    t[Opcode::MUL as usize] = a::mul;
    t[Opcode::SUB as usize] = a::sub;
    t[Opcode::DIV as usize] = a::div;
    t[Opcode::SDIV as usize] = a::sdiv;
    t[Opcode::MOD as usize] = a::modulo;
    t[Opcode::SMOD as usize] = a::smod;
    t[Opcode::ADDMOD as usize] = a::addmod;
    t[Opcode::MULMOD as usize] = a::mulmod;
    t[Opcode::EXP as usize] = a::exp;
    t[Opcode::SIGNEXTEND as usize] = a::signextend;

    t[Opcode::LT as usize] = b::lt;
    t[Opcode::GT as usize] = b::gt;
    t[Opcode::SLT as usize] = b::slt;
    t[Opcode::SGT as usize] = b::sgt;
    t[Opcode::EQ as usize] = b::eq;
    t[Opcode::ISZERO as usize] = b::iszero;
    t[Opcode::AND as usize] = b::and;
    t[Opcode::OR as usize] = b::or;
    t[Opcode::XOR as usize] = b::xor;
    t[Opcode::NOT as usize] = b::not;
    t[Opcode::BYTE as usize] = b::byte;
    t[Opcode::SHL as usize] = b::shl;
    t[Opcode::SHR as usize] = b::shr;
    t[Opcode::SAR as usize] = b::sar;

    t[Opcode::KECCAK256 as usize] = m::keccak256;

    t[Opcode::ADDRESS as usize] = e::address;
    t[Opcode::BALANCE as usize] = e::balance;
    t[Opcode::ORIGIN as usize] = e::origin;
    t[Opcode::CALLER as usize] = e::caller;
    t[Opcode::CALLVALUE as usize] = e::callvalue;
    t[Opcode::CALLDATALOAD as usize] = e::calldataload;
    t[Opcode::CALLDATASIZE as usize] = e::calldatasize;
    t[Opcode::CALLDATACOPY as usize] = e::calldatacopy;
    t[Opcode::CODESIZE as usize] = e::codesize;
    t[Opcode::CODECOPY as usize] = e::codecopy;
    t[Opcode::GASPRICE as usize] = e::gasprice;
    t[Opcode::EXTCODESIZE as usize] = e::extcodesize;
    t[Opcode::EXTCODECOPY as usize] = e::extcodecopy;
    t[Opcode::RETURNDATASIZE as usize] = e::returndatasize;
    t[Opcode::RETURNDATACOPY as usize] = e::returndatacopy;
    t[Opcode::EXTCODEHASH as usize] = e::extcodehash;

    t[Opcode::BLOCKHASH as usize] = e::blockhash;
    t[Opcode::COINBASE as usize] = e::coinbase;
    t[Opcode::TIMESTAMP as usize] = e::timestamp;
    t[Opcode::NUMBER as usize] = e::number;
    t[Opcode::PREVRANDAO as usize] = e::prevrandao;
    t[Opcode::GASLIMIT as usize] = e::gaslimit;
    t[Opcode::CHAINID as usize] = e::chainid;
    t[Opcode::SELFBALANCE as usize] = e::selfbalance;
    t[Opcode::BASEFEE as usize] = e::basefee;

    t[Opcode::POP as usize] = s::pop;
    t[Opcode::MLOAD as usize] = m::mload;
    t[Opcode::MSTORE as usize] = m::mstore;
    t[Opcode::MSTORE8 as usize] = m::mstore8;
    t[Opcode::SLOAD as usize] = st::sload;
    t[Opcode::SSTORE as usize] = st::sstore;
    t[Opcode::MSIZE as usize] = m::msize;
    t[Opcode::GAS as usize] = ctl::gas;
    t[Opcode::JUMPDEST as usize] = ctl::jumpdest;
    t[Opcode::PUSH0 as usize] = s::push0;

    t[Opcode::DUP1 as usize] = s::dup::<1>;
    t[Opcode::DUP2 as usize] = s::dup::<2>;
    t[Opcode::DUP3 as usize] = s::dup::<3>;
    t[Opcode::DUP4 as usize] = s::dup::<4>;
    t[Opcode::DUP5 as usize] = s::dup::<5>;
    t[Opcode::DUP6 as usize] = s::dup::<6>;
    t[Opcode::DUP7 as usize] = s::dup::<7>;
    t[Opcode::DUP8 as usize] = s::dup::<8>;
    t[Opcode::DUP9 as usize] = s::dup::<9>;
    t[Opcode::DUP10 as usize] = s::dup::<10>;
    t[Opcode::DUP11 as usize] = s::dup::<11>;
    t[Opcode::DUP12 as usize] = s::dup::<12>;
    t[Opcode::DUP13 as usize] = s::dup::<13>;
    t[Opcode::DUP14 as usize] = s::dup::<14>;
    t[Opcode::DUP15 as usize] = s::dup::<15>;
    t[Opcode::DUP16 as usize] = s::dup::<16>;

    t[Opcode::SWAP1 as usize] = s::swap::<1>;
    t[Opcode::SWAP2 as usize] = s::swap::<2>;
    t[Opcode::SWAP3 as usize] = s::swap::<3>;
    t[Opcode::SWAP4 as usize] = s::swap::<4>;
    t[Opcode::SWAP5 as usize] = s::swap::<5>;
    t[Opcode::SWAP6 as usize] = s::swap::<6>;
    t[Opcode::SWAP7 as usize] = s::swap::<7>;
    t[Opcode::SWAP8 as usize] = s::swap::<8>;
    t[Opcode::SWAP9 as usize] = s::swap::<9>;
    t[Opcode::SWAP10 as usize] = s::swap::<10>;
    t[Opcode::SWAP11 as usize] = s::swap::<11>;
    t[Opcode::SWAP12 as usize] = s::swap::<12>;
    t[Opcode::SWAP13 as usize] = s::swap::<13>;
    t[Opcode::SWAP14 as usize] = s::swap::<14>;
    t[Opcode::SWAP15 as usize] = s::swap::<15>;
    t[Opcode::SWAP16 as usize] = s::swap::<16>;

    t[Opcode::LOG0 as usize] = st::log::<0>;
    t[Opcode::LOG1 as usize] = st::log::<1>;
    t[Opcode::LOG2 as usize] = st::log::<2>;
    t[Opcode::LOG3 as usize] = st::log::<3>;
    t[Opcode::LOG4 as usize] = st::log::<4>;

    t[Opcode::CREATE as usize] = c::create;
    t[Opcode::CALL as usize] = c::call;
    t[Opcode::CALLCODE as usize] = c::callcode;
    t[Opcode::DELEGATECALL as usize] = c::delegatecall;
    t[Opcode::CREATE2 as usize] = c::create2;
    t[Opcode::STATICCALL as usize] = c::staticcall;

    t
}
