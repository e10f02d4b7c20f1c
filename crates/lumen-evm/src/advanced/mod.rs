//! Advanced interpreter
//!
//! The code is first split into basic blocks. Gas and stack requirements are
//! checked once per block, and instructions that observe `gas_left` correct
//! for the part of the block that has not run yet.

mod analysis;
mod execution;

pub use analysis::{analyze, AdvancedCodeAnalysis, BlockInfo, Instruction, InstructionArgument};
pub use execution::execute;
