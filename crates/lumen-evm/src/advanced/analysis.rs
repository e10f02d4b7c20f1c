//! Block analysis for the advanced interpreter

use crate::eof::{is_eof_code, is_enabled, read_valid_eof1_header};
use crate::gas::gas_table;
use crate::instructions::stack::read_push_value;
use crate::opcode::{immediate_size, traits, Opcode};
use crate::revision::Revision;
use lumen_primitives::U256;

/// Requirements of a basic block, checked once on entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockInfo {
    /// Sum of the static gas of the block's instructions
    pub gas_cost: u32,
    /// Stack height needed to run the whole block
    pub stack_req: i16,
    /// Largest stack growth at any point of the block
    pub stack_max_growth: i16,
}

/// Per-instruction argument prepared by the analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionArgument {
    /// Nothing
    None,
    /// Block requirements (JUMPDEST, JUMPI and the entry sentinel)
    Block(BlockInfo),
    /// PUSH1..PUSH8 value
    SmallPush(u64),
    /// Index into [`AdvancedCodeAnalysis::push_values`] for PUSH9..PUSH32
    PushValue(usize),
    /// Block gas up to and including the instruction, or the code offset for PC
    Number(i64),
    /// Undefined in the analyzed revision
    Undefined,
}

/// One executable record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// Opcode byte
    pub opcode: u8,
    /// Prepared argument
    pub arg: InstructionArgument,
}

impl Instruction {
    fn new(opcode: u8, arg: InstructionArgument) -> Self {
        Self { opcode, arg }
    }
}

/// Flattened, block-annotated form of a code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvancedCodeAnalysis {
    /// Instruction records; index 0 is the entry block sentinel
    pub instrs: Vec<Instruction>,
    /// Values of PUSH9..PUSH32
    pub push_values: Vec<U256>,
    /// Code offsets of JUMPDESTs, ascending
    pub jumpdest_offsets: Vec<usize>,
    /// Record index of the JUMPDEST at the same position in `jumpdest_offsets`
    pub jumpdest_targets: Vec<usize>,
}

impl AdvancedCodeAnalysis {
    /// Record index of the JUMPDEST at code offset `offset`
    pub fn find_jumpdest(&self, offset: usize) -> Option<usize> {
        self.jumpdest_offsets
            .binary_search(&offset)
            .ok()
            .map(|i| self.jumpdest_targets[i])
    }
}

#[derive(Default)]
struct BlockAnalysis {
    gas_cost: i64,
    stack_req: i32,
    stack_change: i32,
    stack_max_growth: i32,
    begin_block_index: usize,
}

impl BlockAnalysis {
    fn new(begin_block_index: usize) -> Self {
        Self {
            begin_block_index,
            ..Default::default()
        }
    }

    /// Gas of the block so far, in the range the block record can hold
    fn gas_so_far(&self) -> i64 {
        self.gas_cost.clamp(0, u32::MAX as i64)
    }

    fn close(&self) -> InstructionArgument {
        InstructionArgument::Block(BlockInfo {
            gas_cost: self.gas_so_far() as u32,
            stack_req: self.stack_req.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
            stack_max_growth: self.stack_max_growth.clamp(i16::MIN as i32, i16::MAX as i32)
                as i16,
        })
    }
}

/// Offset just past the dead code that starts at `pos`
fn skip_dead_code(code: &[u8], mut pos: usize) -> usize {
    while pos < code.len() && code[pos] != Opcode::JUMPDEST as u8 {
        pos = (pos + 1 + immediate_size(code[pos])).min(code.len());
    }
    pos
}

/// Instructions that read `gas_left` or charge gas beyond their static cost.
/// They run with the unspent part of the block handed back.
fn observes_gas_left(op: Opcode) -> bool {
    matches!(
        op,
        Opcode::GAS
            | Opcode::EXP
            | Opcode::KECCAK256
            | Opcode::BALANCE
            | Opcode::CALLDATACOPY
            | Opcode::CODECOPY
            | Opcode::EXTCODESIZE
            | Opcode::EXTCODECOPY
            | Opcode::RETURNDATACOPY
            | Opcode::EXTCODEHASH
            | Opcode::MLOAD
            | Opcode::MSTORE
            | Opcode::MSTORE8
            | Opcode::SLOAD
            | Opcode::SSTORE
            | Opcode::LOG0
            | Opcode::LOG1
            | Opcode::LOG2
            | Opcode::LOG3
            | Opcode::LOG4
            | Opcode::CREATE
            | Opcode::CALL
            | Opcode::CALLCODE
            | Opcode::DELEGATECALL
            | Opcode::CREATE2
            | Opcode::STATICCALL
    )
}

/// Build the block structure of `code`. Containers must have passed validation
/// already; only their code section is analyzed.
pub fn analyze(rev: Revision, code: &[u8]) -> AdvancedCodeAnalysis {
    let code = if is_enabled(rev) && is_eof_code(code) {
        read_valid_eof1_header(code).code(code)
    } else {
        code
    };

    let table = gas_table(rev);
    let mut analysis = AdvancedCodeAnalysis {
        instrs: Vec::with_capacity(code.len() + 2),
        push_values: Vec::with_capacity(code.len() + 1),
        ..Default::default()
    };

    analysis.instrs.push(Instruction::new(
        Opcode::JUMPDEST as u8,
        InstructionArgument::Block(BlockInfo::default()),
    ));
    let mut block = BlockAnalysis::new(0);

    let mut pos = 0;
    while pos < code.len() {
        let opcode = code[pos];
        pos += 1;

        if opcode == Opcode::JUMPDEST as u8 {
            analysis.instrs[block.begin_block_index].arg = block.close();
            block = BlockAnalysis::new(analysis.instrs.len());
            analysis.jumpdest_offsets.push(pos - 1);
            analysis.jumpdest_targets.push(analysis.instrs.len());
        }

        let (Some(gas), Some(info), Some(op)) =
            (table[opcode as usize], traits(opcode), Opcode::from_byte(opcode))
        else {
            // nothing after an undefined instruction runs, so it ends the block
            analysis
                .instrs
                .push(Instruction::new(opcode, InstructionArgument::Undefined));
            pos = skip_dead_code(code, pos);
            continue;
        };

        block.stack_req = block
            .stack_req
            .max(info.stack_height_required as i32 - block.stack_change);
        block.stack_change += info.stack_height_change as i32;
        block.stack_max_growth = block.stack_max_growth.max(block.stack_change);
        block.gas_cost += gas as i64;

        let arg = match op {
            Opcode::JUMP | Opcode::STOP | Opcode::RETURN | Opcode::REVERT | Opcode::SELFDESTRUCT => {
                pos = skip_dead_code(code, pos);
                InstructionArgument::None
            }
            Opcode::JUMPI => {
                // the JUMPI record carries the block of the fall-through path
                analysis.instrs[block.begin_block_index].arg = block.close();
                block = BlockAnalysis::new(analysis.instrs.len());
                InstructionArgument::None
            }
            op if observes_gas_left(op) => InstructionArgument::Number(block.gas_so_far()),
            Opcode::PC => InstructionArgument::Number(pos as i64 - 1),
            push if push.push_size() > 0 => {
                let len = push.push_size();
                let value = read_push_value(&code[pos..], len);
                pos = (pos + len).min(code.len());
                if len <= 8 {
                    InstructionArgument::SmallPush(value.low_u64())
                } else {
                    analysis.push_values.push(value);
                    InstructionArgument::PushValue(analysis.push_values.len() - 1)
                }
            }
            _ => InstructionArgument::None,
        };
        analysis.instrs.push(Instruction::new(opcode, arg));
    }

    analysis.instrs[block.begin_block_index].arg = block.close();
    analysis
        .instrs
        .push(Instruction::new(Opcode::STOP as u8, InstructionArgument::None));
    analysis
}
