//! Opcode definitions and static instruction traits

macro_rules! opcodes {
    ($($name:ident = $byte:literal => ($required:literal, $change:literal)),* $(,)?) => {
        /// EVM opcodes (see Yellow Paper Appendix H)
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        #[allow(missing_docs)]
        pub enum Opcode {
            $($name = $byte),*
        }

        impl Opcode {
            /// Try to convert from byte
            pub const fn from_byte(byte: u8) -> Option<Self> {
                match byte {
                    $($byte => Some(Opcode::$name),)*
                    _ => None,
                }
            }

            /// Mnemonic, e.g. `"PUSH1"`
            pub const fn name(self) -> &'static str {
                match self {
                    $(Opcode::$name => stringify!($name)),*
                }
            }

            const fn stack_io(self) -> (u8, i8) {
                match self {
                    $(Opcode::$name => ($required, $change)),*
                }
            }
        }
    };
}

opcodes! {
    // Stop and Arithmetic
    STOP = 0x00 => (0, 0),
    ADD = 0x01 => (2, -1),
    MUL = 0x02 => (2, -1),
    SUB = 0x03 => (2, -1),
    DIV = 0x04 => (2, -1),
    SDIV = 0x05 => (2, -1),
    MOD = 0x06 => (2, -1),
    SMOD = 0x07 => (2, -1),
    ADDMOD = 0x08 => (3, -2),
    MULMOD = 0x09 => (3, -2),
    EXP = 0x0A => (2, -1),
    SIGNEXTEND = 0x0B => (2, -1),

    // Comparison and Bitwise
    LT = 0x10 => (2, -1),
    GT = 0x11 => (2, -1),
    SLT = 0x12 => (2, -1),
    SGT = 0x13 => (2, -1),
    EQ = 0x14 => (2, -1),
    ISZERO = 0x15 => (1, 0),
    AND = 0x16 => (2, -1),
    OR = 0x17 => (2, -1),
    XOR = 0x18 => (2, -1),
    NOT = 0x19 => (1, 0),
    BYTE = 0x1A => (2, -1),
    SHL = 0x1B => (2, -1),
    SHR = 0x1C => (2, -1),
    SAR = 0x1D => (2, -1),

    KECCAK256 = 0x20 => (2, -1),

    // Environment
    ADDRESS = 0x30 => (0, 1),
    BALANCE = 0x31 => (1, 0),
    ORIGIN = 0x32 => (0, 1),
    CALLER = 0x33 => (0, 1),
    CALLVALUE = 0x34 => (0, 1),
    CALLDATALOAD = 0x35 => (1, 0),
    CALLDATASIZE = 0x36 => (0, 1),
    CALLDATACOPY = 0x37 => (3, -3),
    CODESIZE = 0x38 => (0, 1),
    CODECOPY = 0x39 => (3, -3),
    GASPRICE = 0x3A => (0, 1),
    EXTCODESIZE = 0x3B => (1, 0),
    EXTCODECOPY = 0x3C => (4, -4),
    RETURNDATASIZE = 0x3D => (0, 1),
    RETURNDATACOPY = 0x3E => (3, -3),
    EXTCODEHASH = 0x3F => (1, 0),

    // Block
    BLOCKHASH = 0x40 => (1, 0),
    COINBASE = 0x41 => (0, 1),
    TIMESTAMP = 0x42 => (0, 1),
    NUMBER = 0x43 => (0, 1),
    PREVRANDAO = 0x44 => (0, 1),
    GASLIMIT = 0x45 => (0, 1),
    CHAINID = 0x46 => (0, 1),
    SELFBALANCE = 0x47 => (0, 1),
    BASEFEE = 0x48 => (0, 1),

    // Stack, Memory, Storage and Flow
    POP = 0x50 => (1, -1),
    MLOAD = 0x51 => (1, 0),
    MSTORE = 0x52 => (2, -2),
    MSTORE8 = 0x53 => (2, -2),
    SLOAD = 0x54 => (1, 0),
    SSTORE = 0x55 => (2, -2),
    JUMP = 0x56 => (1, -1),
    JUMPI = 0x57 => (2, -2),
    PC = 0x58 => (0, 1),
    MSIZE = 0x59 => (0, 1),
    GAS = 0x5A => (0, 1),
    JUMPDEST = 0x5B => (0, 0),

    // Push
    PUSH0 = 0x5F => (0, 1),
    PUSH1 = 0x60 => (0, 1),
    PUSH2 = 0x61 => (0, 1),
    PUSH3 = 0x62 => (0, 1),
    PUSH4 = 0x63 => (0, 1),
    PUSH5 = 0x64 => (0, 1),
    PUSH6 = 0x65 => (0, 1),
    PUSH7 = 0x66 => (0, 1),
    PUSH8 = 0x67 => (0, 1),
    PUSH9 = 0x68 => (0, 1),
    PUSH10 = 0x69 => (0, 1),
    PUSH11 = 0x6A => (0, 1),
    PUSH12 = 0x6B => (0, 1),
    PUSH13 = 0x6C => (0, 1),
    PUSH14 = 0x6D => (0, 1),
    PUSH15 = 0x6E => (0, 1),
    PUSH16 = 0x6F => (0, 1),
    PUSH17 = 0x70 => (0, 1),
    PUSH18 = 0x71 => (0, 1),
    PUSH19 = 0x72 => (0, 1),
    PUSH20 = 0x73 => (0, 1),
    PUSH21 = 0x74 => (0, 1),
    PUSH22 = 0x75 => (0, 1),
    PUSH23 = 0x76 => (0, 1),
    PUSH24 = 0x77 => (0, 1),
    PUSH25 = 0x78 => (0, 1),
    PUSH26 = 0x79 => (0, 1),
    PUSH27 = 0x7A => (0, 1),
    PUSH28 = 0x7B => (0, 1),
    PUSH29 = 0x7C => (0, 1),
    PUSH30 = 0x7D => (0, 1),
    PUSH31 = 0x7E => (0, 1),
    PUSH32 = 0x7F => (0, 1),

    // Duplication
    DUP1 = 0x80 => (1, 1),
    DUP2 = 0x81 => (2, 1),
    DUP3 = 0x82 => (3, 1),
    DUP4 = 0x83 => (4, 1),
    DUP5 = 0x84 => (5, 1),
    DUP6 = 0x85 => (6, 1),
    DUP7 = 0x86 => (7, 1),
    DUP8 = 0x87 => (8, 1),
    DUP9 = 0x88 => (9, 1),
    DUP10 = 0x89 => (10, 1),
    DUP11 = 0x8A => (11, 1),
    DUP12 = 0x8B => (12, 1),
    DUP13 = 0x8C => (13, 1),
    DUP14 = 0x8D => (14, 1),
    DUP15 = 0x8E => (15, 1),
    DUP16 = 0x8F => (16, 1),

    // Exchange
    SWAP1 = 0x90 => (2, 0),
    SWAP2 = 0x91 => (3, 0),
    SWAP3 = 0x92 => (4, 0),
    SWAP4 = 0x93 => (5, 0),
    SWAP5 = 0x94 => (6, 0),
    SWAP6 = 0x95 => (7, 0),
    SWAP7 = 0x96 => (8, 0),
    SWAP8 = 0x97 => (9, 0),
    SWAP9 = 0x98 => (10, 0),
    SWAP10 = 0x99 => (11, 0),
    SWAP11 = 0x9A => (12, 0),
    SWAP12 = 0x9B => (13, 0),
    SWAP13 = 0x9C => (14, 0),
    SWAP14 = 0x9D => (15, 0),
    SWAP15 = 0x9E => (16, 0),
    SWAP16 = 0x9F => (17, 0),

    // Logging
    LOG0 = 0xA0 => (2, -2),
    LOG1 = 0xA1 => (3, -3),
    LOG2 = 0xA2 => (4, -4),
    LOG3 = 0xA3 => (5, -5),
    LOG4 = 0xA4 => (6, -6),

    // System
    CREATE = 0xF0 => (3, -2),
    CALL = 0xF1 => (7, -6),
    CALLCODE = 0xF2 => (7, -6),
    RETURN = 0xF3 => (2, -2),
    DELEGATECALL = 0xF4 => (6, -5),
    CREATE2 = 0xF5 => (4, -3),
    STATICCALL = 0xFA => (6, -5),
    REVERT = 0xFD => (2, -2),
    INVALID = 0xFE => (0, 0),
    SELFDESTRUCT = 0xFF => (1, -1),
}

impl Opcode {
    /// Get PUSH operand size (1-32 for PUSH1-PUSH32, 0 otherwise)
    pub const fn push_size(self) -> usize {
        let byte = self as u8;
        if byte >= 0x60 && byte <= 0x7F {
            (byte - 0x5F) as usize
        } else {
            0
        }
    }

    /// Check if this is a PUSH opcode (PUSH0 included)
    pub const fn is_push(self) -> bool {
        let byte = self as u8;
        byte >= 0x5F && byte <= 0x7F
    }

    /// Whether execution of this instruction always ends the call
    pub const fn is_terminating(self) -> bool {
        matches!(
            self,
            Opcode::STOP | Opcode::RETURN | Opcode::REVERT | Opcode::INVALID | Opcode::SELFDESTRUCT
        )
    }

    /// Static traits of this instruction
    pub const fn traits(self) -> OpcodeTraits {
        let (stack_height_required, stack_height_change) = self.stack_io();
        OpcodeTraits {
            name: self.name(),
            stack_height_required,
            stack_height_change,
            immediate_size: self.push_size() as u8,
            is_terminating: self.is_terminating(),
        }
    }
}

/// Revision-independent properties of an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeTraits {
    /// Mnemonic
    pub name: &'static str,
    /// Stack items the instruction reads
    pub stack_height_required: u8,
    /// Net stack height change after execution
    pub stack_height_change: i8,
    /// Number of immediate bytes following the opcode
    pub immediate_size: u8,
    /// Whether the instruction ends execution
    pub is_terminating: bool,
}

/// Traits of every byte value; `None` for bytes that are not instructions in any revision.
pub static OPCODE_TRAITS: [Option<OpcodeTraits>; 256] = build_traits();

const fn build_traits() -> [Option<OpcodeTraits>; 256] {
    let mut table = [None; 256];
    let mut i = 0;
    while i < 256 {
        if let Some(op) = Opcode::from_byte(i as u8) {
            table[i] = Some(op.traits());
        }
        i += 1;
    }
    table
}

/// Traits of a raw opcode byte
#[inline]
pub fn traits(byte: u8) -> Option<&'static OpcodeTraits> {
    OPCODE_TRAITS[byte as usize].as_ref()
}

/// Number of immediate bytes after `byte` (push data length)
#[inline]
pub const fn immediate_size(byte: u8) -> usize {
    if byte >= 0x60 && byte <= 0x7F {
        (byte - 0x5F) as usize
    } else {
        0
    }
}
