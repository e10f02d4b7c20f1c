//! Gas schedule per revision

use crate::opcode::Opcode;
use crate::revision::Revision;

/// Gas costs for EVM operations
pub mod cost {
    /// Zero gas
    pub const ZERO: u16 = 0;
    /// Base gas
    pub const BASE: u16 = 2;
    /// Very low gas
    pub const VERYLOW: u16 = 3;
    /// Low gas
    pub const LOW: u16 = 5;
    /// Mid gas
    pub const MID: u16 = 8;
    /// High gas
    pub const HIGH: u16 = 10;
    /// Jump dest gas
    pub const JUMPDEST: u16 = 1;
    /// KECCAK256 base gas
    pub const KECCAK256: u16 = 30;
    /// Log gas (per topic as well)
    pub const LOG: u16 = 375;
    /// Create gas
    pub const CREATE: u16 = 32000;

    /// Exp gas per exponent byte before Spurious Dragon
    pub const EXP_BYTE_FRONTIER: i64 = 10;
    /// Exp gas per exponent byte (EIP-160)
    pub const EXP_BYTE: i64 = 50;
    /// KECCAK256 gas per word
    pub const KECCAK256_WORD: i64 = 6;
    /// Copy gas per word
    pub const COPY_WORD: i64 = 3;
    /// Memory gas per word
    pub const MEMORY_WORD: i64 = 3;
    /// Quadratic memory divisor
    pub const MEMORY_QUAD_DIVISOR: i64 = 512;
    /// Log data gas (per byte)
    pub const LOG_DATA: i64 = 8;

    /// Cold account access (EIP-2929)
    pub const COLD_ACCOUNT_ACCESS: i64 = 2600;
    /// Warm storage read (EIP-2929)
    pub const WARM_STORAGE_READ: i64 = 100;
    /// Surcharge on top of the warm cost for a cold account
    pub const ADDITIONAL_COLD_ACCOUNT_ACCESS: i64 = COLD_ACCOUNT_ACCESS - WARM_STORAGE_READ;
    /// Cold sload (EIP-2929)
    pub const COLD_SLOAD: i64 = 2100;
    /// Surcharge on top of the warm cost for a cold slot
    pub const ADDITIONAL_COLD_SLOAD: i64 = COLD_SLOAD - WARM_STORAGE_READ;

    /// Sstore set gas
    pub const SSTORE_SET: i64 = 20000;
    /// Sstore reset gas
    pub const SSTORE_RESET: i64 = 5000;
    /// Sstore of an unchanged value in Constantinople (EIP-1283)
    pub const SSTORE_NOOP_CONSTANTINOPLE: i64 = 200;
    /// Sstore of an unchanged value in Istanbul (EIP-2200)
    pub const SSTORE_NOOP_ISTANBUL: i64 = 800;
    /// Sstore is rejected with this much gas or less (EIP-2200)
    pub const SSTORE_SENTRY: i64 = 2300;

    /// Call value transfer gas
    pub const CALL_VALUE: i64 = 9000;
    /// Call new account gas
    pub const CALL_NEW_ACCOUNT: i64 = 25000;
    /// Call stipend
    pub const CALL_STIPEND: i64 = 2300;
    /// Selfdestruct new account gas
    pub const SELFDESTRUCT_NEW_ACCOUNT: i64 = 25000;
    /// Selfdestruct refund before London
    pub const SELFDESTRUCT_REFUND: i64 = 24000;

    /// Max call depth
    pub const MAX_CALL_DEPTH: i32 = 1024;
    /// Max stack size
    pub const MAX_STACK_SIZE: usize = 1024;
}

/// Static gas of every opcode byte in one revision; `None` marks an undefined instruction.
pub type GasTable = [Option<u16>; 256];

static GAS_TABLES: [GasTable; Revision::COUNT] = {
    let mut tables = [[None; 256]; Revision::COUNT];
    let mut i = 0;
    while i < Revision::COUNT {
        tables[i] = build_table(Revision::ALL[i]);
        i += 1;
    }
    tables
};

/// Gas table of a revision
#[inline]
pub fn gas_table(rev: Revision) -> &'static GasTable {
    &GAS_TABLES[rev.index()]
}

/// Static gas of `opcode` in `rev`, or `None` when it is undefined there
#[inline]
pub fn gas_cost(rev: Revision, opcode: u8) -> Option<u16> {
    gas_table(rev)[opcode as usize]
}

const fn since(rev: Revision, first: Revision) -> bool {
    rev as u8 >= first as u8
}

const fn build_table(rev: Revision) -> GasTable {
    use cost::*;

    let mut table: GasTable = [None; 256];

    table[Opcode::STOP as usize] = Some(ZERO);
    table[Opcode::ADD as usize] = Some(VERYLOW);
    table[Opcode::MUL as usize] = Some(LOW);
    table[Opcode::SUB as usize] = Some(VERYLOW);
    table[Opcode::DIV as usize] = Some(LOW);
    table[Opcode::SDIV as usize] = Some(LOW);
    table[Opcode::MOD as usize] = Some(LOW);
    table[Opcode::SMOD as usize] = Some(LOW);
    table[Opcode::ADDMOD as usize] = Some(MID);
    table[Opcode::MULMOD as usize] = Some(MID);
    table[Opcode::EXP as usize] = Some(HIGH);
    table[Opcode::SIGNEXTEND as usize] = Some(LOW);

    let mut op = Opcode::LT as usize;
    while op <= Opcode::BYTE as usize {
        table[op] = Some(VERYLOW);
        op += 1;
    }

    table[Opcode::KECCAK256 as usize] = Some(KECCAK256);

    table[Opcode::ADDRESS as usize] = Some(BASE);
    table[Opcode::BALANCE as usize] = Some(20);
    table[Opcode::ORIGIN as usize] = Some(BASE);
    table[Opcode::CALLER as usize] = Some(BASE);
    table[Opcode::CALLVALUE as usize] = Some(BASE);
    table[Opcode::CALLDATALOAD as usize] = Some(VERYLOW);
    table[Opcode::CALLDATASIZE as usize] = Some(BASE);
    table[Opcode::CALLDATACOPY as usize] = Some(VERYLOW);
    table[Opcode::CODESIZE as usize] = Some(BASE);
    table[Opcode::CODECOPY as usize] = Some(VERYLOW);
    table[Opcode::GASPRICE as usize] = Some(BASE);
    table[Opcode::EXTCODESIZE as usize] = Some(20);
    table[Opcode::EXTCODECOPY as usize] = Some(20);

    table[Opcode::BLOCKHASH as usize] = Some(20);
    table[Opcode::COINBASE as usize] = Some(BASE);
    table[Opcode::TIMESTAMP as usize] = Some(BASE);
    table[Opcode::NUMBER as usize] = Some(BASE);
    table[Opcode::PREVRANDAO as usize] = Some(BASE);
    table[Opcode::GASLIMIT as usize] = Some(BASE);

    table[Opcode::POP as usize] = Some(BASE);
    table[Opcode::MLOAD as usize] = Some(VERYLOW);
    table[Opcode::MSTORE as usize] = Some(VERYLOW);
    table[Opcode::MSTORE8 as usize] = Some(VERYLOW);
    table[Opcode::SLOAD as usize] = Some(50);
    table[Opcode::SSTORE as usize] = Some(ZERO);
    table[Opcode::JUMP as usize] = Some(MID);
    table[Opcode::JUMPI as usize] = Some(HIGH);
    table[Opcode::PC as usize] = Some(BASE);
    table[Opcode::MSIZE as usize] = Some(BASE);
    table[Opcode::GAS as usize] = Some(BASE);
    table[Opcode::JUMPDEST as usize] = Some(JUMPDEST);

    // PUSH1..PUSH32, DUP1..DUP16, SWAP1..SWAP16
    let mut op = Opcode::PUSH1 as usize;
    while op <= Opcode::SWAP16 as usize {
        table[op] = Some(VERYLOW);
        op += 1;
    }

    let mut n = 0;
    while n <= 4 {
        table[Opcode::LOG0 as usize + n] = Some(LOG * (n as u16 + 1));
        n += 1;
    }

    table[Opcode::CREATE as usize] = Some(CREATE);
    table[Opcode::CALL as usize] = Some(40);
    table[Opcode::CALLCODE as usize] = Some(40);
    table[Opcode::RETURN as usize] = Some(ZERO);
    table[Opcode::INVALID as usize] = Some(ZERO);
    table[Opcode::SELFDESTRUCT as usize] = Some(ZERO);

    if since(rev, Revision::Homestead) {
        table[Opcode::DELEGATECALL as usize] = Some(40);
    }

    // EIP-150
    if since(rev, Revision::TangerineWhistle) {
        table[Opcode::BALANCE as usize] = Some(400);
        table[Opcode::EXTCODESIZE as usize] = Some(700);
        table[Opcode::EXTCODECOPY as usize] = Some(700);
        table[Opcode::SLOAD as usize] = Some(200);
        table[Opcode::CALL as usize] = Some(700);
        table[Opcode::CALLCODE as usize] = Some(700);
        table[Opcode::DELEGATECALL as usize] = Some(700);
        table[Opcode::SELFDESTRUCT as usize] = Some(5000);
    }

    if since(rev, Revision::Byzantium) {
        table[Opcode::RETURNDATASIZE as usize] = Some(BASE);
        table[Opcode::RETURNDATACOPY as usize] = Some(VERYLOW);
        table[Opcode::STATICCALL as usize] = Some(700);
        table[Opcode::REVERT as usize] = Some(ZERO);
    }

    if since(rev, Revision::Constantinople) {
        table[Opcode::SHL as usize] = Some(VERYLOW);
        table[Opcode::SHR as usize] = Some(VERYLOW);
        table[Opcode::SAR as usize] = Some(VERYLOW);
        table[Opcode::EXTCODEHASH as usize] = Some(400);
        table[Opcode::CREATE2 as usize] = Some(CREATE);
    }

    // EIP-1884
    if since(rev, Revision::Istanbul) {
        table[Opcode::BALANCE as usize] = Some(700);
        table[Opcode::CHAINID as usize] = Some(BASE);
        table[Opcode::EXTCODEHASH as usize] = Some(700);
        table[Opcode::SELFBALANCE as usize] = Some(LOW);
        table[Opcode::SLOAD as usize] = Some(800);
    }

    // EIP-2929: static part is the warm cost, cold surcharges are dynamic
    if since(rev, Revision::Berlin) {
        let warm = WARM_STORAGE_READ as u16;
        table[Opcode::EXTCODESIZE as usize] = Some(warm);
        table[Opcode::EXTCODECOPY as usize] = Some(warm);
        table[Opcode::EXTCODEHASH as usize] = Some(warm);
        table[Opcode::BALANCE as usize] = Some(warm);
        table[Opcode::CALL as usize] = Some(warm);
        table[Opcode::CALLCODE as usize] = Some(warm);
        table[Opcode::DELEGATECALL as usize] = Some(warm);
        table[Opcode::STATICCALL as usize] = Some(warm);
        table[Opcode::SLOAD as usize] = Some(warm);
    }

    if since(rev, Revision::London) {
        table[Opcode::BASEFEE as usize] = Some(BASE);
    }

    if since(rev, Revision::Shanghai) {
        table[Opcode::PUSH0 as usize] = Some(BASE);
    }

    table
}

/// Memory cost of `words` 32-byte words: `3 * words + words² / 512`
#[inline]
pub const fn memory_cost(words: i64) -> i64 {
    cost::MEMORY_WORD * words + words * words / cost::MEMORY_QUAD_DIVISOR
}

/// Number of 32-byte words covering `size` bytes
#[inline]
pub const fn num_words(size: u64) -> i64 {
    size.div_ceil(32) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontier_costs() {
        let rev = Revision::Frontier;
        assert_eq!(gas_cost(rev, Opcode::ADD as u8), Some(3));
        assert_eq!(gas_cost(rev, Opcode::MUL as u8), Some(5));
        assert_eq!(gas_cost(rev, Opcode::JUMPI as u8), Some(10));
        assert_eq!(gas_cost(rev, Opcode::BALANCE as u8), Some(20));
        assert_eq!(gas_cost(rev, Opcode::SLOAD as u8), Some(50));
        assert_eq!(gas_cost(rev, Opcode::LOG2 as u8), Some(1125));
        assert_eq!(gas_cost(rev, Opcode::CALL as u8), Some(40));
        assert_eq!(gas_cost(rev, Opcode::DELEGATECALL as u8), None);
        assert_eq!(gas_cost(rev, Opcode::SHL as u8), None);
        assert_eq!(gas_cost(rev, Opcode::PUSH0 as u8), None);
    }

    #[test]
    fn test_revision_upgrades() {
        assert_eq!(gas_cost(Revision::Homestead, Opcode::DELEGATECALL as u8), Some(40));
        assert_eq!(gas_cost(Revision::TangerineWhistle, Opcode::SELFDESTRUCT as u8), Some(5000));
        assert_eq!(gas_cost(Revision::Byzantium, Opcode::REVERT as u8), Some(0));
        assert_eq!(gas_cost(Revision::Constantinople, Opcode::EXTCODEHASH as u8), Some(400));
        assert_eq!(gas_cost(Revision::Istanbul, Opcode::SLOAD as u8), Some(800));
        assert_eq!(gas_cost(Revision::Istanbul, Opcode::SELFBALANCE as u8), Some(5));
        assert_eq!(gas_cost(Revision::Berlin, Opcode::SLOAD as u8), Some(100));
        assert_eq!(gas_cost(Revision::Berlin, Opcode::BASEFEE as u8), None);
        assert_eq!(gas_cost(Revision::London, Opcode::BASEFEE as u8), Some(2));
        assert_eq!(gas_cost(Revision::Shanghai, Opcode::PUSH0 as u8), Some(2));
    }

    #[test]
    fn test_undefined_bytes() {
        for rev in Revision::ALL {
            for byte in [0x0C, 0x21, 0x49, 0x5C, 0xA5, 0xEF, 0xF6] {
                assert_eq!(gas_cost(rev, byte), None, "{byte:#x} in {rev}");
            }
        }
    }

    #[test]
    fn test_defined_bytes_have_traits() {
        for rev in Revision::ALL {
            for byte in 0..=255u8 {
                if gas_cost(rev, byte).is_some() {
                    assert!(crate::opcode::traits(byte).is_some(), "{byte:#x}");
                }
            }
        }
    }

    #[test]
    fn test_memory_cost() {
        assert_eq!(memory_cost(0), 0);
        assert_eq!(memory_cost(1), 3);
        assert_eq!(memory_cost(32), 98);
        assert_eq!(memory_cost(1024), 3 * 1024 + 2048);
        assert_eq!(num_words(0), 0);
        assert_eq!(num_words(1), 1);
        assert_eq!(num_words(32), 1);
        assert_eq!(num_words(33), 2);
    }
}
