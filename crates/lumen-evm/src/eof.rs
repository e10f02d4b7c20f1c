//! EOF1 code container validation
//!
//! Layout of a version 1 container:
//!
//! ```text
//! magic(EF 00) version(01) 01 code_size(u16) [02 data_size(u16)] 00 code [data]
//! ```
//!
//! Validation short-circuits on the first violation, in header order, and
//! then checks the instructions of the code section.

use crate::gas::gas_table;
use crate::opcode::{immediate_size, traits};
use crate::revision::Revision;
use thiserror::Error;

/// Container prefix
pub const MAGIC: [u8; 2] = [0xEF, 0x00];

const TERMINATOR: u8 = 0;
const CODE_SECTION: u8 = 1;
const DATA_SECTION: u8 = 2;

/// Structural rejection reasons
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EofValidationError {
    /// Does not start with the container magic
    #[error("invalid_prefix")]
    InvalidPrefix,

    /// Version byte is unknown or not enabled in this revision
    #[error("eof_version_unknown")]
    EofVersionUnknown,

    /// Header ends inside a section size
    #[error("incomplete_section_size")]
    IncompleteSectionSize,

    /// No code section before the data section or the terminator
    #[error("code_section_missing")]
    CodeSectionMissing,

    /// More than one code section
    #[error("multiple_code_sections")]
    MultipleCodeSections,

    /// More than one data section
    #[error("multiple_data_sections")]
    MultipleDataSections,

    /// Section id other than terminator, code or data
    #[error("unknown_section_id")]
    UnknownSectionId,

    /// Declared section size is zero
    #[error("zero_section_size")]
    ZeroSectionSize,

    /// Header has no terminator
    #[error("section_headers_not_terminated")]
    SectionHeadersNotTerminated,

    /// Declared section sizes do not add up to the remaining bytes
    #[error("invalid_section_bodies_size")]
    InvalidSectionBodiesSize,

    /// Code section contains an instruction undefined in this revision
    #[error("undefined_instruction")]
    UndefinedInstruction,

    /// Code section does not end with a terminating instruction
    #[error("missing_terminating_instruction")]
    MissingTerminatingInstruction,
}

/// Section sizes of a version 1 container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Eof1Header {
    /// Size of the code section
    pub code_size: u16,
    /// Size of the data section, 0 when absent
    pub data_size: u16,
}

impl Eof1Header {
    /// Offset of the code section inside the container
    pub fn code_begin(&self) -> usize {
        // magic + version + code header + terminator, plus the data header if any
        if self.data_size == 0 {
            7
        } else {
            10
        }
    }

    /// The code section of `container`
    pub fn code<'c>(&self, container: &'c [u8]) -> &'c [u8] {
        let begin = self.code_begin();
        &container[begin..begin + self.code_size as usize]
    }
}

/// Whether `code` starts with the container magic
pub fn is_eof_code(code: &[u8]) -> bool {
    code.starts_with(&MAGIC)
}

/// Version byte of a container, 0 when there is none
pub fn eof_version(container: &[u8]) -> u8 {
    if container.len() >= 3 && is_eof_code(container) {
        container[2]
    } else {
        0
    }
}

/// Whether containers are recognized in `rev`
pub fn is_enabled(rev: Revision) -> bool {
    rev >= Revision::Cancun
}

/// Validate a container, returning its header
pub fn validate_eof(rev: Revision, container: &[u8]) -> Result<Eof1Header, EofValidationError> {
    if !is_eof_code(container) {
        return Err(EofValidationError::InvalidPrefix);
    }
    if eof_version(container) != 1 || !is_enabled(rev) {
        return Err(EofValidationError::EofVersionUnknown);
    }

    let header = validate_headers(container)?;
    validate_instructions(rev, header.code(container))?;
    Ok(header)
}

/// Parse the header of a container that already passed [`validate_eof`]
pub fn read_valid_eof1_header(container: &[u8]) -> Eof1Header {
    let code_size = u16::from_be_bytes([container[4], container[5]]);
    let data_size = if container[6] == DATA_SECTION {
        u16::from_be_bytes([container[7], container[8]])
    } else {
        0
    };
    Eof1Header {
        code_size,
        data_size,
    }
}

fn validate_headers(container: &[u8]) -> Result<Eof1Header, EofValidationError> {
    let mut sizes = [0u16; 3];
    let mut pos = 3;
    let mut terminated = false;

    while pos < container.len() {
        let id = container[pos];
        pos += 1;
        match id {
            TERMINATOR => {
                if sizes[CODE_SECTION as usize] == 0 {
                    return Err(EofValidationError::CodeSectionMissing);
                }
                terminated = true;
                break;
            }
            CODE_SECTION => {
                if sizes[CODE_SECTION as usize] != 0 {
                    return Err(EofValidationError::MultipleCodeSections);
                }
            }
            DATA_SECTION => {
                if sizes[CODE_SECTION as usize] == 0 {
                    return Err(EofValidationError::CodeSectionMissing);
                }
                if sizes[DATA_SECTION as usize] != 0 {
                    return Err(EofValidationError::MultipleDataSections);
                }
            }
            _ => return Err(EofValidationError::UnknownSectionId),
        }

        if pos + 2 > container.len() {
            return Err(EofValidationError::IncompleteSectionSize);
        }
        let size = u16::from_be_bytes([container[pos], container[pos + 1]]);
        if size == 0 {
            return Err(EofValidationError::ZeroSectionSize);
        }
        sizes[id as usize] = size;
        pos += 2;
    }

    if !terminated {
        return Err(EofValidationError::SectionHeadersNotTerminated);
    }

    let bodies_size = sizes[CODE_SECTION as usize] as usize + sizes[DATA_SECTION as usize] as usize;
    if bodies_size != container.len() - pos {
        return Err(EofValidationError::InvalidSectionBodiesSize);
    }

    Ok(Eof1Header {
        code_size: sizes[CODE_SECTION as usize],
        data_size: sizes[DATA_SECTION as usize],
    })
}

fn validate_instructions(rev: Revision, code: &[u8]) -> Result<(), EofValidationError> {
    let table = gas_table(rev);
    let mut last = 0;
    let mut pos = 0;
    while pos < code.len() {
        let op = code[pos];
        if table[op as usize].is_none() {
            return Err(EofValidationError::UndefinedInstruction);
        }
        last = op;
        pos += 1 + immediate_size(op);
    }

    // a PUSH whose immediate runs past the end is the last instruction too
    match traits(last) {
        Some(t) if t.is_terminating && pos == code.len() => Ok(()),
        _ => Err(EofValidationError::MissingTerminatingInstruction),
    }
}
