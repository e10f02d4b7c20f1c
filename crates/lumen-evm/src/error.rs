//! Execution status codes and option errors

use thiserror::Error;

/// Terminal status of an execution.
///
/// `Success` and `Revert` are the only statuses that keep unused gas and
/// output; every other status is a failure that consumes all gas.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Execution finished normally
    #[error("success")]
    Success,

    /// Generic failure reported by a host
    #[error("failure")]
    Failure,

    /// Execution reverted by REVERT
    #[error("revert")]
    Revert,

    /// Out of gas
    #[error("out of gas")]
    OutOfGas,

    /// The designated INVALID instruction was executed
    #[error("invalid instruction")]
    InvalidInstruction,

    /// An opcode not defined in the active revision was executed
    #[error("undefined instruction")]
    UndefinedInstruction,

    /// Stack overflow (max 1024)
    #[error("stack overflow")]
    StackOverflow,

    /// Stack underflow
    #[error("stack underflow")]
    StackUnderflow,

    /// Jump to something other than a JUMPDEST
    #[error("bad jump destination")]
    BadJumpDestination,

    /// Read outside of the return data buffer
    #[error("invalid memory access")]
    InvalidMemoryAccess,

    /// Call depth limit exceeded
    #[error("call depth exceeded")]
    CallDepthExceeded,

    /// State modification in static context
    #[error("static mode violation")]
    StaticModeViolation,

    /// Precompiled contract failed
    #[error("precompile failure")]
    PrecompileFailure,

    /// Code container failed structural validation
    #[error("contract validation failure")]
    ContractValidationFailure,

    /// An argument was out of the supported range
    #[error("argument out of range")]
    ArgumentOutOfRange,

    /// Not enough balance for a value transfer
    #[error("insufficient balance")]
    InsufficientBalance,

    /// Engine internal error
    #[error("internal error")]
    InternalError,
}

impl StatusCode {
    /// Whether unused gas and output survive this status
    pub fn keeps_gas(self) -> bool {
        matches!(self, StatusCode::Success | StatusCode::Revert)
    }

    /// Whether this is `Success`
    pub fn is_success(self) -> bool {
        self == StatusCode::Success
    }
}

/// Errors returned by `Vm::set_option`
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetOptionError {
    /// The option name is not recognized
    #[error("unknown option: {0}")]
    InvalidName(String),

    /// The option value is not valid for this option
    #[error("invalid value {value:?} for option {name}")]
    InvalidValue {
        /// Option name
        name: String,
        /// Rejected value
        value: String,
    },
}
