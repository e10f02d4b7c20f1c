//! # lumen-evm
//!
//! EVM execution engine with two interpreters sharing one instruction set:
//! - [`baseline`]: runs the code bytes directly with per-instruction checks
//! - [`advanced`]: runs a block-structured analysis with per-block checks
//!
//! Both observe the same gas, stack and output for any code. [`Vm`] picks
//! one of them, validates EOF containers, caches analyses and drives the
//! tracers. All account and storage access goes through the [`Host`] trait;
//! [`MockedHost`] is an in-memory implementation for tests and benchmarks.
//!
//! ```
//! use lumen_evm::{Message, MockedHost, Revision, StatusCode, Vm};
//! use lumen_primitives::Address;
//!
//! let vm = Vm::new();
//! let mut host = MockedHost::new();
//! let msg = Message::new(Address::ZERO, Address::ZERO, vec![], 100);
//! // PUSH1 0, PUSH1 0, RETURN
//! let result = vm.execute(&mut host, Revision::LATEST, &msg, &[0x60, 0x00, 0x60, 0x00, 0xF3]);
//! assert_eq!(result.status, StatusCode::Success);
//! assert_eq!(result.gas_left, 94);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod advanced;
pub mod baseline;
pub mod cache;
pub mod config;
pub mod context;
pub mod eof;
pub mod error;
pub mod gas;
pub mod host;
pub mod instructions;
pub mod memory;
pub mod mocked_host;
pub mod opcode;
pub mod revision;
pub mod stack;
pub mod state;
pub mod tracer;
pub mod vm;

pub use cache::AnalysisCache;
pub use config::{ConfigError, InterpreterKind, VmConfig};
pub use context::{CallKind, ExecutionResult, Message, TxContext};
pub use eof::{validate_eof, Eof1Header, EofValidationError};
pub use error::{SetOptionError, StatusCode};
pub use host::{AccessStatus, Host, StorageStatus};
pub use memory::Memory;
pub use mocked_host::MockedHost;
pub use opcode::Opcode;
pub use revision::Revision;
pub use stack::Stack;
pub use state::ExecutionState;
pub use tracer::{HistogramTracer, InstructionTracer, Tracer};
pub use vm::Vm;
