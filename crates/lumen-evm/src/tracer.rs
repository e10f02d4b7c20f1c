//! Execution tracers
//!
//! Tracers are attached to a [`Vm`](crate::Vm) and notified in registration
//! order. The baseline interpreter reports every instruction; both
//! interpreters report the start and the end of each execution.

use crate::context::{ExecutionResult, Message};
use crate::opcode::traits;
use crate::revision::Revision;
use crate::state::ExecutionState;
use parking_lot::Mutex;
use serde_json::json;
use std::io::{self, Write};

/// Receiver of execution events
pub trait Tracer: Send + Sync {
    /// A new execution begins (nested calls included)
    fn on_execution_start(&self, rev: Revision, msg: &Message, code: &[u8]);

    /// `opcode` at `pc` is about to run, before any check or gas charge
    fn on_instruction_start(&self, _pc: usize, _opcode: u8, _state: &ExecutionState<'_>) {}

    /// The innermost running execution finished
    fn on_execution_end(&self, result: &ExecutionResult);
}

/// Output sink shared by the built-in tracers
pub type TraceWriter = Box<dyn Write + Send>;

fn opcode_name(opcode: u8) -> String {
    match traits(opcode) {
        Some(t) => t.name.to_string(),
        None => format!("0x{opcode:02x}"),
    }
}

/// Writes one JSON object per line for every event
pub struct InstructionTracer {
    inner: Mutex<InstructionTracerInner>,
}

struct InstructionTracerInner {
    out: TraceWriter,
    /// Gas limit of every running execution, innermost last
    gas_limits: Vec<i64>,
}

impl InstructionTracer {
    /// Trace into `out`
    pub fn new(out: TraceWriter) -> Self {
        Self {
            inner: Mutex::new(InstructionTracerInner {
                out,
                gas_limits: Vec::new(),
            }),
        }
    }

    /// Trace into stderr
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }
}

impl InstructionTracerInner {
    fn emit(&mut self, value: serde_json::Value) {
        if let Err(err) = writeln!(self.out, "{value}") {
            tracing::warn!(%err, "failed to write instruction trace");
        }
    }
}

impl Tracer for InstructionTracer {
    fn on_execution_start(&self, rev: Revision, msg: &Message, _code: &[u8]) {
        let mut inner = self.inner.lock();
        inner.gas_limits.push(msg.gas);
        inner.emit(json!({
            "depth": msg.depth,
            "rev": rev.name(),
            "static": msg.is_static,
        }));
    }

    fn on_instruction_start(&self, pc: usize, opcode: u8, state: &ExecutionState<'_>) {
        let stack: Vec<String> = state
            .stack
            .as_slice()
            .iter()
            .rev()
            .map(|v| format!("{v:#x}"))
            .collect();
        self.inner.lock().emit(json!({
            "pc": pc,
            "op": opcode,
            "opName": opcode_name(opcode),
            "gas": state.gas_left,
            "stack": stack,
            "memorySize": state.memory.size(),
        }));
    }

    fn on_execution_end(&self, result: &ExecutionResult) {
        let mut inner = self.inner.lock();
        let gas_limit = inner.gas_limits.pop().unwrap_or_default();
        let error = if result.status.is_success() {
            None
        } else {
            Some(result.status.to_string())
        };
        inner.emit(json!({
            "error": error,
            "gas": result.gas_left,
            "gasUsed": gas_limit - result.gas_left,
            "output": hex::encode(&result.output),
        }));
    }
}

/// Counts executed opcodes per call and prints them as CSV when the call ends
pub struct HistogramTracer {
    inner: Mutex<HistogramTracerInner>,
}

struct HistogramContext {
    depth: i32,
    counts: [u32; 256],
}

struct HistogramTracerInner {
    out: TraceWriter,
    contexts: Vec<HistogramContext>,
}

impl HistogramTracer {
    /// Write histograms into `out`
    pub fn new(out: TraceWriter) -> Self {
        Self {
            inner: Mutex::new(HistogramTracerInner {
                out,
                contexts: Vec::new(),
            }),
        }
    }

    /// Write histograms into stderr
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }
}

impl HistogramTracerInner {
    fn write_histogram(&mut self, ctx: &HistogramContext) -> io::Result<()> {
        writeln!(self.out, "--- # HISTOGRAM depth={}", ctx.depth)?;
        writeln!(self.out, "opcode,count")?;
        for (opcode, &count) in ctx.counts.iter().enumerate() {
            if count != 0 {
                writeln!(self.out, "{},{}", opcode_name(opcode as u8), count)?;
            }
        }
        Ok(())
    }
}

impl Tracer for HistogramTracer {
    fn on_execution_start(&self, _rev: Revision, msg: &Message, _code: &[u8]) {
        self.inner.lock().contexts.push(HistogramContext {
            depth: msg.depth,
            counts: [0; 256],
        });
    }

    fn on_instruction_start(&self, _pc: usize, opcode: u8, _state: &ExecutionState<'_>) {
        if let Some(ctx) = self.inner.lock().contexts.last_mut() {
            ctx.counts[opcode as usize] += 1;
        }
    }

    fn on_execution_end(&self, _result: &ExecutionResult) {
        let mut inner = self.inner.lock();
        let Some(ctx) = inner.contexts.pop() else {
            return;
        };
        if let Err(err) = inner.write_histogram(&ctx) {
            tracing::warn!(%err, "failed to write opcode histogram");
        }
    }
}

/// In-memory writer that can be read back while a tracer owns a clone
#[derive(Clone, Default)]
pub struct SharedBuffer(std::sync::Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// New empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
