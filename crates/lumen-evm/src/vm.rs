//! Engine entry point

use crate::advanced::{self, AdvancedCodeAnalysis};
use crate::baseline::{self, CodeAnalysis};
use crate::cache::AnalysisCache;
use crate::config::{InterpreterKind, VmConfig};
use crate::context::{ExecutionResult, Message};
use crate::eof::{is_eof_code, is_enabled, validate_eof};
use crate::error::{SetOptionError, StatusCode};
use crate::host::Host;
use crate::revision::Revision;
use crate::state::{Buffers, ExecutionState};
use crate::tracer::{HistogramTracer, InstructionTracer, Tracer};
use parking_lot::Mutex;

/// Stack and memory allocations kept for reuse
const MAX_POOLED_BUFFERS: usize = 16;

/// EVM instance.
///
/// One `Vm` can run many executions, including nested ones started by the
/// host from inside [`Host::call`].
pub struct Vm {
    interpreter: InterpreterKind,
    cache_enabled: bool,
    tracers: Vec<Box<dyn Tracer>>,
    baseline_cache: AnalysisCache<CodeAnalysis<'static>>,
    advanced_cache: AnalysisCache<AdvancedCodeAnalysis>,
    buffers: Mutex<Vec<Buffers>>,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    /// Create a VM with the default configuration
    pub fn new() -> Self {
        Self::from_config(&VmConfig::default())
    }

    /// Create a VM from a configuration
    pub fn from_config(config: &VmConfig) -> Self {
        let mut vm = Self {
            interpreter: config.interpreter,
            cache_enabled: config.analysis_cache,
            tracers: Vec::new(),
            baseline_cache: AnalysisCache::with_capacity(config.analysis_cache_capacity),
            advanced_cache: AnalysisCache::with_capacity(config.analysis_cache_capacity),
            buffers: Mutex::new(Vec::new()),
        };
        if config.trace {
            vm.add_tracer(Box::new(InstructionTracer::stderr()));
        }
        if config.histogram {
            vm.add_tracer(Box::new(HistogramTracer::stderr()));
        }
        vm
    }

    /// Instruction events come from the baseline interpreter only
    fn warn_if_instructions_untraced(&self) {
        if self.interpreter == InterpreterKind::Advanced && !self.tracers.is_empty() {
            tracing::warn!(
                tracers = self.tracers.len(),
                "advanced interpreter reports only execution start and end to tracers"
            );
        }
    }

    /// Active interpreter
    pub fn interpreter(&self) -> InterpreterKind {
        self.interpreter
    }

    /// Whether code analyses are cached
    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    /// Number of cached analyses for the active interpreter
    pub fn cached_analyses(&self) -> usize {
        match self.interpreter {
            InterpreterKind::Baseline => self.baseline_cache.len(),
            InterpreterKind::Advanced => self.advanced_cache.len(),
        }
    }

    /// Append a tracer; tracers are notified in the order they were added
    pub fn add_tracer(&mut self, tracer: Box<dyn Tracer>) {
        self.tracers.push(tracer);
        self.warn_if_instructions_untraced();
    }

    /// Change a runtime option.
    ///
    /// `advanced` and `baseline` select the interpreter, `cache` takes `yes`
    /// or `no`, `trace` and `histogram` attach a stderr tracer.
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<(), SetOptionError> {
        match name {
            "advanced" => {
                self.interpreter = InterpreterKind::Advanced;
                self.warn_if_instructions_untraced();
            }
            "baseline" => self.interpreter = InterpreterKind::Baseline,
            "cache" => {
                self.cache_enabled = match value {
                    "yes" => true,
                    "no" => false,
                    _ => {
                        return Err(SetOptionError::InvalidValue {
                            name: name.to_string(),
                            value: value.to_string(),
                        })
                    }
                };
                if !self.cache_enabled {
                    self.baseline_cache.clear();
                    self.advanced_cache.clear();
                }
            }
            "trace" => self.add_tracer(Box::new(InstructionTracer::stderr())),
            "histogram" => self.add_tracer(Box::new(HistogramTracer::stderr())),
            _ => return Err(SetOptionError::InvalidName(name.to_string())),
        }
        tracing::debug!(name, value, "vm option set");
        Ok(())
    }

    /// Execute `code` for `msg`
    pub fn execute(
        &self,
        host: &mut dyn Host,
        rev: Revision,
        msg: &Message,
        code: &[u8],
    ) -> ExecutionResult {
        tracing::trace!(
            %rev,
            depth = msg.depth,
            gas = msg.gas,
            code_size = code.len(),
            interpreter = ?self.interpreter,
            "execution start"
        );

        if is_enabled(rev) && is_eof_code(code) {
            if let Err(err) = validate_eof(rev, code) {
                tracing::debug!(%err, %rev, code_size = code.len(), "rejected code container");
                return ExecutionResult::failure(StatusCode::ContractValidationFailure);
            }
        }

        let buffers = self.buffers.lock().pop().unwrap_or_default();
        let mut state = ExecutionState::with_buffers(buffers, msg, rev, host, code);

        let result = match self.interpreter {
            InterpreterKind::Baseline if self.cache_enabled => {
                let analysis = self
                    .baseline_cache
                    .get_or_insert_with(rev, code, || baseline::analyze(rev, code).into_owned());
                baseline::execute(&mut state, &analysis, &self.tracers)
            }
            InterpreterKind::Baseline => {
                let analysis = baseline::analyze(rev, code);
                baseline::execute(&mut state, &analysis, &self.tracers)
            }
            InterpreterKind::Advanced if self.cache_enabled => {
                let analysis = self
                    .advanced_cache
                    .get_or_insert_with(rev, code, || advanced::analyze(rev, code));
                advanced::execute(&mut state, &analysis, &self.tracers)
            }
            InterpreterKind::Advanced => {
                let analysis = advanced::analyze(rev, code);
                advanced::execute(&mut state, &analysis, &self.tracers)
            }
        };

        let mut pool = self.buffers.lock();
        if pool.len() < MAX_POOLED_BUFFERS {
            pool.push(state.into_buffers());
        }
        drop(pool);

        tracing::trace!(
            status = %result.status,
            gas_left = result.gas_left,
            gas_refund = result.gas_refund,
            output_size = result.output.len(),
            "execution end"
        );
        result
    }
}
