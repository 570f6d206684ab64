//src/debug/mod.rs
//! Ambient instrumentation: a per-cycle tracer and a branch-predictor
//! miss-rate decorator (`TracerConfig`/`PipelineTracer`, and a
//! `BranchPredictorWrapper`-style `MissRateTracker` for the miss-rate
//! bookkeeping).

use std::fmt;
use std::fs::File;
use std::io::Write;

use chrono::Local;

use crate::pipeline::PipelineStats;
use crate::pvm::branch_predictor::BranchPredictor;

#[derive(Debug, Clone)]
pub struct TracerConfig {
    pub log_to_console: bool,
    pub log_to_file: bool,
    pub log_file_path: String,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            log_to_console: true,
            log_to_file: false,
            log_file_path: "rv5pipe_trace.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CycleTrace {
    pub pc: u32,
    pub stats: PipelineStats,
}

impl fmt::Display for CycleTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycle {} pc=0x{:08x} completed={} stalls={} flushes={}",
            self.stats.cycles,
            self.pc,
            self.stats.instructions_completed,
            self.stats.stalls,
            self.stats.branch_flushes
        )
    }
}

/// Records one line per cycle, optionally to a log file as well as
/// stdout. Not wired into the hot path unless `CoreConfig::trace` is set.
pub struct PipelineTracer {
    config: TracerConfig,
    log_file: Option<File>,
    history: Vec<CycleTrace>,
}

impl PipelineTracer {
    pub fn new() -> Self {
        Self::with_config(TracerConfig::default())
    }

    pub fn with_config(config: TracerConfig) -> Self {
        let log_file = if config.log_to_file {
            File::create(&config.log_file_path).ok()
        } else {
            None
        };
        Self {
            config,
            log_file,
            history: Vec::new(),
        }
    }

    pub fn trace_cycle(&mut self, pc: u32, stats: PipelineStats) {
        let entry = CycleTrace { pc, stats };
        if self.config.log_to_console {
            println!("[{}] {}", Local::now().format("%H:%M:%S%.3f"), entry);
        }
        if let Some(file) = &mut self.log_file {
            let _ = writeln!(file, "{}", entry);
        }
        self.history.push(entry);
    }

    pub fn history(&self) -> &[CycleTrace] {
        &self.history
    }

    /// A short end-of-run summary line.
    pub fn summary(&self) -> String {
        match self.history.last() {
            Some(last) => format!(
                "{} cycles, {} instructions completed, ipc={:.3}",
                last.stats.cycles,
                last.stats.instructions_completed,
                last.stats.ipc()
            ),
            None => "no cycles traced".to_string(),
        }
    }
}

impl Default for PipelineTracer {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps a predictor with `BranchPredictorWrapper<T>`'s bookkeeping: counts
/// of predictions made, updates applied, and mispredictions, plus a small
/// queue so `undo()` can cancel the most recent in-flight prediction's
/// count without touching the wrapped predictor's own state.
pub struct MissRateTracker<P: BranchPredictor> {
    inner: P,
    process_count: u64,
    update_count: u64,
    miss_predictions: u64,
    pending: Vec<bool>,
}

impl<P: BranchPredictor> MissRateTracker<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            process_count: 0,
            update_count: 0,
            miss_predictions: 0,
            pending: Vec::new(),
        }
    }

    pub fn miss_rate(&self) -> f64 {
        if self.update_count == 0 {
            0.0
        } else {
            self.miss_predictions as f64 / self.update_count as f64
        }
    }

    pub fn process_count(&self) -> u64 {
        self.process_count
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }
}

impl<P: BranchPredictor> BranchPredictor for MissRateTracker<P> {
    fn predict(&mut self, pc: u32) -> bool {
        self.process_count += 1;
        let prediction = self.inner.predict(pc);
        self.pending.push(prediction);
        prediction
    }

    fn train(&mut self, pc: u32, taken: bool) {
        self.update_count += 1;
        if let Some(predicted) = self.pending.first().copied() {
            self.pending.remove(0);
            if predicted != taken {
                self.miss_predictions += 1;
            }
        }
        self.inner.train(pc, taken);
    }

    fn undo(&mut self) {
        if !self.pending.is_empty() {
            self.pending.remove(0);
        }
        self.inner.undo();
    }
}
