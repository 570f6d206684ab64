//src/pvm/vm.rs
//! The `Core`: owns the pipeline, memories, register file, predictor and
//! syscall bridge, and drives the cycle loop. Scoped down to what a
//! 5-stage RV32I core actually needs (no cache hierarchy, no store
//! buffer).

use crate::debug::PipelineTracer;
use crate::pipeline::{Pipeline, PipelineStats};
use crate::pvm::branch_predictor::{BranchPredictor, DefaultPredictor, PerceptronBranchPredictor};
use crate::pvm::core_errors::CoreResult;
use crate::pvm::csr::CsrFile;
use crate::pvm::loader::LoadedProgram;
use crate::pvm::memory::{DataMemory, InstructionMemory};
use crate::pvm::registers::RegisterFile;
use crate::pvm::syscall::{ReferenceSyscallBridge, SyscallBridge};

/// Which direction predictor a core should run with. `Bimodal` (the
/// original's default `BitBranchPredictor<2, 4>`) unless the caller
/// specifically wants to exercise the perceptron path.
#[derive(Debug, Clone, Copy)]
pub enum PredictorKind {
    Bimodal,
    Perceptron { threshold: i32, learning_rate: i32 },
}

impl Default for PredictorKind {
    fn default() -> Self {
        Self::Bimodal
    }
}

fn build_predictor(kind: PredictorKind) -> Box<dyn BranchPredictor> {
    match kind {
        PredictorKind::Bimodal => Box::new(DefaultPredictor::new()),
        PredictorKind::Perceptron {
            threshold,
            learning_rate,
        } => Box::new(PerceptronBranchPredictor::<8, 16>::new(threshold, learning_rate)),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CoreConfig {
    pub predictor: PredictorKind,
    /// Hard cap on cycles run before `run()` gives up, mirroring the
    /// original's `while (i < 0xffff)` bound in `doCore()`.
    pub max_cycles: u64,
    pub trace: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            predictor: PredictorKind::default(),
            max_cycles: 0xFFFF,
            trace: false,
        }
    }
}

pub struct Core {
    pipeline: Pipeline,
    registers: RegisterFile,
    instruction_memory: InstructionMemory,
    data_memory: DataMemory,
    csrs: CsrFile,
    predictor: Box<dyn BranchPredictor>,
    syscalls: Box<dyn SyscallBridge>,
    tracer: Option<PipelineTracer>,
    config: CoreConfig,
}

impl Core {
    pub fn new(program: LoadedProgram, config: CoreConfig) -> CoreResult<Self> {
        let instruction_memory = InstructionMemory::load(&program.instructions)?;
        let data_memory = DataMemory::load(&program.data)?;
        Ok(Self {
            pipeline: Pipeline::new(program.entry_pc),
            registers: RegisterFile::new(),
            instruction_memory,
            data_memory,
            csrs: CsrFile::new(),
            predictor: build_predictor(config.predictor),
            syscalls: Box::new(ReferenceSyscallBridge::default()),
            tracer: config.trace.then(PipelineTracer::new),
            config,
        })
    }

    /// Replaces the default syscall bridge, e.g. with a mock in tests.
    pub fn with_syscall_bridge(mut self, bridge: Box<dyn SyscallBridge>) -> Self {
        self.syscalls = bridge;
        self
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn data_memory(&self) -> &DataMemory {
        &self.data_memory
    }

    pub fn csrs(&self) -> &CsrFile {
        &self.csrs
    }

    pub fn stats(&self) -> PipelineStats {
        self.pipeline.stats
    }

    /// Runs until the program halts or `max_cycles` is reached, returning
    /// the final stats either way.
    pub fn run(&mut self) -> PipelineStats {
        for _ in 0..self.config.max_cycles {
            let pc_before = self.pipeline.pc();
            let outcome = self.pipeline.step(
                &mut self.registers,
                &self.instruction_memory,
                &mut self.data_memory,
                &mut self.csrs,
                self.predictor.as_mut(),
                self.syscalls.as_mut(),
            );
            if let Some(tracer) = &mut self.tracer {
                tracer.trace_cycle(pc_before, self.pipeline.stats);
            }
            if outcome.halted {
                break;
            }
        }
        self.pipeline.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pvm::loader::FlatBinaryLoader;
    use crate::pvm::loader::ProgramLoader;

    #[test]
    fn core_runs_an_addi_chain_to_completion() {
        let instr = |rd: u8, rs1: u8, imm: i32| -> u32 {
            ((imm as u32 & 0xFFF) << 20)
                | ((rs1 as u32) << 15)
                | ((rd as u32) << 7)
                | 0b001_0011
        };
        let words = [instr(1, 0, 5), instr(2, 1, 5)];
        let mut bytes = Vec::new();
        for w in words {
            bytes.extend_from_slice(&w.to_le_bytes());
        }
        let program = FlatBinaryLoader.load(&bytes).unwrap();
        let mut core = Core::new(
            program,
            CoreConfig {
                max_cycles: 16,
                ..CoreConfig::default()
            },
        )
        .unwrap();
        core.run();
        assert_eq!(core.registers().read(2), 10);
    }
}
