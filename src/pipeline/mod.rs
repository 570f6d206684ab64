//src/pipeline/mod.rs
//! The five-stage pipeline datapath: owns the stage structs, the combined
//! forward/stall unit, the branch redirect unit, and the latches between
//! stages, and drives exactly one clock edge per `step()` call. Grounded
//! in `core.cpp::doCycle()`, with the original's per-stage temporaries
//! replaced by Rust's ordinary "compute the new values, then commit"
//! shape.

pub mod branch_unit;
pub mod decode;
pub mod execute;
pub mod fetch;
pub mod forward;
pub mod memory;
pub mod registers;
pub mod writeback;

use branch_unit::{BranchUnit, Redirect};
use decode::DecodeStage;
use execute::ExecuteStage;
use fetch::FetchStage;
use forward::ForwardUnit;
use memory::MemoryStage;
use registers::{DecodeExecuteLatch, ExecuteMemoryLatch, FetchDecodeLatch, MemoryWritebackLatch};
use writeback::WritebackStage;

use crate::pvm::branch_predictor::BranchPredictor;
use crate::pvm::csr::CsrFile;
use crate::pvm::memory::{DataMemory, InstructionMemory};
use crate::pvm::registers::RegisterFile;
use crate::pvm::syscall::SyscallBridge;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub cycles: u64,
    pub instructions_completed: u64,
    pub stalls: u64,
    pub forwards: u64,
    pub branch_flushes: u64,
}

impl PipelineStats {
    /// Instructions-per-cycle, `0.0` before the first cycle runs.
    pub fn ipc(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.instructions_completed as f64 / self.cycles as f64
        }
    }
}

#[derive(Debug)]
pub struct Pipeline {
    fetch_stage: FetchStage,
    decode_stage: DecodeStage,
    execute_stage: ExecuteStage,
    memory_stage: MemoryStage,
    writeback_stage: WritebackStage,
    forward_unit: ForwardUnit,
    branch_unit: BranchUnit,

    fetch_decode: FetchDecodeLatch,
    decode_execute: DecodeExecuteLatch,
    execute_memory: ExecuteMemoryLatch,
    memory_writeback: MemoryWritebackLatch,

    pc: u32,
    pub stats: PipelineStats,
}

/// What happened during one `step()`, for the driving loop in `pvm::vm`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub halted: bool,
}

impl Pipeline {
    pub fn new(entry_pc: u32) -> Self {
        Self {
            fetch_stage: FetchStage,
            decode_stage: DecodeStage,
            execute_stage: ExecuteStage::new(),
            memory_stage: MemoryStage,
            writeback_stage: WritebackStage,
            forward_unit: ForwardUnit::new(),
            branch_unit: BranchUnit,
            fetch_decode: FetchDecodeLatch::bubble(),
            decode_execute: DecodeExecuteLatch::bubble(),
            execute_memory: ExecuteMemoryLatch::bubble(),
            memory_writeback: MemoryWritebackLatch::bubble(),
            pc: entry_pc,
            stats: PipelineStats::default(),
        }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        registers: &mut RegisterFile,
        instruction_memory: &InstructionMemory,
        data_memory: &mut DataMemory,
        csrs: &mut CsrFile,
        predictor: &mut dyn BranchPredictor,
        syscalls: &mut dyn SyscallBridge,
    ) -> StepOutcome {
        self.stats.cycles += 1;

        // Writeback commits first: its register write must be visible to
        // this cycle's forwarding and syscall-argument reads.
        self.writeback_stage.process(&self.memory_writeback, registers);
        if self.memory_writeback.we && self.memory_writeback.use_rd && self.memory_writeback.rd != 0 {
            self.stats.instructions_completed += 1;
        }

        let stall = self
            .forward_unit
            .has_load_use_hazard(&self.decode_execute, &self.execute_memory);
        if stall {
            self.stats.stalls += 1;
        } else {
            self.forward_unit.resolve(
                &mut self.decode_execute,
                &self.execute_memory,
                &self.memory_writeback,
            );
        }

        let new_memory_writeback = self.memory_stage.process(&self.execute_memory, data_memory, csrs);

        // Decode's predict() must run before execute's train()/undo() land
        // on the predictor this cycle: a self-branch (a branch whose own
        // pc is what it's predicting) would otherwise see this
        // instruction's own outcome before asking for its prediction.
        let fetched_and_decoded = (!stall).then(|| {
            let fetched = self.fetch_stage.process(self.pc, instruction_memory);
            let decoded = self.decode_stage.process(&self.fetch_decode, registers, csrs, predictor);
            (fetched, decoded)
        });

        let (new_execute_memory, halted) = if stall {
            (ExecuteMemoryLatch::bubble(), false)
        } else if self.decode_execute.we && self.decode_execute.is_ecall {
            self.resolve_ecall(registers, data_memory, syscalls)
        } else {
            (self.execute_stage.process(&self.decode_execute), false)
        };

        if new_execute_memory.we && new_execute_memory.is_branch {
            predictor.train(new_execute_memory.pc, new_execute_memory.branch_taken);
        }
        let execute_mispredicted = new_execute_memory.mispredicted();
        if execute_mispredicted {
            predictor.undo();
            self.stats.branch_flushes += 1;
        }

        let (next_pc, committed_fetch_decode, committed_decode_execute) = match fetched_and_decoded {
            None => (self.pc, self.fetch_decode, self.decode_execute),
            Some((fetched, decoded)) => {
                let redirect = self.branch_unit.resolve(&new_execute_memory, &decoded);
                let squash_fetch = execute_mispredicted || !matches!(redirect, Redirect::None);
                let squash_decode = execute_mispredicted;

                let next_pc = match redirect {
                    Redirect::Execute(target) | Redirect::Decode(target) => target,
                    Redirect::None => self.pc.wrapping_add(4),
                };

                (
                    next_pc,
                    if squash_fetch {
                        FetchDecodeLatch::bubble()
                    } else {
                        fetched
                    },
                    if squash_decode {
                        DecodeExecuteLatch::bubble()
                    } else {
                        decoded
                    },
                )
            }
        };

        self.pc = next_pc;
        self.fetch_decode = committed_fetch_decode;
        self.decode_execute = committed_decode_execute;
        self.execute_memory = new_execute_memory;
        self.memory_writeback = new_memory_writeback;

        StepOutcome { halted }
    }

    fn resolve_ecall(
        &self,
        registers: &RegisterFile,
        data_memory: &mut DataMemory,
        syscalls: &mut dyn SyscallBridge,
    ) -> (ExecuteMemoryLatch, bool) {
        let number = registers.read(17) as u32;
        let args = [
            registers.read(10) as u32,
            registers.read(11) as u32,
            registers.read(12) as u32,
            registers.read(13) as u32,
        ];
        let outcome = syscalls.handle(number, args, data_memory);
        let latch = ExecuteMemoryLatch {
            pc: self.decode_execute.pc,
            instruction: self.decode_execute.instruction,
            result: outcome.result as i32,
            rd: 10,
            use_rd: true,
            we: true,
            halted: outcome.exit,
            ..ExecuteMemoryLatch::bubble()
        };
        (latch, outcome.exit)
    }
}
