//src/pipeline/fetch.rs
//! Fetch stage: reads one instruction word at `pc`. No prefetch buffer —
//! this core's instruction memory is zero-latency.

use crate::pipeline::registers::FetchDecodeLatch;
use crate::pvm::memory::InstructionMemory;

#[derive(Debug, Default)]
pub struct FetchStage;

impl FetchStage {
    pub fn process(&self, pc: u32, memory: &InstructionMemory) -> FetchDecodeLatch {
        FetchDecodeLatch {
            pc,
            instruction: memory.fetch(pc),
            we: true,
        }
    }
}
