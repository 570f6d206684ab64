//src/pipeline/writeback.rs
//! Writeback stage: commits the memory stage's result into the register
//! file. Grounded in `core.cpp::writeback()`'s `rd != 0 && we && useRd`
//! guard — `RegisterFile::write` already drops writes to `x0`, so this
//! stage only needs to check `we`/`use_rd`.

use crate::pipeline::registers::MemoryWritebackLatch;
use crate::pvm::registers::RegisterFile;

#[derive(Debug, Default)]
pub struct WritebackStage;

impl WritebackStage {
    pub fn process(&self, latch: &MemoryWritebackLatch, registers: &mut RegisterFile) {
        if latch.we && latch.use_rd {
            registers.write(latch.rd, latch.result);
        }
    }
}
