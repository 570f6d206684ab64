//src/pipeline/memory.rs
//! Memory stage: performs the load or store the execute stage computed
//! the address for. Grounded in `core.cpp::memory()`.

use crate::pipeline::registers::{ExecuteMemoryLatch, MemoryWritebackLatch};
use crate::pvm::csr::CsrFile;
use crate::pvm::memory::DataMemory;

#[derive(Debug, Default)]
pub struct MemoryStage;

impl MemoryStage {
    pub fn process(
        &self,
        latch: &ExecuteMemoryLatch,
        memory: &mut DataMemory,
        csrs: &mut CsrFile,
    ) -> MemoryWritebackLatch {
        if !latch.we {
            return MemoryWritebackLatch::bubble();
        }

        let result = if latch.is_load {
            memory.read(latch.mem_addr, latch.width_code, latch.load_sign_extend) as i32
        } else {
            if latch.is_store {
                memory.write(latch.mem_addr, latch.store_value as u32, latch.width_code);
            }
            if latch.is_csr {
                csrs.write(latch.csr_addr, latch.csr_new_value);
            }
            latch.result
        };

        MemoryWritebackLatch {
            rd: latch.rd,
            use_rd: latch.use_rd,
            result,
            we: true,
        }
    }
}
