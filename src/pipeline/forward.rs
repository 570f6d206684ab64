//src/pipeline/forward.rs
//! Combined forwarding and stall unit: one module, folding both concerns
//! together rather than splitting them across separate hazard/forward
//! units. Priority is EX/MEM over MEM/WB, and a load whose value isn't
//! ready yet forces a stall instead of an impossible forward.

use crate::pipeline::registers::{DecodeExecuteLatch, ExecuteMemoryLatch, MemoryWritebackLatch};

#[derive(Debug, Default)]
pub struct ForwardUnit {
    pub forwards: u64,
    pub stalls: u64,
}

impl ForwardUnit {
    pub fn new() -> Self {
        Self::default()
    }

    /// A load one stage ahead of `consumer` whose destination the
    /// consumer needs can't supply it yet — its value only exists after
    /// this cycle's memory access completes.
    pub fn has_load_use_hazard(
        &self,
        consumer: &DecodeExecuteLatch,
        producer_in_mem: &ExecuteMemoryLatch,
    ) -> bool {
        producer_in_mem.we
            && producer_in_mem.is_load
            && producer_in_mem.use_rd
            && producer_in_mem.rd != 0
            && ((consumer.use_rs1 && consumer.rs1 == producer_in_mem.rd)
                || (consumer.use_rs2 && consumer.rs2 == producer_in_mem.rd))
    }

    /// Forwards into `consumer`'s operand values from the two producers
    /// ahead of it in the pipeline. Call only once `has_load_use_hazard`
    /// has ruled out the one case forwarding can't cover.
    pub fn resolve(
        &mut self,
        consumer: &mut DecodeExecuteLatch,
        producer_in_mem: &ExecuteMemoryLatch,
        producer_in_wb: &MemoryWritebackLatch,
    ) {
        if consumer.use_rs1 {
            if let Some(value) = self.forward_value(consumer.rs1, producer_in_mem, producer_in_wb) {
                consumer.rs1_value = value;
                if consumer.is_csr {
                    consumer.csr_operand = value;
                }
                self.forwards += 1;
            }
        }
        if consumer.use_rs2 {
            if let Some(value) = self.forward_value(consumer.rs2, producer_in_mem, producer_in_wb) {
                consumer.rs2_value = value;
                if consumer.is_store {
                    consumer.store_value = value;
                }
                self.forwards += 1;
            }
        }
    }

    fn forward_value(
        &self,
        reg: u8,
        producer_in_mem: &ExecuteMemoryLatch,
        producer_in_wb: &MemoryWritebackLatch,
    ) -> Option<i32> {
        if reg == 0 {
            return None;
        }
        if producer_in_mem.we
            && producer_in_mem.use_rd
            && producer_in_mem.rd == reg
            && !producer_in_mem.is_load
        {
            return Some(producer_in_mem.result);
        }
        if producer_in_wb.we && producer_in_wb.use_rd && producer_in_wb.rd == reg {
            return Some(producer_in_wb.result);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consumer_using_rs1(reg: u8) -> DecodeExecuteLatch {
        DecodeExecuteLatch {
            we: true,
            use_rs1: true,
            rs1: reg,
            ..DecodeExecuteLatch::bubble()
        }
    }

    #[test]
    fn load_use_hazard_detected_when_rs1_matches_pending_load() {
        let unit = ForwardUnit::new();
        let consumer = consumer_using_rs1(5);
        let producer = ExecuteMemoryLatch {
            we: true,
            is_load: true,
            use_rd: true,
            rd: 5,
            ..ExecuteMemoryLatch::bubble()
        };
        assert!(unit.has_load_use_hazard(&consumer, &producer));
    }

    #[test]
    fn ex_mem_forward_takes_priority_over_mem_wb() {
        let mut unit = ForwardUnit::new();
        let mut consumer = consumer_using_rs1(5);
        let producer_in_mem = ExecuteMemoryLatch {
            we: true,
            use_rd: true,
            rd: 5,
            result: 100,
            ..ExecuteMemoryLatch::bubble()
        };
        let producer_in_wb = MemoryWritebackLatch {
            we: true,
            use_rd: true,
            rd: 5,
            result: 200,
        };
        unit.resolve(&mut consumer, &producer_in_mem, &producer_in_wb);
        assert_eq!(consumer.rs1_value, 100);
        assert_eq!(unit.forwards, 1);
    }

    #[test]
    fn falls_back_to_mem_wb_when_ex_mem_does_not_match() {
        let mut unit = ForwardUnit::new();
        let mut consumer = consumer_using_rs1(5);
        let producer_in_mem = ExecuteMemoryLatch::bubble();
        let producer_in_wb = MemoryWritebackLatch {
            we: true,
            use_rd: true,
            rd: 5,
            result: 200,
        };
        unit.resolve(&mut consumer, &producer_in_mem, &producer_in_wb);
        assert_eq!(consumer.rs1_value, 200);
    }

    #[test]
    fn csr_register_operand_is_refreshed_like_store_value() {
        let mut unit = ForwardUnit::new();
        let mut consumer = DecodeExecuteLatch {
            we: true,
            use_rs1: true,
            rs1: 5,
            is_csr: true,
            csr_operand: 7, // stale value captured at decode
            ..DecodeExecuteLatch::bubble()
        };
        let producer_in_mem = ExecuteMemoryLatch {
            we: true,
            use_rd: true,
            rd: 5,
            result: 100,
            ..ExecuteMemoryLatch::bubble()
        };
        unit.resolve(&mut consumer, &producer_in_mem, &MemoryWritebackLatch::bubble());
        assert_eq!(consumer.rs1_value, 100);
        assert_eq!(consumer.csr_operand, 100);
    }

    #[test]
    fn no_match_leaves_decode_value_untouched() {
        let mut unit = ForwardUnit::new();
        let mut consumer = consumer_using_rs1(5);
        consumer.rs1_value = 7;
        unit.resolve(
            &mut consumer,
            &ExecuteMemoryLatch::bubble(),
            &MemoryWritebackLatch::bubble(),
        );
        assert_eq!(consumer.rs1_value, 7);
    }
}
