//src/pipeline/execute.rs
//! Execute stage: runs the ALU, resolves branch conditions, and computes
//! memory addresses. Grounded in `core.cpp::execute()`'s per-opcode
//! switch. ECALL never reaches this stage — the core resolves it
//! directly against the register file before it would — but the rest of
//! the `SYSTEM` opcode (the CSR family) does, like any other instruction.

use crate::alu::{Alu, BranchCondition};
use crate::isa::opcodes as op;
use crate::pipeline::registers::{DecodeExecuteLatch, ExecuteMemoryLatch};
use crate::pvm::memory::{WIDTH_BYTE, WIDTH_HALF, WIDTH_WORD};

#[derive(Debug, Default)]
pub struct ExecuteStage {
    alu: Alu,
}

impl ExecuteStage {
    pub fn new() -> Self {
        Self { alu: Alu::new() }
    }

    pub fn process(&self, latch: &DecodeExecuteLatch) -> ExecuteMemoryLatch {
        if !latch.we {
            return ExecuteMemoryLatch::bubble();
        }

        let mut out = ExecuteMemoryLatch {
            pc: latch.pc,
            instruction: latch.instruction,
            rd: latch.rd,
            use_rd: latch.use_rd,
            we: true,
            ..ExecuteMemoryLatch::bubble()
        };

        match latch.opcode {
            op::LUI => out.result = latch.immediate,
            op::AUIPC => out.result = (latch.pc as i32).wrapping_add(latch.immediate),
            op::JAL | op::JALR => out.result = latch.immediate, // link value, computed in decode
            op::BRANCH => {
                let taken = BranchCondition::from_funct3(latch.funct3)
                    .map(|c| c.evaluate(latch.rs1_value, latch.rs2_value))
                    .unwrap_or(false);
                out.is_branch = true;
                out.branch_taken = taken;
                out.branch_target = latch.branch_target;
                out.predicted_taken = latch.predicted_taken;
            }
            op::LOAD => {
                out.is_load = true;
                out.mem_addr = (latch.rs1_value.wrapping_add(latch.immediate)) as u32;
                let (width_code, sign) = load_width(latch.funct3);
                out.width_code = width_code;
                out.load_sign_extend = sign;
            }
            op::STORE => {
                out.is_store = true;
                out.mem_addr = (latch.rs1_value.wrapping_add(latch.immediate)) as u32;
                out.store_value = latch.store_value;
                out.width_code = store_width(latch.funct3);
            }
            op::OP_IMM => {
                out.result = self.alu.op_imm(
                    latch.funct3,
                    latch.funct7,
                    latch.rs1_value,
                    latch.immediate,
                    latch.immediate as u32 & 0x1F,
                );
            }
            op::OP => {
                // funct7[0] selects the M extension, which this core does
                // not implement; treated as a reserved no-op.
                if latch.funct7 & 0x1 == 0 {
                    out.result = self.alu.op_reg(
                        latch.funct3,
                        latch.funct7,
                        latch.rs1_value,
                        latch.rs2_value,
                    );
                }
            }
            op::SYSTEM if latch.is_csr => {
                out.is_csr = true;
                out.csr_addr = latch.csr_addr;
                out.result = latch.csr_old_value; // old value, written back to rd
                out.csr_new_value = match latch.funct3 {
                    op::SYSTEM_CSRRW | op::SYSTEM_CSRRWI => latch.csr_operand,
                    op::SYSTEM_CSRRS | op::SYSTEM_CSRRSI => latch.csr_old_value | latch.csr_operand,
                    op::SYSTEM_CSRRC | op::SYSTEM_CSRRCI => latch.csr_old_value & !latch.csr_operand,
                    _ => latch.csr_old_value,
                };
            }
            _ => {}
        }

        out
    }
}

/// `ld_op`/sign pair from `process_dm`'s `RISCV_LD_*` cases. `LBU` is a
/// known quirk carried over from the original: it decodes as a
/// half-width, zero-extended load rather than a byte load.
fn load_width(funct3: u8) -> (u8, bool) {
    match funct3 {
        op::LD_LB => (WIDTH_BYTE, true),
        op::LD_LH => (WIDTH_HALF, true),
        op::LD_LW => (WIDTH_WORD, false),
        op::LD_LBU => (WIDTH_HALF, false),
        op::LD_LHU => (WIDTH_HALF, false),
        _ => (WIDTH_WORD, false),
    }
}

fn store_width(funct3: u8) -> u8 {
    match funct3 {
        op::ST_STB => WIDTH_BYTE,
        op::ST_STH => WIDTH_HALF,
        _ => WIDTH_WORD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latch() -> DecodeExecuteLatch {
        DecodeExecuteLatch {
            we: true,
            ..DecodeExecuteLatch::bubble()
        }
    }

    #[test]
    fn op_imm_addi_adds_operands() {
        let mut l = latch();
        l.opcode = op::OP_IMM;
        l.funct3 = op::OPI_ADDI;
        l.rs1_value = 4;
        l.immediate = 6;
        let out = ExecuteStage::new().process(&l);
        assert_eq!(out.result, 10);
    }

    #[test]
    fn branch_blt_taken_sets_branch_taken() {
        let mut l = latch();
        l.opcode = op::BRANCH;
        l.funct3 = op::BR_BLT;
        l.rs1_value = -1;
        l.rs2_value = 1;
        l.predicted_taken = false;
        let out = ExecuteStage::new().process(&l);
        assert!(out.is_branch);
        assert!(out.branch_taken);
        assert!(out.mispredicted());
    }

    #[test]
    fn lbu_decodes_as_zero_extended_half_width() {
        let (width, sign) = load_width(op::LD_LBU);
        assert_eq!(width, WIDTH_HALF);
        assert!(!sign);
    }

    #[test]
    fn m_extension_bit_is_a_reserved_no_op() {
        let mut l = latch();
        l.opcode = op::OP;
        l.funct3 = op::OP_ADD;
        l.funct7 = 0x01; // reserved M-extension bit set
        l.rs1_value = 6;
        l.rs2_value = 7;
        let out = ExecuteStage::new().process(&l);
        assert_eq!(out.result, 0);
    }

    #[test]
    fn csrrw_returns_old_value_and_sets_new_value_to_the_operand() {
        let mut l = latch();
        l.opcode = op::SYSTEM;
        l.funct3 = op::SYSTEM_CSRRW;
        l.is_csr = true;
        l.csr_addr = 0x300;
        l.csr_old_value = 9;
        l.csr_operand = 0x55;
        let out = ExecuteStage::new().process(&l);
        assert!(out.is_csr);
        assert_eq!(out.csr_addr, 0x300);
        assert_eq!(out.result, 9);
        assert_eq!(out.csr_new_value, 0x55);
    }

    #[test]
    fn csrrs_ors_the_operand_into_the_old_value() {
        let mut l = latch();
        l.opcode = op::SYSTEM;
        l.funct3 = op::SYSTEM_CSRRS;
        l.is_csr = true;
        l.csr_old_value = 0b0010;
        l.csr_operand = 0b0101;
        let out = ExecuteStage::new().process(&l);
        assert_eq!(out.result, 0b0010);
        assert_eq!(out.csr_new_value, 0b0111);
    }

    #[test]
    fn csrrc_clears_the_operand_bits_from_the_old_value() {
        let mut l = latch();
        l.opcode = op::SYSTEM;
        l.funct3 = op::SYSTEM_CSRRC;
        l.is_csr = true;
        l.csr_old_value = 0b0111;
        l.csr_operand = 0b0101;
        let out = ExecuteStage::new().process(&l);
        assert_eq!(out.result, 0b0111);
        assert_eq!(out.csr_new_value, 0b0010);
    }

    #[test]
    fn ecall_never_reaches_the_system_csr_arm() {
        let mut l = latch();
        l.opcode = op::SYSTEM;
        l.is_csr = false;
        l.is_ecall = true;
        let out = ExecuteStage::new().process(&l);
        assert!(!out.is_csr);
        assert_eq!(out.result, 0);
    }
}
