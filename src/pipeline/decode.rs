//src/pipeline/decode.rs
//! Decode stage: splits the instruction word into its fields, reads the
//! register file, extracts the immediate and, for branches, asks the
//! predictor for a direction. Grounded in `core.cpp::decode()`'s
//! per-opcode switch.

use crate::isa;
use crate::isa::opcodes as op;
use crate::pipeline::registers::{DecodeExecuteLatch, FetchDecodeLatch};
use crate::pvm::branch_predictor::BranchPredictor;
use crate::pvm::csr::CsrFile;
use crate::pvm::registers::RegisterFile;

#[derive(Debug, Default)]
pub struct DecodeStage;

impl DecodeStage {
    pub fn process(
        &self,
        latch: &FetchDecodeLatch,
        registers: &RegisterFile,
        csrs: &CsrFile,
        predictor: &mut dyn BranchPredictor,
    ) -> DecodeExecuteLatch {
        if !latch.we {
            return DecodeExecuteLatch::bubble();
        }

        let instruction = latch.instruction;
        let opcode = isa::opcode(instruction);
        let funct3 = isa::funct3(instruction);
        let funct7 = isa::funct7(instruction);
        let rs1 = isa::rs1(instruction);
        let rs2 = isa::rs2(instruction);
        let rd = isa::rd(instruction);

        let mut out = DecodeExecuteLatch {
            pc: latch.pc,
            instruction,
            opcode,
            funct3,
            funct7,
            rs1,
            rs2,
            rd,
            we: true,
            next_pc_sequential: latch.pc.wrapping_add(4),
            ..DecodeExecuteLatch::bubble()
        };

        match opcode {
            op::LUI => {
                out.use_rd = true;
                out.immediate = isa::imm_u(instruction);
            }
            op::AUIPC => {
                out.use_rd = true;
                out.immediate = isa::imm_u(instruction);
            }
            op::JAL => {
                out.use_rd = true;
                let target = latch.pc.wrapping_add(isa::imm_j(instruction) as u32);
                out.branch_target = target;
                out.decode_redirect = Some(target);
                out.immediate = latch.pc.wrapping_add(4) as i32; // link value
            }
            op::JALR => {
                out.use_rs1 = true;
                out.use_rd = true;
                out.rs1_value = registers.read(rs1);
                out.immediate = isa::imm_i(instruction);
                let target = (out.rs1_value.wrapping_add(out.immediate) as u32) & !1u32;
                out.branch_target = target;
                out.decode_redirect = Some(target);
                out.immediate = latch.pc.wrapping_add(4) as i32; // link value
            }
            op::BRANCH => {
                out.use_rs1 = true;
                out.use_rs2 = true;
                out.is_branch = true;
                out.rs1_value = registers.read(rs1);
                out.rs2_value = registers.read(rs2);
                out.branch_target = latch.pc.wrapping_add(isa::imm_b(instruction) as u32);
                out.predicted_taken = predictor.predict(latch.pc);
            }
            op::LOAD => {
                out.use_rs1 = true;
                out.use_rd = true;
                out.is_load = true;
                out.rs1_value = registers.read(rs1);
                out.immediate = isa::imm_i(instruction);
            }
            op::STORE => {
                out.use_rs1 = true;
                out.use_rs2 = true;
                out.is_store = true;
                out.rs1_value = registers.read(rs1);
                out.rs2_value = registers.read(rs2);
                out.store_value = out.rs2_value;
                out.immediate = isa::imm_s(instruction);
            }
            op::OP_IMM => {
                out.use_rs1 = true;
                out.use_rd = true;
                out.rs1_value = registers.read(rs1);
                out.immediate = if funct3 == op::OPI_SRI {
                    isa::shamt(instruction) as i32
                } else {
                    isa::imm_i(instruction)
                };
            }
            op::OP => {
                out.use_rs1 = true;
                out.use_rs2 = true;
                out.use_rd = true;
                out.rs1_value = registers.read(rs1);
                out.rs2_value = registers.read(rs2);
            }
            op::SYSTEM => {
                if op::is_ecall(instruction) {
                    // a7/a0..a3 read by the syscall bridge, not the ALU.
                    out.is_ecall = true;
                } else {
                    out.use_rd = true;
                    out.is_csr = true;
                    let addr = isa::csr_index(instruction);
                    out.csr_addr = addr;
                    out.csr_old_value = csrs.read(addr);
                    out.csr_operand = match funct3 {
                        op::SYSTEM_CSRRWI | op::SYSTEM_CSRRSI | op::SYSTEM_CSRRCI => {
                            isa::csr_uimm(instruction) as i32
                        }
                        _ => {
                            out.use_rs1 = true;
                            out.rs1_value = registers.read(rs1);
                            out.rs1_value
                        }
                    };
                }
            }
            _ => {}
        }

        // x0 is never a real write target; dropping `use_rd` here keeps
        // the forwarding unit from treating it as a dependency producer.
        if rd == 0 {
            out.use_rd = false;
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pvm::branch_predictor::DefaultPredictor;
    use crate::pvm::csr::CsrFile;

    fn fd(instruction: u32, pc: u32) -> FetchDecodeLatch {
        FetchDecodeLatch {
            pc,
            instruction,
            we: true,
        }
    }

    #[test]
    fn addi_reads_rs1_and_sign_extends_immediate() {
        let mut regs = RegisterFile::new();
        regs.write(2, 10);
        let csrs = CsrFile::new();
        let mut pred = DefaultPredictor::new();
        let instr: u32 = ((0xFFFu32) << 20) | (2 << 15) | (0 << 12) | (1 << 7) | op::OP_IMM as u32;
        let out = DecodeStage.process(&fd(instr, 0), &regs, &csrs, &mut pred);
        assert_eq!(out.rs1_value, 10);
        assert_eq!(out.immediate, -1);
        assert_eq!(out.rd, 1);
        assert!(out.use_rd);
    }

    #[test]
    fn jal_computes_target_and_link_value_in_decode() {
        let regs = RegisterFile::new();
        let csrs = CsrFile::new();
        let mut pred = DefaultPredictor::new();
        let imm: u32 = 8;
        let instr = ((imm >> 20 & 1) << 31)
            | (((imm >> 1) & 0x3FF) << 21)
            | (((imm >> 11) & 1) << 20)
            | (((imm >> 12) & 0xFF) << 12)
            | (1 << 7)
            | op::JAL as u32;
        let out = DecodeStage.process(&fd(instr, 100), &regs, &csrs, &mut pred);
        assert_eq!(out.decode_redirect, Some(108));
        assert_eq!(out.immediate, 104);
    }

    #[test]
    fn rd_x0_clears_use_rd() {
        let regs = RegisterFile::new();
        let csrs = CsrFile::new();
        let mut pred = DefaultPredictor::new();
        let instr: u32 = (5 << 20) | (0 << 15) | op::OP_IMM as u32; // rd = x0
        let out = DecodeStage.process(&fd(instr, 0), &regs, &csrs, &mut pred);
        assert!(!out.use_rd);
    }

    #[test]
    fn branch_asks_the_predictor_for_a_direction() {
        let regs = RegisterFile::new();
        let csrs = CsrFile::new();
        let mut pred = DefaultPredictor::new();
        let instr: u32 = (1 << 15) | (1 << 20) | op::BRANCH as u32; // BEQ x1,x2
        let out = DecodeStage.process(&fd(instr, 0), &regs, &csrs, &mut pred);
        assert!(out.is_branch);
        assert!(out.predicted_taken); // reset state predicts taken
    }

    #[test]
    fn csrrw_reads_old_value_and_captures_register_operand() {
        let mut regs = RegisterFile::new();
        regs.write(2, 0x55);
        let mut csrs = CsrFile::new();
        csrs.write(0x300, 9);
        let mut pred = DefaultPredictor::new();
        // CSRRW x1, 0x300, x2
        let instr: u32 =
            (0x300 << 20) | (2 << 15) | (op::SYSTEM_CSRRW as u32) << 12 | (1 << 7) | op::SYSTEM as u32;
        let out = DecodeStage.process(&fd(instr, 0), &regs, &csrs, &mut pred);
        assert!(out.is_csr);
        assert!(!out.is_ecall);
        assert_eq!(out.csr_addr, 0x300);
        assert_eq!(out.csr_old_value, 9);
        assert_eq!(out.csr_operand, 0x55);
        assert!(out.use_rd);
        assert!(out.use_rs1);
    }

    #[test]
    fn csrrsi_uses_the_uimm_field_instead_of_a_register_read() {
        let regs = RegisterFile::new();
        let csrs = CsrFile::new();
        let mut pred = DefaultPredictor::new();
        // CSRRSI x1, 0x300, uimm=5
        let instr: u32 =
            (0x300 << 20) | (5 << 15) | (op::SYSTEM_CSRRSI as u32) << 12 | (1 << 7) | op::SYSTEM as u32;
        let out = DecodeStage.process(&fd(instr, 0), &regs, &csrs, &mut pred);
        assert!(out.is_csr);
        assert_eq!(out.csr_operand, 5);
        assert!(!out.use_rs1);
    }
}
