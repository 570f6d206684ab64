//src/isa/opcodes.rs
//! RV32I opcode and funct3/funct7 discriminants, named after the `RISCV_*`
//! constants in the original `riscvISA.h` (not shipped in the retrieved
//! source pack, reconstructed from their use in `core.cpp`).

pub const LUI: u8 = 0b011_0111;
pub const AUIPC: u8 = 0b001_0111;
pub const JAL: u8 = 0b110_1111;
pub const JALR: u8 = 0b110_0111;
pub const BRANCH: u8 = 0b110_0011;
pub const LOAD: u8 = 0b000_0011;
pub const STORE: u8 = 0b010_0011;
pub const OP_IMM: u8 = 0b001_0011;
pub const OP: u8 = 0b011_0011;
pub const SYSTEM: u8 = 0b111_0011;

// BRANCH funct3
pub const BR_BEQ: u8 = 0b000;
pub const BR_BNE: u8 = 0b001;
pub const BR_BLT: u8 = 0b100;
pub const BR_BGE: u8 = 0b101;
pub const BR_BLTU: u8 = 0b110;
pub const BR_BGEU: u8 = 0b111;

// LOAD funct3
pub const LD_LB: u8 = 0b000;
pub const LD_LH: u8 = 0b001;
pub const LD_LW: u8 = 0b010;
pub const LD_LBU: u8 = 0b100;
pub const LD_LHU: u8 = 0b101;

// STORE funct3
pub const ST_STB: u8 = 0b000;
pub const ST_STH: u8 = 0b001;
pub const ST_STW: u8 = 0b010;

// OP-IMM funct3
pub const OPI_ADDI: u8 = 0b000;
pub const OPI_SLLI: u8 = 0b001;
pub const OPI_SLTI: u8 = 0b010;
pub const OPI_SLTIU: u8 = 0b011;
pub const OPI_XORI: u8 = 0b100;
pub const OPI_SRI: u8 = 0b101; // SRLI/SRAI, discriminated by funct7[5]
pub const OPI_ORI: u8 = 0b110;
pub const OPI_ANDI: u8 = 0b111;

// OP funct3
pub const OP_ADD: u8 = 0b000; // ADD/SUB, discriminated by funct7[5]
pub const OP_SLL: u8 = 0b001;
pub const OP_SLT: u8 = 0b010;
pub const OP_SLTU: u8 = 0b011;
pub const OP_XOR: u8 = 0b100;
pub const OP_SR: u8 = 0b101; // SRL/SRA, discriminated by funct7[5]
pub const OP_OR: u8 = 0b110;
pub const OP_AND: u8 = 0b111;

// SYSTEM funct3
pub const SYSTEM_ENV: u8 = 0b000; // ECALL/EBREAK
pub const SYSTEM_CSRRW: u8 = 0b001;
pub const SYSTEM_CSRRS: u8 = 0b010;
pub const SYSTEM_CSRRC: u8 = 0b011;
pub const SYSTEM_CSRRWI: u8 = 0b101;
pub const SYSTEM_CSRRSI: u8 = 0b110;
pub const SYSTEM_CSRRCI: u8 = 0b111;

/// `instr[31:20]` of an ECALL is all zero; non-zero there selects other
/// privileged CSR/trap variants this core leaves unimplemented.
pub fn is_ecall(instruction: u32) -> bool {
    (instruction >> 20) == 0
}

/// The canonical RV32I NOP (`ADDI x0, x0, 0`), used to pre-seed the fetch
/// latch so an idle pipeline stage has a harmless instruction to carry.
pub const NOP_INSTRUCTION: u32 = 0x0000_0013;
