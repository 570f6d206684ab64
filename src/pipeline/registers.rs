//src/pipeline/registers.rs
//! The pipeline's latch types: value snapshots passed between adjacent
//! stages, one struct per original `FtoDC`/`DCtoEx`/`ExtoMem`/`MemtoWB`
//! from `pipelineRegisters.h`. Each carries a `we` flag instead of being
//! wrapped in `Option` — a bubble is a latch with `we: false`, matching
//! the original's hardware-shaped "valid bit on every register" design.

/// Fetch -> Decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchDecodeLatch {
    pub pc: u32,
    pub instruction: u32,
    pub we: bool,
}

impl FetchDecodeLatch {
    pub fn bubble() -> Self {
        Self {
            pc: 0,
            instruction: crate::isa::NOP_INSTRUCTION,
            we: false,
        }
    }
}

impl Default for FetchDecodeLatch {
    fn default() -> Self {
        Self::bubble()
    }
}

/// Decode -> Execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeExecuteLatch {
    pub pc: u32,
    pub instruction: u32,
    pub opcode: u8,
    pub funct3: u8,
    pub funct7: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub rd: u8,
    pub use_rs1: bool,
    pub use_rs2: bool,
    pub use_rd: bool,
    pub rs1_value: i32,
    pub rs2_value: i32,
    /// The value to store on a `STORE`, pre-forwarding (equal to
    /// `rs2_value` except when overwritten by the forwarding unit).
    pub store_value: i32,
    pub immediate: i32,
    pub is_branch: bool,
    pub is_load: bool,
    pub is_store: bool,
    /// Set for `SYSTEM`/ECALL: resolved by the syscall bridge outside the
    /// normal execute/memory stages, against the live register file.
    pub is_ecall: bool,
    /// Set for `SYSTEM`/CSRRW/CSRRS/CSRRC and their immediate forms.
    pub is_csr: bool,
    pub csr_addr: u16,
    /// CSR value read in decode (the original's `lhs` for this family).
    pub csr_old_value: i32,
    /// `reg[rs1]` for CSRRW/CSRRS/CSRRC, or the zero-extended `uimm` field
    /// for the `*I` forms (the original's `rhs`).
    pub csr_operand: i32,
    /// Decode-time "this branch is taken" guess, used by the branch unit
    /// to redirect fetch before execute resolves the real outcome.
    pub predicted_taken: bool,
    pub branch_target: u32,
    pub next_pc_sequential: u32,
    /// Set for `JAL`/`JALR`: the target is already known in decode, so
    /// fetch redirects immediately rather than waiting on execute.
    pub decode_redirect: Option<u32>,
    pub we: bool,
}

impl DecodeExecuteLatch {
    pub fn bubble() -> Self {
        Self {
            pc: 0,
            instruction: crate::isa::NOP_INSTRUCTION,
            opcode: 0,
            funct3: 0,
            funct7: 0,
            rs1: 0,
            rs2: 0,
            rd: 0,
            use_rs1: false,
            use_rs2: false,
            use_rd: false,
            rs1_value: 0,
            rs2_value: 0,
            store_value: 0,
            immediate: 0,
            is_branch: false,
            is_load: false,
            is_store: false,
            is_ecall: false,
            is_csr: false,
            csr_addr: 0,
            csr_old_value: 0,
            csr_operand: 0,
            predicted_taken: false,
            branch_target: 0,
            next_pc_sequential: 0,
            decode_redirect: None,
            we: false,
        }
    }
}

impl Default for DecodeExecuteLatch {
    fn default() -> Self {
        Self::bubble()
    }
}

/// Execute -> Memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteMemoryLatch {
    pub pc: u32,
    pub instruction: u32,
    pub result: i32,
    pub rd: u8,
    pub use_rd: bool,
    pub is_load: bool,
    pub is_store: bool,
    pub width_code: u8,
    pub load_sign_extend: bool,
    pub mem_addr: u32,
    pub store_value: i32,
    pub is_branch: bool,
    pub branch_taken: bool,
    pub branch_target: u32,
    pub predicted_taken: bool,
    /// Set for the CSR family: the memory stage commits `csr_new_value`
    /// to `csr_addr` in the CSR file, the same cycle a store would land
    /// in data memory.
    pub is_csr: bool,
    pub csr_addr: u16,
    pub csr_new_value: i32,
    pub halted: bool,
    pub we: bool,
}

impl ExecuteMemoryLatch {
    pub fn bubble() -> Self {
        Self {
            pc: 0,
            instruction: crate::isa::NOP_INSTRUCTION,
            result: 0,
            rd: 0,
            use_rd: false,
            is_load: false,
            is_store: false,
            width_code: 0,
            load_sign_extend: false,
            mem_addr: 0,
            store_value: 0,
            is_branch: false,
            branch_taken: false,
            branch_target: 0,
            predicted_taken: false,
            is_csr: false,
            csr_addr: 0,
            csr_new_value: 0,
            halted: false,
            we: false,
        }
    }

    /// True when the branch resolved differently than decode guessed,
    /// i.e. fetch and decode must be squashed and redirected.
    pub fn mispredicted(&self) -> bool {
        self.we && self.is_branch && self.branch_taken != self.predicted_taken
    }

    pub fn redirect_target(&self) -> u32 {
        if self.branch_taken {
            self.branch_target
        } else {
            self.pc.wrapping_add(4)
        }
    }
}

impl Default for ExecuteMemoryLatch {
    fn default() -> Self {
        Self::bubble()
    }
}

/// Memory -> Writeback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryWritebackLatch {
    pub rd: u8,
    pub use_rd: bool,
    pub result: i32,
    pub we: bool,
}

impl MemoryWritebackLatch {
    pub fn bubble() -> Self {
        Self {
            rd: 0,
            use_rd: false,
            result: 0,
            we: false,
        }
    }
}

impl Default for MemoryWritebackLatch {
    fn default() -> Self {
        Self::bubble()
    }
}
