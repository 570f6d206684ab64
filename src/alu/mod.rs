//src/alu/mod.rs
pub mod alu;

pub use alu::{Alu, BranchCondition};
