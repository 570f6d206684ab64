//src/lib.rs
pub mod alu;
pub mod debug;
pub mod demos;
pub mod isa;
pub mod pipeline;
pub mod pvm;

pub use pvm::{Core, CoreConfig, CoreError, CoreResult};
