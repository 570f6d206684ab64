//src/pvm/core_errors.rs
//! Core-level error type, in the style of `bytecode::decode_errors` in the
//! teacher crate: a plain enum with a hand-written `Display` and `Error`
//! impl rather than a derive macro.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Instruction or data image is too large for the fixed-size memories.
    MemoryOverflow { words: usize, capacity: usize },
    /// A syscall bridge was asked to handle a number it doesn't recognize.
    UnsupportedSyscall(u32),
    /// ELF parsing or image loading failed.
    Io(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::MemoryOverflow { words, capacity } => write!(
                f,
                "program has {} words, exceeds memory capacity of {} words",
                words, capacity
            ),
            CoreError::UnsupportedSyscall(n) => write!(f, "unsupported syscall number {}", n),
            CoreError::Io(msg) => write!(f, "io error: {}", msg),
        }
    }
}

impl std::error::Error for CoreError {}

pub type CoreResult<T> = Result<T, CoreError>;
