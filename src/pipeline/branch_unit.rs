//src/pipeline/branch_unit.rs
//! Redirect priority, grounded in `core.cpp::branchUnit()`: an execute
//! misprediction squashes fetch and decode and wins outright; otherwise a
//! decode-stage instruction with an already-known target (`JAL`/`JALR`)
//! squashes only fetch; otherwise the pipeline just keeps walking PC+4.

use crate::pipeline::registers::{DecodeExecuteLatch, ExecuteMemoryLatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    None,
    /// `JAL`/`JALR` resolved in decode: squash fetch only.
    Decode(u32),
    /// A conditional branch resolved in execute differently than
    /// predicted: squash fetch and decode, and undo the predictor's
    /// bookkeeping for the guess it made.
    Execute(u32),
}

#[derive(Debug, Default)]
pub struct BranchUnit;

impl BranchUnit {
    pub fn resolve(
        &self,
        execute_memory: &ExecuteMemoryLatch,
        decode_execute: &DecodeExecuteLatch,
    ) -> Redirect {
        if execute_memory.mispredicted() {
            Redirect::Execute(execute_memory.redirect_target())
        } else if decode_execute.we {
            match decode_execute.decode_redirect {
                Some(target) => Redirect::Decode(target),
                None => Redirect::None,
            }
        } else {
            Redirect::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_misprediction_outranks_decode_redirect() {
        let unit = BranchUnit;
        let em = ExecuteMemoryLatch {
            we: true,
            is_branch: true,
            branch_taken: true,
            predicted_taken: false,
            branch_target: 40,
            pc: 20,
            ..ExecuteMemoryLatch::bubble()
        };
        let de = DecodeExecuteLatch {
            we: true,
            decode_redirect: Some(1000),
            ..DecodeExecuteLatch::bubble()
        };
        assert_eq!(unit.resolve(&em, &de), Redirect::Execute(40));
    }

    #[test]
    fn decode_redirect_used_when_execute_has_no_misprediction() {
        let unit = BranchUnit;
        let em = ExecuteMemoryLatch::bubble();
        let de = DecodeExecuteLatch {
            we: true,
            decode_redirect: Some(64),
            ..DecodeExecuteLatch::bubble()
        };
        assert_eq!(unit.resolve(&em, &de), Redirect::Decode(64));
    }

    #[test]
    fn no_redirect_falls_through_to_sequential_pc() {
        let unit = BranchUnit;
        assert_eq!(
            unit.resolve(&ExecuteMemoryLatch::bubble(), &DecodeExecuteLatch::bubble()),
            Redirect::None
        );
    }

    #[test]
    fn correctly_predicted_branch_does_not_redirect() {
        let unit = BranchUnit;
        let em = ExecuteMemoryLatch {
            we: true,
            is_branch: true,
            branch_taken: true,
            predicted_taken: true,
            ..ExecuteMemoryLatch::bubble()
        };
        assert_eq!(unit.resolve(&em, &DecodeExecuteLatch::bubble()), Redirect::None);
    }
}
