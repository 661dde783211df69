//! Handle to the simulation environment shared by every processor.
//!
//! The environment owns the processors and their scheduling; this crate
//! only sees it as an injected reference. The one service it provides to
//! code running inside a core is cross-core IPI routing: an instruction
//! posts a wakeup request here, and the environment drains the mailbox and
//! calls `Processor::deliver_ipi` on the target.

use std::cell::RefCell;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("no core with id {0}")]
    UnknownCore(u32),
}

pub struct SimEnv {
    core_count: usize,
    ipi_requests: RefCell<Vec<u32>>,
}

impl SimEnv {
    pub fn new(core_count: usize) -> Self {
        Self {
            core_count,
            ipi_requests: RefCell::new(Vec::new()),
        }
    }

    pub fn core_count(&self) -> usize {
        self.core_count
    }

    /// Post an IPI request for another core. The environment is expected
    /// to drain these between stepping batches.
    pub fn request_ipi(&self, target: u32) -> Result<(), SimError> {
        if (target as usize) >= self.core_count {
            return Err(SimError::UnknownCore(target));
        }
        self.ipi_requests.borrow_mut().push(target);
        Ok(())
    }

    /// Take all posted IPI requests, leaving the mailbox empty.
    pub fn drain_ipi_requests(&self) -> Vec<u32> {
        std::mem::take(&mut *self.ipi_requests.borrow_mut())
    }
}

// ============================================================================
// Tests
// ============================================================================
