//! Execution core of a RISC-V instruction-set simulator.
//!
//! Models one processor core and its vector microthreads: privileged
//! status state (SR/FSR), trap and interrupt delivery, the fetch-execute
//! stepping loop, the instruction-count timer, and IPI wakeup.
//!
//! Instruction decoding, address translation, and the top-level multi-core
//! scheduler are external collaborators reached through [`mmu::Mmu`] and
//! [`sim::SimEnv`]; this crate is the state machine between them.

pub mod mmu;
pub mod processor;
pub mod sim;
pub mod snapshot;

pub use processor::{Caps, Insn, InsnFunc, Processor, Reg, Signal, BOOT_PC};
pub use sim::{SimEnv, SimError};
