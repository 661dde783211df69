//! The processor state machine: register file, status state, vector
//! configuration, microthread lanes, trap delivery, and the stepping loop.

pub mod core;
pub mod execution;
pub mod regfile;
pub mod status;
pub mod types;
pub mod vector;

pub use self::core::{Processor, BOOT_PC};
pub use self::status::Caps;
pub use self::types::{Insn, InsnFunc, Reg, Signal};
