//! Instruction word, cause codes, and the non-local control-transfer signal.

use serde::{Deserialize, Serialize};

use super::core::Processor;

/// Architectural register value. Registers are 64 bits wide even when the
/// core is running in 32-bit mode; `xprlen` governs how instruction
/// semantics interpret them.
pub type Reg = u64;

/// Raw instruction word as fetched from memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insn {
    pub bits: u32,
}

/// Semantic function for one decoded opcode.
///
/// Resolved by the external decoder as part of instruction fetch. Executes
/// one instruction against the processor state and returns the next program
/// counter, or raises a [`Signal`] that unwinds to the stepping loop.
pub type InsnFunc = fn(&mut Processor, Insn, Reg) -> Result<Reg, Signal>;

/// Non-local control transfer raised during fetch or execution.
///
/// The single recovery point for all variants is [`Processor::step`];
/// nothing below the stepper may swallow or re-dispatch one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    /// Architectural exception caused by the executing instruction.
    Exception(u32),
    /// Asynchronous interrupt, cause `CAUSE_INTERRUPT + line`.
    Interrupt(u32),
    /// A vector microthread finished its work item. Expected, not an error.
    UthreadStop,
    /// The processor entered its low-power wait state.
    Halt,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Signal::Exception(c) | Signal::Interrupt(c) => write!(f, "{}", cause_name(c)),
            Signal::UthreadStop => write!(f, "microthread stop"),
            Signal::Halt => write!(f, "halt"),
        }
    }
}

impl std::error::Error for Signal {}

// Cause codes from the ISA encoding.
pub const CAUSE_MISALIGNED_FETCH: u32 = 0;
pub const CAUSE_FAULT_FETCH: u32 = 1;
pub const CAUSE_ILLEGAL_INSTRUCTION: u32 = 2;
pub const CAUSE_PRIVILEGED_INSTRUCTION: u32 = 3;
pub const CAUSE_FP_DISABLED: u32 = 4;
pub const CAUSE_SYSCALL: u32 = 6;
pub const CAUSE_BREAKPOINT: u32 = 7;
pub const CAUSE_MISALIGNED_LOAD: u32 = 8;
pub const CAUSE_MISALIGNED_STORE: u32 = 9;
pub const CAUSE_FAULT_LOAD: u32 = 10;
pub const CAUSE_FAULT_STORE: u32 = 11;
pub const CAUSE_VECTOR_DISABLED: u32 = 12;
/// Base cause code for interrupts; line N reports as `CAUSE_INTERRUPT + N`.
pub const CAUSE_INTERRUPT: u32 = 16;

/// Number of interrupt lines wired into the status-register mask field.
pub const NUM_IRQ: u32 = 8;
/// Inter-processor interrupt line.
pub const IRQ_IPI: u32 = 5;
/// Timer interrupt line.
pub const IRQ_TIMER: u32 = 7;

/// Symbolic trap name used in trap trace lines.
pub fn cause_name(cause: u32) -> &'static str {
    match cause {
        CAUSE_MISALIGNED_FETCH => "instruction address misaligned",
        CAUSE_FAULT_FETCH => "instruction access fault",
        CAUSE_ILLEGAL_INSTRUCTION => "illegal instruction",
        CAUSE_PRIVILEGED_INSTRUCTION => "privileged instruction",
        CAUSE_FP_DISABLED => "fp disabled",
        CAUSE_SYSCALL => "syscall",
        CAUSE_BREAKPOINT => "breakpoint",
        CAUSE_MISALIGNED_LOAD => "misaligned load",
        CAUSE_MISALIGNED_STORE => "misaligned store",
        CAUSE_FAULT_LOAD => "load access fault",
        CAUSE_FAULT_STORE => "store access fault",
        CAUSE_VECTOR_DISABLED => "vector disabled",
        CAUSE_INTERRUPT => "interrupt 0",
        c if c > CAUSE_INTERRUPT && c < CAUSE_INTERRUPT + NUM_IRQ => {
            const NAMES: [&str; 7] = [
                "interrupt 1",
                "interrupt 2",
                "interrupt 3",
                "interrupt 4",
                "interrupt 5 (ipi)",
                "interrupt 6",
                "interrupt 7 (timer)",
            ];
            NAMES[(c - CAUSE_INTERRUPT - 1) as usize]
        }
        _ => "unknown",
    }
}

// ============================================================================
// Tests
// ============================================================================
