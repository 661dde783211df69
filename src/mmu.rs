//! Interface to the external memory-management unit and decoder.
//!
//! The core drives translation-mode changes into the MMU on every status
//! write and pulls instruction fetch/decode results out of it; everything
//! behind this trait (page walks, TLB, the opcode dispatch table) lives
//! outside this crate.

use crate::processor::types::{Insn, InsnFunc, Reg, Signal};

pub trait Mmu {
    /// Fetch the instruction at `pc` and resolve it to its semantic
    /// function. `rvc_enabled` reflects the SR compressed-instruction bit.
    ///
    /// Fails with an architectural exception signal on access, alignment,
    /// or translation faults.
    fn fetch_insn(&mut self, pc: Reg, rvc_enabled: bool) -> Result<(Insn, InsnFunc), Signal>;

    /// Mirror of the SR virtual-memory bit.
    fn set_vm_enabled(&mut self, enabled: bool);

    /// Mirror of the SR supervisor bit.
    fn set_supervisor(&mut self, supervisor: bool);

    /// Invalidate all cached translations. Called on every SR write.
    fn flush_tlb(&mut self);

    /// Faulting address recorded by the most recent access fault.
    fn badvaddr(&self) -> Reg;

    /// Disassembly text for trace output. Debug only; the rendering is not
    /// a stable contract.
    fn disassemble(&self, insn: Insn) -> String {
        format!("unknown ({:#010x})", insn.bits)
    }
}
