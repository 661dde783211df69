//! The fetch-execute stepping loop.

use super::core::Processor;
use super::status::SR_EC;
use super::types::Signal;

impl Processor {
    /// Execute up to `n` instructions, or fewer if a non-local signal ends
    /// the batch early. No-op unless the processor is running.
    ///
    /// Pending interrupts are checked before each batch attempt, never
    /// mid-batch: an interrupt asserted while instructions are executing
    /// is observed on the next attempt. Signals raised during fetch or
    /// execution unwind to this loop, the single recovery point.
    pub fn step(&mut self, n: usize, trace: bool) {
        if !self.run {
            return;
        }

        let mut retired: usize = 0;
        loop {
            match self.run_batch(n, &mut retired, trace) {
                None => break,
                Some(Signal::Exception(cause)) | Some(Signal::Interrupt(cause)) => {
                    // The raising slot is committed to the counters.
                    retired += 1;
                    self.take_trap(cause, trace);
                }
                Some(Signal::UthreadStop) => {
                    // This microthread has finished its work item.
                    retired += 1;
                    break;
                }
                Some(Signal::Halt) => {
                    // Sleep until the next IPI; the remaining budget is
                    // discarded without touching the counters.
                    self.reset();
                    return;
                }
            }
        }

        self.cycle += retired as u64;
        self.bump_timer(retired as u64);
    }

    /// One batch attempt: interrupt check, then fetch-execute-commit until
    /// the budget runs out or a signal unwinds.
    fn run_batch(&mut self, n: usize, retired: &mut usize, trace: bool) -> Option<Signal> {
        if let Some(sig) = self.pending_interrupt() {
            return Some(sig);
        }

        while *retired < n {
            if let Err(sig) = self.execute_one(trace) {
                return Some(sig);
            }
            *retired += 1;
        }

        None
    }

    fn execute_one(&mut self, trace: bool) -> Result<(), Signal> {
        let pc = self.pc;
        let rvc = self.sr() & SR_EC != 0;
        let (insn, func) = self.mmu().borrow_mut().fetch_insn(pc, rvc)?;

        if trace {
            let text = self.mmu().borrow().disassemble(insn);
            log::trace!(
                "core {:3}: 0x{:016x} ({:#010x}) {}",
                self.id,
                pc,
                insn.bits,
                text
            );
        }

        self.pc = func(self, insn, pc)?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use crate::processor::core::BOOT_PC;
    use crate::processor::status::{SR_ET, SR_S};
    use crate::mmu::Mmu;
    use crate::processor::testing::{fault_load, fixture, halt, ut_stop};
    use crate::processor::types::{
        Insn, Reg, Signal, CAUSE_FAULT_FETCH, CAUSE_FAULT_LOAD, CAUSE_INTERRUPT, IRQ_IPI,
        IRQ_TIMER,
    };
    use crate::processor::Processor;

    #[test]
    fn test_step_noop_when_not_running() {
        let mut f = fixture();
        f.cpu.step(100, false);
        assert_eq!(f.cpu.cycle, 0);
        assert_eq!(f.cpu.pc, BOOT_PC);
    }

    #[test]
    fn test_budget_exhaustion_is_clean() {
        let mut f = fixture();
        f.cpu.run = true;
        f.cpu.step(16, false);
        // Default-scripted nops fall through one word at a time.
        assert_eq!(f.cpu.cycle, 16);
        assert_eq!(f.cpu.count, 16);
        assert_eq!(f.cpu.pc, BOOT_PC + 16 * 4);
        assert_eq!(f.cpu.cause, 0);
    }

    #[test]
    fn test_boot_ipi_scenario() {
        let mut f = fixture();
        f.cpu.reset();
        f.cpu.deliver_ipi();
        f.cpu.step(1, false);
        // The interrupt check fires before any instruction executes.
        assert_eq!(f.cpu.cause, CAUSE_INTERRUPT + IRQ_IPI);
        assert_eq!(f.cpu.epc, BOOT_PC);
        assert_eq!(f.cpu.pc, BOOT_PC);
        assert_eq!(f.cpu.sr() & SR_ET, 0);
    }

    #[test]
    fn test_exception_vectors_and_resumes() {
        let mut f = fixture();
        f.cpu.run = true;
        f.cpu.evec = 0x8000;
        f.mmu.borrow_mut().badvaddr = 0xbad;
        // Two clean instructions, then a faulting load.
        let fault_pc = BOOT_PC + 8;
        f.mmu.borrow_mut().script(fault_pc, 0xdead_0003, fault_load);
        f.cpu.step(10, false);

        assert_eq!(f.cpu.cause, CAUSE_FAULT_LOAD);
        assert_eq!(f.cpu.epc, fault_pc);
        assert_eq!(f.cpu.badvaddr, 0xbad);
        // The batch resumed at the trap vector and ran out the budget.
        assert_eq!(f.cpu.cycle, 10);
        assert_eq!(f.cpu.pc, 0x8000 + 7 * 4);
        // Trap entry disabled further traps.
        assert_eq!(f.cpu.sr() & SR_ET, 0);
        assert_eq!(f.cpu.sr() & SR_S, SR_S);
    }

    #[test]
    fn test_fetch_fault_traps() {
        let mut f = fixture();
        f.cpu.run = true;
        f.mmu
            .borrow_mut()
            .script_fetch_fault(BOOT_PC, Signal::Exception(CAUSE_FAULT_FETCH));
        f.cpu.step(1, false);
        assert_eq!(f.cpu.cause, CAUSE_FAULT_FETCH);
        assert_eq!(f.cpu.epc, BOOT_PC);
        // evec still points at the boot address.
        assert_eq!(f.cpu.pc, BOOT_PC);
        assert_eq!(f.cpu.cycle, 1);
    }

    #[test]
    fn test_halt_resets_and_goes_dormant() {
        let mut f = fixture();
        f.cpu.run = true;
        f.cpu.set_compare(1000);
        f.mmu.borrow_mut().script(BOOT_PC + 4, 0x0000_0073, halt);
        f.cpu.step(100, false);

        // Power-on state, dormant, remaining budget discarded.
        assert!(!f.cpu.is_running());
        assert_eq!(f.cpu.cycle, 0);
        assert_eq!(f.cpu.count, 0);
        assert_eq!(f.cpu.compare, 0);
        assert_eq!(f.cpu.pc, BOOT_PC);
        assert_eq!(f.cpu.regs.x, [0; 32]);

        // Dormant until an IPI arrives.
        f.cpu.step(100, false);
        assert_eq!(f.cpu.cycle, 0);
        f.cpu.deliver_ipi();
        assert!(f.cpu.is_running());
    }

    #[test]
    fn test_halted_state_matches_power_on_reset() {
        let mut f = fixture();
        f.cpu.run = true;
        f.cpu.regs.write_x(5, 99);
        f.cpu.vector.set_vl(8);
        f.mmu.borrow_mut().script(BOOT_PC, 0x0000_0073, halt);
        f.cpu.step(1, false);

        let fresh = fixture();
        assert_eq!(f.cpu.snapshot(), fresh.cpu.snapshot());
    }

    #[test]
    fn test_microthread_stop_ends_batch() {
        let mut f = fixture();
        f.mmu.borrow_mut().script(BOOT_PC + 4, 0x0000_100b, ut_stop);
        let lane = &mut f.cpu.uts_mut()[3];
        lane.run = true;
        lane.step(100, false);
        // One nop plus the stopping slot are committed; no trap delivered.
        assert_eq!(lane.cycle, 2);
        assert_eq!(lane.cause, 0);
        assert!(lane.is_running());
    }

    #[test]
    fn test_timer_interrupt_fires_on_next_batch() {
        let mut f = fixture();
        f.cpu.run = true;
        f.cpu.set_compare(4);
        f.cpu.step(8, false);
        // The crossing happened in the batch epilogue; the trap is
        // observed at the next batch's interrupt check.
        assert_eq!(f.cpu.cause, 0);
        f.cpu.step(1, false);
        assert_eq!(f.cpu.cause, CAUSE_INTERRUPT + IRQ_TIMER);
        assert_eq!(f.cpu.epc, BOOT_PC + 8 * 4);
    }

    #[test]
    fn test_handler_can_request_cross_core_ipi() {
        fn ipi_insn(p: &mut Processor, _insn: Insn, pc: Reg) -> Result<Reg, Signal> {
            p.env().request_ipi(0).map_err(|_| Signal::Exception(2))?;
            Ok(pc + 4)
        }
        let mut f = fixture();
        f.cpu.run = true;
        f.mmu.borrow_mut().script(BOOT_PC, 0x0000_0077, ipi_insn);
        f.cpu.step(1, false);
        assert_eq!(f.env.drain_ipi_requests(), vec![0]);
    }

    #[test]
    fn test_trace_output_is_side_effect_only() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut quiet = fixture();
        let mut noisy = fixture();
        quiet.cpu.run = true;
        noisy.cpu.run = true;
        quiet.cpu.step(5, false);
        noisy.cpu.step(5, true);
        assert_eq!(quiet.cpu.pc, noisy.cpu.pc);
        assert_eq!(quiet.cpu.cycle, noisy.cpu.cycle);
    }

    #[test]
    fn test_default_program_is_nops() {
        // The scripted MMU falls back to a fall-through nop; pin its shape
        // here since several tests lean on it.
        let f = fixture();
        let (insn, func) = f.mmu.borrow_mut().fetch_insn(0x100, false).unwrap();
        assert_eq!(insn.bits, 0x13);
        let mut g = fixture();
        assert_eq!(func(&mut g.cpu, insn, 0x100).unwrap(), 0x104);
    }
}
