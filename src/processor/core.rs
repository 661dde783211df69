//! Processor lifecycle, privileged status state, trap delivery, and the
//! timer. The fetch-execute loop lives in `execution.rs`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::mmu::Mmu;
use crate::sim::SimEnv;

use super::regfile::RegFile;
use super::status::{self, Caps, SR_EF, SR_ET, SR_EV, SR_IM, SR_IM_SHIFT, SR_PS, SR_S, SR_SX, SR_VM};
use super::types::{cause_name, Reg, Signal, CAUSE_INTERRUPT, IRQ_IPI, IRQ_TIMER, NUM_IRQ};
use super::vector::{VectorCfg, MAX_UTS};

/// Boot address. The trap vector points here at reset, so the boot IPI
/// vectors the first fetch to it.
pub const BOOT_PC: Reg = 0x2000;

/// One simulated processor: either a main core (which owns its vector
/// microthreads) or a single microthread lane.
///
/// The memory-management unit and the simulation environment are shared by
/// reference across a main core and all of its lanes; each lane otherwise
/// has fully independent register and status state.
pub struct Processor {
    env: Rc<SimEnv>,
    mmu: Rc<RefCell<dyn Mmu>>,

    /// Core identifier, shared between a main core and its lanes.
    pub id: u32,
    /// Microthread index: -1 for a main core, lane number for a lane.
    pub utidx: i32,

    pub pc: Reg,
    /// Program counter saved on trap entry.
    pub epc: Reg,
    /// Trap vector base.
    pub evec: Reg,
    /// Faulting address latched from the MMU on trap entry.
    pub badvaddr: Reg,
    /// Cause code of the most recent trap.
    pub cause: u32,
    // Kernel scratch registers.
    pub pcr_k0: Reg,
    pub pcr_k1: Reg,
    /// Retired-instruction counter driving the timer.
    pub count: u32,
    /// Timer compare threshold.
    pub compare: u32,
    /// Cycle counter.
    pub cycle: u64,

    pub regs: RegFile,
    pub vector: VectorCfg,

    pub(crate) sr: u32,
    pub(crate) fsr: u32,
    pub(crate) xprlen: u32,
    pub(crate) caps: Caps,
    pub(crate) interrupts_pending: u32,
    pub(crate) run: bool,

    // Main cores only; lanes own no further lanes.
    uts: Vec<Processor>,
}

impl Processor {
    /// Create a main core together with its microthread array.
    pub fn new(env: Rc<SimEnv>, mmu: Rc<RefCell<dyn Mmu>>, id: u32) -> Self {
        Self::with_caps(env, mmu, id, Caps::default())
    }

    /// Create a main core with an explicit extension capability set.
    pub fn with_caps(env: Rc<SimEnv>, mmu: Rc<RefCell<dyn Mmu>>, id: u32, caps: Caps) -> Self {
        let mut p = Self::bare(env.clone(), mmu.clone(), id, caps);
        p.reset();
        p.uts.reserve_exact(MAX_UTS);
        for utidx in 0..MAX_UTS {
            p.uts
                .push(Self::new_lane(env.clone(), mmu.clone(), id, utidx as i32, caps));
        }
        p
    }

    /// Lane constructor: skips microthread creation and enables the FPU
    /// and vector unit from reset (subject to `caps`).
    fn new_lane(
        env: Rc<SimEnv>,
        mmu: Rc<RefCell<dyn Mmu>>,
        id: u32,
        utidx: i32,
        caps: Caps,
    ) -> Self {
        let mut p = Self::bare(env, mmu, id, caps);
        p.reset();
        p.set_sr(p.sr | SR_EF | SR_EV);
        p.utidx = utidx;
        p
    }

    fn bare(env: Rc<SimEnv>, mmu: Rc<RefCell<dyn Mmu>>, id: u32, caps: Caps) -> Self {
        Self {
            env,
            mmu,
            id,
            utidx: -1,
            pc: 0,
            epc: 0,
            evec: 0,
            badvaddr: 0,
            cause: 0,
            pcr_k0: 0,
            pcr_k1: 0,
            count: 0,
            compare: 0,
            cycle: 0,
            regs: RegFile::new(),
            vector: VectorCfg::new(),
            sr: 0,
            fsr: 0,
            xprlen: 32,
            caps,
            interrupts_pending: 0,
            run: false,
            uts: Vec::new(),
        }
    }

    /// Return to the power-on state. The processor is left non-running;
    /// [`Processor::deliver_ipi`] wakes it.
    pub fn reset(&mut self) {
        self.run = false;

        // Boot contract: supervisor mode, 64-bit if supported, virtual
        // memory off, traps enabled with the vector at the boot address.
        // The boot IPI then redirects the first fetch to BOOT_PC.
        self.set_sr(SR_S | SR_SX | SR_ET | SR_IM);
        self.pc = BOOT_PC;
        self.evec = BOOT_PC;

        // Architecturally undefined at power-on; zeroed for reproducible
        // simulation runs.
        self.regs.reset();
        self.epc = 0;
        self.badvaddr = 0;
        self.cause = 0;
        self.pcr_k0 = 0;
        self.pcr_k1 = 0;
        self.count = 0;
        self.compare = 0;
        self.cycle = 0;
        self.interrupts_pending = 0;
        self.set_fsr(0);

        self.vector.reset();
        self.utidx = -1;
    }

    /// Write the status register.
    ///
    /// Reserved-zero bits are masked, unsupported-extension bits are forced
    /// off, the VM and supervisor bits are pushed into the MMU with an
    /// unconditional TLB flush, and the active register width is
    /// recomputed. Not an idempotent no-op even when nothing changed.
    pub fn set_sr(&mut self, val: u32) {
        self.sr = status::normalize_sr(val, self.caps);

        {
            let mut mmu = self.mmu.borrow_mut();
            mmu.set_vm_enabled(self.sr & SR_VM != 0);
            mmu.set_supervisor(self.sr & SR_S != 0);
            mmu.flush_tlb();
        }

        self.xprlen = status::xprlen_for(self.sr);
    }

    pub fn sr(&self) -> u32 {
        self.sr
    }

    /// Write the floating-point status register. Masks reserved bits only.
    pub fn set_fsr(&mut self, val: u32) {
        self.fsr = status::normalize_fsr(val);
    }

    pub fn fsr(&self) -> u32 {
        self.fsr
    }

    /// Active integer register width, 32 or 64. Consistent with the SR
    /// mode bits immediately after any SR write.
    pub fn xprlen(&self) -> u32 {
        self.xprlen
    }

    pub fn caps(&self) -> Caps {
        self.caps
    }

    pub fn is_running(&self) -> bool {
        self.run
    }

    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    pub fn mmu(&self) -> &Rc<RefCell<dyn Mmu>> {
        &self.mmu
    }

    /// Microthread lanes. Empty for a lane processor.
    pub fn uts(&self) -> &[Processor] {
        &self.uts
    }

    pub fn uts_mut(&mut self) -> &mut [Processor] {
        &mut self.uts
    }

    /// Assert an interrupt line.
    pub fn raise_irq(&mut self, line: u32) {
        debug_assert!(line < NUM_IRQ);
        self.interrupts_pending |= 1 << line;
    }

    /// Deassert an interrupt line.
    pub fn clear_irq(&mut self, line: u32) {
        debug_assert!(line < NUM_IRQ);
        self.interrupts_pending &= !(1 << line);
    }

    pub fn pending_interrupts(&self) -> u32 {
        self.interrupts_pending
    }

    /// Reprogram the timer compare threshold. Re-arms the edge trigger by
    /// deasserting any pending timer interrupt.
    pub fn set_compare(&mut self, val: u32) {
        self.compare = val;
        self.clear_irq(IRQ_TIMER);
    }

    /// Wake the processor: assert the IPI line and enter the running
    /// state. The only way a halted processor resumes execution; invoked
    /// by the simulation environment, never by the processor itself.
    pub fn deliver_ipi(&mut self) {
        self.interrupts_pending |= 1 << IRQ_IPI;
        self.run = true;
    }

    /// Priority-encode the pending interrupts against the SR mask: the
    /// lowest-numbered asserted unmasked line wins, provided traps are
    /// enabled.
    pub(super) fn pending_interrupt(&self) -> Option<Signal> {
        let unmasked = self.interrupts_pending & ((self.sr & SR_IM) >> SR_IM_SHIFT);
        if unmasked != 0 && self.sr & SR_ET != 0 {
            Some(Signal::Interrupt(CAUSE_INTERRUPT + unmasked.trailing_zeros()))
        } else {
            None
        }
    }

    /// Deliver a trap: enter supervisor mode, save the previous supervisor
    /// bit, disable traps, record the cause and faulting state, and vector
    /// the program counter. Atomic with respect to the instruction stream.
    pub(super) fn take_trap(&mut self, cause: u32, trace: bool) {
        if trace {
            log::debug!(
                "core {:3}: trap {}, pc 0x{:016x}",
                self.id,
                cause_name(cause),
                self.pc
            );
        }

        let prev_s = if self.sr & SR_S != 0 { SR_PS } else { 0 };
        self.set_sr((((self.sr & !SR_ET) | SR_S) & !SR_PS) | prev_s);
        self.cause = cause;
        self.epc = self.pc;
        self.badvaddr = self.mmu.borrow().badvaddr();
        self.pc = self.evec;
    }

    /// Advance the retired-instruction counter and assert the timer line
    /// when it crosses the compare threshold. Edge-triggered: a crossing
    /// fires exactly once until the threshold is reprogrammed.
    pub(super) fn bump_timer(&mut self, retired: u64) {
        let old_count = self.count;
        self.count = self.count.wrapping_add(retired as u32);
        if (old_count as u64) < self.compare as u64
            && old_count as u64 + retired >= self.compare as u64
        {
            self.interrupts_pending |= 1 << IRQ_TIMER;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
