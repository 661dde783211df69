//! Serializable export of one processor's architectural state.
//!
//! Snapshots cover a single processor instance; the environment snapshots
//! a main core's lanes individually if it wants them. Restore goes through
//! the normal status-write path so the MMU mode flags and the register
//! width resynchronize.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::processor::regfile::RegFile;
use crate::processor::types::Reg;
use crate::processor::vector::VectorCfg;
use crate::processor::Processor;

/// Bumped whenever the snapshot layout changes incompatibly.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("unsupported snapshot version {0}")]
    Version(u32),
}

/// Architectural state of one processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcSnapshot {
    pub version: u32,
    pub pc: Reg,
    pub epc: Reg,
    pub evec: Reg,
    pub badvaddr: Reg,
    pub cause: u32,
    pub pcr_k0: Reg,
    pub pcr_k1: Reg,
    pub count: u32,
    pub compare: u32,
    pub cycle: u64,
    pub sr: u32,
    pub fsr: u32,
    pub interrupts_pending: u32,
    pub run: bool,
    pub utidx: i32,
    pub regs: RegFile,
    pub vector: VectorCfg,
}

impl Processor {
    pub fn snapshot(&self) -> ProcSnapshot {
        ProcSnapshot {
            version: SNAPSHOT_VERSION,
            pc: self.pc,
            epc: self.epc,
            evec: self.evec,
            badvaddr: self.badvaddr,
            cause: self.cause,
            pcr_k0: self.pcr_k0,
            pcr_k1: self.pcr_k1,
            count: self.count,
            compare: self.compare,
            cycle: self.cycle,
            sr: self.sr,
            fsr: self.fsr,
            interrupts_pending: self.interrupts_pending,
            run: self.run,
            utidx: self.utidx,
            regs: self.regs.clone(),
            vector: self.vector,
        }
    }

    /// Restore a previously captured state. The status registers are
    /// written through `set_sr`/`set_fsr`, so MMU flags and `xprlen` end
    /// up consistent with the restored SR.
    pub fn restore(&mut self, snap: &ProcSnapshot) -> Result<(), SnapshotError> {
        if snap.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version(snap.version));
        }
        self.pc = snap.pc;
        self.epc = snap.epc;
        self.evec = snap.evec;
        self.badvaddr = snap.badvaddr;
        self.cause = snap.cause;
        self.pcr_k0 = snap.pcr_k0;
        self.pcr_k1 = snap.pcr_k1;
        self.count = snap.count;
        self.compare = snap.compare;
        self.cycle = snap.cycle;
        self.set_sr(snap.sr);
        self.set_fsr(snap.fsr);
        self.interrupts_pending = snap.interrupts_pending;
        self.run = snap.run;
        self.utidx = snap.utidx;
        self.regs = snap.regs.clone();
        self.vector = snap.vector;
        Ok(())
    }
}

pub fn to_bytes(snap: &ProcSnapshot) -> Result<Vec<u8>, SnapshotError> {
    Ok(bincode::serialize(snap)?)
}

pub fn from_bytes(bytes: &[u8]) -> Result<ProcSnapshot, SnapshotError> {
    Ok(bincode::deserialize(bytes)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::status::{SR_ET, SR_S, SR_VM};
    use crate::processor::testing::fixture;

    #[test]
    fn test_round_trip_bytes() {
        let mut f = fixture();
        f.cpu.pc = 0x4444;
        f.cpu.regs.write_x(7, 123);
        f.cpu.vector.set_vl(4);
        let snap = f.cpu.snapshot();
        let bytes = to_bytes(&snap).unwrap();
        assert_eq!(from_bytes(&bytes).unwrap(), snap);
    }

    #[test]
    fn test_restore_resynchronizes_mmu() {
        let mut f = fixture();
        f.cpu.set_sr(SR_VM | SR_ET);
        let snap = f.cpu.snapshot();

        let mut g = fixture();
        g.cpu.set_sr(SR_S | SR_ET);
        g.cpu.restore(&snap).unwrap();
        assert_eq!(g.cpu.sr(), snap.sr);
        assert!(g.mmu.borrow().vm_enabled);
        assert!(!g.mmu.borrow().supervisor);
        assert_eq!(g.cpu.xprlen(), 32);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut f = fixture();
        let mut snap = f.cpu.snapshot();
        snap.version = 99;
        assert!(matches!(
            f.cpu.restore(&snap),
            Err(SnapshotError::Version(99))
        ));
    }
}
