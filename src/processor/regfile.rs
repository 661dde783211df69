//! Integer and floating-point register banks.

use serde::{Deserialize, Serialize};

use super::types::Reg;

/// Number of integer registers.
pub const NXPR: usize = 32;
/// Number of floating-point registers.
pub const NFPR: usize = 32;

/// One processor's register file.
///
/// The architecture leaves register contents undefined at reset; we zero
/// them so simulation runs are reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegFile {
    pub x: [Reg; NXPR],
    pub f: [Reg; NFPR],
}

impl RegFile {
    pub const fn new() -> Self {
        Self {
            x: [0; NXPR],
            f: [0; NFPR],
        }
    }

    /// Zero every register in both banks.
    pub fn reset(&mut self) {
        self.x = [0; NXPR];
        self.f = [0; NFPR];
    }

    /// Read an integer register. x0 is hardwired to zero.
    #[inline]
    pub fn read_x(&self, reg: usize) -> Reg {
        if reg == 0 {
            0
        } else {
            self.x[reg]
        }
    }

    /// Write an integer register. Writes to x0 are discarded.
    #[inline]
    pub fn write_x(&mut self, reg: usize, val: Reg) {
        if reg != 0 {
            self.x[reg] = val;
        }
    }

    #[inline]
    pub fn read_f(&self, reg: usize) -> Reg {
        self.f[reg]
    }

    #[inline]
    pub fn write_f(&mut self, reg: usize, val: Reg) {
        self.f[reg] = val;
    }
}

impl Default for RegFile {
    fn default() -> Self {
        Self::new()
    }
}
