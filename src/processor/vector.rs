//! Vector-length and register-bank configuration for the microthread unit.

use serde::{Deserialize, Serialize};

/// Hard ceiling on vector lanes: the number of microthreads a core owns.
pub const MAX_UTS: usize = 2048;

/// Vector unit configuration.
///
/// `vlmax` is bounded both by how many physical registers each bank can
/// supply per active element and by how many microthread lanes exist to
/// execute them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorCfg {
    /// Maximum vector length under the current register partitioning.
    pub vlmax: u32,
    /// Currently active vector length, always <= vlmax.
    pub vl: u32,
    /// Bitmask of register banks available to the vector unit.
    pub vecbanks: u32,
    /// Population count of `vecbanks`.
    pub vecbanks_count: u32,
    /// Physical registers per bank.
    pub nxfpr_bank: u32,
    /// Integer registers requested per vector element.
    pub nxpr_use: u32,
    /// Floating-point registers requested per vector element.
    pub nfpr_use: u32,
}

impl VectorCfg {
    pub const fn new() -> Self {
        Self {
            vlmax: 32,
            vl: 0,
            vecbanks: 0xff,
            vecbanks_count: 8,
            nxfpr_bank: 256,
            nxpr_use: 32,
            nfpr_use: 32,
        }
    }

    /// Restore the power-on configuration.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Set the per-element register demand and recompute `vlmax`.
    pub fn configure(&mut self, nxpr_use: u32, nfpr_use: u32) {
        self.nxpr_use = nxpr_use;
        self.nfpr_use = nfpr_use;
        self.recompute_vlmax();
    }

    /// Set the available bank mask and recompute `vlmax`.
    pub fn set_banks(&mut self, mask: u32) {
        self.vecbanks = mask;
        self.vecbanks_count = mask.count_ones();
        self.recompute_vlmax();
    }

    /// Recompute the maximum vector length from the bank partitioning,
    /// clamped to the microthread ceiling. `vl` is re-clamped so it never
    /// exceeds the new maximum.
    pub fn recompute_vlmax(&mut self) {
        let per_element = self.nxpr_use + self.nfpr_use;
        self.vlmax = if per_element < 2 {
            self.nxfpr_bank * self.vecbanks_count
        } else {
            (self.nxfpr_bank / (per_element - 1)) * self.vecbanks_count
        };
        self.vlmax = self.vlmax.min(MAX_UTS as u32);
        self.vl = self.vl.min(self.vlmax);
    }

    /// Set the active vector length. Requests above capacity (or below
    /// zero) are silently truncated, never rejected.
    pub fn set_vl(&mut self, requested: i64) -> u32 {
        self.vl = requested.clamp(0, self.vlmax as i64) as u32;
        self.vl
    }
}

impl Default for VectorCfg {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
