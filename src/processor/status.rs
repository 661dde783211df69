//! Status-register (SR/FSR) bit layout and write-time normalization.
//!
//! SR writes are normalized in two steps: reserved-zero bits are masked
//! away, then bits for extensions the build does not support are forced
//! off. The original scattered the support checks through compile-time
//! conditionals; here they are a runtime [`Caps`] set checked uniformly in
//! the write path.

use serde::{Deserialize, Serialize};

/// Traps enabled.
pub const SR_ET: u32 = 0x0000_0001;
/// Floating-point unit enabled.
pub const SR_EF: u32 = 0x0000_0002;
/// Vector unit enabled.
pub const SR_EV: u32 = 0x0000_0004;
/// Compressed (RVC) instructions enabled.
pub const SR_EC: u32 = 0x0000_0008;
/// Previous supervisor bit, saved on trap entry.
pub const SR_PS: u32 = 0x0000_0010;
/// Supervisor mode.
pub const SR_S: u32 = 0x0000_0020;
/// 64-bit mode in user mode.
pub const SR_UX: u32 = 0x0000_0040;
/// 64-bit mode in supervisor mode.
pub const SR_SX: u32 = 0x0000_0080;
/// Interrupt mask, one bit per line.
pub const SR_IM: u32 = 0x0000_ff00;
/// Virtual memory enabled.
pub const SR_VM: u32 = 0x0001_0000;

pub const SR_IM_SHIFT: u32 = 8;

/// SR bits that read as zero.
pub const SR_ZERO: u32 =
    !(SR_ET | SR_EF | SR_EV | SR_EC | SR_PS | SR_S | SR_UX | SR_SX | SR_IM | SR_VM);

/// Accrued floating-point exception flags.
pub const FSR_AEXC: u32 = 0x0000_001f;
/// Rounding mode.
pub const FSR_RD: u32 = 0x0000_00e0;
/// FSR bits that read as zero.
pub const FSR_ZERO: u32 = !(FSR_AEXC | FSR_RD);

/// Extension support of the simulated implementation.
///
/// SR bits for unsupported extensions read as zero regardless of the value
/// written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caps {
    pub rv64: bool,
    pub fpu: bool,
    pub rvc: bool,
    pub vector: bool,
}

impl Caps {
    /// SR bits this capability set forces to zero.
    pub fn unsupported_sr_bits(&self) -> u32 {
        let mut mask = 0;
        if !self.rv64 {
            mask |= SR_SX | SR_UX;
        }
        if !self.fpu {
            mask |= SR_EF;
        }
        if !self.rvc {
            mask |= SR_EC;
        }
        if !self.vector {
            mask |= SR_EV;
        }
        mask
    }
}

impl Default for Caps {
    fn default() -> Self {
        Self {
            rv64: true,
            fpu: true,
            rvc: true,
            vector: true,
        }
    }
}

/// Normalize a value written to SR: clear reserved-zero bits, then force
/// unsupported-extension bits off.
pub fn normalize_sr(val: u32, caps: Caps) -> u32 {
    (val & !SR_ZERO) & !caps.unsupported_sr_bits()
}

/// Normalize a value written to FSR.
pub fn normalize_fsr(val: u32) -> u32 {
    val & !FSR_ZERO
}

/// Active integer register width selected by the SR mode bits: 64 iff the
/// 32/64 selector for the current privilege mode is set.
pub fn xprlen_for(sr: u32) -> u32 {
    let wide = if sr & SR_S != 0 {
        sr & SR_SX
    } else {
        sr & SR_UX
    };
    if wide != 0 {
        64
    } else {
        32
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_bits_read_as_zero() {
        let sr = normalize_sr(0xffff_ffff, Caps::default());
        assert_eq!(sr & SR_ZERO, 0);
    }

    #[test]
    fn test_unsupported_bits_forced_off() {
        let caps = Caps {
            rv64: false,
            fpu: false,
            rvc: false,
            vector: false,
        };
        let sr = normalize_sr(0xffff_ffff, caps);
        assert_eq!(sr & (SR_SX | SR_UX | SR_EF | SR_EC | SR_EV), 0);
        // Base bits survive.
        assert_eq!(sr & (SR_S | SR_ET | SR_IM), SR_S | SR_ET | SR_IM);
    }

    #[test]
    fn test_xprlen_selector() {
        assert_eq!(xprlen_for(SR_S | SR_SX), 64);
        assert_eq!(xprlen_for(SR_S | SR_UX), 32);
        assert_eq!(xprlen_for(SR_UX), 64);
        assert_eq!(xprlen_for(SR_SX), 32);
        assert_eq!(xprlen_for(0), 32);
    }

    #[test]
    fn test_fsr_masks_reserved() {
        assert_eq!(normalize_fsr(0xffff_ffff), FSR_AEXC | FSR_RD);
    }
}
