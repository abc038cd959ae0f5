use core::fmt;
use platform_mmio::PhysicalAddress;

/// Everything needed to bring up one Cadence I2C controller.
///
/// Platform code fills one of these per controller and hands it to the
/// driver, which never changes it afterwards. The layout is the firmware's
/// C layout: a naturally aligned 64-bit base followed by a 32-bit clock,
/// padded to 16 bytes.
#[repr(C)]
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct CadenceI2cInstall {
    /// Base of the controller's register window.
    pub mmio_base: PhysicalAddress,

    /// Frequency of the controller's input clock in Hertz.
    pub input_clock_hz: u32,
}

const _: () = {
    assert!(size_of::<CadenceI2cInstall>() == 16);
    assert!(align_of::<CadenceI2cInstall>() == 8);
    assert!(core::mem::offset_of!(CadenceI2cInstall, mmio_base) == 0);
    assert!(core::mem::offset_of!(CadenceI2cInstall, input_clock_hz) == 8);
};

impl CadenceI2cInstall {
    #[inline]
    #[must_use]
    pub const fn new(mmio_base: PhysicalAddress, input_clock_hz: u32) -> Self {
        Self {
            mmio_base,
            input_clock_hz,
        }
    }

    #[inline]
    #[must_use]
    pub const fn mmio_base(&self) -> PhysicalAddress {
        self.mmio_base
    }

    #[inline]
    #[must_use]
    pub const fn input_clock_hz(&self) -> u32 {
        self.input_clock_hz
    }
}

impl fmt::Debug for CadenceI2cInstall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CadenceI2cInstall")
            .field("mmio_base", &self.mmio_base)
            .field("input_clock_hz", &self.input_clock_hz)
            .finish()
    }
}

/// Log prefix identifying the controller, e.g. `cadence-i2c@0x000000001C0F0000`.
impl fmt::Display for CadenceI2cInstall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cadence-i2c@{}", self.mmio_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_controller() {
        let install = CadenceI2cInstall::new(PhysicalAddress::new(0x1C0F_0000), 1);
        assert_eq!(install.to_string(), "cadence-i2c@0x000000001C0F0000");
    }

    #[test]
    fn copies_are_identical() {
        let a = CadenceI2cInstall::new(PhysicalAddress::new(0x2000), 50_000_000);
        let b = a;
        assert_eq!(a, b);
        assert_eq!(b.input_clock_hz(), 50_000_000);
    }
}
