use core::fmt;
use platform_mmio::{MmioRegion, PhysicalAddress};

/// Base of the CLINT register window.
pub const CLINT_REG_BASE_ADDR: u64 = 0x0200_0000;

/// Size of the CLINT register window.
pub const CLINT_REG_SIZE: u64 = 0x1_0000;

/// Free-running machine time counter (`mtime`, 64 bits).
pub const CLINT_REG_MTIME: u64 = 0x0200_BFF8;

/// Machine timer compare register of hart 0 (the S7 monitor core).
pub const CLINT_REG_MTIMECMP0: u64 = 0x0200_4000;
/// Machine timer compare register of hart 1.
pub const CLINT_REG_MTIMECMP1: u64 = 0x0200_4008;
/// Machine timer compare register of hart 2.
pub const CLINT_REG_MTIMECMP2: u64 = 0x0200_4010;
/// Machine timer compare register of hart 3.
pub const CLINT_REG_MTIMECMP3: u64 = 0x0200_4018;
/// Machine timer compare register of hart 4.
pub const CLINT_REG_MTIMECMP4: u64 = 0x0200_4020;

/// Machine software interrupt pending register of hart 0.
pub const CLINT_REG_MSIP0: u64 = CLINT_REG_BASE_ADDR;

/// Offset of the `msip` block within the CLINT window.
pub const MSIP_OFFSET: usize = 0x0000;
/// Stride between two harts' `msip` registers.
pub const MSIP_STRIDE: usize = 4;
/// Offset of the `mtimecmp` block within the CLINT window.
pub const MTIMECMP_OFFSET: usize = 0x4000;
/// Stride between two harts' `mtimecmp` registers.
pub const MTIMECMP_STRIDE: usize = 8;
/// Offset of `mtime` within the CLINT window.
pub const MTIME_OFFSET: usize = 0xBFF8;

/// Number of harts on a U7-series coreplex (one S7 monitor core, four U7 cores).
pub const U7_HART_COUNT: usize = 5;

/// Hart id of the monitor core.
pub const U7_MC_HART_ID: u8 = 0;

/// Absolute addresses of all compare registers, indexed by hart id.
pub const CLINT_REG_MTIMECMP: [u64; U7_HART_COUNT] = [
    CLINT_REG_MTIMECMP0,
    CLINT_REG_MTIMECMP1,
    CLINT_REG_MTIMECMP2,
    CLINT_REG_MTIMECMP3,
    CLINT_REG_MTIMECMP4,
];

/// The full CLINT register window.
pub const CLINT_REGION: MmioRegion =
    MmioRegion::new(PhysicalAddress::new(CLINT_REG_BASE_ADDR), CLINT_REG_SIZE);

#[allow(clippy::cast_possible_truncation)]
const _: () = {
    assert!(CLINT_REG_MTIME == CLINT_REG_BASE_ADDR + MTIME_OFFSET as u64);
    assert!(CLINT_REG_MTIMECMP0 == CLINT_REG_BASE_ADDR + MTIMECMP_OFFSET as u64);

    let mut hart = 0;
    while hart < U7_HART_COUNT {
        let expected = CLINT_REG_MTIMECMP0 + (hart * MTIMECMP_STRIDE) as u64;
        assert!(CLINT_REG_MTIMECMP[hart] == expected);
        assert!(CLINT_REG_MTIMECMP[hart] + 8 <= CLINT_REG_MTIME);
        hart += 1;
    }

    let msip_end = CLINT_REG_MSIP0 + (U7_HART_COUNT * MSIP_STRIDE) as u64;
    assert!(msip_end <= CLINT_REG_MTIMECMP0);
    assert!(CLINT_REG_MTIME + 8 <= CLINT_REG_BASE_ADDR + CLINT_REG_SIZE);
};

/// A hart that exists on the coreplex.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct HartId(u8);

impl HartId {
    /// The S7 monitor core.
    pub const MONITOR: Self = Self(U7_MC_HART_ID);

    /// Returns `None` for ids beyond [`U7_HART_COUNT`].
    #[inline]
    #[must_use]
    pub const fn new(id: u8) -> Option<Self> {
        if (id as usize) < U7_HART_COUNT {
            Some(Self(id))
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterates over every hart of the coreplex, monitor core first.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..U7_HART_COUNT).filter_map(|id| u8::try_from(id).ok().and_then(Self::new))
    }
}

impl fmt::Debug for HartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HartId({})", self.0)
    }
}

impl fmt::Display for HartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hart{}", self.0)
    }
}

impl TryFrom<u8> for HartId {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(value)
    }
}

/// Offset of `hart`'s `mtimecmp` register within the CLINT window.
#[inline]
#[must_use]
pub const fn mtimecmp_offset(hart: HartId) -> usize {
    MTIMECMP_OFFSET + hart.index() * MTIMECMP_STRIDE
}

/// Offset of `hart`'s `msip` register within the CLINT window.
#[inline]
#[must_use]
pub const fn msip_offset(hart: HartId) -> usize {
    MSIP_OFFSET + hart.index() * MSIP_STRIDE
}

/// Absolute address of `hart`'s `mtimecmp` register.
#[inline]
#[must_use]
pub const fn mtimecmp_address(hart: HartId) -> PhysicalAddress {
    PhysicalAddress::new(CLINT_REG_MTIMECMP[hart.index()])
}

/// Absolute address of `hart`'s `msip` register.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn msip_address(hart: HartId) -> PhysicalAddress {
    PhysicalAddress::new(CLINT_REG_BASE_ADDR + msip_offset(hart) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hart_bounds() {
        assert!(HartId::new(0).is_some());
        assert!(HartId::new(4).is_some());
        assert!(HartId::new(5).is_none());
        assert_eq!(HartId::try_from(9), Err(9));
        assert_eq!(HartId::MONITOR.as_u8(), 0);
        assert_eq!(HartId::all().count(), U7_HART_COUNT);
    }

    #[test]
    fn offsets_match_absolute_addresses() {
        for hart in HartId::all() {
            let abs = CLINT_REG_BASE_ADDR + mtimecmp_offset(hart) as u64;
            assert_eq!(abs, mtimecmp_address(hart).as_u64());
            assert!(CLINT_REGION.contains_range(mtimecmp_address(hart), 8));
            assert!(CLINT_REGION.contains_range(msip_address(hart), 4));
        }
    }

    #[test]
    fn display() {
        let hart = HartId::new(3).unwrap();
        assert_eq!(format!("{hart}"), "hart3");
        assert_eq!(format!("{hart:?}"), "HartId(3)");
    }
}
