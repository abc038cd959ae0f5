use core::fmt;
use core::ops::{Add, AddAssign};

/// An absolute physical address, typically the base of a register window.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalAddress(u64);

impl PhysicalAddress {
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Address `offset` bytes above this one, or `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, offset: u64) -> Option<Self> {
        match self.0.checked_add(offset) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Distance in bytes from `base` up to this address, or `None` if this
    /// address lies below `base`.
    #[inline]
    #[must_use]
    pub const fn offset_from(self, base: Self) -> Option<u64> {
        self.0.checked_sub(base.0)
    }

    /// Whether the address is a multiple of `align`, which must be a power of two.
    #[inline]
    #[must_use]
    pub const fn is_aligned(self, align: u64) -> bool {
        debug_assert!(align.is_power_of_two());
        self.0 & (align - 1) == 0
    }
}

impl fmt::Debug for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysicalAddress(0x{:016X})", self.0)
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl fmt::LowerHex for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl Add<u64> for PhysicalAddress {
    type Output = Self;

    #[inline]
    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl AddAssign<u64> for PhysicalAddress {
    #[inline]
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs;
    }
}

impl From<u64> for PhysicalAddress {
    #[inline]
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<PhysicalAddress> for u64 {
    #[inline]
    fn from(value: PhysicalAddress) -> Self {
        value.0
    }
}

/// A half-open register window `[base, base + size)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct MmioRegion {
    base: PhysicalAddress,
    size: u64,
}

impl MmioRegion {
    #[inline]
    #[must_use]
    pub const fn new(base: PhysicalAddress, size: u64) -> Self {
        Self { base, size }
    }

    #[inline]
    #[must_use]
    pub const fn base(&self) -> PhysicalAddress {
        self.base
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// First address past the window. Saturates at `u64::MAX` for windows
    /// reaching the top of the address space.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.base.as_u64().saturating_add(self.size))
    }

    #[inline]
    #[must_use]
    pub const fn contains(&self, addr: PhysicalAddress) -> bool {
        addr.as_u64() >= self.base.as_u64() && addr.as_u64() < self.end().as_u64()
    }

    /// Whether `[addr, addr + len)` lies entirely within this window.
    #[inline]
    #[must_use]
    pub const fn contains_range(&self, addr: PhysicalAddress, len: u64) -> bool {
        match addr.as_u64().checked_add(len) {
            Some(end) => addr.as_u64() >= self.base.as_u64() && end <= self.end().as_u64(),
            None => false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.size != 0
            && other.size != 0
            && self.base.as_u64() < other.end().as_u64()
            && other.base.as_u64() < self.end().as_u64()
    }
}

impl fmt::Display for MmioRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.base, self.end())
    }
}
