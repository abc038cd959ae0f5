use crate::PhysicalAddress;
use core::fmt;
use core::ops::{BitAnd, BitOr, Not};

mod sealed {
    pub trait Sealed {}
}

/// Access width of a single register: `u8`, `u16`, `u32` or `u64`.
pub trait RegisterWidth:
    sealed::Sealed
    + Copy
    + Eq
    + fmt::Debug
    + fmt::LowerHex
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + Not<Output = Self>
{
    /// Width of the access in bytes.
    const BYTES: usize;

    /// Zero-extends the value to 64 bits.
    fn to_raw(self) -> u64;

    /// Truncates a 64-bit value to this width.
    fn from_raw(raw: u64) -> Self;
}

macro_rules! impl_register_width {
    ($($ty:ty),*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl RegisterWidth for $ty {
                const BYTES: usize = size_of::<$ty>();

                #[inline]
                fn to_raw(self) -> u64 {
                    u64::from(self)
                }

                #[inline]
                #[allow(clippy::cast_possible_truncation)]
                fn from_raw(raw: u64) -> Self {
                    raw as $ty
                }
            }
        )*
    };
}

impl_register_width!(u8, u16, u32, u64);

/// A bank of registers addressed by byte offset.
///
/// Reads and writes take `&self`: a register access is a side effect on the
/// device, not on the Rust value. Implementations that need bookkeeping (like
/// test fakes) use interior mutability.
pub trait RegisterBus {
    /// Reads the register of width `T` at `offset`.
    fn read<T: RegisterWidth>(&self, offset: usize) -> T;

    /// Writes `value` into the register of width `T` at `offset`.
    fn write<T: RegisterWidth>(&self, offset: usize, value: T);

    /// Read, AND with `and`, OR with `or`, write back. Returns the written value.
    #[inline]
    fn modify<T: RegisterWidth>(&self, offset: usize, and: T, or: T) -> T {
        let value = (self.read::<T>(offset) & and) | or;
        self.write(offset, value);
        value
    }

    /// Sets `bits` in the register at `offset`. Returns the written value.
    #[inline]
    fn set_bits<T: RegisterWidth>(&self, offset: usize, bits: T) -> T {
        let value = self.read::<T>(offset) | bits;
        self.write(offset, value);
        value
    }

    /// Clears `bits` in the register at `offset`. Returns the written value.
    #[inline]
    fn clear_bits<T: RegisterWidth>(&self, offset: usize, bits: T) -> T {
        let value = self.read::<T>(offset) & !bits;
        self.write(offset, value);
        value
    }
}

impl<B: RegisterBus> RegisterBus for &B {
    #[inline]
    fn read<T: RegisterWidth>(&self, offset: usize) -> T {
        (**self).read(offset)
    }

    #[inline]
    fn write<T: RegisterWidth>(&self, offset: usize, value: T) {
        (**self).write(offset, value);
    }
}

/// Volatile register access to a memory-mapped register window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mmio {
    base: PhysicalAddress,
}

impl Mmio {
    /// Creates an accessor for the register window starting at `base`.
    ///
    /// # Safety
    /// - `base` must be mapped (identity or otherwise) at the same virtual
    ///   address for as long as the accessor is used.
    /// - Every offset later passed to [`RegisterBus::read`] or
    ///   [`RegisterBus::write`] must name an actual register of the device.
    /// - The caller must make sure no other code concurrently programs the
    ///   same device in a conflicting way.
    #[inline]
    #[must_use]
    pub const unsafe fn new(base: PhysicalAddress) -> Self {
        Self { base }
    }

    #[inline]
    #[must_use]
    pub const fn base(&self) -> PhysicalAddress {
        self.base
    }

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn register_ptr<T: RegisterWidth>(&self, offset: usize) -> *mut T {
        debug_assert_eq!(offset % T::BYTES, 0, "unaligned register offset");
        let addr = self.base.as_u64() as usize + offset;
        addr as *mut T
    }
}

impl RegisterBus for Mmio {
    #[inline]
    fn read<T: RegisterWidth>(&self, offset: usize) -> T {
        // SAFETY: the register window was vouched for in `Mmio::new`.
        unsafe { core::ptr::read_volatile(self.register_ptr::<T>(offset)) }
    }

    #[inline]
    fn write<T: RegisterWidth>(&self, offset: usize, value: T) {
        // SAFETY: the register window was vouched for in `Mmio::new`.
        unsafe { core::ptr::write_volatile(self.register_ptr::<T>(offset), value) }
    }
}
