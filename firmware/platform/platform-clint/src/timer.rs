use crate::registers::{CLINT_REG_BASE_ADDR, HartId, MTIME_OFFSET, msip_offset, mtimecmp_offset};
use log::trace;
use platform_mmio::{Mmio, PhysicalAddress, RegisterBus};

/// Access to the machine timer and software interrupts of the CLINT.
///
/// The bus must be rooted at the CLINT base; offsets are relative to it.
pub struct Clint<B> {
    bus: B,
}

impl Clint<Mmio> {
    /// Accessor for the CLINT at [`CLINT_REG_BASE_ADDR`].
    ///
    /// # Safety
    /// The CLINT window must be identity-mapped and the caller must be running
    /// in a mode that may access it (M-mode, or S-mode with a PMP grant).
    #[must_use]
    pub const unsafe fn u7() -> Self {
        Self {
            bus: unsafe { Mmio::new(PhysicalAddress::new(CLINT_REG_BASE_ADDR)) },
        }
    }
}

impl<B: RegisterBus> Clint<B> {
    #[must_use]
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    #[must_use]
    pub fn into_inner(self) -> B {
        self.bus
    }

    /// Current value of the free-running `mtime` counter.
    #[inline]
    #[must_use]
    pub fn mtime(&self) -> u64 {
        self.bus.read::<u64>(MTIME_OFFSET)
    }

    #[inline]
    #[must_use]
    pub fn mtimecmp(&self, hart: HartId) -> u64 {
        self.bus.read::<u64>(mtimecmp_offset(hart))
    }

    /// Programs `hart`'s compare register with an absolute deadline.
    #[inline]
    pub fn set_mtimecmp(&mut self, hart: HartId, deadline: u64) {
        trace!("{hart}: mtimecmp <- {deadline:#x}");
        self.bus.write::<u64>(mtimecmp_offset(hart), deadline);
    }

    /// Schedules a timer interrupt on `hart` `ticks` from now and returns the
    /// absolute deadline. Saturates rather than wrapping into the past.
    pub fn arm_after(&mut self, hart: HartId, ticks: u64) -> u64 {
        let deadline = self.mtime().saturating_add(ticks);
        self.set_mtimecmp(hart, deadline);
        deadline
    }

    /// Moves `hart`'s deadline out of reach, clearing a pending timer interrupt.
    pub fn disarm(&mut self, hart: HartId) {
        self.set_mtimecmp(hart, u64::MAX);
    }

    /// Whether `hart`'s timer interrupt condition (`mtime >= mtimecmp`) holds.
    #[must_use]
    pub fn timer_expired(&self, hart: HartId) -> bool {
        self.mtime() >= self.mtimecmp(hart)
    }

    pub fn raise_software_interrupt(&mut self, hart: HartId) {
        trace!("{hart}: msip <- 1");
        self.bus.write::<u32>(msip_offset(hart), 1);
    }

    pub fn clear_software_interrupt(&mut self, hart: HartId) {
        trace!("{hart}: msip <- 0");
        self.bus.write::<u32>(msip_offset(hart), 0);
    }

    /// Only bit 0 of `msip` is implemented; the rest reads as zero.
    #[must_use]
    pub fn software_interrupt_pending(&self, hart: HartId) -> bool {
        self.bus.read::<u32>(msip_offset(hart)) & 1 != 0
    }
}
