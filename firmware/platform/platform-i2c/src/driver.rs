use crate::divisors::{BusDivisors, actual_bus_frequency};
use crate::install::CadenceI2cInstall;
use crate::registers::{
    ALL_INTERRUPTS, BusStatus, Control, DEFAULT_TIMEOUT, Interrupts, MAX_REGISTER_OFFSET, REG_CR,
    REG_DR, REG_IDR, REG_IER, REG_IMR, REG_ISR, REG_SR, REG_TOR, REG_TSR,
};
use crate::I2cError;
use log::{debug, error, info, trace};
use platform_mmio::{Mmio, RegisterBus};

/// Writes to the data register before giving up on seeing the FIFO overflow.
pub const MAX_FIFO_PROBE_SIZE: u16 = 32;

/// Default number of polls for self-clearing bits and bus idle.
pub const DEFAULT_SPIN_LIMIT: usize = 1_000_000;

/// A Cadence I2C controller in master mode.
///
/// [`start`](Self::start) must succeed before the controller is used; it
/// checks the input clock and probes the synthesis parameters the hardware
/// does not advertise (FIFO depth, transfer size register width).
pub struct CadenceI2c<B> {
    bus: B,
    install: CadenceI2cInstall,
    fifo_size: u16,
    spin_limit: usize,
}

impl CadenceI2c<Mmio> {
    /// Driver for the controller described by `install`.
    ///
    /// # Safety
    /// `install.mmio_base` must name a Cadence I2C register window; see
    /// [`Mmio::new`].
    #[must_use]
    pub const unsafe fn from_install(install: CadenceI2cInstall) -> Self {
        Self::new(unsafe { Mmio::new(install.mmio_base) }, install)
    }
}

impl<B> CadenceI2c<B> {
    #[must_use]
    pub const fn new(bus: B, install: CadenceI2cInstall) -> Self {
        Self {
            bus,
            install,
            fifo_size: 0,
            spin_limit: DEFAULT_SPIN_LIMIT,
        }
    }

    /// Bounds every busy wait to `spins` polls.
    #[must_use]
    pub const fn with_spin_limit(mut self, spins: usize) -> Self {
        self.spin_limit = spins;
        self
    }

    #[must_use]
    pub const fn install(&self) -> &CadenceI2cInstall {
        &self.install
    }

    /// FIFO depth in bytes found by [`start`](Self::start); zero before.
    #[must_use]
    pub const fn fifo_size(&self) -> u16 {
        self.fifo_size
    }
}

impl<B: RegisterBus> CadenceI2c<B> {
    #[inline]
    fn read(&self, reg: usize) -> u16 {
        debug_assert!(reg.is_multiple_of(4) && reg <= MAX_REGISTER_OFFSET);
        self.bus.read::<u16>(reg)
    }

    #[inline]
    fn write(&self, reg: usize, value: u16) {
        debug_assert!(reg.is_multiple_of(4) && reg <= MAX_REGISTER_OFFSET);
        self.bus.write::<u16>(reg, value);
    }

    fn control(&self) -> Control {
        Control::from_bits(self.read(REG_CR))
    }

    /// Reads the pending interrupts and acknowledges exactly those.
    fn clear_isr(&self) -> Interrupts {
        let isr = self.read(REG_ISR);
        self.write(REG_ISR, isr);
        Interrupts::from_bits(isr)
    }

    /// Sets `CR.CLRFIFO` and waits for the hardware to drop it.
    fn clear_fifo(&self) -> Result<(), I2cError> {
        self.write(REG_CR, self.control().with_clrfifo(true).into_bits());
        for _ in 0..self.spin_limit {
            if !self.control().clrfifo() {
                return Ok(());
            }
            core::hint::spin_loop();
        }

        error!("{}: FIFO clear never completed; is the input clock running?", self.install);
        Err(I2cError::Timeout("FIFO clear"))
    }

    /// Puts the controller in master mode with every interrupt source masked
    /// and nothing pending.
    ///
    /// # Errors
    /// - [`I2cError::Timeout`] if the FIFO does not clear.
    /// - [`I2cError::InterruptsNotMasked`] if `IMR` does not reflect the disable.
    pub fn reset(&self) -> Result<(), I2cError> {
        self.write(REG_CR, Control::new().with_ms(true).with_acken(true).into_bits());
        self.clear_fifo()?;

        self.write(REG_TOR, DEFAULT_TIMEOUT);

        self.write(REG_IER, 0);
        self.write(REG_IDR, ALL_INTERRUPTS);
        let imr = self.read(REG_IMR);
        if imr != ALL_INTERRUPTS {
            error!("{}: failed to disable all interrupt sources (IMR {imr:#06x})", self.install);
            return Err(I2cError::InterruptsNotMasked { imr });
        }

        self.clear_isr();
        Ok(())
    }

    /// Fills the transmit FIFO until it overflows; the number of accepted
    /// writes is its depth.
    fn probe_fifo_size(&self) -> Result<u16, I2cError> {
        self.write(REG_CR, self.control().with_rw(false).into_bits());
        self.clear_isr();
        self.clear_fifo()?;

        for probe in 0..=MAX_FIFO_PROBE_SIZE {
            self.write(REG_DR, 0);
            let isr = self.clear_isr();
            if !isr.without_tx_ovf().is_empty() {
                error!(
                    "{}: unexpected interrupt {:#06x} while probing the FIFO",
                    self.install,
                    isr.into_bits()
                );
                return Err(I2cError::UnexpectedInterrupt(isr.into_bits()));
            }
            if isr.tx_ovf() {
                return Ok(probe);
            }
        }

        Err(I2cError::FifoProbe(MAX_FIFO_PROBE_SIZE + 1))
    }

    /// Writes all ones to `TSR` in read mode; the bits that stick give the
    /// width of the transfer size counter.
    fn probe_max_transfer_size(&self) -> Result<u16, I2cError> {
        self.write(
            REG_CR,
            self.control().with_hold(false).with_rw(true).into_bits(),
        );
        self.write(REG_TSR, 0);
        self.clear_isr();
        self.clear_fifo()?;
        self.write(REG_TSR, u16::MAX);
        Ok(self.read(REG_TSR))
    }

    /// Validates the input clock, resets the controller and probes its FIFO
    /// depth and transfer size width.
    ///
    /// # Errors
    /// - [`I2cError::InputClockTooLow`] if no divisor yields a non-zero bus
    ///   clock.
    /// - [`I2cError::TransferSizeTooSmall`] if `TSR` cannot hold one more
    ///   byte than the FIFO.
    /// - Any error of [`reset`](Self::reset) or the FIFO probe.
    pub fn start(&mut self) -> Result<(), I2cError> {
        let input = self.install.input_clock_hz;
        if input == 0 || actual_bus_frequency(input, BusDivisors::MAX) == 0 {
            error!("{}: input clock ({input} Hz) is unreasonably low", self.install);
            return Err(I2cError::InputClockTooLow(input));
        }

        self.reset()?;

        let fifo_size = self.probe_fifo_size().inspect_err(|e| {
            error!("{}: unable to probe FIFO size: {e}", self.install);
        })?;
        self.fifo_size = fifo_size;
        info!("{}: FIFO size is {} bytes", self.install, self.fifo_size);

        let max_transfer = self.probe_max_transfer_size()?;
        info!("{}: max transfer size is {max_transfer} bytes", self.install);

        // Transfers program FIFO_SIZE + 1 into TSR.
        let required = self.fifo_size + 1;
        if max_transfer < required {
            error!(
                "{}: max transfer size {max_transfer} cannot cover FIFO size {}",
                self.install, self.fifo_size
            );
            return Err(I2cError::TransferSizeTooSmall {
                max_transfer,
                fifo_size: self.fifo_size,
            });
        }

        self.reset()
    }

    /// Divisors currently programmed in `CR`.
    #[must_use]
    pub fn bus_divisors(&self) -> BusDivisors {
        let cr = self.control();
        BusDivisors::new(cr.div_a(), cr.div_b()).unwrap_or(BusDivisors::MAX)
    }

    /// Programs the fastest bus clock not above `requested_hz` and returns it.
    /// Only the divisor fields of `CR` change.
    ///
    /// # Errors
    /// See [`BusDivisors::for_frequency`].
    pub fn set_bus_frequency(&self, requested_hz: u32) -> Result<u32, I2cError> {
        let (divisors, actual) = BusDivisors::for_frequency(self.install.input_clock_hz, requested_hz)
            .inspect_err(|e| error!("{}: {e}", self.install))?;

        let cr = self
            .control()
            .with_div_a(divisors.a())
            .with_div_b(divisors.b());
        self.write(REG_CR, cr.into_bits());

        debug!(
            "{}: bus clock {actual} Hz for {requested_hz} Hz (a={}, b={})",
            self.install,
            divisors.a(),
            divisors.b()
        );
        Ok(actual)
    }

    #[must_use]
    pub fn bus_active(&self) -> bool {
        BusStatus::from_bits(self.read(REG_SR)).ba()
    }

    /// Waits until no transfer occupies the bus.
    ///
    /// # Errors
    /// [`I2cError::Timeout`] if the bus stays busy.
    pub fn wait_bus_inactive(&self) -> Result<(), I2cError> {
        for _ in 0..self.spin_limit {
            if !self.bus_active() {
                return Ok(());
            }
            core::hint::spin_loop();
        }

        error!("{}: time-out while waiting for the bus to be inactive", self.install);
        Err(I2cError::Timeout("bus inactive"))
    }

    /// Pending interrupts, without acknowledging them.
    #[must_use]
    pub fn pending_interrupts(&self) -> Interrupts {
        let isr = Interrupts::from_bits(self.read(REG_ISR));
        trace!("{}: ISR {:#06x}", self.install, isr.into_bits());
        isr
    }
}
