//! # Cadence I2C Controller
//!
//! Platform code describes each controller with a [`CadenceI2cInstall`]
//! (register base and input clock). [`CadenceI2c`] turns that descriptor into
//! a master-mode controller: it validates the clock, resets the block, probes
//! the FIFO depth and transfer size width, and programs the bus clock.
//!
//! ## Bus clock
//!
//! ```text
//!                 input_clock_hz
//! bus_hz = ────────────────────────────
//!           22 · (DIV_A + 1) · (DIV_B + 1)        DIV_A ∈ 0..=63, DIV_B ∈ 0..=3
//! ```
//!
//! [`BusDivisors::for_frequency`] always lands on or below the requested
//! rate, never above it.
//!
//! ```rust
//! use platform_i2c::{BusDivisors, CadenceI2cInstall};
//! use platform_mmio::PhysicalAddress;
//!
//! let install = CadenceI2cInstall::new(PhysicalAddress::new(0x1000_0000), 100_000_000);
//! let (_, hz) = BusDivisors::for_frequency(install.input_clock_hz(), 100_000).unwrap();
//! assert_eq!(hz, 98_814);
//! ```
//!
//! Bus transactions themselves are not driven by this crate.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod divisors;
mod driver;
mod install;
pub mod registers;

pub use divisors::{BusDivisors, actual_bus_frequency};
pub use driver::{CadenceI2c, DEFAULT_SPIN_LIMIT, MAX_FIFO_PROBE_SIZE};
pub use install::CadenceI2cInstall;

/// Errors reported while bringing up or configuring a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum I2cError {
    #[error("input clock of {0} Hz is too low to drive the bus")]
    InputClockTooLow(u32),
    #[error("a bus frequency of 0 Hz is not supported")]
    UnsupportedFrequency,
    #[error("requested {requested} Hz but the slowest possible bus clock is {slowest} Hz")]
    FrequencyTooLow { requested: u32, slowest: u32 },
    #[error("interrupt sources could not be disabled (IMR {imr:#06x})")]
    InterruptsNotMasked { imr: u16 },
    #[error("unexpected interrupt status {0:#06x}")]
    UnexpectedInterrupt(u16),
    #[error("transmit FIFO did not overflow after {0} writes")]
    FifoProbe(u16),
    #[error("max transfer size {max_transfer} cannot cover FIFO size {fifo_size} + 1")]
    TransferSizeTooSmall { max_transfer: u16, fifo_size: u16 },
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
}
