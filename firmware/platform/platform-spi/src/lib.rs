//! # SPI Flash Master Controller
//!
//! Register map and a polled register-mode driver for the SPIFMC block that
//! fronts the boot flash.
//!
//! | Offset | Register    | Purpose                                   |
//! |--------|-------------|-------------------------------------------|
//! | `0x00` | `CTRL`      | clock divider, frame format, soft reset   |
//! | `0x04` | `CE_CTRL`   | manual chip select                        |
//! | `0x08` | `DLY_CTRL`  | inter-frame and CE timing                 |
//! | `0x0C` | `DMMR`      | direct memory mapped read enable          |
//! | `0x10` | `TRAN_CSR`  | transfer setup and `GO_BUSY`              |
//! | `0x14` | `TRAN_NUM`  | data byte count                           |
//! | `0x18` | `FIFO_PORT` | 8-byte data FIFO                          |
//! | `0x20` | `FIFO_PT`   | FIFO pointer and fill level               |
//! | `0x28` | `INT_STS`   | interrupt status, polled                  |
//! | `0x2C` | `INT_EN`    | interrupt enable                          |
//! | `0x30` | `OPT`       | FIFO flush options                        |
//!
//! Every transfer follows the same shape:
//!
//! ```text
//! prepare(preset) ──► push opcode/address/data ──► go(csr) ──► wait_for(TRAN_DONE)
//!      │                                                              │
//!      └── TRAN_CSR transfer fields cleared, FIFO emptied             └── pop FIFO
//! ```
//!
//! [`TranCsr`] carries the presets for register reads, register writes and
//! flash reads, writes and erases. Flash data moves through the FIFO in
//! [`SPIFMC_MAX_FIFO_DEPTH`] byte chunks, paced by the `FIFO_PT` fill level.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod controller;
mod registers;

pub use controller::{DEFAULT_SCK_DIV, DEFAULT_SPIN_LIMIT, Spifmc};
pub use registers::*;

/// Errors reported by the SPIFMC driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SpiError {
    #[error("no interrupt in mask {mask:#x} after {spins} polls")]
    Timeout { mask: u32, spins: usize },
    #[error("clock divider {0} exceeds 0x7FF")]
    ClockDivider(u16),
    #[error("{0} address bytes do not fit TRAN_CSR")]
    AddressBytes(u8),
    #[error("{0} data bytes plus opcode overflow the FIFO")]
    FifoOverflow(usize),
    #[error("transfer of {0} bytes is too long")]
    TransferTooLong(usize),
    #[error("FIFO did not reach {level} bytes after {spins} polls")]
    FifoLevel { level: usize, spins: usize },
}
