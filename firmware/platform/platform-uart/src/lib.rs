//! # `SiFive` U7 Series UART
//!
//! Register layout and a polled driver for the `SiFive` UART found on U7-series
//! parts, plus a [`log`] sink on top of it.
//!
//! This crate is the single import path for serial output: it re-exports the
//! register definitions ([`registers`]), the driver ([`SifiveUart`]) and the
//! logger ([`UartLogger`]), so board code depends on `platform_uart` only.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use log::LevelFilter;
//! use platform_mmio::{Mmio, PhysicalAddress};
//! use platform_uart::{SifiveUart, U7_UART0_BASE, UartLogger};
//!
//! static LOGGER: UartLogger<Mmio> = UartLogger::new(
//!     SifiveUart::new(unsafe { Mmio::new(PhysicalAddress::new(U7_UART0_BASE)) }),
//!     LevelFilter::Debug,
//! );
//!
//! LOGGER.uart().init(125_000_000, 115_200);
//! UartLogger::install(&LOGGER).expect("logger installed once");
//! log::info!("UART up");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod logger;
pub mod registers;
mod uart;

pub use logger::UartLogger;
pub use registers::{U7_UART0_BASE, U7_UART1_BASE, min_clk_divisor};
pub use uart::{SifiveUart, UartWriter};
