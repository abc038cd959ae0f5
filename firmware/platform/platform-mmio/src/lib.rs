//! # Physical Addresses and Register Access
//!
//! Strongly typed physical addresses and a small register-access abstraction
//! shared by the platform drivers in this workspace.
//!
//! ## Overview
//!
//! Platform code deals with two kinds of raw numbers that are easy to confuse:
//! absolute physical addresses (where a peripheral's register window lives)
//! and register offsets (where a register lives inside that window). This
//! crate keeps them apart:
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`PhysicalAddress`] | An absolute physical (MMIO) address. |
//! | [`MmioRegion`] | A half-open `[base, base + size)` register window. |
//! | [`RegisterBus`] | Something that can read and write registers by offset. |
//! | [`Mmio`] | The volatile [`RegisterBus`] backed by a real register window. |
//!
//! Drivers are written against [`RegisterBus`] rather than raw pointers. On
//! hardware they are handed an [`Mmio`]; in tests they are handed a fake
//! register file that models just enough of the device.
//!
//! ## Typical Usage
//!
//! ```rust
//! # use platform_mmio::*;
//! let uart = MmioRegion::new(PhysicalAddress::new(0x1001_0000), 0x1000);
//! let clint = MmioRegion::new(PhysicalAddress::new(0x0200_0000), 0x1_0000);
//!
//! assert!(uart.contains(PhysicalAddress::new(0x1001_0018)));
//! assert!(!uart.overlaps(&clint));
//! assert_eq!(uart.end().as_u64(), 0x1001_1000);
//! ```
//!
//! ## Register Widths
//!
//! [`RegisterWidth`] is sealed and implemented for `u8`, `u16`, `u32` and
//! `u64`. Accesses must be naturally aligned to their width; [`Mmio`] checks
//! this with `debug_assert!`.
//!
//! ## Testing
//!
//! With the `testing` feature the crate exports
//! [`testing::RegisterFile`], a sparse in-memory register bank that logs
//! every write. Driver crates pull it in as a dev-dependency.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod address;
mod bus;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use address::{MmioRegion, PhysicalAddress};
pub use bus::{Mmio, RegisterBus, RegisterWidth};
