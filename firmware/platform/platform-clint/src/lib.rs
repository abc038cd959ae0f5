//! # `SiFive` U7 Core-Local Interruptor (CLINT)
//!
//! Register map of the CLINT on `SiFive` U7-series parts and a small accessor
//! for the machine timer and software interrupts.
//!
//! ## Register Map
//!
//! ```text
//! CLINT_REG_BASE_ADDR  0x0200_0000 ┌──────────────────────────────┐
//!                                  │ msip[hart]   (4 bytes each)  │
//!                      0x0200_4000 ├──────────────────────────────┤
//!                                  │ mtimecmp[hart] (8 bytes each)│
//!                                  │   MTIMECMP0 .. MTIMECMP4     │
//!                      0x0200_BFF8 ├──────────────────────────────┤
//!                                  │ mtime        (8 bytes)       │
//!                      0x0201_0000 └──────────────────────────────┘
//! ```
//!
//! The absolute addresses are exported as `u64` constants
//! ([`CLINT_REG_MTIME`], [`CLINT_REG_MTIMECMP0`], ...). Hart-indexed access goes
//! through [`HartId`], which can only be constructed for the harts that exist
//! on the part ([`U7_HART_COUNT`]).
//!
//! ## Timer Programming
//!
//! A hart's machine timer interrupt is pending while `mtime >= mtimecmp[hart]`.
//! [`Clint::arm_after`] schedules an interrupt a number of ticks from now and
//! [`Clint::disarm`] pushes the deadline out to `u64::MAX`.
//!
//! ```rust
//! use platform_clint::{CLINT_REG_MTIMECMP2, HartId, mtimecmp_address};
//!
//! let hart = HartId::new(2).expect("hart 2 exists");
//! assert_eq!(mtimecmp_address(hart).as_u64(), CLINT_REG_MTIMECMP2);
//! assert!(HartId::new(5).is_none());
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod registers;
mod timer;

pub use registers::*;
pub use timer::Clint;
