//! `SiFive` UART register map.

use bitfield_struct::bitfield;

/// UART0 on U7-series chips.
pub const U7_UART0_BASE: u64 = 0x1001_0000;

/// UART1 on U7-series chips.
pub const U7_UART1_BASE: u64 = 0x1001_1000;

/// Transmit data register ([`TxData`]).
pub const UART_REG_TXFIFO: usize = 0x00;
/// Receive data register ([`RxData`]).
pub const UART_REG_RXFIFO: usize = 0x04;
/// Transmit control register ([`TxCtrl`]).
pub const UART_REG_TXCTRL: usize = 0x08;
/// Receive control register ([`RxCtrl`]).
pub const UART_REG_RXCTRL: usize = 0x0C;
/// Interrupt enable register.
pub const UART_REG_IE: usize = 0x10;
/// Interrupt pending register.
pub const UART_REG_IP: usize = 0x14;
/// Baud rate divisor register.
pub const UART_REG_DIV: usize = 0x18;

/// Depth of the transmit and receive FIFOs.
pub const UART_FIFO_DEPTH: u8 = 8;

/// `txdata`: write a byte to enqueue it; `full` is set while the FIFO cannot
/// accept another one.
#[bitfield(u32, order = Lsb)]
#[derive(Eq, PartialEq)]
pub struct TxData {
    /// Bits 0–7 — byte to transmit.
    pub data: u8,

    /// Bits 8–30 — Reserved.
    #[bits(23)]
    pub reserved0: u32,

    /// Bit 31 — transmit FIFO full.
    pub full: bool,
}

/// `rxdata`: a read dequeues one byte unless `empty` is set.
#[bitfield(u32, order = Lsb)]
#[derive(Eq, PartialEq)]
pub struct RxData {
    /// Bits 0–7 — received byte.
    pub data: u8,

    /// Bits 8–30 — Reserved.
    #[bits(23)]
    pub reserved0: u32,

    /// Bit 31 — receive FIFO empty; `data` is not valid.
    pub empty: bool,
}

/// `txctrl`.
#[bitfield(u32, order = Lsb)]
#[derive(Eq, PartialEq)]
pub struct TxCtrl {
    /// Bit 0 — transmit enable.
    pub txen: bool,

    /// Bit 1 — number of stop bits minus one.
    pub nstop: bool,

    /// Bits 2–15 — Reserved.
    #[bits(14)]
    pub reserved0: u16,

    /// Bits 16–18 — transmit watermark level.
    #[bits(3)]
    pub txcnt: u8,

    /// Bits 19–31 — Reserved.
    #[bits(13)]
    pub reserved1: u16,
}

/// `rxctrl`.
#[bitfield(u32, order = Lsb)]
#[derive(Eq, PartialEq)]
pub struct RxCtrl {
    /// Bit 0 — receive enable.
    pub rxen: bool,

    /// Bits 1–15 — Reserved.
    #[bits(15)]
    pub reserved0: u16,

    /// Bits 16–18 — receive watermark level.
    #[bits(3)]
    pub rxcnt: u8,

    /// Bits 19–31 — Reserved.
    #[bits(13)]
    pub reserved1: u16,
}

/// Smallest divisor whose baud rate does not exceed `max_target_hz`.
///
/// The UART runs at `input_hz / (div + 1)`, so this is
/// `ceil(input_hz / max_target_hz) - 1`, clamped at zero. A zero target
/// yields zero, leaving the divisor at its fastest setting.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn min_clk_divisor(input_hz: u64, max_target_hz: u64) -> u32 {
    if max_target_hz == 0 {
        return 0;
    }

    let quotient = input_hz.div_ceil(max_target_hz);
    if quotient == 0 {
        return 0;
    }

    let div = quotient - 1;
    if div > u32::MAX as u64 { u32::MAX } else { div as u32 }
}
