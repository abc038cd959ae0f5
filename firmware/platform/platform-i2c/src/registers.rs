//! Cadence I2C register map. All registers are accessed 16 bits wide.

use bitfield_struct::bitfield;

/// Control.
pub const REG_CR: usize = 0x00;
/// Status.
pub const REG_SR: usize = 0x04;
/// Address of the target device.
pub const REG_AR: usize = 0x08;
/// Data FIFO.
pub const REG_DR: usize = 0x0C;
/// Interrupt status, write one to clear.
pub const REG_ISR: usize = 0x10;
/// Transfer size.
pub const REG_TSR: usize = 0x14;
/// Time-out.
pub const REG_TOR: usize = 0x1C;
/// Interrupt mask, read-only.
pub const REG_IMR: usize = 0x20;
/// Interrupt enable.
pub const REG_IER: usize = 0x24;
/// Interrupt disable.
pub const REG_IDR: usize = 0x28;

/// Highest register offset the controller decodes.
pub const MAX_REGISTER_OFFSET: usize = REG_IDR;

/// Every interrupt source the controller implements.
pub const ALL_INTERRUPTS: u16 = 0x02FF;

/// Time-out register value restored on reset.
pub const DEFAULT_TIMEOUT: u16 = 0x001F;

/// Largest `DIV_A` value.
pub const MAX_DIVISOR_A: u8 = 0x3F;

/// Largest `DIV_B` value.
pub const MAX_DIVISOR_B: u8 = 0x3;

/// `CR`.
#[bitfield(u16, order = Lsb)]
#[derive(Eq, PartialEq)]
pub struct Control {
    /// Bit 0 — transfer direction, set for reads.
    pub rw: bool,

    /// Bit 1 — master mode.
    pub ms: bool,

    /// Bit 2 — normal (7-bit) addressing.
    pub nea: bool,

    /// Bit 3 — acknowledge enable.
    pub acken: bool,

    /// Bit 4 — hold the bus after the transfer.
    pub hold: bool,

    /// Bit 5 — slave monitor mode.
    pub slvmon: bool,

    /// Bit 6 — clear the FIFO; self-clearing.
    pub clrfifo: bool,

    /// Bit 7 — Reserved.
    #[bits(1)]
    pub reserved0: u8,

    /// Bits 8–13 — first stage clock divisor.
    #[bits(6)]
    pub div_a: u8,

    /// Bits 14–15 — second stage clock divisor.
    #[bits(2)]
    pub div_b: u8,
}

impl Control {
    /// Mask of the `DIV_A` and `DIV_B` fields.
    pub const DIVISOR_MASK: u16 = 0xFF00;
}

/// `SR`.
#[bitfield(u16, order = Lsb)]
#[derive(Eq, PartialEq)]
pub struct BusStatus {
    /// Bits 0–2 — Reserved.
    #[bits(3)]
    pub reserved0: u8,

    /// Bit 3 — direction requested by the master in slave mode.
    pub rxrw: bool,

    /// Bit 4 — Reserved.
    #[bits(1)]
    pub reserved1: u8,

    /// Bit 5 — received data valid.
    pub rxdv: bool,

    /// Bit 6 — transmit data valid.
    pub txdv: bool,

    /// Bit 7 — receive overflow.
    pub rxovf: bool,

    /// Bit 8 — bus active.
    pub ba: bool,

    /// Bits 9–15 — Reserved.
    #[bits(7)]
    pub reserved2: u8,
}

/// `ISR`, `IMR`, `IER` and `IDR` share this layout.
#[bitfield(u16, order = Lsb)]
#[derive(Eq, PartialEq)]
pub struct Interrupts {
    /// Bit 0 — transfer complete.
    pub comp: bool,

    /// Bit 1 — more data.
    pub data: bool,

    /// Bit 2 — not acknowledged.
    pub nack: bool,

    /// Bit 3 — time-out.
    pub to: bool,

    /// Bit 4 — monitored slave ready.
    pub slv_rdy: bool,

    /// Bit 5 — receive overflow.
    pub rx_ovf: bool,

    /// Bit 6 — FIFO transmit overflow.
    pub tx_ovf: bool,

    /// Bit 7 — FIFO receive underflow.
    pub rx_unf: bool,

    /// Bit 8 — Reserved.
    #[bits(1)]
    pub reserved0: u8,

    /// Bit 9 — arbitration lost.
    pub arb_lost: bool,

    /// Bits 10–15 — Reserved.
    #[bits(6)]
    pub reserved1: u8,
}

impl Interrupts {
    /// `self` without the `TX_OVF` bit.
    #[must_use]
    pub const fn without_tx_ovf(self) -> Self {
        self.with_tx_ovf(false)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.into_bits() == 0
    }
}

const _: () = {
    assert!(MAX_REGISTER_OFFSET == 0x28);
    assert!(Control::new().with_div_a(MAX_DIVISOR_A).with_div_b(MAX_DIVISOR_B).into_bits() == Control::DIVISOR_MASK);
};
