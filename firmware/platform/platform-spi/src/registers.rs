//! SPIFMC register map.

use crate::SpiError;
use bitfield_struct::bitfield;

/// SPI controller MMIO base on AMD FCH platforms.
///
/// The FCH controller has its own register map; [`Spifmc`](crate::Spifmc)
/// does not drive it.
pub const FCH_SPI_BASE: u64 = 0xFEC1_0000;

pub const SPIFMC_CTRL: usize = 0x00;
pub const SPIFMC_CE_CTRL: usize = 0x04;
pub const SPIFMC_DLY_CTRL: usize = 0x08;
/// Direct memory mapped read enable.
pub const SPIFMC_DMMR: usize = 0x0C;
pub const SPIFMC_TRAN_CSR: usize = 0x10;
/// Number of data bytes in the transfer, excluding command and address.
pub const SPIFMC_TRAN_NUM: usize = 0x14;
pub const SPIFMC_FIFO_PORT: usize = 0x18;
/// FIFO pointer; the low nibble holds the fill level, a write resets it.
pub const SPIFMC_FIFO_PT: usize = 0x20;
pub const SPIFMC_INT_STS: usize = 0x28;
pub const SPIFMC_INT_EN: usize = 0x2C;
pub const SPIFMC_OPT: usize = 0x30;

/// Bytes the data FIFO holds.
pub const SPIFMC_MAX_FIFO_DEPTH: u8 = 8;

/// Largest serial clock divider `CTRL.SCK_DIV` can hold.
pub const SPIFMC_MAX_SCK_DIV: u16 = 0x7FF;

/// `OPT` bit 1: keep the FIFO when a command without address completes.
pub const SPIFMC_OPT_NO_ADDR_FLUSH_DISABLE: u32 = 1 << 1;

const FIFO_LEVEL_MASK: u32 = 0xF;

/// `CTRL`: serial clock and frame format.
///
/// `SCK = HCLK / (2 * (SCK_DIV + 1))`.
#[bitfield(u32, order = Lsb)]
#[derive(Eq, PartialEq)]
pub struct SpifmcCtrl {
    /// Bits 0–10 — serial clock divider.
    #[bits(11)]
    pub sck_div: u16,

    /// Bit 11 — Reserved.
    #[bits(1)]
    pub reserved0: u8,

    /// Bit 12 — clock phase.
    pub cpha: bool,

    /// Bit 13 — clock polarity.
    pub cpol: bool,

    /// Bit 14 — drive HOLD# high.
    pub hold_ol: bool,

    /// Bit 15 — drive WP# high.
    pub wp_ol: bool,

    /// Bits 16–19 — frame length.
    #[bits(4)]
    pub frame_len: u8,

    /// Bit 20 — shift out least significant bit first.
    pub lsbf: bool,

    /// Bit 21 — soft reset.
    pub srst: bool,

    /// Bits 22–31 — Reserved.
    #[bits(10)]
    pub reserved1: u16,
}

/// Direction of a transfer (`TRAN_CSR.TRAN_MODE`).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum TransferMode {
    /// Command and address only.
    None = 0,
    Rx = 1,
    Tx = 2,
    /// Data bytes are shifted out and the answer is captured.
    RxTx = 3,
}

impl TransferMode {
    #[must_use]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_bits(v: u8) -> Self {
        match v & 0b11 {
            0 => Self::None,
            1 => Self::Rx,
            2 => Self::Tx,
            _ => Self::RxTx,
        }
    }
}

/// Data lines used (`TRAN_CSR.BUS_WIDTH`).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum BusWidth {
    Single = 0,
    Dual = 1,
    Quad = 2,
    Reserved = 3,
}

impl BusWidth {
    #[must_use]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_bits(v: u8) -> Self {
        match v & 0b11 {
            0 => Self::Single,
            1 => Self::Dual,
            2 => Self::Quad,
            _ => Self::Reserved,
        }
    }
}

/// FIFO fill level that raises `RD_FIFO` / `WR_FIFO` (`TRAN_CSR.FIFO_TRG_LVL`).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum FifoTriggerLevel {
    OneByte = 0,
    TwoBytes = 1,
    FourBytes = 2,
    EightBytes = 3,
}

impl FifoTriggerLevel {
    /// Trigger level in bytes.
    #[must_use]
    pub const fn bytes(self) -> u8 {
        1 << (self as u8)
    }

    #[must_use]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_bits(v: u8) -> Self {
        match v & 0b11 {
            0 => Self::OneByte,
            1 => Self::TwoBytes,
            2 => Self::FourBytes,
            _ => Self::EightBytes,
        }
    }
}

/// `TRAN_CSR`: transfer control and status.
#[bitfield(u32, order = Lsb)]
#[derive(Eq, PartialEq)]
pub struct TranCsr {
    /// Bits 0–1 — transfer direction.
    #[bits(2, default = TransferMode::None)]
    pub tran_mode: TransferMode,

    /// Bit 2 — continuous read.
    pub cntns_read: bool,

    /// Bit 3 — fast read (dummy cycles after the address).
    pub fast_mode: bool,

    /// Bits 4–5 — number of data lines.
    #[bits(2, default = BusWidth::Single)]
    pub bus_width: BusWidth,

    /// Bit 6 — DMA request enable.
    pub dma_en: bool,

    /// Bit 7 — MISO sampling level.
    pub miso_level: bool,

    /// Bits 8–10 — number of address bytes sent after the command.
    #[bits(3)]
    pub addr_bytes: u8,

    /// Bit 11 — the first FIFO byte is a command opcode.
    pub with_cmd: bool,

    /// Bits 12–13 — FIFO interrupt trigger level.
    #[bits(2, default = FifoTriggerLevel::OneByte)]
    pub fifo_trg_lvl: FifoTriggerLevel,

    /// Bit 14 — Reserved.
    #[bits(1)]
    pub reserved0: u8,

    /// Bit 15 — write 1 to start; reads 1 while the transfer runs.
    pub go_busy: bool,

    /// Bits 16–31 — Reserved.
    #[bits(16)]
    pub reserved1: u16,
}

impl TranCsr {
    /// Mask of every transfer-setup field.
    const TRANSFER_FIELDS: u32 = 0x0000_3F7F;

    /// `self` with all transfer-setup fields zeroed and every other bit kept.
    ///
    /// Starting point for a new transfer: the fields a previous transfer set
    /// must not leak into the next one.
    #[must_use]
    pub const fn cleared(self) -> Self {
        Self::from_bits(self.into_bits() & !Self::TRANSFER_FIELDS)
    }

    /// Opcode followed by `n` response bytes on a single data line.
    ///
    /// Dummy bytes are pushed alongside the opcode, so the controller has to
    /// shift in both directions.
    #[must_use]
    pub const fn register_read() -> Self {
        Self::new()
            .with_bus_width(BusWidth::Single)
            .with_fifo_trg_lvl(FifoTriggerLevel::OneByte)
            .with_with_cmd(true)
            .with_tran_mode(TransferMode::RxTx)
    }

    /// Opcode followed by data bytes.
    ///
    /// Status register writes need `full_duplex`, which sets the transfer up
    /// like [`register_read`](Self::register_read).
    #[must_use]
    pub const fn register_write(full_duplex: bool) -> Self {
        let csr = Self::new()
            .with_fifo_trg_lvl(FifoTriggerLevel::OneByte)
            .with_with_cmd(true);
        if full_duplex {
            csr.with_tran_mode(TransferMode::RxTx)
        } else {
            csr
        }
    }

    /// Read opcode and `addr_bytes` address bytes, then data into the FIFO.
    ///
    /// # Errors
    /// [`SpiError::AddressBytes`] if `addr_bytes` does not fit the field.
    pub const fn flash_read(addr_bytes: u8) -> Result<Self, SpiError> {
        match Self::flash(addr_bytes) {
            Ok(csr) => Ok(csr.with_tran_mode(TransferMode::Rx)),
            Err(e) => Err(e),
        }
    }

    /// Program opcode and `addr_bytes` address bytes, then data from the FIFO.
    ///
    /// # Errors
    /// [`SpiError::AddressBytes`] if `addr_bytes` does not fit the field.
    pub const fn flash_write(addr_bytes: u8) -> Result<Self, SpiError> {
        match Self::flash(addr_bytes) {
            Ok(csr) => Ok(csr.with_tran_mode(TransferMode::Tx)),
            Err(e) => Err(e),
        }
    }

    /// Erase opcode and `addr_bytes` address bytes, no data phase.
    ///
    /// # Errors
    /// [`SpiError::AddressBytes`] if `addr_bytes` does not fit the field.
    pub const fn flash_erase(addr_bytes: u8) -> Result<Self, SpiError> {
        match Self::flash(addr_bytes) {
            Ok(csr) => Ok(csr.with_fifo_trg_lvl(FifoTriggerLevel::OneByte)),
            Err(e) => Err(e),
        }
    }

    const fn flash(addr_bytes: u8) -> Result<Self, SpiError> {
        if addr_bytes > 4 {
            return Err(SpiError::AddressBytes(addr_bytes));
        }
        Ok(Self::new()
            .with_addr_bytes(addr_bytes)
            .with_fifo_trg_lvl(FifoTriggerLevel::EightBytes)
            .with_with_cmd(true))
    }
}

/// `INT_STS` / `INT_EN`.
#[bitfield(u32, order = Lsb)]
#[derive(Eq, PartialEq)]
pub struct SpifmcInterrupts {
    /// Bit 0 — transfer done.
    pub tran_done: bool,

    /// Bit 1 — Reserved.
    #[bits(1)]
    pub reserved0: u8,

    /// Bit 2 — read FIFO reached its trigger level.
    pub rd_fifo: bool,

    /// Bit 3 — write FIFO drained to its trigger level.
    pub wr_fifo: bool,

    /// Bit 4 — frame received.
    pub rx_frame: bool,

    /// Bit 5 — frame sent.
    pub tx_frame: bool,

    /// Bits 6–31 — Reserved.
    #[bits(26)]
    pub reserved1: u32,
}

impl SpifmcInterrupts {
    pub const TRAN_DONE: Self = Self::new().with_tran_done(true);
    pub const RD_FIFO: Self = Self::new().with_rd_fifo(true);
    pub const WR_FIFO: Self = Self::new().with_wr_fifo(true);

    /// Whether any bit of `mask` is set in `self`.
    #[must_use]
    pub const fn intersects(self, mask: Self) -> bool {
        self.into_bits() & mask.into_bits() != 0
    }
}

/// Fill level encoded in a `FIFO_PT` value.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn fifo_level(fifo_pt: u32) -> u8 {
    (fifo_pt & FIFO_LEVEL_MASK) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tran_csr_bit_positions() {
        assert_eq!(TranCsr::new().with_tran_mode(TransferMode::Rx).into_bits(), 1 << 0);
        assert_eq!(TranCsr::new().with_tran_mode(TransferMode::Tx).into_bits(), 1 << 1);
        assert_eq!(TranCsr::new().with_cntns_read(true).into_bits(), 1 << 2);
        assert_eq!(TranCsr::new().with_fast_mode(true).into_bits(), 1 << 3);
        assert_eq!(TranCsr::new().with_bus_width(BusWidth::Dual).into_bits(), 0x01 << 4);
        assert_eq!(TranCsr::new().with_bus_width(BusWidth::Quad).into_bits(), 0x02 << 4);
        assert_eq!(TranCsr::new().with_dma_en(true).into_bits(), 1 << 6);
        assert_eq!(TranCsr::new().with_miso_level(true).into_bits(), 1 << 7);
        assert_eq!(TranCsr::new().with_addr_bytes(7).into_bits(), 0x0700);
        assert_eq!(TranCsr::new().with_with_cmd(true).into_bits(), 1 << 11);
        assert_eq!(
            TranCsr::new().with_fifo_trg_lvl(FifoTriggerLevel::EightBytes).into_bits(),
            0x3000
        );
        assert_eq!(TranCsr::new().with_go_busy(true).into_bits(), 1 << 15);
    }

    #[test]
    fn cleared_keeps_miso_level_and_reserved_bits() {
        let csr = TranCsr::from_bits(0xFFFF_FFFF).cleared();
        assert!(csr.miso_level());
        assert!(csr.go_busy());
        assert_eq!(csr.tran_mode(), TransferMode::None);
        assert_eq!(csr.addr_bytes(), 0);
        assert!(!csr.with_cmd());
        assert!(!csr.dma_en());
        assert_eq!(csr.fifo_trg_lvl(), FifoTriggerLevel::OneByte);
        assert_eq!(csr.into_bits(), 0xFFFF_C080);
    }

    #[test]
    fn presets() {
        assert_eq!(TranCsr::register_read().into_bits(), 0x0803);
        assert_eq!(TranCsr::register_write(false).into_bits(), 0x0800);
        assert_eq!(TranCsr::register_write(true).into_bits(), 0x0803);
        assert_eq!(TranCsr::flash_read(3).map(TranCsr::into_bits), Ok(0x3B01));
        assert_eq!(TranCsr::flash_write(4).map(TranCsr::into_bits), Ok(0x3C02));
        assert_eq!(TranCsr::flash_erase(4).map(TranCsr::into_bits), Ok(0x0C00));
        assert_eq!(TranCsr::flash_read(5), Err(SpiError::AddressBytes(5)));
        assert_eq!(TranCsr::flash_erase(5), Err(SpiError::AddressBytes(5)));
    }

    #[test]
    fn fch_window() {
        assert_eq!(FCH_SPI_BASE, 0xFEC1_0000);
    }

    #[test]
    fn ctrl_layout() {
        let ctrl = SpifmcCtrl::new().with_sck_div(3).with_srst(true);
        assert_eq!(ctrl.into_bits(), (1 << 21) | 3);
        assert_eq!(SpifmcCtrl::new().with_frame_len(8).into_bits(), 8 << 16);
        assert_eq!(SpifmcCtrl::new().with_lsbf(true).into_bits(), 1 << 20);
        assert_eq!(SpifmcCtrl::new().with_cpol(true).into_bits(), 1 << 13);
    }

    #[test]
    fn interrupt_bits() {
        assert_eq!(SpifmcInterrupts::TRAN_DONE.into_bits(), 1);
        assert_eq!(SpifmcInterrupts::RD_FIFO.into_bits(), 1 << 2);
        assert_eq!(SpifmcInterrupts::WR_FIFO.into_bits(), 1 << 3);
        assert_eq!(SpifmcInterrupts::new().with_tx_frame(true).into_bits(), 1 << 5);
        assert!(SpifmcInterrupts::from_bits(0x5).intersects(SpifmcInterrupts::RD_FIFO));
        assert!(!SpifmcInterrupts::from_bits(0x1).intersects(SpifmcInterrupts::WR_FIFO));
    }

    #[test]
    fn trigger_levels() {
        assert_eq!(FifoTriggerLevel::OneByte.bytes(), 1);
        assert_eq!(FifoTriggerLevel::EightBytes.bytes(), SPIFMC_MAX_FIFO_DEPTH);
        assert_eq!(fifo_level(0xFFFF_FFF5), 5);
    }
}
