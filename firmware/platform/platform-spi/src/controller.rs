use crate::SpiError;
use crate::registers::{
    SPIFMC_CE_CTRL, SPIFMC_CTRL, SPIFMC_DMMR, SPIFMC_FIFO_PORT, SPIFMC_FIFO_PT, SPIFMC_INT_STS,
    SPIFMC_MAX_FIFO_DEPTH, SPIFMC_MAX_SCK_DIV, SPIFMC_OPT, SPIFMC_OPT_NO_ADDR_FLUSH_DISABLE,
    SPIFMC_TRAN_CSR, SPIFMC_TRAN_NUM, SpifmcCtrl, FifoTriggerLevel, SpifmcInterrupts, TranCsr,
    TransferMode, fifo_level,
};
use log::{debug, trace, warn};
use platform_mmio::RegisterBus;

/// Polls to wait for an interrupt status bit before giving up.
pub const DEFAULT_SPIN_LIMIT: usize = 1_000_000;

/// Clock divider programmed by [`Spifmc::setup`]: `SCK = HCLK / 8`.
pub const DEFAULT_SCK_DIV: u16 = 3;

/// Polled driver for a SPI flash master controller.
///
/// The register window is board specific; wrap it in a
/// [`Mmio`](platform_mmio::Mmio) and hand it to [`new`](Self::new).
pub struct Spifmc<B> {
    bus: B,
}

impl<B: RegisterBus> Spifmc<B> {
    #[must_use]
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    #[must_use]
    pub fn into_inner(self) -> B {
        self.bus
    }

    /// Brings the controller into register mode for a flash part using
    /// `addr_bytes` address bytes.
    ///
    /// Disables direct memory mapped reads, soft-resets with the default clock
    /// divider, hands chip select to the hardware and leaves a flash transfer
    /// template in `TRAN_CSR`.
    ///
    /// # Errors
    /// [`SpiError::AddressBytes`] if `addr_bytes` does not fit the field.
    pub fn setup(&self, addr_bytes: u8) -> Result<(), SpiError> {
        let template = TranCsr::flash_read(addr_bytes)?
            .with_tran_mode(TransferMode::None)
            .with_fifo_trg_lvl(FifoTriggerLevel::FourBytes);

        self.bus.write::<u32>(SPIFMC_DMMR, 0);

        let ctrl = SpifmcCtrl::from_bits(self.bus.read::<u32>(SPIFMC_CTRL))
            .with_sck_div(DEFAULT_SCK_DIV)
            .with_srst(true);
        self.bus.write::<u32>(SPIFMC_CTRL, ctrl.into_bits());

        // Soft reset leaves CE_CTRL alone.
        self.bus.write::<u32>(SPIFMC_CE_CTRL, 0);
        self.bus.write::<u32>(SPIFMC_TRAN_CSR, template.into_bits());

        debug!("spifmc: ready, {addr_bytes} address bytes, sck_div {DEFAULT_SCK_DIV}");
        Ok(())
    }

    #[must_use]
    pub fn clock_divider(&self) -> u16 {
        SpifmcCtrl::from_bits(self.bus.read::<u32>(SPIFMC_CTRL)).sck_div()
    }

    /// Rewrites `CTRL.SCK_DIV`, keeping the frame format.
    ///
    /// # Errors
    /// [`SpiError::ClockDivider`] if `div` exceeds [`SPIFMC_MAX_SCK_DIV`].
    pub fn set_clock_divider(&self, div: u16) -> Result<(), SpiError> {
        if div > SPIFMC_MAX_SCK_DIV {
            return Err(SpiError::ClockDivider(div));
        }
        let ctrl = SpifmcCtrl::from_bits(self.bus.read::<u32>(SPIFMC_CTRL)).with_sck_div(div);
        self.bus.write::<u32>(SPIFMC_CTRL, ctrl.into_bits());
        trace!("spifmc: sck_div <- {div}");
        Ok(())
    }

    /// Merges `preset` into the current `TRAN_CSR` with its transfer fields
    /// cleared, and empties the FIFO. Returns the value for [`go`](Self::go).
    #[must_use]
    pub fn prepare(&self, preset: TranCsr) -> TranCsr {
        let current = TranCsr::from_bits(self.bus.read::<u32>(SPIFMC_TRAN_CSR)).cleared();
        self.bus.write::<u32>(SPIFMC_FIFO_PT, 0);
        TranCsr::from_bits(current.into_bits() | preset.into_bits())
    }

    /// Current FIFO fill level in bytes.
    #[must_use]
    pub fn fifo_level(&self) -> u8 {
        fifo_level(self.bus.read::<u32>(SPIFMC_FIFO_PT))
    }

    pub fn push_fifo(&self, bytes: &[u8]) {
        for &b in bytes {
            self.bus.write::<u8>(SPIFMC_FIFO_PORT, b);
        }
    }

    pub fn pop_fifo(&self, out: &mut [u8]) {
        for b in out.iter_mut() {
            *b = self.bus.read::<u8>(SPIFMC_FIFO_PORT);
        }
    }

    /// Programs the number of data bytes of the next transfer.
    ///
    /// # Errors
    /// [`SpiError::TransferTooLong`] if `len` does not fit the register.
    pub fn set_transfer_length(&self, len: usize) -> Result<(), SpiError> {
        let num = u32::try_from(len).map_err(|_| SpiError::TransferTooLong(len))?;
        self.bus.write::<u32>(SPIFMC_TRAN_NUM, num);
        Ok(())
    }

    /// Clears the interrupt status and starts the transfer described by `csr`.
    pub fn go(&self, csr: TranCsr) {
        self.bus.write::<u32>(SPIFMC_INT_STS, 0);
        self.bus
            .write::<u32>(SPIFMC_TRAN_CSR, csr.with_go_busy(true).into_bits());
    }

    /// Polls `INT_STS` until any bit of `mask` is set, at most `spins` times.
    ///
    /// # Errors
    /// [`SpiError::Timeout`] if the bits never show up.
    pub fn wait_for(
        &self,
        mask: SpifmcInterrupts,
        spins: usize,
    ) -> Result<SpifmcInterrupts, SpiError> {
        for _ in 0..spins {
            let status = SpifmcInterrupts::from_bits(self.bus.read::<u32>(SPIFMC_INT_STS));
            if status.intersects(mask) {
                return Ok(status);
            }
            core::hint::spin_loop();
        }

        warn!("spifmc: no interrupt {:#x} after {spins} polls", mask.into_bits());
        Err(SpiError::Timeout {
            mask: mask.into_bits(),
            spins,
        })
    }

    /// Sends `opcode` and reads `out.len()` response bytes.
    ///
    /// # Errors
    /// [`SpiError::FifoOverflow`] if the response does not fit the FIFO
    /// alongside the opcode; [`SpiError::Timeout`] if the transfer never
    /// completes.
    pub fn read_register(&self, opcode: u8, out: &mut [u8], spins: usize) -> Result<(), SpiError> {
        Self::check_fifo(out.len())?;

        let csr = self.prepare(TranCsr::register_read());
        // The FIFO is only reachable in 32-bit units; keep the padding of an
        // address-less command from being flushed.
        self.bus
            .write::<u32>(SPIFMC_OPT, SPIFMC_OPT_NO_ADDR_FLUSH_DISABLE);

        self.bus.write::<u8>(SPIFMC_FIFO_PORT, opcode);
        for _ in 0..out.len() {
            self.bus.write::<u8>(SPIFMC_FIFO_PORT, 0);
        }

        self.set_transfer_length(out.len())?;
        self.go(csr);
        self.wait_for(SpifmcInterrupts::TRAN_DONE, spins)?;

        self.pop_fifo(out);
        self.bus.write::<u32>(SPIFMC_FIFO_PT, 0);
        trace!("spifmc: read register {opcode:#04x}: {out:02x?}");
        Ok(())
    }

    /// Sends `opcode` followed by `data`.
    ///
    /// `full_duplex` selects the status-register write setup, which also
    /// programs the transfer length.
    ///
    /// # Errors
    /// As [`read_register`](Self::read_register).
    pub fn write_register(
        &self,
        opcode: u8,
        data: &[u8],
        full_duplex: bool,
        spins: usize,
    ) -> Result<(), SpiError> {
        Self::check_fifo(data.len())?;

        let csr = self.prepare(TranCsr::register_write(full_duplex));
        if full_duplex {
            self.set_transfer_length(data.len())?;
        }

        self.bus.write::<u8>(SPIFMC_FIFO_PORT, opcode);
        self.push_fifo(data);

        self.go(csr);
        self.wait_for(SpifmcInterrupts::TRAN_DONE, spins)?;

        self.bus.write::<u32>(SPIFMC_FIFO_PT, 0);
        trace!("spifmc: wrote register {opcode:#04x}: {data:02x?}");
        Ok(())
    }

    /// Reads `out.len()` bytes of flash starting at `addr` with the read
    /// command `opcode`.
    ///
    /// The controller raises `RD_FIFO` unreliably for very short reads, so at
    /// least one full FIFO is always transferred and the surplus dropped.
    ///
    /// # Errors
    /// [`SpiError::AddressBytes`] for an address wider than 4 bytes;
    /// [`SpiError::Timeout`] or [`SpiError::FifoLevel`] if the controller
    /// stops delivering data.
    pub fn read_flash(
        &self,
        opcode: u8,
        addr: u32,
        addr_bytes: u8,
        out: &mut [u8],
        spins: usize,
    ) -> Result<(), SpiError> {
        let csr = self.command(TranCsr::flash_read(addr_bytes)?, opcode, addr, addr_bytes);

        let depth = usize::from(SPIFMC_MAX_FIFO_DEPTH);
        let len = out.len().max(depth);
        self.set_transfer_length(len)?;
        self.go(csr);
        self.wait_for(SpifmcInterrupts::RD_FIFO, spins)?;

        let mut offset = 0;
        while offset < len {
            let chunk = depth.min(len - offset);
            self.wait_fifo_level(chunk, spins)?;
            for i in offset..offset + chunk {
                let byte = self.bus.read::<u8>(SPIFMC_FIFO_PORT);
                if let Some(slot) = out.get_mut(i) {
                    *slot = byte;
                }
            }
            offset += chunk;
        }

        self.wait_for(SpifmcInterrupts::TRAN_DONE, spins)?;
        self.bus.write::<u32>(SPIFMC_FIFO_PT, 0);
        trace!("spifmc: read {} bytes at {addr:#x}", out.len());
        Ok(())
    }

    /// Programs `data` at `addr` with the program command `opcode`.
    ///
    /// The part must already be write enabled and `data` must not cross a
    /// page boundary.
    ///
    /// # Errors
    /// As [`read_flash`](Self::read_flash).
    pub fn write_flash(
        &self,
        opcode: u8,
        addr: u32,
        addr_bytes: u8,
        data: &[u8],
        spins: usize,
    ) -> Result<(), SpiError> {
        let csr = self.command(TranCsr::flash_write(addr_bytes)?, opcode, addr, addr_bytes);

        self.set_transfer_length(data.len())?;
        self.go(csr);

        // Command and address leave the FIFO first.
        self.wait_fifo_level(0, spins)?;
        self.bus.write::<u32>(SPIFMC_FIFO_PT, 0);

        for chunk in data.chunks(usize::from(SPIFMC_MAX_FIFO_DEPTH)) {
            self.wait_fifo_level(0, spins)?;
            self.push_fifo(chunk);
        }

        self.wait_for(SpifmcInterrupts::TRAN_DONE, spins)?;
        self.bus.write::<u32>(SPIFMC_FIFO_PT, 0);
        trace!("spifmc: wrote {} bytes at {addr:#x}", data.len());
        Ok(())
    }

    /// Erases the sector or block holding `addr` with the erase command
    /// `opcode`.
    ///
    /// # Errors
    /// [`SpiError::AddressBytes`] for an address wider than 4 bytes;
    /// [`SpiError::Timeout`] if the transfer never completes.
    pub fn erase(
        &self,
        opcode: u8,
        addr: u32,
        addr_bytes: u8,
        spins: usize,
    ) -> Result<(), SpiError> {
        let csr = self.command(TranCsr::flash_erase(addr_bytes)?, opcode, addr, addr_bytes);

        self.go(csr);
        self.wait_for(SpifmcInterrupts::TRAN_DONE, spins)?;

        self.bus.write::<u32>(SPIFMC_FIFO_PT, 0);
        debug!("spifmc: erased {addr:#x} with {opcode:#04x}");
        Ok(())
    }

    /// Polls `FIFO_PT` until the FIFO holds exactly `level` bytes.
    ///
    /// # Errors
    /// [`SpiError::FifoLevel`] if it never does within `spins` polls.
    pub fn wait_fifo_level(&self, level: usize, spins: usize) -> Result<(), SpiError> {
        for _ in 0..spins {
            if usize::from(self.fifo_level()) == level {
                return Ok(());
            }
            core::hint::spin_loop();
        }

        warn!("spifmc: FIFO never reached {level} bytes after {spins} polls");
        Err(SpiError::FifoLevel { level, spins })
    }

    /// Prepares `preset` and queues `opcode` and the big-endian address.
    ///
    /// `addr_bytes` has been validated by the preset constructor.
    fn command(&self, preset: TranCsr, opcode: u8, addr: u32, addr_bytes: u8) -> TranCsr {
        let csr = self.prepare(preset);
        let addr = addr.to_be_bytes();
        let skip = addr.len().saturating_sub(usize::from(addr_bytes));

        self.bus.write::<u8>(SPIFMC_FIFO_PORT, opcode);
        self.push_fifo(&addr[skip..]);
        csr
    }

    const fn check_fifo(len: usize) -> Result<(), SpiError> {
        if len >= SPIFMC_MAX_FIFO_DEPTH as usize {
            Err(SpiError::FifoOverflow(len))
        } else {
            Ok(())
        }
    }
}
