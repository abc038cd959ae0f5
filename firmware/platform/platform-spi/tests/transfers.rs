use platform_mmio::testing::RegisterFile;
use platform_mmio::{RegisterBus, RegisterWidth};
use platform_spi::{
    SPIFMC_CE_CTRL, SPIFMC_CTRL, SPIFMC_DMMR, SPIFMC_FIFO_PORT, SPIFMC_FIFO_PT, SPIFMC_INT_STS,
    SPIFMC_OPT, SPIFMC_TRAN_CSR, SPIFMC_TRAN_NUM, SpiError, Spifmc, SpifmcCtrl, SpifmcInterrupts,
    TranCsr, TransferMode,
};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// Register file that completes a transfer as soon as `GO_BUSY` is written
/// and serves queued bytes from the FIFO port.
///
/// While a receive transfer runs, `FIFO_PT` reports up to a FIFO worth of the
/// queued bytes; while a transmit transfer runs it reports `tx_level`.
#[derive(Default)]
struct FakeController {
    regs: RegisterFile,
    rx: RefCell<VecDeque<u8>>,
    running: Cell<Option<TransferMode>>,
    tx_level: u8,
    stuck: bool,
}

impl RegisterBus for FakeController {
    fn read<T: RegisterWidth>(&self, offset: usize) -> T {
        if offset == SPIFMC_FIFO_PORT {
            let byte = self.rx.borrow_mut().pop_front().unwrap_or(0xFF);
            return T::from_raw(u64::from(byte));
        }
        if offset == SPIFMC_FIFO_PT {
            match self.running.get() {
                Some(TransferMode::Rx) => {
                    let level = self.rx.borrow().len().min(8);
                    return T::from_raw(u64::try_from(level).unwrap());
                }
                Some(TransferMode::Tx) => return T::from_raw(u64::from(self.tx_level)),
                _ => {}
            }
        }
        self.regs.read(offset)
    }

    fn write<T: RegisterWidth>(&self, offset: usize, value: T) {
        self.regs.write(offset, value);
        if offset != SPIFMC_TRAN_CSR {
            return;
        }

        let csr = TranCsr::from_bits(u32::try_from(value.to_raw()).unwrap());
        if csr.go_busy() {
            self.running.set(Some(csr.tran_mode()));
            if !self.stuck {
                let mut status = SpifmcInterrupts::TRAN_DONE;
                if csr.tran_mode() == TransferMode::Rx {
                    status = status.with_rd_fifo(true);
                }
                self.regs.preset::<u32>(SPIFMC_INT_STS, status.into_bits());
            }
        }
    }
}

#[test]
fn setup_programs_register_mode() {
    let fake = FakeController::default();
    fake.regs.preset::<u32>(SPIFMC_CTRL, 0x0000_07FF | (1 << 13));
    fake.regs.preset::<u32>(SPIFMC_DMMR, 1);

    let spi = Spifmc::new(&fake);
    spi.setup(3).unwrap();

    assert_eq!(fake.regs.peek(SPIFMC_DMMR), 0);
    assert_eq!(fake.regs.peek(SPIFMC_CE_CTRL), 0);

    let ctrl = SpifmcCtrl::from_bits(u32::try_from(fake.regs.peek(SPIFMC_CTRL)).unwrap());
    assert_eq!(ctrl.sck_div(), 3);
    assert!(ctrl.srst());
    assert!(ctrl.cpol());

    // addr bytes, 4-byte trigger level, with command
    assert_eq!(fake.regs.peek(SPIFMC_TRAN_CSR), 0x2B00);
    assert_eq!(spi.setup(9), Err(SpiError::AddressBytes(9)));
}

#[test]
fn clock_divider_bounds() {
    let fake = FakeController::default();
    let spi = Spifmc::new(&fake);

    spi.set_clock_divider(0x7FF).unwrap();
    assert_eq!(spi.clock_divider(), 0x7FF);
    assert_eq!(spi.set_clock_divider(0x800), Err(SpiError::ClockDivider(0x800)));
    assert_eq!(spi.clock_divider(), 0x7FF);
}

#[test]
fn prepare_clears_stale_transfer_fields() {
    let fake = FakeController::default();
    fake.regs.preset::<u32>(SPIFMC_TRAN_CSR, 0x3FFF);
    fake.regs.preset::<u32>(SPIFMC_FIFO_PT, 5);

    let spi = Spifmc::new(&fake);
    let csr = spi.prepare(TranCsr::flash_read(4).unwrap());

    assert_eq!(csr.tran_mode(), TransferMode::Rx);
    assert_eq!(csr.addr_bytes(), 4);
    assert!(csr.miso_level());
    assert!(!csr.dma_en());
    assert_eq!(spi.fifo_level(), 0);
}

#[test]
fn read_register_sequence() {
    let fake = FakeController::default();
    fake.rx.borrow_mut().extend([0xC2, 0x20, 0x18]);

    let spi = Spifmc::new(&fake);
    let mut id = [0u8; 3];
    spi.read_register(0x9F, &mut id, 10).unwrap();

    assert_eq!(id, [0xC2, 0x20, 0x18]);
    assert_eq!(fake.regs.writes_to(SPIFMC_FIFO_PORT), vec![0x9F, 0, 0, 0]);
    assert_eq!(fake.regs.writes_to(SPIFMC_TRAN_NUM), vec![3]);
    assert_eq!(fake.regs.writes_to(SPIFMC_OPT), vec![2]);
    assert_eq!(fake.regs.writes_to(SPIFMC_TRAN_CSR), vec![0x8803]);
    assert_eq!(fake.regs.writes_to(SPIFMC_FIFO_PT), vec![0, 0]);
}

#[test]
fn write_register_without_data_phase() {
    let fake = FakeController::default();
    let spi = Spifmc::new(&fake);

    spi.write_register(0x06, &[], false, 10).unwrap();
    assert_eq!(fake.regs.writes_to(SPIFMC_FIFO_PORT), vec![0x06]);
    assert!(fake.regs.writes_to(SPIFMC_TRAN_NUM).is_empty());
    assert_eq!(fake.regs.writes_to(SPIFMC_TRAN_CSR), vec![0x8800]);
}

#[test]
fn status_register_write_is_full_duplex() {
    let fake = FakeController::default();
    let spi = Spifmc::new(&fake);

    spi.write_register(0x01, &[0x00, 0x02], true, 10).unwrap();
    assert_eq!(fake.regs.writes_to(SPIFMC_FIFO_PORT), vec![0x01, 0x00, 0x02]);
    assert_eq!(fake.regs.writes_to(SPIFMC_TRAN_NUM), vec![2]);
    assert_eq!(fake.regs.writes_to(SPIFMC_TRAN_CSR), vec![0x8803]);
}

#[test]
fn oversized_register_access_is_rejected() {
    let fake = FakeController::default();
    let spi = Spifmc::new(&fake);

    let mut buf = [0u8; 8];
    assert_eq!(spi.read_register(0x9F, &mut buf, 10), Err(SpiError::FifoOverflow(8)));
    assert!(fake.regs.writes().is_empty());
}

#[test]
fn stuck_transfer_times_out() {
    let fake = FakeController {
        stuck: true,
        ..FakeController::default()
    };
    let spi = Spifmc::new(&fake);

    let mut status = [0u8; 1];
    assert_eq!(
        spi.read_register(0x05, &mut status, 16),
        Err(SpiError::Timeout {
            mask: 1,
            spins: 16
        })
    );
}

#[test]
fn flash_read_drains_the_fifo_in_chunks() {
    let fake = FakeController::default();
    fake.rx.borrow_mut().extend(0u8..11);

    let spi = Spifmc::new(&fake);
    let mut data = [0u8; 11];
    spi.read_flash(0x03, 0x0012_3456, 3, &mut data, 10).unwrap();

    assert_eq!(data, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    assert_eq!(fake.regs.writes_to(SPIFMC_FIFO_PORT), vec![0x03, 0x12, 0x34, 0x56]);
    assert_eq!(fake.regs.writes_to(SPIFMC_TRAN_NUM), vec![11]);
    assert_eq!(fake.regs.writes_to(SPIFMC_TRAN_CSR), vec![0xBB01]);
    assert_eq!(fake.regs.writes_to(SPIFMC_FIFO_PT), vec![0, 0]);
    assert!(fake.rx.borrow().is_empty());
}

#[test]
fn short_flash_read_moves_a_full_fifo() {
    let fake = FakeController::default();
    fake.rx.borrow_mut().extend([0xAA, 0xBB, 1, 2, 3, 4, 5, 6]);

    let spi = Spifmc::new(&fake);
    let mut data = [0u8; 2];
    spi.read_flash(0x13, 0x0100_0000, 4, &mut data, 10).unwrap();

    assert_eq!(data, [0xAA, 0xBB]);
    assert_eq!(fake.regs.writes_to(SPIFMC_TRAN_NUM), vec![8]);
    assert_eq!(fake.regs.writes_to(SPIFMC_FIFO_PORT), vec![0x13, 0x01, 0x00, 0x00, 0x00]);
    assert!(fake.rx.borrow().is_empty());
}

#[test]
fn starved_flash_read_times_out() {
    let fake = FakeController::default();
    fake.rx.borrow_mut().extend([1, 2, 3, 4]);

    let spi = Spifmc::new(&fake);
    let mut data = [0u8; 8];
    assert_eq!(
        spi.read_flash(0x03, 0, 3, &mut data, 16),
        Err(SpiError::FifoLevel { level: 8, spins: 16 })
    );

    let fake = FakeController {
        stuck: true,
        ..FakeController::default()
    };
    let spi = Spifmc::new(&fake);
    assert_eq!(
        spi.read_flash(0x03, 0, 3, &mut data, 16),
        Err(SpiError::Timeout {
            mask: SpifmcInterrupts::RD_FIFO.into_bits(),
            spins: 16
        })
    );
}

#[test]
fn flash_write_fills_the_fifo_in_chunks() {
    let fake = FakeController::default();
    let spi = Spifmc::new(&fake);

    let data: Vec<u8> = (0x10..0x1A).collect();
    spi.write_flash(0x02, 0x0000_2000, 3, &data, 10).unwrap();

    let mut expected = vec![0x02, 0x00, 0x20, 0x00];
    expected.extend(data.iter().map(|&b| u64::from(b)));
    assert_eq!(fake.regs.writes_to(SPIFMC_FIFO_PORT), expected);
    assert_eq!(fake.regs.writes_to(SPIFMC_TRAN_NUM), vec![10]);
    assert_eq!(fake.regs.writes_to(SPIFMC_TRAN_CSR), vec![0xBB02]);
    // prepare, after the command, after the data
    assert_eq!(fake.regs.writes_to(SPIFMC_FIFO_PT), vec![0, 0, 0]);
}

#[test]
fn flash_write_waits_for_fifo_space() {
    let fake = FakeController {
        tx_level: 8,
        ..FakeController::default()
    };
    let spi = Spifmc::new(&fake);

    assert_eq!(
        spi.write_flash(0x02, 0, 3, &[0xFF; 4], 16),
        Err(SpiError::FifoLevel { level: 0, spins: 16 })
    );
    // only command and address made it out
    assert_eq!(fake.regs.writes_to(SPIFMC_FIFO_PORT).len(), 4);
}

#[test]
fn erase_sends_command_and_address_only() {
    let fake = FakeController::default();
    let spi = Spifmc::new(&fake);

    spi.erase(0xDC, 0x0012_3456, 4, 10).unwrap();

    assert_eq!(fake.regs.writes_to(SPIFMC_FIFO_PORT), vec![0xDC, 0x00, 0x12, 0x34, 0x56]);
    assert!(fake.regs.writes_to(SPIFMC_TRAN_NUM).is_empty());
    assert_eq!(fake.regs.writes_to(SPIFMC_TRAN_CSR), vec![0x8C00]);
    assert_eq!(spi.erase(0xDC, 0, 5, 10), Err(SpiError::AddressBytes(5)));
}
