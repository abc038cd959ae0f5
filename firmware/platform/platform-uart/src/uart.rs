use crate::registers::{
    RxCtrl, RxData, TxCtrl, TxData, UART_REG_DIV, UART_REG_IE, UART_REG_RXCTRL, UART_REG_RXFIFO,
    UART_REG_TXCTRL, UART_REG_TXFIFO, min_clk_divisor,
};
use core::fmt;
use platform_mmio::RegisterBus;

/// Polled driver for one `SiFive` UART instance.
///
/// All operations take `&self`; the UART is a shared output device and the
/// driver holds no state besides the register bus.
pub struct SifiveUart<B> {
    bus: B,
}

impl<B> SifiveUart<B> {
    #[must_use]
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    #[must_use]
    pub fn into_inner(self) -> B {
        self.bus
    }
}

impl<B: RegisterBus> SifiveUart<B> {
    /// Programs the baud divisor, masks interrupts and enables both directions.
    ///
    /// With an `input_hz` of zero the divisor is left as configured by earlier
    /// boot stages.
    pub fn init(&self, input_hz: u64, baud: u64) {
        if input_hz != 0 {
            self.bus
                .write::<u32>(UART_REG_DIV, min_clk_divisor(input_hz, baud));
        }

        self.bus.write::<u32>(UART_REG_IE, 0);
        self.bus
            .write::<u32>(UART_REG_TXCTRL, TxCtrl::new().with_txen(true).into_bits());
        self.bus
            .write::<u32>(UART_REG_RXCTRL, RxCtrl::new().with_rxen(true).into_bits());
    }

    /// Currently programmed baud divisor.
    #[must_use]
    pub fn divisor(&self) -> u32 {
        self.bus.read::<u32>(UART_REG_DIV)
    }

    #[must_use]
    pub fn tx_full(&self) -> bool {
        TxData::from_bits(self.bus.read::<u32>(UART_REG_TXFIFO)).full()
    }

    /// Blocks until the transmit FIFO has room, then enqueues `byte`.
    pub fn putc(&self, byte: u8) {
        while self.tx_full() {
            core::hint::spin_loop();
        }
        self.bus
            .write::<u32>(UART_REG_TXFIFO, TxData::new().with_data(byte).into_bits());
    }

    /// Dequeues one received byte, if any.
    pub fn getc(&self) -> Option<u8> {
        let rx = RxData::from_bits(self.bus.read::<u32>(UART_REG_RXFIFO));
        if rx.empty() { None } else { Some(rx.data()) }
    }

    pub fn write_bytes(&self, bytes: &[u8]) {
        for &b in bytes {
            self.putc(b);
        }
    }

    /// A [`fmt::Write`] adapter borrowing this UART.
    #[must_use]
    pub const fn writer(&self) -> UartWriter<'_, B> {
        UartWriter { uart: self }
    }
}

/// [`fmt::Write`] adapter for a shared [`SifiveUart`].
pub struct UartWriter<'a, B> {
    uart: &'a SifiveUart<B>,
}

impl<B: RegisterBus> fmt::Write for UartWriter<'_, B> {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.uart.write_bytes(s.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;
    use platform_mmio::testing::RegisterFile;

    #[test]
    fn init_programs_divisor_and_enables() {
        let regs = RegisterFile::new();
        let uart = SifiveUart::new(&regs);
        uart.init(125_000_000, 115_200);

        assert_eq!(uart.divisor(), 1085);
        assert_eq!(regs.peek(UART_REG_IE), 0);
        assert_eq!(regs.peek(UART_REG_TXCTRL), 1);
        assert_eq!(regs.peek(UART_REG_RXCTRL), 1);
    }

    #[test]
    fn init_without_clock_keeps_divisor() {
        let regs = RegisterFile::new();
        regs.preset::<u32>(UART_REG_DIV, 42);
        SifiveUart::new(&regs).init(0, 115_200);

        assert_eq!(regs.peek(UART_REG_DIV), 42);
        assert!(regs.writes_to(UART_REG_DIV).is_empty());
    }

    #[test]
    fn putc_enqueues_bytes() {
        let regs = RegisterFile::new();
        let uart = SifiveUart::new(&regs);
        uart.write_bytes(b"ok");

        assert_eq!(regs.writes_to(UART_REG_TXFIFO), vec![u64::from(b'o'), u64::from(b'k')]);
    }

    #[test]
    fn getc_respects_empty_flag() {
        let regs = RegisterFile::new();
        let uart = SifiveUart::new(&regs);

        regs.preset::<u32>(UART_REG_RXFIFO, 0x8000_0000);
        assert_eq!(uart.getc(), None);

        regs.preset::<u32>(UART_REG_RXFIFO, u32::from(b'x'));
        assert_eq!(uart.getc(), Some(b'x'));
    }

    #[test]
    fn formatted_output() {
        let regs = RegisterFile::new();
        let uart = SifiveUart::new(&regs);
        write!(uart.writer(), "{}-{:02x}", 7, 10).unwrap();

        let sent: Vec<u8> = regs
            .writes_to(UART_REG_TXFIFO)
            .into_iter()
            .map(|v| u8::try_from(v).unwrap())
            .collect();
        assert_eq!(sent, b"7-0a");
    }
}
