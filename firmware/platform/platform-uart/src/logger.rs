use crate::uart::SifiveUart;
use core::fmt::Write;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use platform_mmio::RegisterBus;

/// [`log`] sink writing `[LEVEL] target: message` lines to a [`SifiveUart`].
pub struct UartLogger<B> {
    uart: SifiveUart<B>,
    max_level: LevelFilter,
}

impl<B> UartLogger<B> {
    #[must_use]
    pub const fn new(uart: SifiveUart<B>, max_level: LevelFilter) -> Self {
        Self { uart, max_level }
    }

    #[must_use]
    pub const fn uart(&self) -> &SifiveUart<B> {
        &self.uart
    }

    #[must_use]
    pub const fn max_level(&self) -> LevelFilter {
        self.max_level
    }
}

impl<B: RegisterBus> UartLogger<B> {
    /// Formats `record` onto the UART, ignoring the level filter.
    pub fn emit(&self, record: &Record) {
        // The UART cannot fail a write; a formatting error only truncates the line.
        let _ = writeln!(
            self.uart.writer(),
            "[{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        );
    }
}

impl<B: RegisterBus + Send + Sync + 'static> UartLogger<B> {
    /// Registers `logger` as the global logger. Call this once during early init.
    ///
    /// # Errors
    /// Fails if a logger has already been installed.
    pub fn install(logger: &'static Self) -> Result<(), SetLoggerError> {
        log::set_logger(logger)?;
        log::set_max_level(logger.max_level);
        Ok(())
    }
}

impl<B: RegisterBus + Send + Sync> Log for UartLogger<B> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.emit(record);
    }

    fn flush(&self) {
        // Bytes leave the TX FIFO on their own.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::{TxData, UART_REG_TXFIFO};
    use log::Level;
    use platform_mmio::RegisterWidth;
    use platform_mmio::testing::RegisterFile;
    use std::sync::Mutex;

    fn sent(regs: &RegisterFile) -> String {
        regs.writes_to(UART_REG_TXFIFO)
            .into_iter()
            .map(|v| char::from(u8::try_from(v).unwrap()))
            .collect()
    }

    #[test]
    fn emit_formats_level_and_target() {
        let regs = RegisterFile::new();
        let logger = UartLogger::new(SifiveUart::new(&regs), LevelFilter::Info);

        logger.emit(
            &Record::builder()
                .args(format_args!("cpu{} enabled", 3))
                .level(Level::Info)
                .target("platform")
                .build(),
        );

        assert_eq!(sent(&regs), "[INFO] platform: cpu3 enabled\n");
    }

    /// Thread-safe TX capture; `Log` needs a `Sync` bus.
    #[derive(Default)]
    struct TxCapture(Mutex<Vec<u8>>);

    impl RegisterBus for TxCapture {
        fn read<T: RegisterWidth>(&self, _offset: usize) -> T {
            T::from_raw(0)
        }

        fn write<T: RegisterWidth>(&self, offset: usize, value: T) {
            if offset == UART_REG_TXFIFO {
                let byte = TxData::from_bits(u32::try_from(value.to_raw()).unwrap()).data();
                self.0.lock().unwrap().push(byte);
            }
        }
    }

    impl TxCapture {
        fn sent(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn level_filter_is_kept() {
        let tx = TxCapture::default();
        let logger = UartLogger::new(SifiveUart::new(&tx), LevelFilter::Warn);
        assert_eq!(logger.max_level(), LevelFilter::Warn);

        assert!(!logger.enabled(&Metadata::builder().level(Level::Debug).build()));
        logger.log(
            &Record::builder()
                .args(format_args!("noise"))
                .level(Level::Debug)
                .target("platform")
                .build(),
        );
        assert!(tx.sent().is_empty());

        logger.log(
            &Record::builder()
                .args(format_args!("variable lost"))
                .level(Level::Error)
                .target("platform")
                .build(),
        );
        assert_eq!(tx.sent(), "[ERROR] platform: variable lost\n");
    }
}
