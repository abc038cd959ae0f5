use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

#[cfg(feature = "uart-log")]
use platform_mmio::{Mmio, PhysicalAddress};
#[cfg(feature = "uart-log")]
use platform_uart::{SifiveUart, U7_UART0_BASE, UartLogger};

/// Logs to the UEFI console and, with `uart-log`, to the first U7 UART.
pub struct DxeLogger {
    max_level: LevelFilter,
    #[cfg(feature = "uart-log")]
    uart: UartLogger<Mmio>,
}

impl DxeLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self {
            max_level,
            #[cfg(feature = "uart-log")]
            // SAFETY: UART0 is identity mapped while boot services run and
            // nothing else in this image drives it.
            uart: UartLogger::new(
                SifiveUart::new(unsafe { Mmio::new(PhysicalAddress::new(U7_UART0_BASE)) }),
                max_level,
            ),
        }
    }

    /// Registers `self` as the global logger. Call this once during early init.
    ///
    /// # Errors
    /// Fails if a logger has already been installed.
    pub fn install(&'static self) -> Result<(), SetLoggerError> {
        // Input clock 0 keeps whatever divisor earlier firmware programmed.
        #[cfg(feature = "uart-log")]
        self.uart.uart().init(0, 115_200);

        log::set_logger(self)?;
        log::set_max_level(self.max_level);
        Ok(())
    }
}

impl Log for DxeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        #[cfg(feature = "uart-log")]
        self.uart.emit(record);

        uefi::println!(
            "[{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}
