//! # Platform Configuration DXE Application
//!
//! Makes sure the `PlatformConfig` variable exists and holds a valid CPU
//! enable mask before later boot stages read it. On first boot the
//! variable is created with every CPU enabled.

#![no_std]
#![no_main]
#![allow(unsafe_code)]

mod logger;

use crate::logger::DxeLogger;
use log::{LevelFilter, error, info};
use platform_config::{MAX_CPUS, PlatformConfigStore, RuntimeVariableStore};
use uefi::prelude::*;

static LOGGER: DxeLogger = DxeLogger::new(LevelFilter::Debug);

#[entry]
fn efi_main() -> Status {
    if uefi::helpers::init().is_err() {
        return Status::UNSUPPORTED;
    }

    if LOGGER.install().is_err() {
        uefi::println!("Platform configuration: logger already installed");
        return Status::ALREADY_STARTED;
    }

    let mut store = PlatformConfigStore::new(RuntimeVariableStore);
    match store.load_or_init() {
        Ok(config) => {
            info!(
                "{} of {MAX_CPUS} CPUs enabled: {config}",
                config.enabled_count()
            );
            Status::SUCCESS
        }
        Err(e) => {
            error!("Platform configuration unavailable: {e}");
            e.status()
        }
    }
}
