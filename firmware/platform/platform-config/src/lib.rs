//! # Platform Configuration
//!
//! The `PlatformConfig` UEFI variable records which of the platform's CPUs
//! are brought up. It lives under [`PLATFORM_CONFIG_GUID`] as the 8-byte
//! [`PlatformConfigData`] image and backs an HII form through varstore
//! [`CONFIGURATION_VARSTORE_ID`].
//!
//! ```text
//!  offset  0    1    2    3    4    5    6    7
//!        ┌────┬────┬────┬────┬────┬────┬────┬────┐
//!        │cpu0│cpu1│cpu2│cpu3│cpu4│cpu5│cpu6│cpu7│   0 = off, 1 = on
//!        └────┴────┴────┴────┴────┴────┴────┴────┘
//! ```
//!
//! [`PlatformConfigStore`] loads the variable (writing defaults on first
//! boot) and services block-level extract and route requests against it.
//! Storage goes through the [`VariableStore`] trait; on firmware that is
//! [`RuntimeVariableStore`].

#![cfg_attr(not(any(test, doctest)), no_std)]

mod data;
mod request;
mod store;

pub use data::{PLATFORM_CONFIG_SIZE, PlatformConfigData};
pub use request::{BlockRequest, ConfigHeader};
pub use store::{PlatformConfigStore, RuntimeVariableStore, VariableStore};

use uefi::runtime::VariableAttributes;
use uefi::{CStr16, Guid, Status, cstr16, guid};

/// Vendor GUID of the `PlatformConfig` variable.
pub const PLATFORM_CONFIG_GUID: Guid = guid!("f97637d5-a725-4dbd-a180-d9554920545d");

/// Varstore id the configuration form refers to.
pub const CONFIGURATION_VARSTORE_ID: u16 = 0x1234;

/// Number of CPUs the configuration can describe.
pub const MAX_CPUS: usize = 8;

pub const PLATFORM_CONFIG_VARIABLE: &CStr16 = cstr16!("PlatformConfig");

/// Non-volatile, visible only during boot services.
pub const PLATFORM_CONFIG_ATTRIBUTES: VariableAttributes =
    VariableAttributes::NON_VOLATILE.union(VariableAttributes::BOOTSERVICE_ACCESS);

/// Failures of the backing variable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("variable needs a {needed} byte buffer")]
    BufferTooSmall { needed: usize },
    #[error("firmware returned {0:?}")]
    Firmware(Status),
}

impl StoreError {
    /// The UEFI status this error corresponds to.
    #[must_use]
    pub const fn status(self) -> Status {
        match self {
            Self::BufferTooSmall { .. } => Status::BUFFER_TOO_SMALL,
            Self::Firmware(status) => status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("CPU index {0} is out of range (max {MAX_CPUS})")]
    CpuOutOfRange(usize),
    #[error("expected {expected} bytes of configuration, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("byte {index} holds {value:#04x}, not a boolean")]
    InvalidBoolean { index: usize, value: u8 },
    #[error("block at offset {offset} width {width} leaves the configuration")]
    BlockOutOfRange { offset: usize, width: usize },
    #[error("output buffer needs {needed} bytes")]
    BufferTooSmall { needed: usize },
    #[error("request does not carry a valid OFFSET/WIDTH block")]
    MalformedRequest,
    #[error("request is not addressed to the platform configuration")]
    HeaderMismatch,
    #[error("variable store: {0}")]
    Store(#[from] StoreError),
}

impl ConfigError {
    /// The UEFI status a configuration access reports for this error.
    #[must_use]
    pub const fn status(self) -> Status {
        match self {
            Self::HeaderMismatch => Status::NOT_FOUND,
            Self::BufferTooSmall { .. } => Status::BUFFER_TOO_SMALL,
            Self::Store(e) => e.status(),
            Self::CpuOutOfRange(_)
            | Self::InvalidLength { .. }
            | Self::InvalidBoolean { .. }
            | Self::BlockOutOfRange { .. }
            | Self::MalformedRequest => Status::INVALID_PARAMETER,
        }
    }
}

impl From<ConfigError> for Status {
    fn from(e: ConfigError) -> Self {
        e.status()
    }
}
