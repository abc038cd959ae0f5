use crate::data::{PLATFORM_CONFIG_SIZE, PlatformConfigData};
use crate::request::{BlockRequest, ConfigHeader};
use crate::{
    ConfigError, PLATFORM_CONFIG_ATTRIBUTES, PLATFORM_CONFIG_GUID, PLATFORM_CONFIG_VARIABLE,
    StoreError,
};
use log::{debug, info, warn};
use uefi::runtime::{self, VariableAttributes, VariableVendor};
use uefi::{CStr16, Guid, Status};

/// Named, vendor-scoped variable storage.
pub trait VariableStore {
    /// Reads `name` into `buf`.
    ///
    /// Returns the variable's size, or `None` if it does not exist.
    ///
    /// # Errors
    /// [`StoreError::BufferTooSmall`] if `buf` cannot hold the value, or the
    /// underlying failure.
    fn read(&mut self, name: &CStr16, vendor: &Guid, buf: &mut [u8])
    -> Result<Option<usize>, StoreError>;

    /// Creates or replaces `name`.
    ///
    /// # Errors
    /// The underlying failure.
    fn write(
        &mut self,
        name: &CStr16,
        vendor: &Guid,
        attributes: VariableAttributes,
        data: &[u8],
    ) -> Result<(), StoreError>;
}

impl<S: VariableStore + ?Sized> VariableStore for &mut S {
    fn read(
        &mut self,
        name: &CStr16,
        vendor: &Guid,
        buf: &mut [u8],
    ) -> Result<Option<usize>, StoreError> {
        (**self).read(name, vendor, buf)
    }

    fn write(
        &mut self,
        name: &CStr16,
        vendor: &Guid,
        attributes: VariableAttributes,
        data: &[u8],
    ) -> Result<(), StoreError> {
        (**self).write(name, vendor, attributes, data)
    }
}

/// UEFI runtime services variables.
///
/// Only usable while the firmware's runtime services are.
#[derive(Debug, Default, Copy, Clone)]
pub struct RuntimeVariableStore;

impl VariableStore for RuntimeVariableStore {
    fn read(
        &mut self,
        name: &CStr16,
        vendor: &Guid,
        buf: &mut [u8],
    ) -> Result<Option<usize>, StoreError> {
        match runtime::get_variable(name, &VariableVendor(*vendor), buf) {
            Ok((data, _attributes)) => Ok(Some(data.len())),
            Err(e) if e.status() == Status::NOT_FOUND => Ok(None),
            Err(e) if e.status() == Status::BUFFER_TOO_SMALL => Err(StoreError::BufferTooSmall {
                needed: e.data().unwrap_or(0),
            }),
            Err(e) => Err(StoreError::Firmware(e.status())),
        }
    }

    fn write(
        &mut self,
        name: &CStr16,
        vendor: &Guid,
        attributes: VariableAttributes,
        data: &[u8],
    ) -> Result<(), StoreError> {
        runtime::set_variable(name, &VariableVendor(*vendor), attributes, data)
            .map_err(|e| StoreError::Firmware(e.status()))
    }
}

/// The `PlatformConfig` variable and its last known value.
pub struct PlatformConfigStore<S> {
    store: S,
    current: PlatformConfigData,
}

impl<S> PlatformConfigStore<S> {
    /// Wraps `store`; the cached value starts at the defaults until
    /// [`load_or_init`](Self::load_or_init) runs.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self {
            store,
            current: PlatformConfigData::all_enabled(),
        }
    }

    /// The value last loaded or written.
    #[must_use]
    pub const fn current(&self) -> PlatformConfigData {
        self.current
    }

    #[must_use]
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: VariableStore> PlatformConfigStore<S> {
    /// Reads the variable, or `None` if it does not exist.
    fn read_variable(&mut self) -> Result<Option<PlatformConfigData>, ConfigError> {
        let mut buf = [0u8; PLATFORM_CONFIG_SIZE];
        match self
            .store
            .read(PLATFORM_CONFIG_VARIABLE, &PLATFORM_CONFIG_GUID, &mut buf)?
        {
            Some(len) => {
                let bytes = buf.get(..len).ok_or(ConfigError::InvalidLength {
                    expected: PLATFORM_CONFIG_SIZE,
                    actual: len,
                })?;
                PlatformConfigData::from_bytes(bytes).map(Some)
            }
            None => Ok(None),
        }
    }

    fn write_variable(&mut self, data: PlatformConfigData) -> Result<(), ConfigError> {
        self.store.write(
            PLATFORM_CONFIG_VARIABLE,
            &PLATFORM_CONFIG_GUID,
            PLATFORM_CONFIG_ATTRIBUTES,
            &data.to_bytes(),
        )?;
        Ok(())
    }

    fn init_defaults(&mut self) -> Result<PlatformConfigData, ConfigError> {
        self.write_variable(PlatformConfigData::default())?;
        self.read_variable()?
            .ok_or(ConfigError::Store(StoreError::Firmware(Status::NOT_FOUND)))
    }

    /// Loads the stored configuration.
    ///
    /// If the variable cannot be read it is (re)created with the defaults
    /// and read back. An existing variable that does not hold a valid
    /// configuration is reported, not overwritten.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidLength`] or [`ConfigError::InvalidBoolean`] if
    ///   the stored value is malformed.
    /// - [`ConfigError::Store`] if the defaults cannot be written or read back.
    pub fn load_or_init(&mut self) -> Result<PlatformConfigData, ConfigError> {
        let config = match self.read_variable() {
            Ok(Some(config)) => {
                debug!("{PLATFORM_CONFIG_VARIABLE} loaded: {config}");
                config
            }
            Ok(None) => {
                info!("{PLATFORM_CONFIG_VARIABLE} not found; writing defaults");
                self.init_defaults()?
            }
            Err(ConfigError::Store(e)) => {
                warn!("{PLATFORM_CONFIG_VARIABLE} unreadable ({e}); writing defaults");
                self.init_defaults()?
            }
            Err(e) => {
                warn!("{PLATFORM_CONFIG_VARIABLE} is invalid: {e}");
                return Err(e);
            }
        };
        self.current = config;
        Ok(config)
    }

    /// Persists `data` as the new configuration.
    ///
    /// # Errors
    /// [`ConfigError::Store`] if the write fails.
    pub fn save(&mut self, data: PlatformConfigData) -> Result<(), ConfigError> {
        self.write_variable(data)?;
        self.current = data;
        debug!("{PLATFORM_CONFIG_VARIABLE} saved: {data}");
        Ok(())
    }

    /// Copies the requested block of the current configuration into `out`.
    ///
    /// `None` asks for the whole structure. Otherwise the request must be
    /// routed here by its `GUID` field; a request naming no block
    /// also selects everything.
    ///
    /// # Errors
    /// - [`ConfigError::HeaderMismatch`] for requests meant for another
    ///   store.
    /// - Any error of [`BlockRequest::parse`] or
    ///   [`PlatformConfigData::extract_block`].
    pub fn extract(&self, request: Option<&str>, out: &mut [u8]) -> Result<usize, ConfigError> {
        let block = match request {
            None => BlockRequest::whole(),
            Some(request) => {
                ConfigHeader::check(request)?;
                BlockRequest::parse(request)?
            }
        };

        self.current.extract_block(block, out)
    }

    /// Applies `data` to the requested block of the stored configuration
    /// and persists the result.
    ///
    /// The block is applied on top of the stored value, or the defaults if
    /// none is stored yet.
    ///
    /// # Errors
    /// - [`ConfigError::HeaderMismatch`] for requests meant for another
    ///   store.
    /// - Any error of [`BlockRequest::parse`] or
    ///   [`PlatformConfigData::apply_block`].
    /// - [`ConfigError::Store`] if reading or writing the variable fails.
    pub fn route(&mut self, request: &str, data: &[u8]) -> Result<PlatformConfigData, ConfigError> {
        ConfigHeader::check(request)?;
        let block = BlockRequest::parse(request)?;

        let mut config = self.read_variable()?.unwrap_or_default();
        config.apply_block(block, data)?;
        self.write_variable(config)?;

        self.current = config;
        debug!("{PLATFORM_CONFIG_VARIABLE} routed {block}: {config}");
        Ok(config)
    }
}
