use crate::request::BlockRequest;
use crate::{ConfigError, MAX_CPUS};
use core::fmt;

/// Which CPUs the platform brings up.
///
/// Stored verbatim as the `PlatformConfig` variable: one byte per CPU,
/// `0` or `1`, no padding.
#[repr(C, packed)]
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct PlatformConfigData {
    cpu_enable: [bool; MAX_CPUS],
}

/// Size of the variable in bytes.
pub const PLATFORM_CONFIG_SIZE: usize = size_of::<PlatformConfigData>();

const _: () = {
    assert!(PLATFORM_CONFIG_SIZE == MAX_CPUS);
    assert!(align_of::<PlatformConfigData>() == 1);
};

impl PlatformConfigData {
    /// Every CPU enabled; the value written on first boot.
    #[must_use]
    pub const fn all_enabled() -> Self {
        Self {
            cpu_enable: [true; MAX_CPUS],
        }
    }

    /// Every CPU disabled.
    #[must_use]
    pub const fn all_disabled() -> Self {
        Self {
            cpu_enable: [false; MAX_CPUS],
        }
    }

    #[must_use]
    pub const fn from_mask(cpu_enable: [bool; MAX_CPUS]) -> Self {
        Self { cpu_enable }
    }

    #[must_use]
    pub const fn mask(&self) -> [bool; MAX_CPUS] {
        self.cpu_enable
    }

    /// `None` for `cpu >= MAX_CPUS`.
    #[must_use]
    pub const fn cpu_enabled(&self, cpu: usize) -> Option<bool> {
        if cpu < MAX_CPUS {
            let mask = self.cpu_enable;
            Some(mask[cpu])
        } else {
            None
        }
    }

    /// # Errors
    /// [`ConfigError::CpuOutOfRange`] for `cpu >= MAX_CPUS`.
    pub const fn set_cpu_enabled(&mut self, cpu: usize, enabled: bool) -> Result<(), ConfigError> {
        if cpu >= MAX_CPUS {
            return Err(ConfigError::CpuOutOfRange(cpu));
        }
        let mut mask = self.cpu_enable;
        mask[cpu] = enabled;
        self.cpu_enable = mask;
        Ok(())
    }

    /// Indices of the enabled CPUs, ascending.
    pub fn enabled_cpus(&self) -> impl Iterator<Item = usize> + use<> {
        let mask = self.cpu_enable;
        (0..MAX_CPUS).filter(move |&cpu| mask[cpu])
    }

    #[must_use]
    pub fn enabled_count(&self) -> usize {
        self.enabled_cpus().count()
    }

    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn to_bytes(&self) -> [u8; PLATFORM_CONFIG_SIZE] {
        let mask = self.cpu_enable;
        let mut bytes = [0u8; PLATFORM_CONFIG_SIZE];
        let mut cpu = 0;
        while cpu < MAX_CPUS {
            bytes[cpu] = mask[cpu] as u8;
            cpu += 1;
        }
        bytes
    }

    /// Parses the stored variable image.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidLength`] unless `bytes` is exactly
    ///   [`PLATFORM_CONFIG_SIZE`] long.
    /// - [`ConfigError::InvalidBoolean`] for any byte other than `0` or `1`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() != PLATFORM_CONFIG_SIZE {
            return Err(ConfigError::InvalidLength {
                expected: PLATFORM_CONFIG_SIZE,
                actual: bytes.len(),
            });
        }

        let mut config = Self::all_disabled();
        config.write_bytes(0, bytes)?;
        Ok(config)
    }

    /// Copies the bytes `request` names into `out`, returning how many.
    ///
    /// # Errors
    /// - [`ConfigError::BlockOutOfRange`] if the block leaves the structure.
    /// - [`ConfigError::BufferTooSmall`] if `out` cannot hold it.
    pub fn extract_block(&self, request: BlockRequest, out: &mut [u8]) -> Result<usize, ConfigError> {
        let range = request.range_within(PLATFORM_CONFIG_SIZE)?;
        if out.len() < range.len() {
            return Err(ConfigError::BufferTooSmall {
                needed: range.len(),
            });
        }

        let len = range.len();
        let bytes = self.to_bytes();
        out[..len].copy_from_slice(&bytes[range]);
        Ok(len)
    }

    /// Overwrites the bytes `request` names with `data`.
    ///
    /// Nothing changes unless every byte is a valid boolean.
    ///
    /// # Errors
    /// - [`ConfigError::BlockOutOfRange`] if the block leaves the structure.
    /// - [`ConfigError::InvalidLength`] if `data` is not as wide as the block.
    /// - [`ConfigError::InvalidBoolean`] for any byte other than `0` or `1`.
    pub fn apply_block(&mut self, request: BlockRequest, data: &[u8]) -> Result<(), ConfigError> {
        let range = request.range_within(PLATFORM_CONFIG_SIZE)?;
        if data.len() != range.len() {
            return Err(ConfigError::InvalidLength {
                expected: range.len(),
                actual: data.len(),
            });
        }

        let mut updated = *self;
        updated.write_bytes(range.start, data)?;
        *self = updated;
        Ok(())
    }

    fn write_bytes(&mut self, offset: usize, data: &[u8]) -> Result<(), ConfigError> {
        let mut mask = self.cpu_enable;
        for (i, &value) in data.iter().enumerate() {
            let index = offset + i;
            mask[index] = match value {
                0 => false,
                1 => true,
                _ => return Err(ConfigError::InvalidBoolean { index, value }),
            };
        }
        self.cpu_enable = mask;
        Ok(())
    }
}

impl Default for PlatformConfigData {
    fn default() -> Self {
        Self::all_enabled()
    }
}

impl fmt::Debug for PlatformConfigData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = self.cpu_enable;
        f.debug_struct("PlatformConfigData")
            .field("cpu_enable", &mask)
            .finish()
    }
}

/// Lists the enabled CPUs, e.g. `cpu0 cpu1 cpu4`, or `none`.
impl fmt::Display for PlatformConfigData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut any = false;
        for cpu in self.enabled_cpus() {
            if any {
                f.write_str(" ")?;
            }
            write!(f, "cpu{cpu}")?;
            any = true;
        }
        if !any {
            f.write_str("none")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexing_is_bounded_by_max_cpus() {
        let mut config = PlatformConfigData::all_enabled();
        assert_eq!(config.cpu_enabled(7), Some(true));
        assert_eq!(config.cpu_enabled(8), None);

        assert!(config.set_cpu_enabled(7, false).is_ok());
        assert_eq!(config.cpu_enabled(7), Some(false));
        assert_eq!(config.set_cpu_enabled(8, false), Err(ConfigError::CpuOutOfRange(8)));
    }

    #[test]
    fn enabled_cpus() {
        let mut config = PlatformConfigData::all_disabled();
        config.set_cpu_enabled(1, true).unwrap();
        config.set_cpu_enabled(4, true).unwrap();

        assert_eq!(config.enabled_cpus().collect::<Vec<_>>(), vec![1, 4]);
        assert_eq!(config.enabled_count(), 2);
        assert_eq!(config.to_string(), "cpu1 cpu4");
        assert_eq!(PlatformConfigData::all_disabled().to_string(), "none");
    }

    #[test]
    fn defaults_enable_everything() {
        assert_eq!(PlatformConfigData::default().enabled_count(), MAX_CPUS);
        assert_eq!(PlatformConfigData::default().to_bytes(), [1; 8]);
    }

    #[test]
    fn from_bytes_is_strict() {
        assert_eq!(
            PlatformConfigData::from_bytes(&[1; 7]),
            Err(ConfigError::InvalidLength {
                expected: 8,
                actual: 7
            })
        );
        assert_eq!(
            PlatformConfigData::from_bytes(&[1, 0, 1, 0, 2, 0, 0, 0]),
            Err(ConfigError::InvalidBoolean { index: 4, value: 2 })
        );
        let config = PlatformConfigData::from_bytes(&[1, 0, 1, 0, 0, 0, 0, 1]).unwrap();
        assert_eq!(config.enabled_cpus().collect::<Vec<_>>(), vec![0, 2, 7]);
    }

    #[test]
    fn block_access() {
        let mut config = PlatformConfigData::all_disabled();
        config
            .apply_block(BlockRequest::new(2, 3), &[1, 1, 0])
            .unwrap();
        assert_eq!(config.to_bytes(), [0, 0, 1, 1, 0, 0, 0, 0]);

        let mut out = [0xAA; 4];
        assert_eq!(config.extract_block(BlockRequest::new(1, 3), &mut out), Ok(3));
        assert_eq!(out, [0, 1, 1, 0xAA]);
    }

    #[test]
    fn block_errors_leave_data_alone() {
        let mut config = PlatformConfigData::all_disabled();

        assert_eq!(
            config.apply_block(BlockRequest::new(6, 3), &[1, 1, 1]),
            Err(ConfigError::BlockOutOfRange { offset: 6, width: 3 })
        );
        assert_eq!(
            config.apply_block(BlockRequest::new(0, 3), &[1, 1, 9]),
            Err(ConfigError::InvalidBoolean { index: 2, value: 9 })
        );
        assert_eq!(
            config.apply_block(BlockRequest::new(0, 2), &[1]),
            Err(ConfigError::InvalidLength {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(config, PlatformConfigData::all_disabled());

        let mut small = [0u8; 2];
        assert_eq!(
            config.extract_block(BlockRequest::whole(), &mut small),
            Err(ConfigError::BufferTooSmall { needed: 8 })
        );
    }
}
