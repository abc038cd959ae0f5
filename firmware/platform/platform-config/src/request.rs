use crate::data::PLATFORM_CONFIG_SIZE;
use crate::{ConfigError, PLATFORM_CONFIG_GUID};
use core::fmt;
use core::ops::Range;

/// Name of the variable as it appears in a `NAME=` header field.
const VARIABLE_NAME: &str = "PlatformConfig";

/// A byte range of the configuration structure, in HII block notation:
/// `OFFSET=<hex>&WIDTH=<hex>`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BlockRequest {
    pub offset: usize,
    pub width: usize,
}

impl BlockRequest {
    #[must_use]
    pub const fn new(offset: usize, width: usize) -> Self {
        Self { offset, width }
    }

    /// The entire structure; what a request without a block asks for.
    #[must_use]
    pub const fn whole() -> Self {
        Self::new(0, PLATFORM_CONFIG_SIZE)
    }

    /// Reads the block out of a configuration request string.
    ///
    /// Header fields (`GUID`, `NAME`, `PATH`) are skipped. A request naming
    /// no block at all selects [`whole`](Self::whole).
    ///
    /// # Errors
    /// [`ConfigError::MalformedRequest`] if only one of `OFFSET` and `WIDTH`
    /// is present or either is not hexadecimal.
    pub fn parse(request: &str) -> Result<Self, ConfigError> {
        let mut offset = None;
        let mut width = None;

        for (key, value) in fields(request) {
            match key {
                "OFFSET" => offset = Some(parse_hex(value)?),
                "WIDTH" => width = Some(parse_hex(value)?),
                _ => {}
            }
        }

        match (offset, width) {
            (Some(offset), Some(width)) => Ok(Self::new(offset, width)),
            (None, None) => Ok(Self::whole()),
            _ => Err(ConfigError::MalformedRequest),
        }
    }

    /// The requested bytes as a range into a structure of `size` bytes.
    ///
    /// # Errors
    /// [`ConfigError::BlockOutOfRange`] if the block does not fit.
    pub fn range_within(self, size: usize) -> Result<Range<usize>, ConfigError> {
        match self.offset.checked_add(self.width) {
            Some(end) if end <= size => Ok(self.offset..end),
            _ => Err(ConfigError::BlockOutOfRange {
                offset: self.offset,
                width: self.width,
            }),
        }
    }
}

impl Default for BlockRequest {
    fn default() -> Self {
        Self::whole()
    }
}

impl fmt::Display for BlockRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OFFSET={:X}&WIDTH={:016X}", self.offset, self.width)
    }
}

/// The `GUID=...&NAME=...` routing header of the platform configuration.
///
/// The GUID is spelled as its 16 bytes in memory order, the name as one
/// four-digit group per UTF-16 code unit.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ConfigHeader;

impl ConfigHeader {
    /// Whether `request` is routed to the platform configuration.
    ///
    /// The `GUID` field decides. `NAME` may be left out, but a request that
    /// names another variable is not ours.
    #[must_use]
    pub fn matches(request: &str) -> bool {
        let mut guid = false;
        let mut name = true;

        for (key, value) in fields(request) {
            match key {
                "GUID" => guid = hex_bytes_match(value, &PLATFORM_CONFIG_GUID.to_bytes()),
                "NAME" => name = hex_name_matches(value, VARIABLE_NAME),
                _ => {}
            }
        }

        guid && name
    }

    /// Errors unless `request` is routed here.
    ///
    /// # Errors
    /// [`ConfigError::HeaderMismatch`].
    pub fn check(request: &str) -> Result<(), ConfigError> {
        if Self::matches(request) {
            Ok(())
        } else {
            Err(ConfigError::HeaderMismatch)
        }
    }
}

impl fmt::Display for ConfigHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GUID=")?;
        for byte in PLATFORM_CONFIG_GUID.to_bytes() {
            write!(f, "{byte:02x}")?;
        }
        f.write_str("&NAME=")?;
        for unit in VARIABLE_NAME.encode_utf16() {
            write!(f, "{unit:04x}")?;
        }
        Ok(())
    }
}

fn fields(request: &str) -> impl Iterator<Item = (&str, &str)> {
    request
        .split('&')
        .filter_map(|field| field.split_once('='))
}

fn parse_hex(value: &str) -> Result<usize, ConfigError> {
    if !is_hex(value.as_bytes()) {
        return Err(ConfigError::MalformedRequest);
    }
    usize::from_str_radix(value, 16).map_err(|_| ConfigError::MalformedRequest)
}

fn hex_bytes_match(value: &str, expected: &[u8]) -> bool {
    value.len() == expected.len() * 2
        && value
            .as_bytes()
            .chunks_exact(2)
            .zip(expected)
            .all(|(pair, &byte)| hex_value(pair) == Some(u32::from(byte)))
}

fn hex_name_matches(value: &str, expected: &str) -> bool {
    value.len() == expected.encode_utf16().count() * 4
        && value
            .as_bytes()
            .chunks_exact(4)
            .zip(expected.encode_utf16())
            .all(|(group, unit)| hex_value(group) == Some(u32::from(unit)))
}

/// Non-empty and nothing but hex digits; `from_str_radix` alone lets a sign through.
fn is_hex(digits: &[u8]) -> bool {
    !digits.is_empty() && digits.iter().all(u8::is_ascii_hexdigit)
}

fn hex_value(digits: &[u8]) -> Option<u32> {
    if !is_hex(digits) {
        return None;
    }
    let text = core::str::from_utf8(digits).ok()?;
    u32::from_str_radix(text, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_hii_notation() {
        assert_eq!(BlockRequest::whole().to_string(), "OFFSET=0&WIDTH=0000000000000008");
        assert_eq!(BlockRequest::new(0x1A, 2).to_string(), "OFFSET=1A&WIDTH=0000000000000002");
    }

    #[test]
    fn parse_skips_header_fields() {
        let request = format!("{}&PATH=0104140000&OFFSET=3&WIDTH=0002", ConfigHeader);
        assert_eq!(BlockRequest::parse(&request), Ok(BlockRequest::new(3, 2)));
    }

    #[test]
    fn parse_without_block_selects_everything() {
        assert_eq!(BlockRequest::parse(""), Ok(BlockRequest::whole()));
        assert_eq!(
            BlockRequest::parse(&ConfigHeader.to_string()),
            Ok(BlockRequest::whole())
        );
    }

    #[test]
    fn parse_rejects_partial_or_bad_blocks() {
        assert_eq!(BlockRequest::parse("WIDTH=8"), Err(ConfigError::MalformedRequest));
        assert_eq!(BlockRequest::parse("OFFSET=0"), Err(ConfigError::MalformedRequest));
        assert_eq!(
            BlockRequest::parse("OFFSET=zz&WIDTH=8"),
            Err(ConfigError::MalformedRequest)
        );
        assert_eq!(
            BlockRequest::parse("OFFSET=+4&WIDTH=1"),
            Err(ConfigError::MalformedRequest)
        );
        assert_eq!(
            BlockRequest::parse("OFFSET=&WIDTH=1"),
            Err(ConfigError::MalformedRequest)
        );
    }

    #[test]
    fn range_checks() {
        assert_eq!(BlockRequest::whole().range_within(8), Ok(0..8));
        assert_eq!(BlockRequest::new(7, 1).range_within(8), Ok(7..8));
        assert_eq!(
            BlockRequest::new(usize::MAX, 2).range_within(8),
            Err(ConfigError::BlockOutOfRange {
                offset: usize::MAX,
                width: 2
            })
        );
    }

    #[test]
    fn header_spelling() {
        let header = ConfigHeader.to_string();
        assert!(header.starts_with("GUID=d53776f925a7bd4da180d9554920545d&NAME="));
        assert!(header.ends_with("&NAME=0050006c006100740066006f0072006d0043006f006e006600690067"));
    }

    #[test]
    fn header_routing() {
        let header = ConfigHeader.to_string();
        assert!(ConfigHeader::matches(&header));
        assert!(ConfigHeader::matches(&header.to_uppercase()));
        assert!(ConfigHeader::check(&format!("{header}&OFFSET=0&WIDTH=8")).is_ok());

        let other_guid = header.replace("d53776f9", "d53776f8");
        assert!(!ConfigHeader::matches(&other_guid));

        let truncated_name = header.trim_end_matches("0067");
        assert!(!ConfigHeader::matches(truncated_name));

        let longer_name = format!("{header}0041");
        assert!(!ConfigHeader::matches(&longer_name));

        let signed_name = header.replace("&NAME=0050", "&NAME=+050");
        assert!(!ConfigHeader::matches(&signed_name));

        let (guid_only, _) = header.split_once("&NAME=").unwrap();
        assert!(ConfigHeader::matches(guid_only));
        assert!(ConfigHeader::check(&format!("{guid_only}&OFFSET=0&WIDTH=8")).is_ok());

        assert_eq!(ConfigHeader::check("OFFSET=0&WIDTH=8"), Err(ConfigError::HeaderMismatch));
    }
}
