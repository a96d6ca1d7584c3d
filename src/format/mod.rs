//! DSK container formats, constants and default disk geometry

/// Format constants
pub mod constants;
/// Default track/sector geometry
pub mod geometry;

pub use constants::*;
pub use geometry::Geometry;

/// DSK container type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DskFormat {
    /// Standard DSK format with fixed track sizes
    Standard,
    /// Extended DSK format with a per-track size table
    Extended,
}

impl DskFormat {
    /// Get the signature written for this format
    pub fn magic_bytes(&self) -> &'static [u8] {
        match self {
            DskFormat::Standard => STANDARD_DSK_SIGNATURE,
            DskFormat::Extended => EXTENDED_DSK_SIGNATURE,
        }
    }

    /// Get a human-readable name for this format
    pub fn name(&self) -> &'static str {
        match self {
            DskFormat::Standard => "Standard DSK",
            DskFormat::Extended => "Extended DSK",
        }
    }
}

/// Detect DSK format from magic bytes
///
/// Only the leading tag is compared, so images written by other tools with different
/// trailing text or padding are still recognised.
pub fn detect_format(magic: &[u8]) -> Option<DskFormat> {
    if magic.starts_with(EXTENDED_DSK_MAGIC) {
        Some(DskFormat::Extended)
    } else if magic.starts_with(STANDARD_DSK_MAGIC) {
        Some(DskFormat::Standard)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_standard_format() {
        assert_eq!(
            detect_format(STANDARD_DSK_SIGNATURE),
            Some(DskFormat::Standard)
        );
        assert_eq!(detect_format(b"MV - CPC\0\0\0"), Some(DskFormat::Standard));
    }

    #[test]
    fn test_detect_extended_format() {
        assert_eq!(
            detect_format(EXTENDED_DSK_SIGNATURE),
            Some(DskFormat::Extended)
        );
    }

    #[test]
    fn test_detect_invalid_format() {
        assert_eq!(detect_format(b"INVALID DATA"), None);
        assert_eq!(detect_format(b"MV - CP"), None);
        assert_eq!(detect_format(b""), None);
    }

    #[test]
    fn test_format_magic_bytes() {
        assert_eq!(DskFormat::Standard.magic_bytes(), STANDARD_DSK_SIGNATURE);
        assert_eq!(DskFormat::Extended.magic_bytes(), EXTENDED_DSK_SIGNATURE);
        assert_eq!(DskFormat::Extended.name(), "Extended DSK");
    }
}
