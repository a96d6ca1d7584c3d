use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for DSK operations
pub type Result<T> = std::result::Result<T, DskError>;

/// Errors that can occur while imaging or restoring a disk
#[derive(Debug, Error)]
pub enum DskError {
    /// I/O error occurred while reading or writing the image or the drive
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Leading tag bytes of a record did not match the expected literal
    #[error("Invalid {record} magic at offset {offset}")]
    InvalidMagic {
        /// Record kind ("Disk-Info", "Track-Info")
        record: &'static str,
        /// Byte offset of the record within the image
        offset: usize,
    },

    /// Fewer bytes than the record needs were available
    #[error("Truncated {record}: expected {expected} bytes, got {actual}")]
    TruncatedRecord {
        /// Record kind
        record: &'static str,
        /// Number of bytes required
        expected: usize,
        /// Number of bytes available
        actual: usize,
    },

    /// Invalid or inconsistent image contents
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Track declares more sectors than a Track-Info block can describe
    #[error("Track {track} declares {count} sectors (max: 29)")]
    TooManySectors {
        /// Track number
        track: u8,
        /// Declared sector count
        count: u8,
    },

    /// Track payload is larger than the controller can hold
    #[error("Track {track} is too long ({length:#X} bytes)")]
    TrackTooLong {
        /// Track number
        track: u8,
        /// Payload length in bytes
        length: usize,
    },

    /// Track-Info index does not match its position in the file
    #[error("Track-Info out of order: expected track {expected}, found {found}")]
    TrackMismatch {
        /// Track number implied by file order
        expected: u8,
        /// Track number recorded in the Track-Info block
        found: u8,
    },

    /// The controller reported a failure for a sector or track command
    #[error("Could not {operation} sector {sector:02X} on track {track} (ST0={status:02X})")]
    SectorOperationFailed {
        /// Operation that failed ("read", "write", "format")
        operation: &'static str,
        /// Physical track number
        track: u8,
        /// Sector ID (R)
        sector: u8,
        /// Raw ST0 value returned by the controller
        status: u8,
    },

    /// Drive device or image file could not be opened
    #[error("Cannot open {}: {source}", path.display())]
    DeviceUnavailable {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

impl DskError {
    /// Create an invalid format error
    pub fn invalid_format<S: Into<String>>(message: S) -> Self {
        DskError::InvalidFormat(message.into())
    }

    /// Create a truncated record error
    pub fn truncated(record: &'static str, expected: usize, actual: usize) -> Self {
        DskError::TruncatedRecord {
            record,
            expected,
            actual,
        }
    }

    /// Check whether this is a format validation failure (bad magic, counts out of range)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DskError::InvalidMagic { .. }
                | DskError::InvalidFormat(_)
                | DskError::TooManySectors { .. }
                | DskError::TrackTooLong { .. }
                | DskError::TrackMismatch { .. }
        )
    }

    /// Check whether a capture should stop on this error
    ///
    /// Only a failed sector read is recoverable; the sector is reported and capture continues.
    pub fn is_fatal_during_capture(&self) -> bool {
        !matches!(
            self,
            DskError::SectorOperationFailed {
                operation: "read",
                ..
            }
        )
    }
}
