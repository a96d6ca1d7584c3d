//! Sector info entries

use crate::error::{DskError, Result};
use crate::fdc::{FdcStatus1, FdcStatus2};
use crate::format::constants::{fdc_size_to_bytes, SECTOR_INFO_SIZE};
use std::fmt;

/// Sector ID (CHRN) - addressing information for a sector
///
/// The CHRN written in a sector's ID field does not have to match the physical track and side
/// it lives on. Protected disks rely on this, so these values are always passed to the FDC
/// exactly as recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectorId {
    /// C - Cylinder/Track number
    pub track: u8,
    /// H - Head/Side number
    pub side: u8,
    /// R - Sector ID/Record number
    pub sector: u8,
    /// N - Size code (0=128, 1=256, 2=512, 3=1024, 4=2048, etc.)
    pub size_code: u8,
}

impl SectorId {
    /// Create a new sector ID
    pub fn new(track: u8, side: u8, sector: u8, size_code: u8) -> Self {
        Self {
            track,
            side,
            sector,
            size_code,
        }
    }

    /// Get the advertised sector size in bytes based on size code
    pub fn size_bytes(&self) -> usize {
        fdc_size_to_bytes(self.size_code)
    }
}

impl fmt::Display for SectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "C{} H{} R{:02X} N{}",
            self.track, self.side, self.sector, self.size_code
        )
    }
}

/// One 8-byte Sector-Info entry of a Track-Info block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorInfo {
    /// Sector addressing information (CHRN)
    pub id: SectorId,
    /// FDC Status Register 1
    pub fdc_status1: FdcStatus1,
    /// FDC Status Register 2
    pub fdc_status2: FdcStatus2,
    /// Trailing bytes of the entry, kept as found
    pub reserved: [u8; 2],
}

impl SectorInfo {
    /// Create a sector info entry with clear status
    pub fn new(id: SectorId) -> Self {
        Self {
            id,
            fdc_status1: FdcStatus1::default(),
            fdc_status2: FdcStatus2::default(),
            reserved: [0; 2],
        }
    }

    /// Decode an entry from the first 8 bytes of `bytes`
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < SECTOR_INFO_SIZE {
            return Err(DskError::truncated("Sector-Info", SECTOR_INFO_SIZE, bytes.len()));
        }

        Ok(Self {
            id: SectorId::new(bytes[0], bytes[1], bytes[2], bytes[3]),
            fdc_status1: FdcStatus1::new(bytes[4]),
            fdc_status2: FdcStatus2::new(bytes[5]),
            reserved: [bytes[6], bytes[7]],
        })
    }

    /// Encode this entry to its 8-byte form
    pub fn encode(&self) -> [u8; SECTOR_INFO_SIZE] {
        [
            self.id.track,
            self.id.side,
            self.id.sector,
            self.id.size_code,
            self.fdc_status1.0,
            self.fdc_status2.0,
            self.reserved[0],
            self.reserved[1],
        ]
    }

    /// Check if this sector is marked as deleted data
    pub fn is_deleted(&self) -> bool {
        self.fdc_status2.is_deleted()
    }

    /// Check if this sector has any FDC errors recorded
    pub fn has_error(&self) -> bool {
        self.fdc_status1.has_error() || self.fdc_status2.has_error()
    }

    /// Get the sector payload size in bytes
    pub fn size_bytes(&self) -> usize {
        self.id.size_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sector_id_size() {
        let id = SectorId::new(0, 0, 0xC1, 2);
        assert_eq!(id.size_bytes(), 512);

        let id2 = SectorId::new(0, 0, 1, 3);
        assert_eq!(id2.size_bytes(), 1024);
    }

    #[test]
    fn test_sector_id_display() {
        let id = SectorId::new(3, 0, 0xC5, 2);
        assert_eq!(id.to_string(), "C3 H0 RC5 N2");
    }

    #[test]
    fn test_encode_layout() {
        let mut info = SectorInfo::new(SectorId::new(4, 1, 0xC3, 2));
        info.fdc_status1 = FdcStatus1::new(0x20);
        info.fdc_status2 = FdcStatus2::new(0x40);
        assert_eq!(info.encode(), [4, 1, 0xC3, 2, 0x20, 0x40, 0, 0]);
        assert!(info.is_deleted());
        assert!(info.has_error());
    }

    #[test]
    fn test_decode_truncated() {
        let result = SectorInfo::decode(&[0, 0, 0xC1, 2, 0, 0]);
        assert!(matches!(
            result,
            Err(DskError::TruncatedRecord {
                expected: 8,
                actual: 6,
                ..
            })
        ));
    }

    #[test]
    fn test_mismatched_chrn_is_kept() {
        // Protected disks put a different cylinder in the ID field than the physical track
        let info = SectorInfo::decode(&[0x28, 0x05, 0xC1, 2, 0, 0, 0, 0]).unwrap();
        assert_eq!(info.id.track, 0x28);
        assert_eq!(info.id.side, 0x05);
    }

    proptest! {
        #[test]
        fn prop_sector_info_round_trip(bytes in proptest::array::uniform8(any::<u8>())) {
            let info = SectorInfo::decode(&bytes).unwrap();
            prop_assert_eq!(info.encode(), bytes);
            prop_assert_eq!(SectorInfo::decode(&info.encode()).unwrap(), info);
        }
    }
}
