//! Disk info block

use crate::error::{DskError, Result};
use crate::format::constants::*;
use crate::format::{detect_format, DskFormat};
use std::fmt;

/// Decoded Disk-Info block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskInfo {
    /// Container type, from the magic tag
    pub format: DskFormat,
    /// The magic tag as stored in the file
    pub magic: [u8; DISK_INFO_MAGIC_SIZE],
    /// Number of tracks per side
    pub num_tracks: u8,
    /// Number of sides
    pub num_sides: u8,
    /// Size of every track record including its Track-Info block (standard format)
    pub track_size: u16,
    /// Per-track record sizes in 256-byte units (extended format), side-interleaved
    pub track_size_table: Vec<u8>,
}

impl DiskInfo {
    /// Create a standard disk info block with a uniform track record size
    pub fn standard(num_tracks: u8, num_sides: u8, track_size: u16) -> Self {
        Self {
            format: DskFormat::Standard,
            magic: signature(DskFormat::Standard),
            num_tracks,
            num_sides,
            track_size,
            track_size_table: Vec::new(),
        }
    }

    /// Create an extended disk info block from per-track record sizes in 256-byte units
    pub fn extended(num_tracks: u8, num_sides: u8, track_size_table: Vec<u8>) -> Self {
        Self {
            format: DskFormat::Extended,
            magic: signature(DskFormat::Extended),
            num_tracks,
            num_sides,
            track_size: 0,
            track_size_table,
        }
    }

    /// Decode and validate a Disk-Info block
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < DISK_INFO_BLOCK_SIZE {
            return Err(DskError::truncated(
                "Disk-Info",
                DISK_INFO_BLOCK_SIZE,
                bytes.len(),
            ));
        }

        let format = detect_format(bytes).ok_or(DskError::InvalidMagic {
            record: "Disk-Info",
            offset: 0,
        })?;

        let num_tracks = bytes[DISK_INFO_TRACK_COUNT_OFFSET];
        let num_sides = bytes[DISK_INFO_SIDE_COUNT_OFFSET];
        let track_size = u16::from_le_bytes([
            bytes[DISK_INFO_TRACK_SIZE_OFFSET],
            bytes[DISK_INFO_TRACK_SIZE_OFFSET + 1],
        ]);

        let mut info = match format {
            DskFormat::Standard => Self::standard(num_tracks, num_sides, track_size),
            DskFormat::Extended => {
                let count = num_tracks as usize * num_sides as usize;
                if count > MAX_TRACK_TABLE_ENTRIES {
                    return Err(DskError::invalid_format(format!(
                        "{} tracks x {} sides exceeds the {} entry track size table",
                        num_tracks, num_sides, MAX_TRACK_TABLE_ENTRIES
                    )));
                }
                let table_start = DISK_INFO_EXT_TRACK_SIZE_OFFSET;
                let mut info = Self::extended(
                    num_tracks,
                    num_sides,
                    bytes[table_start..table_start + count].to_vec(),
                );
                info.track_size = track_size;
                info
            }
        };
        info.magic.copy_from_slice(&bytes[..DISK_INFO_MAGIC_SIZE]);

        info.validate()?;
        Ok(info)
    }

    /// Encode to a 256-byte Disk-Info block, unused bytes zeroed
    pub fn encode(&self) -> Result<[u8; DISK_INFO_BLOCK_SIZE]> {
        self.validate()?;

        let mut block = [0u8; DISK_INFO_BLOCK_SIZE];
        // Keep the stored tag unless it names the other container type
        let magic = if detect_format(&self.magic) == Some(self.format) {
            self.magic
        } else {
            signature(self.format)
        };
        block[..DISK_INFO_MAGIC_SIZE].copy_from_slice(&magic);
        block[DISK_INFO_TRACK_COUNT_OFFSET] = self.num_tracks;
        block[DISK_INFO_SIDE_COUNT_OFFSET] = self.num_sides;
        block[DISK_INFO_TRACK_SIZE_OFFSET..DISK_INFO_TRACK_SIZE_OFFSET + 2]
            .copy_from_slice(&self.track_size.to_le_bytes());

        if self.format == DskFormat::Extended {
            let table_start = DISK_INFO_EXT_TRACK_SIZE_OFFSET;
            block[table_start..table_start + self.track_size_table.len()]
                .copy_from_slice(&self.track_size_table);
        }

        Ok(block)
    }

    /// Check counts and sizes are consistent
    pub fn validate(&self) -> Result<()> {
        if self.num_tracks == 0 {
            return Err(DskError::invalid_format("Disk-Info declares no tracks"));
        }
        if self.num_sides == 0 {
            return Err(DskError::invalid_format("Disk-Info declares no sides"));
        }

        match self.format {
            DskFormat::Standard => {
                if (self.track_size as usize) < TRACK_INFO_BLOCK_SIZE {
                    return Err(DskError::invalid_format(format!(
                        "Track size {:#X} is smaller than a Track-Info block",
                        self.track_size
                    )));
                }
            }
            DskFormat::Extended => {
                if self.track_size_table.len() != self.record_count() {
                    return Err(DskError::invalid_format(format!(
                        "Track size table has {} entries for {} tracks",
                        self.track_size_table.len(),
                        self.record_count()
                    )));
                }
                if self.track_size_table.len() > MAX_TRACK_TABLE_ENTRIES {
                    return Err(DskError::invalid_format(
                        "Track size table is larger than the Disk-Info block",
                    ));
                }
            }
        }

        Ok(())
    }

    /// Number of track slots (tracks x sides) the image describes
    pub fn record_count(&self) -> usize {
        self.num_tracks as usize * self.num_sides as usize
    }

    /// Payload length of the track record at slot `index` (tracks interleaved by side)
    ///
    /// Returns `None` when the track is absent from an extended image. The payload excludes
    /// the Track-Info block: `size - 0x100`.
    pub fn payload_length(&self, index: usize) -> Option<usize> {
        let record_size = match self.format {
            DskFormat::Standard => self.track_size as usize,
            DskFormat::Extended => match self.track_size_table.get(index)? {
                0 => return None,
                &units => units as usize * 256,
            },
        };
        Some(record_size.saturating_sub(TRACK_INFO_BLOCK_SIZE))
    }

    /// Track and side numbers for the slot at `index`
    pub fn slot_position(&self, index: usize) -> (u8, u8) {
        let sides = self.num_sides.max(1) as usize;
        ((index / sides) as u8, (index % sides) as u8)
    }

    /// Slots of tracks present in the image, with their payload lengths, in file order
    pub fn present_tracks(&self) -> Vec<(usize, usize)> {
        (0..self.record_count())
            .filter_map(|index| self.payload_length(index).map(|len| (index, len)))
            .collect()
    }
}

/// The full magic tag written for `format`
fn signature(format: DskFormat) -> [u8; DISK_INFO_MAGIC_SIZE] {
    let mut magic = [0u8; DISK_INFO_MAGIC_SIZE];
    let bytes = format.magic_bytes();
    let len = bytes.len().min(DISK_INFO_MAGIC_SIZE);
    magic[..len].copy_from_slice(&bytes[..len]);
    magic
}

impl fmt::Display for DiskInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magic = String::from_utf8_lossy(&self.magic);
        let title = magic
            .split("\r\n")
            .next()
            .unwrap_or_default()
            .trim_end_matches('\0');
        writeln!(f, "MAGIC:\t{}", title)?;
        writeln!(f, "TRACKS:\t{}", self.num_tracks)?;
        writeln!(f, "HEADS:\t{}", self.num_sides)?;
        write!(f, "TRACKL:\t{:X}", self.track_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpc_standard() -> DiskInfo {
        DiskInfo::standard(40, 1, 0x1200 + 0x100)
    }

    #[test]
    fn test_encode_layout() {
        let block = cpc_standard().encode().unwrap();
        assert_eq!(&block[..34], STANDARD_DSK_SIGNATURE);
        assert!(block[0x22..0x30].iter().all(|&b| b == 0));
        assert_eq!(block[0x30], 40);
        assert_eq!(block[0x31], 1);
        assert_eq!(block[0x32], 0x00);
        assert_eq!(block[0x33], 0x13);
        assert!(block[0x34..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_decode_standard() {
        let block = cpc_standard().encode().unwrap();
        let info = DiskInfo::decode(&block).unwrap();
        assert_eq!(info, cpc_standard());
        assert_eq!(info.payload_length(0), Some(0x1200));
        assert_eq!(info.payload_length(39), Some(0x1200));
        assert_eq!(info.present_tracks().len(), 40);
    }

    #[test]
    fn test_decode_short_magic_accepted() {
        let mut block = [0u8; DISK_INFO_BLOCK_SIZE];
        block[..8].copy_from_slice(b"MV - CPC");
        block[0x30] = 40;
        block[0x31] = 1;
        block[0x32] = 0x00;
        block[0x33] = 0x13;
        let info = DiskInfo::decode(&block).unwrap();
        assert_eq!(info.format, DskFormat::Standard);
        assert_eq!(info.track_size, 0x1300);
    }

    #[test]
    fn test_decode_invalid_magic() {
        let mut block = cpc_standard().encode().unwrap();
        block[..8].copy_from_slice(b"NOT A DS");
        assert!(matches!(
            DiskInfo::decode(&block),
            Err(DskError::InvalidMagic {
                record: "Disk-Info",
                ..
            })
        ));
    }

    #[test]
    fn test_decode_truncated() {
        let block = cpc_standard().encode().unwrap();
        assert!(matches!(
            DiskInfo::decode(&block[..0x30]),
            Err(DskError::TruncatedRecord { actual: 0x30, .. })
        ));
    }

    #[test]
    fn test_zero_tracks_rejected() {
        let mut block = cpc_standard().encode().unwrap();
        block[0x30] = 0;
        let err = DiskInfo::decode(&block).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_extended_table() {
        let mut table = vec![0x13; 40];
        table[5] = 0;
        table[6] = 0x15;
        let info = DiskInfo::extended(40, 1, table);
        let block = info.encode().unwrap();
        assert_eq!(&block[..8], b"EXTENDED");
        assert_eq!(block[0x34], 0x13);
        assert_eq!(block[0x34 + 5], 0);
        assert_eq!(block[0x34 + 6], 0x15);

        let decoded = DiskInfo::decode(&block).unwrap();
        assert_eq!(decoded, info);
        assert_eq!(decoded.payload_length(4), Some(0x1200));
        assert_eq!(decoded.payload_length(5), None);
        assert_eq!(decoded.payload_length(6), Some(0x1400));
        assert_eq!(decoded.present_tracks().len(), 39);
        assert!(decoded.present_tracks().iter().all(|&(index, _)| index != 5));
    }

    #[test]
    fn test_extended_table_overflow() {
        let mut block = DiskInfo::extended(40, 1, vec![0x13; 40]).encode().unwrap();
        block[0x30] = 0xCD;
        assert!(matches!(
            DiskInfo::decode(&block),
            Err(DskError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_extended_table_mismatch() {
        let info = DiskInfo::extended(40, 1, vec![0x13; 39]);
        assert!(info.encode().is_err());
    }

    #[test]
    fn test_slot_position() {
        let info = DiskInfo::extended(40, 2, vec![0x13; 80]);
        assert_eq!(info.slot_position(0), (0, 0));
        assert_eq!(info.slot_position(1), (0, 1));
        assert_eq!(info.slot_position(7), (3, 1));
    }

    #[test]
    fn test_display() {
        let text = cpc_standard().to_string();
        assert!(text.starts_with("MAGIC:\tMV - CPCEMU Disk-File"));
        assert!(text.contains("TRACKS:\t40\n"));
        assert!(text.contains("HEADS:\t1\n"));
        assert!(text.ends_with("TRACKL:\t1300"));
    }

    #[test]
    fn test_display_shows_stored_magic() {
        let mut block = cpc_standard().encode().unwrap();
        block[..DISK_INFO_MAGIC_SIZE].fill(0);
        block[..33].copy_from_slice(b"MV - CPC format Disk Image (DU54)");
        let info = DiskInfo::decode(&block).unwrap();

        assert_eq!(info.format, DskFormat::Standard);
        assert!(info
            .to_string()
            .starts_with("MAGIC:\tMV - CPC format Disk Image (DU54)\n"));
        assert_eq!(&info.encode().unwrap()[..33], &block[..33]);
    }

    #[test]
    fn test_encode_replaces_foreign_magic() {
        let mut info = cpc_standard();
        info.magic = signature(DskFormat::Extended);
        let block = info.encode().unwrap();
        assert_eq!(&block[..DISK_INFO_MAGIC_SIZE], STANDARD_DSK_SIGNATURE);
    }
}
