//! DSK format magic bytes, block widths and field offsets

/// Standard DSK format signature
pub const STANDARD_DSK_SIGNATURE: &[u8] = b"MV - CPCEMU Disk-File\r\nDisk-Info\r\n";

/// Extended DSK format signature
pub const EXTENDED_DSK_SIGNATURE: &[u8] = b"EXTENDED CPC DSK File\r\nDisk-Info\r\n";

/// Prefix identifying a Standard DSK
pub const STANDARD_DSK_MAGIC: &[u8] = b"MV - CPC";

/// Prefix identifying an Extended DSK
pub const EXTENDED_DSK_MAGIC: &[u8] = b"EXTENDED";

/// Track-Info block marker as written
pub const TRACK_INFO_MARKER: &[u8] = b"Track-Info\r\n";

/// Prefix identifying a Track-Info block
pub const TRACK_INFO_MAGIC: &[u8] = b"Track-Info";

/// Width of the magic field in the disk info block
pub const DISK_INFO_MAGIC_SIZE: usize = 0x22;

/// Size of disk info block
pub const DISK_INFO_BLOCK_SIZE: usize = 0x100;

/// Size of track info block
pub const TRACK_INFO_BLOCK_SIZE: usize = 0x100;

/// Size of sector info entry
pub const SECTOR_INFO_SIZE: usize = 8;

/// Maximum number of sectors per track
pub const MAX_SECTORS_PER_TRACK: usize = 29;

/// Number of entries in the extended track size table
pub const MAX_TRACK_TABLE_ENTRIES: usize = 0xCC;

/// Largest track payload the FDC buffer accepts
pub const MAX_TRACK_PAYLOAD: usize = 0x2000;

/// Offset of track count in disk info block
pub const DISK_INFO_TRACK_COUNT_OFFSET: usize = 0x30;

/// Offset of side count in disk info block
pub const DISK_INFO_SIDE_COUNT_OFFSET: usize = 0x31;

/// Offset of track size in disk info block (standard format)
pub const DISK_INFO_TRACK_SIZE_OFFSET: usize = 0x32;

/// Offset of extended track size table in disk info block (extended format)
pub const DISK_INFO_EXT_TRACK_SIZE_OFFSET: usize = 0x34;

/// Offset of the track number in a track info block
pub const TRACK_INFO_TRACK_OFFSET: usize = 0x10;

/// Offset of the side number in a track info block
pub const TRACK_INFO_SIDE_OFFSET: usize = 0x11;

/// Offset of the sector size code in a track info block
pub const TRACK_INFO_SIZE_CODE_OFFSET: usize = 0x14;

/// Offset of the sector count in a track info block
pub const TRACK_INFO_SECTOR_COUNT_OFFSET: usize = 0x15;

/// Offset of the GAP#3 length in a track info block
pub const TRACK_INFO_GAP_OFFSET: usize = 0x16;

/// Offset of the filler byte in a track info block
pub const TRACK_INFO_FILLER_OFFSET: usize = 0x17;

/// Offset of the first sector info entry in a track info block
pub const TRACK_INFO_SECTOR_LIST_OFFSET: usize = 0x18;

/// Largest size code the FDC accepts (128 << 8 = 32K)
pub const MAX_SIZE_CODE: u8 = 8;

/// Convert FDC size code to actual byte size
///
/// The controller computes `128 << N`; codes above 8 are clamped to 8 as the FDC does.
#[inline]
pub fn fdc_size_to_bytes(size_code: u8) -> usize {
    128 << size_code.min(MAX_SIZE_CODE)
}

/// Convert byte size to FDC size code
#[inline]
pub fn bytes_to_fdc_size(bytes: usize) -> Option<u8> {
    (0..=MAX_SIZE_CODE).find(|&code| fdc_size_to_bytes(code) == bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fdc_size_to_bytes() {
        assert_eq!(fdc_size_to_bytes(0), 128);
        assert_eq!(fdc_size_to_bytes(1), 256);
        assert_eq!(fdc_size_to_bytes(2), 512);
        assert_eq!(fdc_size_to_bytes(3), 1024);
        assert_eq!(fdc_size_to_bytes(8), 32768);
        assert_eq!(fdc_size_to_bytes(255), 32768);
    }

    #[test]
    fn test_bytes_to_fdc_size() {
        assert_eq!(bytes_to_fdc_size(128), Some(0));
        assert_eq!(bytes_to_fdc_size(512), Some(2));
        assert_eq!(bytes_to_fdc_size(32768), Some(8));
        assert_eq!(bytes_to_fdc_size(1000), None);
    }

    #[test]
    fn test_block_layout() {
        assert_eq!(
            TRACK_INFO_SECTOR_LIST_OFFSET + MAX_SECTORS_PER_TRACK * SECTOR_INFO_SIZE,
            TRACK_INFO_BLOCK_SIZE
        );
        assert_eq!(
            DISK_INFO_EXT_TRACK_SIZE_OFFSET + MAX_TRACK_TABLE_ENTRIES,
            DISK_INFO_BLOCK_SIZE
        );
        assert!(STANDARD_DSK_SIGNATURE.starts_with(STANDARD_DSK_MAGIC));
        assert!(EXTENDED_DSK_SIGNATURE.starts_with(EXTENDED_DSK_MAGIC));
        assert_eq!(STANDARD_DSK_SIGNATURE.len(), DISK_INFO_MAGIC_SIZE);
    }
}
