//! Default disk geometry used when capturing a disk

use crate::format::constants::{fdc_size_to_bytes, TRACK_INFO_BLOCK_SIZE};
use crate::image::{DiskInfo, SectorId, SectorInfo, TrackInfo};

/// First sector ID of the IBM format
pub const FIRST_SECTOR_IBM: u8 = 0x01;

/// First sector ID of the CPC system format
pub const FIRST_SECTOR_SYSTEM: u8 = 0x41;

/// First sector ID of the CPC data format
pub const FIRST_SECTOR_DATA: u8 = 0xC1;

/// Track and sector layout of a single-sided disk
///
/// Captures always use a fixed layout: every track is assumed to carry the same sectors,
/// numbered consecutively from `first_sector_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geometry {
    /// Number of tracks
    pub num_tracks: u8,
    /// Sectors per track
    pub sectors_per_track: u8,
    /// Sector size code (128 << code)
    pub size_code: u8,
    /// First sector ID
    pub first_sector_id: u8,
    /// GAP#3 length
    pub gap3_length: u8,
    /// Filler byte for formatting
    pub filler_byte: u8,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::cpc_data()
    }
}

impl Geometry {
    /// Amstrad CPC Data format (40 tracks, 9 sectors of 512 bytes from 0xC1)
    pub fn cpc_data() -> Self {
        Self {
            num_tracks: 40,
            sectors_per_track: 9,
            size_code: 2,
            first_sector_id: FIRST_SECTOR_DATA,
            gap3_length: 0x52,
            filler_byte: 0xFF,
        }
    }

    /// Amstrad CPC System format (sectors from 0x41)
    pub fn cpc_system() -> Self {
        Self {
            first_sector_id: FIRST_SECTOR_SYSTEM,
            ..Self::cpc_data()
        }
    }

    /// IBM format as seen by CP/M-86 on the CPC (sectors from 0x01)
    pub fn ibm() -> Self {
        Self {
            first_sector_id: FIRST_SECTOR_IBM,
            ..Self::cpc_data()
        }
    }

    /// Look up a preset by name: `data`, `system` or `ibm`
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "data" => Some(Self::cpc_data()),
            "system" | "vendor" => Some(Self::cpc_system()),
            "ibm" => Some(Self::ibm()),
            _ => None,
        }
    }

    /// Use a different first sector ID
    pub fn with_first_sector_id(mut self, first_sector_id: u8) -> Self {
        self.first_sector_id = first_sector_id;
        self
    }

    /// Use a different track count
    pub fn with_tracks(mut self, num_tracks: u8) -> Self {
        self.num_tracks = num_tracks;
        self
    }

    /// Use a different GAP#3 length
    pub fn with_gap(mut self, gap3_length: u8) -> Self {
        self.gap3_length = gap3_length;
        self
    }

    /// Use a different filler byte
    pub fn with_fill(mut self, filler_byte: u8) -> Self {
        self.filler_byte = filler_byte;
        self
    }

    /// Sector size in bytes
    pub fn sector_size(&self) -> usize {
        fdc_size_to_bytes(self.size_code)
    }

    /// Payload bytes per track
    pub fn track_data_size(&self) -> usize {
        self.sectors_per_track as usize * self.sector_size()
    }

    /// Size of a whole track record, Track-Info block included
    pub fn track_length(&self) -> usize {
        self.track_data_size() + TRACK_INFO_BLOCK_SIZE
    }

    /// Build the Track-Info for `track`
    ///
    /// Pure: the result depends only on the geometry and the track number. Every sector is
    /// addressed as (track, head 0, first_sector_id + i, size_code) with clear status.
    pub fn build_track(&self, track: u8) -> TrackInfo {
        let sectors = (0..self.sectors_per_track)
            .map(|i| {
                let id = SectorId::new(
                    track,
                    0,
                    self.first_sector_id.wrapping_add(i),
                    self.size_code,
                );
                SectorInfo::new(id)
            })
            .collect();

        TrackInfo {
            track_number: track,
            side_number: 0,
            size_code: self.size_code,
            gap3_length: self.gap3_length,
            filler_byte: self.filler_byte,
            sectors,
        }
    }

    /// Build the standard Disk-Info block for an image captured with this geometry
    pub fn disk_info(&self) -> DiskInfo {
        DiskInfo::standard(self.num_tracks, 1, self.track_length() as u16)
    }
}
