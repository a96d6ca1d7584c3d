//! Track info blocks and track payloads

use crate::error::{DskError, Result};
use crate::format::constants::*;
use crate::image::sector::SectorInfo;
use std::fmt;
use std::ops::Range;

/// Decoded Track-Info block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    /// Physical track number
    pub track_number: u8,
    /// Physical side number
    pub side_number: u8,
    /// Bytes-per-sector size code for the track (128 << code)
    pub size_code: u8,
    /// GAP#3 length
    pub gap3_length: u8,
    /// Filler byte used for formatting
    pub filler_byte: u8,
    /// Sector info entries in recorded (physical) order
    pub sectors: Vec<SectorInfo>,
}

impl TrackInfo {
    /// Create an empty track info block
    pub fn new(track_number: u8, side_number: u8) -> Self {
        Self {
            track_number,
            side_number,
            size_code: 2,
            gap3_length: 0x4E,
            filler_byte: 0xE5,
            sectors: Vec::new(),
        }
    }

    /// Decode a Track-Info block
    ///
    /// `offset` is the block's position in the image and is only used for error reporting.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<Self> {
        if bytes.len() < TRACK_INFO_BLOCK_SIZE {
            return Err(DskError::truncated(
                "Track-Info",
                TRACK_INFO_BLOCK_SIZE,
                bytes.len(),
            ));
        }

        if !bytes.starts_with(TRACK_INFO_MAGIC) {
            return Err(DskError::InvalidMagic {
                record: "Track-Info",
                offset,
            });
        }

        let track_number = bytes[TRACK_INFO_TRACK_OFFSET];
        let num_sectors = bytes[TRACK_INFO_SECTOR_COUNT_OFFSET];
        if num_sectors as usize > MAX_SECTORS_PER_TRACK {
            return Err(DskError::TooManySectors {
                track: track_number,
                count: num_sectors,
            });
        }

        let sectors = bytes[TRACK_INFO_SECTOR_LIST_OFFSET..]
            .chunks_exact(SECTOR_INFO_SIZE)
            .take(num_sectors as usize)
            .map(SectorInfo::decode)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            track_number,
            side_number: bytes[TRACK_INFO_SIDE_OFFSET],
            size_code: bytes[TRACK_INFO_SIZE_CODE_OFFSET],
            gap3_length: bytes[TRACK_INFO_GAP_OFFSET],
            filler_byte: bytes[TRACK_INFO_FILLER_OFFSET],
            sectors,
        })
    }

    /// Encode to a 256-byte Track-Info block, unused bytes zeroed
    pub fn encode(&self) -> Result<[u8; TRACK_INFO_BLOCK_SIZE]> {
        if self.sectors.len() > MAX_SECTORS_PER_TRACK {
            return Err(DskError::TooManySectors {
                track: self.track_number,
                count: self.sectors.len().min(u8::MAX as usize) as u8,
            });
        }

        let mut block = [0u8; TRACK_INFO_BLOCK_SIZE];
        block[..TRACK_INFO_MARKER.len()].copy_from_slice(TRACK_INFO_MARKER);
        block[TRACK_INFO_TRACK_OFFSET] = self.track_number;
        block[TRACK_INFO_SIDE_OFFSET] = self.side_number;
        block[TRACK_INFO_SIZE_CODE_OFFSET] = self.size_code;
        block[TRACK_INFO_SECTOR_COUNT_OFFSET] = self.sectors.len() as u8;
        block[TRACK_INFO_GAP_OFFSET] = self.gap3_length;
        block[TRACK_INFO_FILLER_OFFSET] = self.filler_byte;

        for (i, sector) in self.sectors.iter().enumerate() {
            let sib_offset = TRACK_INFO_SECTOR_LIST_OFFSET + i * SECTOR_INFO_SIZE;
            block[sib_offset..sib_offset + SECTOR_INFO_SIZE].copy_from_slice(&sector.encode());
        }

        Ok(block)
    }

    /// Get the number of sectors in this track
    pub fn sector_count(&self) -> usize {
        self.sectors.len()
    }

    /// Get the track-wide sector size in bytes
    pub fn sector_size(&self) -> usize {
        fdc_size_to_bytes(self.size_code)
    }

    /// Byte ranges of each sector within the track payload, in sector info order
    ///
    /// Sector `k` starts at `k` times the track-wide sector size. A sector whose own size code
    /// is smaller only covers the start of its slot.
    pub fn sector_ranges(&self) -> Vec<Range<usize>> {
        let stride = self.sector_size();
        self.sectors
            .iter()
            .enumerate()
            .map(|(index, sector)| {
                let start = index * stride;
                start..start + sector.size_bytes().min(stride)
            })
            .collect()
    }

    /// Total payload bytes described by the sector info list
    pub fn data_size(&self) -> usize {
        self.sectors.len() * self.sector_size()
    }

    /// Check that no sector is larger than the track-wide sector size
    pub fn validate_sizes(&self) -> Result<()> {
        let stride = self.sector_size();
        match self.sectors.iter().find(|s| s.size_bytes() > stride) {
            Some(sector) => Err(DskError::invalid_format(format!(
                "Sector {:02X} on track {} has size code {}, larger than the track's {}",
                sector.id.sector, self.track_number, sector.id.size_code, self.size_code
            ))),
            None => Ok(()),
        }
    }

    /// Get list of all sector IDs in recorded order
    pub fn sector_ids(&self) -> Vec<u8> {
        self.sectors.iter().map(|s| s.id.sector).collect()
    }
}

impl fmt::Display for TrackInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}: {}-{}-{}-{:X}-{:X}",
            self.track_number,
            self.side_number,
            self.size_code,
            self.sectors.len(),
            self.gap3_length,
            self.filler_byte
        )
    }
}

/// A track record: the Track-Info block and the raw bytes that follow it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Track info block
    pub info: TrackInfo,
    /// Sector payloads in sector info order
    data: Vec<u8>,
}

impl Track {
    /// Create a track with a payload sized for its sector list, filled with the filler byte
    pub fn new(info: TrackInfo) -> Self {
        let data = vec![info.filler_byte; info.data_size()];
        Self { info, data }
    }

    /// Create a track with an existing payload
    pub fn with_data(info: TrackInfo, data: Vec<u8>) -> Self {
        Self { info, data }
    }

    /// Get a reference to the raw payload
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the raw payload
    pub fn data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }

    /// Check every sector fits its slot and every slot lies fully inside the payload
    pub fn validate(&self) -> Result<()> {
        self.info.validate_sizes()?;
        let needed = self.info.data_size();
        if needed > self.data.len() {
            return Err(DskError::truncated("track data", needed, self.data.len()));
        }
        Ok(())
    }

    /// Get the payload of the sector at `index` in sector info order
    pub fn sector_data(&self, index: usize) -> Option<&[u8]> {
        let range = self.info.sector_ranges().into_iter().nth(index)?;
        self.data.get(range)
    }

    /// Iterate sectors together with their payloads, in sector info order
    ///
    /// Sectors whose payload runs past the end of the track data are not yielded; call
    /// [`Track::validate`] first when that must be an error.
    pub fn sectors(&self) -> impl Iterator<Item = (&SectorInfo, &[u8])> + '_ {
        self.info
            .sectors
            .iter()
            .zip(self.info.sector_ranges())
            .map_while(move |(sector, range)| self.data.get(range).map(|bytes| (sector, bytes)))
    }
}
