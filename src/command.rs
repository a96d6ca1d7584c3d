//! Translation of track and sector records into raw FDC commands
//!
//! A [`Command`] carries only what each operation needs. [`Command::to_raw`] turns it into the
//! byte sequence and transfer parameters the drive expects; nothing else in the crate builds
//! command bytes.
//!
//! The CHRN of every sector is sent exactly as it was recorded in the image. Protected disks
//! use IDs whose cylinder or head differ from the physical position, and the FDC refuses to
//! read or write a sector unless all four values match.

use crate::fdc::{FD_DTL, FD_FORMAT, FD_READ, FD_WRITE, FD_WRITE_DEL};
use crate::format::constants::fdc_size_to_bytes;
use crate::image::{SectorId, SectorInfo, TrackInfo};
use std::fmt;

/// Transfer direction: data is read from the drive
pub const FD_RAW_READ: u32 = 0x01;
/// Transfer direction: data is written to the drive
pub const FD_RAW_WRITE: u32 = 0x02;
/// Wait for the completion interrupt
pub const FD_RAW_INTR: u32 = 0x08;
/// Seek to the target cylinder before issuing the command
pub const FD_RAW_NEED_SEEK: u32 = 0x80;

/// Data rate code for 250 kbit/s double density, the only rate CPC media uses
pub const RATE_DD: u8 = 2;

/// Head/drive select byte sent with every command
///
/// Only side 0 of drive 0 is supported. The head recorded in a sector ID is passed through
/// in the CHRN, but the physical head selected here is always 0.
pub const PHYSICAL_HEAD: u8 = 0;

/// Sector IDs laid down by a format command, in physical order
pub type FormatMap = Vec<SectorId>;

/// High-level FDC operation on a single track or sector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read one sector
    Read {
        /// Physical cylinder to seek to
        cylinder: u8,
        /// Sector ID exactly as recorded
        id: SectorId,
        /// GAP#3 length
        gap: u8,
    },
    /// Write one sector, as normal or deleted data
    Write {
        /// Physical cylinder to seek to
        cylinder: u8,
        /// Sector ID exactly as recorded
        id: SectorId,
        /// GAP#3 length
        gap: u8,
        /// Write a deleted data address mark
        deleted: bool,
    },
    /// Format a whole track
    Format {
        /// Physical cylinder to seek to
        cylinder: u8,
        /// Track-wide size code
        size_code: u8,
        /// GAP#3 length
        gap: u8,
        /// Filler byte for sector data
        fill: u8,
        /// Sector IDs to lay down; the sector count sent is its length
        map: FormatMap,
    },
}

impl Command {
    /// Read `sector` of `track`
    pub fn read(track: &TrackInfo, sector: &SectorInfo) -> Self {
        Command::Read {
            cylinder: track.track_number,
            id: sector.id,
            gap: track.gap3_length,
        }
    }

    /// Write `sector` of `track`, as deleted data when its ST2 carries the control mark
    pub fn write(track: &TrackInfo, sector: &SectorInfo) -> Self {
        Command::Write {
            cylinder: track.track_number,
            id: sector.id,
            gap: track.gap3_length,
            deleted: sector.is_deleted(),
        }
    }

    /// Format `track` with its sector IDs in recorded order
    pub fn format(track: &TrackInfo) -> Self {
        Command::Format {
            cylinder: track.track_number,
            size_code: track.size_code,
            gap: track.gap3_length,
            fill: track.filler_byte,
            map: track.sectors.iter().map(|s| s.id).collect(),
        }
    }

    /// Short name of the operation
    pub fn name(&self) -> &'static str {
        match self {
            Command::Read { .. } => "read",
            Command::Write { .. } => "write",
            Command::Format { .. } => "format",
        }
    }

    /// Physical cylinder the drive seeks to
    pub fn cylinder(&self) -> u8 {
        match self {
            Command::Read { cylinder, .. }
            | Command::Write { cylinder, .. }
            | Command::Format { cylinder, .. } => *cylinder,
        }
    }

    /// Sector ID the command addresses; the first sector for a format
    pub fn sector(&self) -> Option<u8> {
        match self {
            Command::Read { id, .. } | Command::Write { id, .. } => Some(id.sector),
            Command::Format { map, .. } => map.first().map(|id| id.sector),
        }
    }

    /// Format map of a format command
    pub fn format_map(&self) -> Option<&[SectorId]> {
        match self {
            Command::Format { map, .. } => Some(map),
            _ => None,
        }
    }

    /// Length of the data transfer: `128 << N`
    pub fn data_length(&self) -> usize {
        match self {
            Command::Read { id, .. } | Command::Write { id, .. } => id.size_bytes(),
            Command::Format { size_code, .. } => fdc_size_to_bytes(*size_code),
        }
    }

    /// Data buffer sent with a format command: four CHRN bytes per sector, zero padded
    pub fn format_buffer(&self) -> Option<Vec<u8>> {
        let map = self.format_map()?;
        let mut buffer: Vec<u8> = map
            .iter()
            .flat_map(|id| [id.track, id.side, id.sector, id.size_code])
            .collect();
        buffer.resize(buffer.len().max(self.data_length()), 0);
        Some(buffer)
    }

    /// Build the wire-level command
    pub fn to_raw(&self) -> RawCommand {
        let (flags, bytes) = match self {
            Command::Read { id, gap, .. } => (
                FD_RAW_READ | FD_RAW_INTR | FD_RAW_NEED_SEEK,
                sector_command(FD_READ, id, *gap),
            ),
            Command::Write {
                id, gap, deleted, ..
            } => {
                let opcode = if *deleted { FD_WRITE_DEL } else { FD_WRITE };
                (
                    FD_RAW_WRITE | FD_RAW_INTR | FD_RAW_NEED_SEEK,
                    sector_command(opcode, id, *gap),
                )
            }
            Command::Format {
                size_code,
                gap,
                fill,
                map,
                ..
            } => (
                FD_RAW_WRITE | FD_RAW_INTR | FD_RAW_NEED_SEEK,
                vec![
                    FD_FORMAT,
                    PHYSICAL_HEAD,
                    *size_code,
                    map.len() as u8,
                    *gap,
                    *fill,
                ],
            ),
        };

        RawCommand {
            flags,
            track: self.cylinder(),
            rate: RATE_DD,
            length: self.data_length(),
            bytes,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Read { cylinder, id, .. } => {
                write!(f, "read T{:02} [{}]", cylinder, id)
            }
            Command::Write {
                cylinder,
                id,
                deleted,
                ..
            } => {
                let kind = if *deleted { "write deleted" } else { "write" };
                write!(f, "{} T{:02} [{}]", kind, cylinder, id)
            }
            Command::Format {
                cylinder,
                size_code,
                gap,
                fill,
                map,
            } => write!(
                f,
                "format T{:02} N{} SC{} GPL{:02X} D{:02X}",
                cylinder,
                size_code,
                map.len(),
                gap,
                fill
            ),
        }
    }
}

/// Read/write data command: opcode, head select, C, H, R, N, EOT, GPL, DTL
fn sector_command(opcode: u8, id: &SectorId, gap: u8) -> Vec<u8> {
    vec![
        opcode,
        PHYSICAL_HEAD,
        id.track,
        id.side,
        id.sector,
        id.size_code,
        id.sector,
        gap,
        FD_DTL,
    ]
}

/// A command in the form the drive executes it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommand {
    /// `FD_RAW_*` flags
    pub flags: u32,
    /// Cylinder to seek to
    pub track: u8,
    /// Data rate code
    pub rate: u8,
    /// Bytes to transfer
    pub length: usize,
    /// Command bytes, opcode first
    pub bytes: Vec<u8>,
}

impl RawCommand {
    /// Check if the command transfers data from the drive
    pub fn is_read(&self) -> bool {
        self.flags & FD_RAW_READ != 0
    }

    /// Check if the command transfers data to the drive
    pub fn is_write(&self) -> bool {
        self.flags & FD_RAW_WRITE != 0
    }

    /// Opcode byte
    pub fn opcode(&self) -> u8 {
        self.bytes.first().copied().unwrap_or(0)
    }
}
