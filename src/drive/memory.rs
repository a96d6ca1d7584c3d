//! A simulated drive holding its disk in memory
//!
//! Behaves like the FDC as far as the transfer engine can observe: format lays down sector
//! IDs, and reads and writes only succeed when all four CHRN bytes match a formatted sector.

use crate::command::RawCommand;
use crate::drive::{Drive, Reply};
use crate::error::Result;
use crate::fdc::{FdcStatus0, FdcStatus1, FdcStatus2, FD_FORMAT, FD_READ, FD_WRITE, FD_WRITE_DEL};
use crate::format::constants::fdc_size_to_bytes;
use crate::image::{DiskImage, SectorId};
use std::collections::{BTreeMap, HashSet};
use std::io;

#[derive(Debug, Clone)]
struct MemorySector {
    id: SectorId,
    deleted: bool,
    data: Vec<u8>,
}

/// In-memory floppy disk
#[derive(Debug, Clone, Default)]
pub struct MemoryDrive {
    cylinders: BTreeMap<u8, Vec<MemorySector>>,
    failing: HashSet<(u8, u8)>,
    failing_formats: HashSet<u8>,
    history: Vec<RawCommand>,
}

impl MemoryDrive {
    /// Create a drive holding an unformatted disk
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a drive holding a disk with the contents of `image`
    pub fn from_image(image: &DiskImage) -> Self {
        let mut drive = Self::new();
        for track in image.tracks() {
            let sectors = track
                .sectors()
                .map(|(info, data)| MemorySector {
                    id: info.id,
                    deleted: info.is_deleted(),
                    data: data.to_vec(),
                })
                .collect();
            drive.cylinders.insert(track.info.track_number, sectors);
        }
        drive
    }

    /// Make every command addressing sector `id` on `cylinder` report failure
    pub fn fail_sector(&mut self, cylinder: u8, id: u8) {
        self.failing.insert((cylinder, id));
    }

    /// Make formatting `cylinder` report failure
    pub fn fail_format(&mut self, cylinder: u8) {
        self.failing_formats.insert(cylinder);
    }

    /// Every command executed so far, in order
    pub fn history(&self) -> &[RawCommand] {
        &self.history
    }

    /// Sector IDs on `cylinder` in physical order
    pub fn sector_ids(&self, cylinder: u8) -> Vec<SectorId> {
        self.cylinders
            .get(&cylinder)
            .map(|sectors| sectors.iter().map(|s| s.id).collect())
            .unwrap_or_default()
    }

    /// Contents of sector `id` on `cylinder`
    pub fn sector_data(&self, cylinder: u8, id: u8) -> Option<&[u8]> {
        self.find(cylinder, id).map(|s| s.data.as_slice())
    }

    /// Check if sector `id` on `cylinder` carries a deleted data mark
    pub fn is_deleted(&self, cylinder: u8, id: u8) -> bool {
        self.find(cylinder, id).map(|s| s.deleted).unwrap_or(false)
    }

    /// Check if `cylinder` has been formatted
    pub fn is_formatted(&self, cylinder: u8) -> bool {
        self.cylinders.contains_key(&cylinder)
    }

    fn find(&self, cylinder: u8, id: u8) -> Option<&MemorySector> {
        self.cylinders
            .get(&cylinder)?
            .iter()
            .find(|s| s.id.sector == id)
    }

    fn locate(&mut self, cylinder: u8, chrn: SectorId) -> Option<&mut MemorySector> {
        self.cylinders
            .get_mut(&cylinder)?
            .iter_mut()
            .find(|s| s.id == chrn)
    }

    fn format(&mut self, command: &RawCommand, data: &[u8]) -> Reply {
        let cylinder = command.track;
        if self.failing_formats.contains(&cylinder) {
            return Reply::new(&[FdcStatus0::IC_ABNORMAL, FdcStatus1::NW, 0]);
        }

        let size_code = command.bytes[2];
        let count = command.bytes[3] as usize;
        let fill = command.bytes[5];
        let sectors = data
            .chunks_exact(4)
            .take(count)
            .map(|chrn| MemorySector {
                id: SectorId::new(chrn[0], chrn[1], chrn[2], chrn[3]),
                deleted: false,
                data: vec![fill; fdc_size_to_bytes(size_code)],
            })
            .collect();
        self.cylinders.insert(cylinder, sectors);

        Reply::new(&[0, 0, 0, cylinder, 0, 0, size_code])
    }

    fn transfer(&mut self, command: &RawCommand, data: &mut [u8]) -> Reply {
        let cylinder = command.track;
        let chrn = SectorId::new(
            command.bytes[2],
            command.bytes[3],
            command.bytes[4],
            command.bytes[5],
        );
        let id_bytes = [chrn.track, chrn.side, chrn.sector, chrn.size_code];
        let failing = self.failing.contains(&(cylinder, chrn.sector));

        let opcode = command.opcode();
        let Some(sector) = self.locate(cylinder, chrn) else {
            return result(FdcStatus0::IC_ABNORMAL, FdcStatus1::ND, 0, id_bytes);
        };
        if failing {
            return result(FdcStatus0::IC_ABNORMAL, FdcStatus1::DE, FdcStatus2::DD, id_bytes);
        }

        let length = command.length.min(data.len());
        match opcode {
            FD_READ => {
                let count = length.min(sector.data.len());
                data[..count].copy_from_slice(&sector.data[..count]);
                let st2 = if sector.deleted { FdcStatus2::CM } else { 0 };
                result(0, 0, st2, id_bytes)
            }
            _ => {
                let count = length.min(sector.data.len());
                sector.data[..count].copy_from_slice(&data[..count]);
                sector.deleted = opcode == FD_WRITE_DEL;
                result(0, 0, 0, id_bytes)
            }
        }
    }
}

fn result(st0: u8, st1: u8, st2: u8, chrn: [u8; 4]) -> Reply {
    Reply::new(&[st0, st1, st2, chrn[0], chrn[1], chrn[2], chrn[3]])
}

impl Drive for MemoryDrive {
    fn execute(&mut self, command: &RawCommand, data: &mut [u8]) -> Result<Reply> {
        self.history.push(command.clone());
        log::trace!("memory drive: {:02X?} T{}", command.bytes, command.track);

        match command.opcode() {
            FD_FORMAT if command.bytes.len() >= 6 => Ok(self.format(command, data)),
            FD_READ | FD_WRITE | FD_WRITE_DEL if command.bytes.len() >= 9 => {
                Ok(self.transfer(command, data))
            }
            opcode => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported FDC command {:02X}", opcode),
            )
            .into()),
        }
    }
}
