//! DSK image data structures

/// Disk info block
pub mod disk;
/// Sector info entries
pub mod sector;
/// Track info blocks and payloads
pub mod track;

pub use disk::DiskInfo;
pub use sector::{SectorId, SectorInfo};
pub use track::{Track, TrackInfo};

use crate::error::{DskError, Result};
use crate::format::{DskFormat, Geometry};
use std::path::Path;

/// An in-memory DSK image: the Disk-Info block and every track record present, in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskImage {
    pub(crate) info: DiskInfo,
    pub(crate) tracks: Vec<Track>,
}

impl DiskImage {
    /// Create an image from its parts, checking they agree
    pub fn new(info: DiskInfo, tracks: Vec<Track>) -> Result<Self> {
        info.validate()?;
        let present = info.present_tracks().len();
        if tracks.len() != present {
            return Err(DskError::invalid_format(format!(
                "Disk-Info describes {} tracks but {} were supplied",
                present,
                tracks.len()
            )));
        }
        Ok(Self { info, tracks })
    }

    /// Create a blank standard image laid out by `geometry`, every sector holding the filler
    pub fn blank(geometry: &Geometry) -> Self {
        let tracks = (0..geometry.num_tracks)
            .map(|track| Track::new(geometry.build_track(track)))
            .collect();
        Self {
            info: geometry.disk_info(),
            tracks,
        }
    }

    /// Open a DSK file from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        crate::io::reader::read_dsk(path)
    }

    /// Save the image to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        crate::io::writer::write_dsk(self, path)
    }

    /// Get the container format
    pub fn format(&self) -> DskFormat {
        self.info.format
    }

    /// Get the Disk-Info block
    pub fn info(&self) -> &DiskInfo {
        &self.info
    }

    /// Get all track records in file order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Get the number of track records present
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Find a track record by physical track and side
    pub fn get_track(&self, track: u8, side: u8) -> Option<&Track> {
        self.tracks
            .iter()
            .find(|t| t.info.track_number == track && t.info.side_number == side)
    }

    /// Find a mutable track record by physical track and side
    pub fn get_track_mut(&mut self, track: u8, side: u8) -> Option<&mut Track> {
        self.tracks
            .iter_mut()
            .find(|t| t.info.track_number == track && t.info.side_number == side)
    }

    /// Read sector data by physical track, side and sector ID
    pub fn read_sector(&self, track: u8, side: u8, sector_id: u8) -> Result<&[u8]> {
        let track_obj = self.get_track(track, side).ok_or_else(|| {
            DskError::invalid_format(format!("Track {} side {} is not in the image", track, side))
        })?;

        let index = track_obj
            .info
            .sectors
            .iter()
            .position(|s| s.id.sector == sector_id)
            .ok_or_else(|| {
                DskError::invalid_format(format!(
                    "Sector {:02X} is not on track {}",
                    sector_id, track
                ))
            })?;

        track_obj.sector_data(index).ok_or_else(|| {
            let needed = track_obj.info.sector_ranges()[index].end;
            DskError::truncated("track data", needed, track_obj.data().len())
        })
    }

    /// Total payload bytes of every track
    pub fn total_size(&self) -> usize {
        self.tracks.iter().map(|t| t.data().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_image() {
        let image = DiskImage::blank(&Geometry::cpc_data());
        assert_eq!(image.format(), DskFormat::Standard);
        assert_eq!(image.track_count(), 40);
        assert_eq!(image.info().track_size, 0x1300);
        assert_eq!(image.total_size(), 40 * 9 * 512);

        let track = image.get_track(39, 0).unwrap();
        assert_eq!(track.info.sector_ids(), (0xC1..=0xC9).collect::<Vec<u8>>());
    }

    #[test]
    fn test_read_sector() {
        let mut image = DiskImage::blank(&Geometry::cpc_data());
        let track = image.get_track_mut(2, 0).unwrap();
        track.data_mut()[512..1024].fill(0x42);

        let data = image.read_sector(2, 0, 0xC2).unwrap();
        assert_eq!(data.len(), 512);
        assert!(data.iter().all(|&b| b == 0x42));

        assert!(image.read_sector(2, 0, 0x01).is_err());
        assert!(image.read_sector(50, 0, 0xC1).is_err());
    }

    #[test]
    fn test_new_checks_track_count() {
        let geometry = Geometry::cpc_data();
        let tracks = vec![Track::new(geometry.build_track(0))];
        assert!(DiskImage::new(geometry.disk_info(), tracks).is_err());
    }
}
