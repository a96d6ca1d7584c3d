//! DSK stream reader

use crate::error::{DskError, Result};
use crate::format::constants::*;
use crate::image::{DiskImage, DiskInfo, Track, TrackInfo};
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

/// Reads a DSK image one track record at a time
///
/// The Disk-Info block is read and validated on construction; nothing after it is read
/// until [`ImageReader::next_track`] is called, so a restore can act on each track before the
/// next one is parsed.
#[derive(Debug)]
pub struct ImageReader<R> {
    reader: R,
    info: DiskInfo,
    slots: Vec<(usize, usize)>,
    next: usize,
    offset: usize,
    payload_limit: Option<usize>,
}

impl<R: Read> ImageReader<R> {
    /// Read and validate the Disk-Info block
    pub fn new(mut reader: R) -> Result<Self> {
        let mut block = [0u8; DISK_INFO_BLOCK_SIZE];
        read_block(&mut reader, &mut block, "Disk-Info")?;
        let info = DiskInfo::decode(&block)?;
        log::debug!(
            "{}: {} tracks, {} sides",
            info.format.name(),
            info.num_tracks,
            info.num_sides
        );

        let slots = info.present_tracks();
        Ok(Self {
            reader,
            info,
            slots,
            next: 0,
            offset: DISK_INFO_BLOCK_SIZE,
            payload_limit: None,
        })
    }

    /// Reject track records whose payload exceeds `limit` bytes
    pub fn with_payload_limit(mut self, limit: usize) -> Self {
        self.payload_limit = Some(limit);
        self
    }

    /// The Disk-Info block
    pub fn info(&self) -> &DiskInfo {
        &self.info
    }

    /// Number of track records the image contains
    pub fn track_count(&self) -> usize {
        self.slots.len()
    }

    /// Read the next track record, or `None` after the last one
    pub fn next_track(&mut self) -> Result<Option<Track>> {
        let Some(&(slot, payload_length)) = self.slots.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        let (expected_track, expected_side) = self.info.slot_position(slot);

        if let Some(limit) = self.payload_limit {
            if payload_length > limit {
                return Err(DskError::TrackTooLong {
                    track: expected_track,
                    length: payload_length,
                });
            }
        }

        let mut block = [0u8; TRACK_INFO_BLOCK_SIZE];
        read_block(&mut self.reader, &mut block, "Track-Info")?;
        let info = TrackInfo::decode(&block, self.offset)?;
        self.offset += TRACK_INFO_BLOCK_SIZE;

        if info.track_number != expected_track {
            return Err(DskError::TrackMismatch {
                expected: expected_track,
                found: info.track_number,
            });
        }
        if info.side_number != expected_side {
            return Err(DskError::invalid_format(format!(
                "Track {} records side {} where side {} was expected",
                info.track_number, info.side_number, expected_side
            )));
        }

        let mut data = vec![0u8; payload_length];
        read_block(&mut self.reader, &mut data, "track data")?;
        self.offset += payload_length;

        Ok(Some(Track::with_data(info, data)))
    }

    /// Read every remaining track into an image
    pub fn into_image(mut self) -> Result<DiskImage> {
        let mut tracks = Vec::with_capacity(self.slots.len());
        while let Some(track) = self.next_track()? {
            tracks.push(track);
        }
        DiskImage::new(self.info, tracks)
    }
}

impl<R: Read> Iterator for ImageReader<R> {
    type Item = Result<Track>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_track().transpose()
    }
}

/// Fill `buf` completely, reporting a short stream as a truncated record
fn read_block<R: Read>(reader: &mut R, buf: &mut [u8], record: &'static str) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Err(DskError::truncated(record, buf.len(), filled)),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Read a whole DSK image from a stream
pub fn read_image<R: Read>(reader: R) -> Result<DiskImage> {
    ImageReader::new(reader)?.into_image()
}

/// Read a DSK file from disk
pub fn read_dsk<P: AsRef<Path>>(path: P) -> Result<DiskImage> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DskError::DeviceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    read_image(BufReader::new(file))
}
