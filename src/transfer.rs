//! Whole-disk transfers between a drive and a DSK stream
//!
//! [`TransferEngine::capture`] images a physical disk into a standard DSK stream;
//! [`TransferEngine::restore`] formats and writes a physical disk from a DSK stream. Both walk
//! tracks in ascending order and sectors in the order the Track-Info block lists them, issuing
//! one command at a time.

use crate::command::Command;
use crate::drive::Drive;
use crate::error::{DskError, Result};
use crate::format::constants::MAX_TRACK_PAYLOAD;
use crate::format::Geometry;
use crate::image::{DiskImage, Track, TrackInfo};
use crate::io::reader::ImageReader;
use crate::io::writer::write_image;
use std::fmt;
use std::io::{Read, Write};

/// Where a transfer currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferState {
    /// No operation started
    #[default]
    Idle,
    /// Disk geometry known (built for capture, read from Disk-Info for restore)
    GeometryPrepared,
    /// Formatting a track
    Formatting,
    /// Reading or writing sectors
    Transferring,
    /// Operation finished
    Complete,
    /// Operation stopped on an error
    Aborted,
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferState::Idle => "idle",
            TransferState::GeometryPrepared => "geometry prepared",
            TransferState::Formatting => "formatting",
            TransferState::Transferring => "transferring",
            TransferState::Complete => "complete",
            TransferState::Aborted => "aborted",
        };
        write!(f, "{}", name)
    }
}

/// A sector the controller could not read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorFailure {
    /// Physical track number
    pub track: u8,
    /// Sector ID (R)
    pub sector: u8,
    /// ST0 returned by the controller
    pub status: u8,
}

impl fmt::Display for SectorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "track {} sector {:02X} (ST0={:02X})",
            self.track, self.sector, self.status
        )
    }
}

/// Summary of a finished transfer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferReport {
    /// Tracks processed
    pub tracks: usize,
    /// Sectors transferred successfully
    pub sectors: usize,
    /// Sectors that could not be read
    pub failed: Vec<SectorFailure>,
}

impl TransferReport {
    /// Check whether every sector transferred
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for TransferReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tracks, {} sectors, {} failed",
            self.tracks,
            self.sectors,
            self.failed.len()
        )
    }
}

/// Drives whole-disk capture and restore over a [`Drive`]
#[derive(Debug)]
pub struct TransferEngine<D> {
    drive: D,
    state: TransferState,
}

impl<D: Drive> TransferEngine<D> {
    /// Create an engine using `drive`
    pub fn new(drive: D) -> Self {
        Self {
            drive,
            state: TransferState::Idle,
        }
    }

    /// Current state
    pub fn state(&self) -> TransferState {
        self.state
    }

    /// The drive commands are sent to
    pub fn drive(&self) -> &D {
        &self.drive
    }

    /// Give back the drive
    pub fn into_inner(self) -> D {
        self.drive
    }

    /// Read a whole disk laid out as `geometry` and write it to `out` as a standard DSK
    ///
    /// A sector the controller fails to read is logged and listed in the report; its payload
    /// is left as the drive returned it and capture moves on. Any other error aborts.
    pub fn capture<W: Write>(&mut self, geometry: &Geometry, out: W) -> Result<TransferReport> {
        let result = self.run_capture(geometry, out);
        self.finish(result)
    }

    /// Format and write a disk from the DSK image read from `input`
    ///
    /// Each track is read and validated before anything is sent to the drive for it. A failed
    /// format or write aborts the restore.
    pub fn restore<R: Read>(&mut self, input: R) -> Result<TransferReport> {
        let result = self.run_restore(input);
        self.finish(result)
    }

    fn finish(&mut self, result: Result<TransferReport>) -> Result<TransferReport> {
        match &result {
            Ok(report) => {
                log::info!("transfer complete: {}", report);
                self.state = TransferState::Complete;
            }
            Err(e) => {
                log::error!("transfer aborted: {}", e);
                self.state = TransferState::Aborted;
            }
        }
        result
    }

    fn run_capture<W: Write>(&mut self, geometry: &Geometry, mut out: W) -> Result<TransferReport> {
        self.state = TransferState::GeometryPrepared;
        let info = geometry.disk_info();
        let mut report = TransferReport::default();
        let mut tracks = Vec::with_capacity(geometry.num_tracks as usize);

        for track_number in 0..geometry.num_tracks {
            let track = self.read_track(geometry.build_track(track_number), &mut report)?;
            tracks.push(track);
            report.tracks += 1;
        }

        let image = DiskImage::new(info, tracks)?;
        write_image(&image, &mut out)?;
        out.flush()?;
        Ok(report)
    }

    fn read_track(&mut self, mut info: TrackInfo, report: &mut TransferReport) -> Result<Track> {
        log::info!("{}", info);
        log::info!("{}", sector_list(&info));

        self.state = TransferState::Transferring;
        let mut data = vec![info.filler_byte; info.data_size()];

        for (index, range) in info.sector_ranges().into_iter().enumerate() {
            let command = Command::read(&info, &info.sectors[index]);
            log::debug!("{}", command);
            let reply = self.drive.execute(&command.to_raw(), &mut data[range])?;

            let sector = &mut info.sectors[index];
            sector.fdc_status1 = reply.st1();
            sector.fdc_status2 = reply.st2();

            if reply.failed() {
                let err = DskError::SectorOperationFailed {
                    operation: command.name(),
                    track: info.track_number,
                    sector: sector.id.sector,
                    status: reply.st0().0,
                };
                if err.is_fatal_during_capture() {
                    return Err(err);
                }
                log::warn!(
                    "Could not read sector {:02X} on track {}",
                    sector.id.sector,
                    info.track_number
                );
                report.failed.push(SectorFailure {
                    track: info.track_number,
                    sector: sector.id.sector,
                    status: reply.st0().0,
                });
            } else {
                report.sectors += 1;
            }
        }

        Ok(Track::with_data(info, data))
    }

    fn run_restore<R: Read>(&mut self, input: R) -> Result<TransferReport> {
        let mut reader = ImageReader::new(input)?.with_payload_limit(MAX_TRACK_PAYLOAD);
        let info = reader.info();
        if info.num_sides != 1 {
            return Err(DskError::invalid_format(format!(
                "Only single-sided images can be written ({} sides)",
                info.num_sides
            )));
        }
        log::info!("{}", info);
        self.state = TransferState::GeometryPrepared;

        let mut report = TransferReport::default();
        while let Some(track) = reader.next_track()? {
            track.validate()?;
            log::info!("{}", track.info);
            log::info!("{}", sector_list(&track.info));

            self.format_track(&track.info)?;
            self.write_track(&track, &mut report)?;
            report.tracks += 1;
        }

        Ok(report)
    }

    fn format_track(&mut self, info: &TrackInfo) -> Result<()> {
        self.state = TransferState::Formatting;
        let command = Command::format(info);
        let mut map = command.format_buffer().unwrap_or_default();
        log::debug!("{}", command);

        let reply = self.drive.execute(&command.to_raw(), &mut map)?;
        if reply.failed() {
            return Err(DskError::SectorOperationFailed {
                operation: command.name(),
                track: info.track_number,
                sector: command.sector().unwrap_or(0),
                status: reply.st0().0,
            });
        }
        Ok(())
    }

    fn write_track(&mut self, track: &Track, report: &mut TransferReport) -> Result<()> {
        self.state = TransferState::Transferring;

        for (sector, payload) in track.sectors() {
            let command = Command::write(&track.info, sector);
            log::debug!("{}", command);

            let mut buffer = payload.to_vec();
            let reply = self.drive.execute(&command.to_raw(), &mut buffer)?;
            if reply.failed() {
                return Err(DskError::SectorOperationFailed {
                    operation: command.name(),
                    track: track.info.track_number,
                    sector: sector.id.sector,
                    status: reply.st0().0,
                });
            }
            report.sectors += 1;
        }
        Ok(())
    }
}

/// Sector IDs of a track as a hex list, in descriptor order
fn sector_list(info: &TrackInfo) -> String {
    let ids: Vec<String> = info
        .sector_ids()
        .iter()
        .map(|id| format!("{:02X}", id))
        .collect();
    format!("sectors: {}", ids.join(" "))
}
