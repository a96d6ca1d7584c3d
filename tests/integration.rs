/// Integration tests for dsktools

use dsktools::fdc::{FD_FORMAT, FD_READ, FD_WRITE, FD_WRITE_DEL};
use dsktools::*;
use std::io::{Cursor, Read};

fn image_bytes(image: &DiskImage) -> Vec<u8> {
    let mut out = Vec::new();
    write_image(image, &mut out).expect("Failed to write image");
    out
}

/// A blank 40 track image where every byte depends on its track and offset
fn patterned_image(geometry: &Geometry) -> DiskImage {
    let mut image = DiskImage::blank(geometry);
    for number in 0..geometry.num_tracks {
        let track = image.get_track_mut(number, 0).expect("Failed to get track");
        for (i, byte) in track.data_mut().iter_mut().enumerate() {
            *byte = (i as u8) ^ number;
        }
    }
    image
}

/// A track laid out the way copy protections do: IDs out of order, a logical cylinder that
/// differs from the physical one and a sector holding deleted data
fn protected_track(physical: u8) -> Track {
    let mut info = TrackInfo::new(physical, 0);
    info.size_code = 2;
    info.gap3_length = 0x52;
    info.filler_byte = 0xE5;
    for id in [0xC5, 0xC1, 0xC9, 0xC3] {
        info.sectors
            .push(SectorInfo::new(SectorId::new(physical + 10, 0, id, 2)));
    }
    info.sectors[2].fdc_status2 = FdcStatus2::new(FdcStatus2::CM);

    let mut track = Track::new(info);
    for (i, byte) in track.data_mut().iter_mut().enumerate() {
        *byte = (i / 512) as u8 + 1;
    }
    track
}

#[test]
fn test_decode_forty_track_standard_image() {
    let bytes = image_bytes(&DiskImage::blank(&Geometry::cpc_data()));
    assert!(bytes.starts_with(b"MV - CPC"));
    assert_eq!(&bytes[0x32..0x34], &[0x00, 0x13]);

    let image = read_image(Cursor::new(bytes)).expect("Failed to read image");
    assert_eq!(image.format(), DskFormat::Standard);
    assert_eq!(image.info().num_tracks, 40);
    assert_eq!(image.info().num_sides, 1);
    assert_eq!(image.track_count(), 40);

    for track in image.tracks() {
        assert_eq!(track.info.sector_count(), 9);
        assert_eq!(track.info.sector_ids(), (0xC1..=0xC9).collect::<Vec<u8>>());
        assert_eq!(track.data().len(), 0x1200);
    }
}

#[test]
fn test_unknown_magic_reads_nothing_further() {
    struct Counting(Cursor<Vec<u8>>, usize);

    impl Read for Counting {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.0.read(buf)?;
            self.1 += n;
            Ok(n)
        }
    }

    let mut bytes = image_bytes(&DiskImage::blank(&Geometry::cpc_data()));
    bytes[..8].copy_from_slice(b"NOT A DS");
    let mut input = Counting(Cursor::new(bytes), 0);

    let mut drive = MemoryDrive::new();
    let mut engine = TransferEngine::new(&mut drive);
    let err = engine.restore(&mut input).expect_err("Bad magic accepted");

    assert!(err.is_validation());
    assert_eq!(engine.state(), TransferState::Aborted);
    assert_eq!(input.1, 0x100);
    assert!(drive.history().is_empty());
}

#[test]
fn test_format_command_for_nine_sector_track() {
    let track = Geometry::cpc_data().build_track(5);
    let command = Command::format(&track);

    let map = command.format_map().expect("Format command has no map");
    assert_eq!(map.len(), 9);
    for (entry, sector) in map.iter().zip(&track.sectors) {
        assert_eq!(*entry, sector.id);
    }

    let raw = command.to_raw();
    assert_eq!(raw.bytes, vec![FD_FORMAT, 0, 2, 9, 0x52, 0xFF]);
    assert_eq!(raw.track, 5);
}

#[test]
fn test_capture_then_restore() {
    let geometry = Geometry::cpc_data();
    let source = patterned_image(&geometry);

    let mut original = MemoryDrive::from_image(&source);
    let mut captured = Vec::new();
    let report = TransferEngine::new(&mut original)
        .capture(&geometry, &mut captured)
        .expect("Capture failed");
    assert!(report.is_clean());
    assert_eq!(captured.len(), 0x100 + 40 * 0x1300);
    assert_eq!(captured, image_bytes(&source));

    let mut copy = MemoryDrive::new();
    let report = TransferEngine::new(&mut copy)
        .restore(Cursor::new(captured))
        .expect("Restore failed");
    assert_eq!(report.tracks, 40);
    assert_eq!(report.sectors, 360);

    for track in source.tracks() {
        for (sector, data) in track.sectors() {
            assert_eq!(
                copy.sector_data(track.info.track_number, sector.id.sector),
                Some(data)
            );
        }
    }
}

#[test]
fn test_protected_track_round_trip() {
    let info = DiskInfo::standard(2, 1, 0x1300);
    let image = DiskImage::new(info, vec![protected_track(0), protected_track(1)])
        .expect("Failed to build image");

    let mut drive = MemoryDrive::new();
    TransferEngine::new(&mut drive)
        .restore(Cursor::new(image_bytes(&image)))
        .expect("Restore failed");

    // Sectors are formatted and written in descriptor order with their recorded CHRN
    let expected: Vec<SectorId> = protected_track(1).info.sectors.iter().map(|s| s.id).collect();
    assert_eq!(drive.sector_ids(1), expected);

    let history = drive.history();
    assert_eq!(history[0].opcode(), FD_FORMAT);
    let writes: Vec<(u8, u8)> = history[1..5]
        .iter()
        .map(|c| (c.opcode(), c.bytes[4]))
        .collect();
    assert_eq!(
        writes,
        vec![
            (FD_WRITE, 0xC5),
            (FD_WRITE, 0xC1),
            (FD_WRITE_DEL, 0xC9),
            (FD_WRITE, 0xC3)
        ]
    );
    assert_eq!(history[1].track, 0);
    assert_eq!(history[1].bytes[2], 10);
    assert!(drive.is_deleted(1, 0xC9));

    // Reading back with the recorded layout finds every sector
    for track in image.tracks() {
        for (sector, data) in track.sectors() {
            let command = Command::read(&track.info, sector).to_raw();
            assert_eq!(command.opcode(), FD_READ);

            let mut buffer = vec![0u8; sector.size_bytes()];
            let reply = drive.execute(&command, &mut buffer).expect("Read failed");
            assert!(!reply.failed());
            assert_eq!(reply.st2().is_deleted(), sector.is_deleted());
            assert_eq!(buffer, data);
        }
    }
}

#[test]
fn test_extended_absent_track_is_skipped() {
    let geometry = Geometry::cpc_data();
    let info = DiskInfo::extended(4, 1, vec![0x13, 0x13, 0x00, 0x13]);
    let tracks = vec![
        Track::new(geometry.build_track(0)),
        Track::new(geometry.build_track(1)),
        Track::new(geometry.build_track(3)),
    ];
    let image = DiskImage::new(info, tracks).expect("Failed to build image");
    let bytes = image_bytes(&image);
    assert!(bytes.starts_with(b"EXTENDED"));
    assert_eq!(bytes.len(), 0x100 + 3 * 0x1300);

    let mut drive = MemoryDrive::new();
    let report = TransferEngine::new(&mut drive)
        .restore(Cursor::new(bytes))
        .expect("Restore failed");

    assert_eq!(report.tracks, 3);
    assert!(drive.history().iter().all(|c| c.track != 2));
    assert!(!drive.is_formatted(2));
    assert!(drive.is_formatted(3));
}

#[test]
fn test_failed_format_stops_before_writes() {
    let geometry = Geometry::cpc_data().with_tracks(5);
    let mut drive = MemoryDrive::new();
    drive.fail_format(2);

    let mut engine = TransferEngine::new(&mut drive);
    let err = engine
        .restore(Cursor::new(image_bytes(&DiskImage::blank(&geometry))))
        .expect_err("Format failure ignored");
    assert_eq!(engine.state(), TransferState::Aborted);
    assert!(matches!(
        err,
        DskError::SectorOperationFailed {
            operation: "format",
            track: 2,
            ..
        }
    ));

    let last = drive.history().last().expect("No commands issued");
    assert_eq!(last.opcode(), FD_FORMAT);
    assert_eq!(last.track, 2);
    assert!(drive.history().iter().all(|c| c.track <= 2));
}

#[test]
fn test_failed_read_does_not_stop_capture() {
    let geometry = Geometry::cpc_data();
    let mut drive = MemoryDrive::from_image(&patterned_image(&geometry));
    drive.fail_sector(7, 0xC2);
    drive.fail_sector(30, 0xC9);

    let mut out = Vec::new();
    let mut engine = TransferEngine::new(&mut drive);
    let report = engine.capture(&geometry, &mut out).expect("Capture failed");

    assert_eq!(engine.state(), TransferState::Complete);
    assert_eq!(report.tracks, 40);
    assert_eq!(report.sectors, 358);
    let failed: Vec<(u8, u8)> = report.failed.iter().map(|f| (f.track, f.sector)).collect();
    assert_eq!(failed, vec![(7, 0xC2), (30, 0xC9)]);
    assert_eq!(out.len(), 0x100 + 40 * 0x1300);

    let image = read_image(Cursor::new(out)).expect("Failed to read capture");
    assert!(image.get_track(7, 0).expect("Missing track").info.sectors[1].has_error());
    assert!(!image.get_track(8, 0).expect("Missing track").info.sectors[1].has_error());
}

#[test]
fn test_capture_follows_descriptor_order() {
    let geometry = Geometry::ibm().with_tracks(2);
    let mut drive = MemoryDrive::from_image(&DiskImage::blank(&geometry));

    TransferEngine::new(&mut drive)
        .capture(&geometry, std::io::sink())
        .expect("Capture failed");

    let order: Vec<(u8, u8)> = drive
        .history()
        .iter()
        .map(|c| (c.track, c.bytes[4]))
        .collect();
    let expected: Vec<(u8, u8)> = (0..2)
        .flat_map(|t| (0x01..=0x09).map(move |r| (t, r)))
        .collect();
    assert_eq!(order, expected);
}

#[test]
fn test_save_and_open_file() {
    let path = std::env::temp_dir().join(format!("dsktools-{}.dsk", std::process::id()));
    let image = patterned_image(&Geometry::cpc_system().with_tracks(3));

    image.save(&path).expect("Failed to save");
    let reopened = DiskImage::open(&path).expect("Failed to open");
    let _ = std::fs::remove_file(&path);

    assert_eq!(reopened, image);
    assert_eq!(
        reopened.read_sector(2, 0, 0x41).expect("Failed to read sector")[0],
        2
    );
}

#[test]
fn test_fdc_status() {
    let st1 = FdcStatus1::new(FdcStatus1::DE | FdcStatus1::EN);
    assert!(st1.data_error());
    assert!(st1.has_error());

    let st2 = FdcStatus2::new(FdcStatus2::CM);
    assert!(st2.is_deleted());
    assert!(!st2.has_error()); // Deleted mark is not an error
}
