/// DSK file writer

use crate::error::{DskError, Result};
use crate::format::constants::*;
use crate::image::DiskImage;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a DSK file to disk
pub fn write_dsk<P: AsRef<Path>>(image: &DiskImage, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| DskError::DeviceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    let mut writer = BufWriter::new(file);
    write_image(image, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a DSK image to a stream
///
/// Each track payload is padded with zeros up to the length the Disk-Info block gives for it.
pub fn write_image<W: Write>(image: &DiskImage, writer: &mut W) -> Result<()> {
    let info = image.info();
    writer.write_all(&info.encode()?)?;

    for (track, (slot, payload_length)) in image.tracks().iter().zip(info.present_tracks()) {
        let data = track.data();
        if data.len() > payload_length {
            return Err(DskError::TrackTooLong {
                track: track.info.track_number,
                length: data.len(),
            });
        }

        log::trace!(
            "slot {}: track {} ({} bytes)",
            slot,
            track.info.track_number,
            payload_length
        );
        writer.write_all(&track.info.encode()?)?;
        writer.write_all(data)?;
        if data.len() < payload_length {
            writer.write_all(&vec![0u8; payload_length - data.len()])?;
        }
    }

    Ok(())
}

/// Size in bytes of the file [`write_image`] produces for `image`
pub fn image_size(image: &DiskImage) -> usize {
    let info = image.info();
    let tracks: usize = info
        .present_tracks()
        .iter()
        .map(|&(_, payload)| payload + TRACK_INFO_BLOCK_SIZE)
        .sum();
    DISK_INFO_BLOCK_SIZE + tracks
}
