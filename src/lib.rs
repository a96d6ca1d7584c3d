/*!
# dsktools

Image Amstrad CPC floppy disks to DSK files and write DSK files back to disk, driving the
floppy controller directly with raw commands.

## Features

- Read Standard and Extended DSK containers as a stream, track by track
- Capture a physical disk into a Standard DSK, continuing past unreadable sectors
- Restore a DSK to a physical disk: format each track with its recorded sector IDs, then
  write every sector, as deleted data where the image says so
- Sector IDs are sent exactly as recorded, so protected layouts survive a round trip
- Linux `FDRAWCMD` backend and an in-memory drive for dry runs and tests

## Quick Start

```rust,no_run
use dsktools::{FloppyDevice, Geometry, TransferEngine};
use std::fs::File;

// Capture /dev/fd0 into a DSK
let mut drive = FloppyDevice::open("/dev/fd0")?;
let mut engine = TransferEngine::new(&mut drive);
let report = engine.capture(&Geometry::cpc_data(), File::create("disk.dsk")?)?;
for failure in &report.failed {
    println!("unreadable: {}", failure);
}

// Write it back
engine.restore(File::open("disk.dsk")?)?;
# Ok::<(), dsktools::DskError>(())
```

## Modules

- `format`: DSK container constants and capture geometry
- `image`: Disk-Info, Track-Info and Sector-Info records
- `io`: streaming DSK reader and writer
- `fdc`: FDC opcodes and status registers
- `command`: translation of records into raw FDC commands
- `drive`: the drive abstraction and its backends
- `transfer`: capture and restore
- `error`: Error types and Result alias
*/

#![warn(missing_docs)]

/// Raw FDC command construction
pub mod command;
/// Drive access backends
pub mod drive;
/// Error types and Result alias
pub mod error;
/// FDC (Floppy Disk Controller) opcodes and status codes
pub mod fdc;
/// DSK format constants and geometry
pub mod format;
/// Core image data structures (DiskInfo, TrackInfo, SectorInfo)
pub mod image;
/// I/O operations for reading and writing DSK files
pub mod io;
/// Disk capture and restore
pub mod transfer;

// Re-export common types
pub use command::{Command, FormatMap, RawCommand};
pub use drive::{Drive, MemoryDrive, Reply, DEFAULT_DEVICE};
#[cfg(target_os = "linux")]
pub use drive::FloppyDevice;
pub use error::{DskError, Result};
pub use fdc::{FdcStatus0, FdcStatus1, FdcStatus2};
pub use format::{detect_format, DskFormat, Geometry};
pub use image::{DiskImage, DiskInfo, SectorId, SectorInfo, Track, TrackInfo};
pub use io::{read_image, write_image, ImageReader};
pub use transfer::{SectorFailure, TransferEngine, TransferReport, TransferState};
