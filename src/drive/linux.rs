//! Raw FDC access through the Linux floppy driver (`FDRAWCMD`)

use crate::command::RawCommand;
use crate::drive::{Drive, Reply};
use crate::error::{DskError, Result};
use libc::{c_char, c_int, c_long, c_uint, c_void};
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// `_IO(2, 0x58)` from `linux/fd.h`
const FDRAWCMD: u32 = 0x0258;

const FD_RAW_CMD_SIZE: usize = 16;
const FD_RAW_REPLY_SIZE: usize = 16;

/// `struct floppy_raw_cmd` from `linux/fd.h`
#[repr(C)]
#[allow(dead_code)]
struct FloppyRawCmd {
    flags: c_uint,
    data: *mut c_void,
    kernel_data: *mut c_char,
    next: *mut FloppyRawCmd,
    length: c_long,
    phys_length: c_long,
    buffer_length: c_int,
    rate: u8,
    cmd_count: u8,
    cmd: [u8; FD_RAW_CMD_SIZE],
    reply_count: u8,
    reply: [u8; FD_RAW_REPLY_SIZE],
    track: c_int,
    resultcode: c_int,
    reserved1: c_int,
    reserved2: c_int,
}

impl FloppyRawCmd {
    fn new(command: &RawCommand, data: &mut [u8]) -> Self {
        let mut cmd = [0u8; FD_RAW_CMD_SIZE];
        let count = command.bytes.len().min(FD_RAW_CMD_SIZE);
        cmd[..count].copy_from_slice(&command.bytes[..count]);

        Self {
            flags: command.flags as c_uint,
            data: data.as_mut_ptr().cast(),
            kernel_data: std::ptr::null_mut(),
            next: std::ptr::null_mut(),
            length: command.length as c_long,
            phys_length: 0,
            buffer_length: 0,
            rate: command.rate,
            cmd_count: count as u8,
            cmd,
            reply_count: 0,
            reply: [0; FD_RAW_REPLY_SIZE],
            track: command.track as c_int,
            resultcode: 0,
            reserved1: 0,
            reserved2: 0,
        }
    }
}

/// A floppy drive opened through its device node
#[derive(Debug)]
pub struct FloppyDevice {
    file: File,
    path: PathBuf,
}

impl FloppyDevice {
    /// Open the device node, e.g. `/dev/fd0`
    ///
    /// The node is opened non-blocking so that no disk geometry is probed; an unformatted or
    /// foreign-format disk is still accessible through raw commands.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NDELAY)
            .open(&path)
            .map_err(|source| DskError::DeviceUnavailable {
                path: path.clone(),
                source,
            })?;

        log::debug!("opened floppy device {}", path.display());
        Ok(Self { file, path })
    }

    /// Path of the device node
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drive for FloppyDevice {
    fn execute(&mut self, command: &RawCommand, data: &mut [u8]) -> Result<Reply> {
        if data.len() < command.length {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "buffer of {} bytes is too small for a {} byte transfer",
                    data.len(),
                    command.length
                ),
            )
            .into());
        }

        let mut raw = FloppyRawCmd::new(command, data);

        // SAFETY: `raw` is a valid floppy_raw_cmd whose data pointer covers at least
        // `raw.length` bytes of `data`, which outlives the call.
        let rc = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                FDRAWCMD as _,
                &mut raw as *mut FloppyRawCmd,
            )
        };
        if rc < 0 {
            let err = io::Error::last_os_error();
            log::error!("FDRAWCMD {:02X} failed: {}", command.opcode(), err);
            return Err(err.into());
        }

        let count = (raw.reply_count as usize).min(FD_RAW_REPLY_SIZE);
        Ok(Reply::new(&raw.reply[..count]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_cmd_fields() {
        let command = RawCommand {
            flags: 0x89,
            track: 12,
            rate: 2,
            length: 512,
            bytes: vec![0xE6, 0, 12, 0, 0xC1, 2, 0xC1, 0x52, 0xFF],
        };
        let mut data = vec![0u8; 512];
        let raw = FloppyRawCmd::new(&command, &mut data);

        assert_eq!(raw.flags, 0x89);
        assert_eq!(raw.track, 12);
        assert_eq!(raw.length, 512);
        assert_eq!(raw.cmd_count, 9);
        assert_eq!(&raw.cmd[..9], command.bytes.as_slice());
        assert_eq!(raw.cmd[9], 0);
    }

    #[test]
    fn test_open_missing_device() {
        let err = FloppyDevice::open("/nonexistent/fd9").unwrap_err();
        assert!(matches!(err, DskError::DeviceUnavailable { .. }));
    }
}
