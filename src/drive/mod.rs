//! Floppy drive access
//!
//! The transfer engine talks to hardware only through the [`Drive`] trait: one raw command in,
//! one result block out, strictly one at a time.

/// In-memory drive used for dry runs and tests
pub mod memory;

/// Linux raw floppy command backend
#[cfg(target_os = "linux")]
pub mod linux;

pub use memory::MemoryDrive;

#[cfg(target_os = "linux")]
pub use linux::FloppyDevice;

use crate::command::RawCommand;
use crate::error::Result;
use crate::fdc::{FdcStatus0, FdcStatus1, FdcStatus2};

/// Default floppy device node
pub const DEFAULT_DEVICE: &str = "/dev/fd0";

/// Something that can execute raw FDC commands
pub trait Drive {
    /// Execute `command`, transferring `command.length` bytes to or from `data`
    ///
    /// Returns the controller's result bytes. An `Err` means the command could not be
    /// delivered at all (device error, timeout) and the operation must stop.
    fn execute(&mut self, command: &RawCommand, data: &mut [u8]) -> Result<Reply>;
}

impl<D: Drive + ?Sized> Drive for &mut D {
    fn execute(&mut self, command: &RawCommand, data: &mut [u8]) -> Result<Reply> {
        (**self).execute(command, data)
    }
}

/// Result phase bytes returned by the FDC
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    bytes: Vec<u8>,
}

impl Reply {
    /// Create a reply from raw result bytes
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Raw result bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Status register 0
    pub fn st0(&self) -> FdcStatus0 {
        FdcStatus0::new(self.byte(0))
    }

    /// Status register 1
    pub fn st1(&self) -> FdcStatus1 {
        FdcStatus1::new(self.byte(1))
    }

    /// Status register 2
    pub fn st2(&self) -> FdcStatus2 {
        FdcStatus2::new(self.byte(2))
    }

    /// Check if the controller reported the command as failed (ST0 bit 6)
    pub fn failed(&self) -> bool {
        self.st0().failed()
    }

    fn byte(&self, index: usize) -> u8 {
        self.bytes.get(index).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_status() {
        let reply = Reply::new(&[0x40, 0x04, 0x40, 0, 0, 0xC1, 2]);
        assert!(reply.failed());
        assert!(reply.st1().no_data());
        assert!(reply.st2().is_deleted());
        assert_eq!(reply.bytes().len(), 7);
    }

    #[test]
    fn test_empty_reply() {
        let reply = Reply::default();
        assert!(!reply.failed());
        assert_eq!(reply.st1().0, 0);
    }
}
