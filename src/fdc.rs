//! Floppy Disk Controller (FDC) opcodes and status register definitions
//!
//! Based on the NEC uPD765 / Intel 82077 FDC found in PCs, driven here to read and write
//! Amstrad CPC formatted media.

use std::fmt;

/// Read Data, with MT, MFM and SK bits set
pub const FD_READ: u8 = 0xE6;

/// Write Data, with MT and MFM bits set
pub const FD_WRITE: u8 = 0xC5;

/// Write Deleted Data, with MT and MFM bits set
pub const FD_WRITE_DEL: u8 = 0xC9;

/// Format Track, with MFM bit set
pub const FD_FORMAT: u8 = 0x4D;

/// Data length (DTL) sent with read/write commands when N != 0
pub const FD_DTL: u8 = 0xFF;

/// FDC Status Register 0 (ST0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FdcStatus0(pub u8);

impl FdcStatus0 {
    /// Interrupt Code bit 7 - invalid command or drive not ready
    pub const IC_INVALID: u8 = 0x80;

    /// Interrupt Code bit 6 - command terminated abnormally
    pub const IC_ABNORMAL: u8 = 0x40;

    /// Seek End (SE) - Bit 5
    pub const SE: u8 = 0x20;

    /// Equipment Check (EC) - Bit 4
    pub const EC: u8 = 0x10;

    /// Create a new FdcStatus0 from a raw byte
    #[inline]
    pub fn new(value: u8) -> Self {
        FdcStatus0(value)
    }

    /// Check if the command terminated abnormally
    ///
    /// This is the failure bit checked after every read, write and format command.
    #[inline]
    pub fn failed(&self) -> bool {
        (self.0 & Self::IC_ABNORMAL) != 0
    }

    /// Check if the command was rejected as invalid
    #[inline]
    pub fn invalid_command(&self) -> bool {
        (self.0 & Self::IC_INVALID) != 0
    }

    /// Check if the equipment check bit is set
    #[inline]
    pub fn equipment_check(&self) -> bool {
        (self.0 & Self::EC) != 0
    }
}

impl fmt::Display for FdcStatus0 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self.0 >> 6 {
            0 => "NT",
            1 => "AT",
            2 => "IC",
            _ => "AI",
        };
        write!(f, "{}", code)?;
        if (self.0 & Self::SE) != 0 {
            write!(f, "|SE")?;
        }
        if self.equipment_check() {
            write!(f, "|EC")?;
        }
        Ok(())
    }
}

/// FDC Status Register 1 (ST1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FdcStatus1(pub u8);

impl FdcStatus1 {
    /// End of Cylinder (EN) - Bit 7
    pub const EN: u8 = 0x80;

    /// Data Error (DE) - Bit 5
    pub const DE: u8 = 0x20;

    /// Overrun (OR) - Bit 4
    pub const OR: u8 = 0x10;

    /// No Data (ND) - Bit 2
    pub const ND: u8 = 0x04;

    /// Not Writable (NW) - Bit 1
    pub const NW: u8 = 0x02;

    /// Missing Address Mark (MA) - Bit 0
    pub const MA: u8 = 0x01;

    /// Create a new FdcStatus1 from a raw byte
    #[inline]
    pub fn new(value: u8) -> Self {
        FdcStatus1(value)
    }

    /// Check if data error bit is set
    #[inline]
    pub fn data_error(&self) -> bool {
        (self.0 & Self::DE) != 0
    }

    /// Check if no data bit is set
    #[inline]
    pub fn no_data(&self) -> bool {
        (self.0 & Self::ND) != 0
    }

    /// Check if not writable bit is set
    #[inline]
    pub fn not_writable(&self) -> bool {
        (self.0 & Self::NW) != 0
    }

    /// Check if any error flag is set
    #[inline]
    pub fn has_error(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for FdcStatus1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const FLAGS: [(u8, &str); 6] = [
            (FdcStatus1::EN, "EN"),
            (FdcStatus1::DE, "DE"),
            (FdcStatus1::OR, "OR"),
            (FdcStatus1::ND, "ND"),
            (FdcStatus1::NW, "NW"),
            (FdcStatus1::MA, "MA"),
        ];
        write_flags(f, self.0, &FLAGS)
    }
}

/// FDC Status Register 2 (ST2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FdcStatus2(pub u8);

impl FdcStatus2 {
    /// Control Mark (CM) - Bit 6
    /// Set if a sector with deleted data address mark is read
    pub const CM: u8 = 0x40;

    /// Data Error in Data Field (DD) - Bit 5
    pub const DD: u8 = 0x20;

    /// Wrong Cylinder (WC) - Bit 4
    pub const WC: u8 = 0x10;

    /// Bad Cylinder (BC) - Bit 1
    pub const BC: u8 = 0x02;

    /// Missing Address Mark in Data Field (MD) - Bit 0
    pub const MD: u8 = 0x01;

    /// Create a new FdcStatus2 from a raw byte
    #[inline]
    pub fn new(value: u8) -> Self {
        FdcStatus2(value)
    }

    /// Check if control mark (deleted data) bit is set
    #[inline]
    pub fn is_deleted(&self) -> bool {
        (self.0 & Self::CM) != 0
    }

    /// Check if any error flag is set (excluding deleted data mark)
    #[inline]
    pub fn has_error(&self) -> bool {
        (self.0 & !Self::CM) != 0
    }
}

impl fmt::Display for FdcStatus2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const FLAGS: [(u8, &str); 5] = [
            (FdcStatus2::CM, "CM"),
            (FdcStatus2::DD, "DD"),
            (FdcStatus2::WC, "WC"),
            (FdcStatus2::BC, "BC"),
            (FdcStatus2::MD, "MD"),
        ];
        write_flags(f, self.0, &FLAGS)
    }
}

fn write_flags(f: &mut fmt::Formatter<'_>, value: u8, flags: &[(u8, &str)]) -> fmt::Result {
    if value == 0 {
        return write!(f, "OK");
    }
    let names: Vec<&str> = flags
        .iter()
        .filter(|(mask, _)| value & mask != 0)
        .map(|(_, name)| *name)
        .collect();
    write!(f, "{}", names.join("|"))
}
