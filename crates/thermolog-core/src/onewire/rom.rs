//! 64-bit 1-Wire device identifiers

use core::fmt;
use core::str::FromStr;

use crate::crc::crc8;

/// A 1-Wire ROM code
///
/// Bit 0 is the first bit sent on the bus. The low byte is the family code,
/// the next six bytes the serial number and the high byte a CRC-8 of the
/// first seven bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RomCode(pub u64);

impl RomCode {
    /// Family code of the DS1922L/T/E and DS1923 loggers
    pub const FAMILY_DS1922: u8 = 0x41;

    /// Build a ROM code from family and serial number, with its CRC-8
    pub fn new(family: u8, serial: u64) -> Self {
        let body = (serial & 0xFFFF_FFFF_FFFF) << 8 | family as u64;
        let crc = crc8(&body.to_le_bytes()[..7]);
        Self(body | (crc as u64) << 56)
    }

    /// Raw 64-bit value
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Bytes in bus order (family code first)
    pub fn to_bytes(&self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    /// Device family code
    pub fn family(&self) -> u8 {
        self.0 as u8
    }

    /// 48-bit serial number
    pub fn serial(&self) -> u64 {
        (self.0 >> 8) & 0xFFFF_FFFF_FFFF
    }

    /// CRC-8 byte stored in the code
    pub fn crc(&self) -> u8 {
        (self.0 >> 56) as u8
    }

    /// Whether the stored CRC-8 matches the family code and serial number
    pub fn crc_valid(&self) -> bool {
        crc8(&self.to_bytes()[..7]) == self.crc()
    }
}

impl From<u64> for RomCode {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

impl FromStr for RomCode {
    type Err = core::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        u64::from_str_radix(hex, 16).map(RomCode)
    }
}
