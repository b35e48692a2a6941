//! Error types for thermolog-core
//!
//! This module provides a no_std compatible error type shared by the bus
//! layer and the logger protocol. Every error belongs to one of three
//! classes, see [`ErrorKind`].

use core::fmt;

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bus session or the bridge failed (not open, USB error, timeout)
    Transport,
    /// Data came back from the device but did not check out
    Integrity,
    /// The caller used the API in the wrong order or with a bad value
    State,
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Transport errors
    /// The bus session is not open
    BusNotOpen,
    /// No matching USB bridge was found
    BridgeNotFound,
    /// The bridge reported an error or a USB transfer failed
    TransferFailed,
    /// The bridge did not become idle in time
    Timeout,
    /// No device answered on the bus
    NoDevice,

    // Integrity errors
    /// CRC-16 of a memory page did not match
    CrcMismatch {
        /// Page address that was read
        address: u16,
    },
    /// A byte written to the bus was not echoed back unchanged
    EchoMismatch {
        /// Byte that was written
        written: u8,
        /// Byte that was read back
        read: u8,
    },
    /// Scratchpad read back with a different target address
    ScratchpadAddressMismatch {
        /// Address that was written
        expected: u16,
        /// Address reported by the device
        found: u16,
    },
    /// Scratchpad read back with different data
    ScratchpadDataMismatch {
        /// Offset of the first differing byte within the payload
        offset: u8,
    },
    /// Copy scratchpad did not set the authorization-accepted bit
    CopyNotAcknowledged {
        /// Target address of the copy
        address: u16,
    },

    // State errors
    /// Operation requires a successful configuration read first
    ConfigurationNotRead,
    /// More than one device answered on the bus
    MultipleDevices {
        /// Number of devices found
        count: usize,
    },
    /// A sample rate of zero would lock up the device
    InvalidSampleRate,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BusNotOpen
            | Self::BridgeNotFound
            | Self::TransferFailed
            | Self::Timeout
            | Self::NoDevice => ErrorKind::Transport,
            Self::CrcMismatch { .. }
            | Self::EchoMismatch { .. }
            | Self::ScratchpadAddressMismatch { .. }
            | Self::ScratchpadDataMismatch { .. }
            | Self::CopyNotAcknowledged { .. } => ErrorKind::Integrity,
            Self::ConfigurationNotRead | Self::MultipleDevices { .. } | Self::InvalidSampleRate => {
                ErrorKind::State
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport error"),
            Self::Integrity => write!(f, "integrity error"),
            Self::State => write!(f, "state error"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusNotOpen => write!(f, "1-Wire bus not open"),
            Self::BridgeNotFound => write!(f, "no USB 1-Wire bridge found"),
            Self::TransferFailed => write!(f, "USB transfer to the bridge failed"),
            Self::Timeout => write!(f, "timeout waiting for the bridge to become idle"),
            Self::NoDevice => write!(f, "no device found on the 1-Wire bus"),
            Self::CrcMismatch { address } => {
                write!(f, "wrong CRC reading memory page 0x{:04X}", address)
            }
            Self::EchoMismatch { written, read } => write!(
                f,
                "byte written to the bus not echoed: wrote 0x{:02X}, read 0x{:02X}",
                written, read
            ),
            Self::ScratchpadAddressMismatch { expected, found } => write!(
                f,
                "scratchpad target address wrong: expected 0x{:04X}, found 0x{:04X}",
                expected, found
            ),
            Self::ScratchpadDataMismatch { offset } => {
                write!(f, "scratchpad data wrong at offset {}", offset)
            }
            Self::CopyNotAcknowledged { address } => write!(
                f,
                "copy scratchpad to 0x{:04X} not acknowledged (AA bit not set)",
                address
            ),
            Self::ConfigurationNotRead => write!(f, "configuration must be read first"),
            Self::MultipleDevices { count } => write!(
                f,
                "{} devices on the 1-Wire bus, only a single device is supported",
                count
            ),
            Self::InvalidSampleRate => write!(f, "sample rate must not be zero"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::Timeout.kind(), ErrorKind::Transport);
        assert_eq!(Error::CrcMismatch { address: 0x200 }.kind(), ErrorKind::Integrity);
        assert_eq!(
            Error::EchoMismatch {
                written: 0xCC,
                read: 0xFF
            }
            .kind(),
            ErrorKind::Integrity
        );
        assert_eq!(Error::ConfigurationNotRead.kind(), ErrorKind::State);
        assert_eq!(Error::MultipleDevices { count: 2 }.kind(), ErrorKind::State);
    }
}
