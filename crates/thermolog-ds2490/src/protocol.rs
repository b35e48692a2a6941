//! DS2490 protocol constants and status packet parsing
//!
//! The DS2490 is driven with vendor control requests on endpoint 0. A
//! communication command starts a 1-Wire operation; the bridge reports
//! progress in a status packet on the interrupt endpoint 0x81 and returns
//! bytes read from the bus on the bulk endpoint 0x83.
//!
//! Status packet layout (16 bytes followed by result codes):
//!
//! | Byte | Meaning                      |
//! |------|------------------------------|
//! | 0    | enable flags                 |
//! | 1    | 1-Wire speed                 |
//! | 8    | status flags                 |
//! | 9-10 | current communication command |
//! | 11   | communication buffer status  |
//! | 12   | 1-Wire write buffer status   |
//! | 13   | 1-Wire read buffer status    |
//! | 16.. | result codes                 |

/// USB vendor ID (Dallas Semiconductor / Maxim)
pub const DS2490_USB_VENDOR: u16 = 0x04FA;
/// USB product ID
pub const DS2490_USB_PRODUCT: u16 = 0x2490;

/// USB configuration to select
pub const USB_CONFIGURATION: u8 = 1;
/// Interface carrying all endpoints
pub const USB_INTERFACE: u8 = 0;
/// Alternate setting: interrupt polling every 1 ms, 64 byte bulk packets
pub const USB_ALT_SETTING: u8 = 3;

/// Status interrupt endpoint
pub const STATUS_EP: u8 = 0x81;
/// Bulk endpoint with data read from the bus
pub const DATA_IN_EP: u8 = 0x83;

/// Maximum status packet length
pub const STATUS_PACKET_LEN: usize = 32;
/// Length of the fixed part of the status packet
pub const STATUS_HEADER_LEN: usize = 16;

/// Default USB transfer timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
/// Default number of status packets to wait for the idle flag
pub const DEFAULT_POLL_LIMIT: u32 = 1000;

/// Vendor request: communication command
pub const COMM_CMD: u8 = 0x01;

// Communication command values (function code plus flag bits)
/// 1-Wire reset with immediate execution
pub const COMM_RESET: u16 = 0x0043;
/// Byte I/O with immediate execution and read-back; byte in wIndex
pub const COMM_BYTE_IO: u16 = 0x0053;
/// Bit I/O with immediate execution and read-back; bit in D (bit 3)
pub const COMM_BIT_IO: u16 = 0x0021;
/// Position of the data bit in a bit I/O command
const COMM_BIT_IO_DATA_SHIFT: u16 = 3;

// Status flags (byte 8)
/// Strong pull-up active
pub const STATUS_SPUA: u8 = 0x01;
/// No command executing
pub const STATUS_IDLE: u8 = 0x20;

// Result codes (byte 16..)
/// Reported when a device attaches to the bus; not an error
pub const RESULT_DEVICE_DETECT: u8 = 0xA5;
/// No presence pulse after reset
pub const RESULT_NRS: u8 = 0x01;
/// 1-Wire short detected
pub const RESULT_SH: u8 = 0x02;

/// Build the value of a bit I/O command
pub fn bit_io_value(bit: bool) -> u16 {
    COMM_BIT_IO | (bit as u16) << COMM_BIT_IO_DATA_SHIFT
}

/// Parsed status packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPacket {
    /// Status flags (byte 8)
    pub flags: u8,
    /// Bytes waiting in the read buffer
    pub read_buffer: u8,
    /// Result codes reported since the last packet
    pub results: Vec<u8>,
}

impl StatusPacket {
    /// Parse a status packet; returns `None` if it is shorter than the
    /// fixed header
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < STATUS_HEADER_LEN {
            return None;
        }
        Some(Self {
            flags: data[8],
            read_buffer: data[13],
            results: data[STATUS_HEADER_LEN..].to_vec(),
        })
    }

    /// Whether the bridge finished executing
    pub fn is_idle(&self) -> bool {
        self.flags & STATUS_IDLE != 0
    }

    /// Whether a result code reports a missing presence pulse
    pub fn no_presence(&self) -> bool {
        self.errors().any(|code| code & RESULT_NRS != 0)
    }

    /// Whether a result code reports a short on the bus
    pub fn short_detected(&self) -> bool {
        self.errors().any(|code| code & RESULT_SH != 0)
    }

    /// Result codes that are errors (device detection is not)
    pub fn errors(&self) -> impl Iterator<Item = u8> + '_ {
        self.results
            .iter()
            .copied()
            .filter(|&code| code != RESULT_DEVICE_DETECT)
    }
}
