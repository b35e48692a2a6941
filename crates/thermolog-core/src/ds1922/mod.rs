//! DS1922 iButton temperature logger
//!
//! - [`Ds1922`] - a session with the logger: paged memory reads, the
//!   write-verify-copy commit of the configuration, mission commands and
//!   sample reads
//! - [`StatusRegister`] - typed view of the configuration pages
//! - [`Calibration`] - the factory calibration fit
//! - [`MissionTimeline`] - chronological reconstruction of the log

mod calibration;
mod device;
pub mod registers;
mod samples;
#[cfg(feature = "std")]
pub mod settings;

pub use calibration::Calibration;
pub use device::Ds1922;
pub use registers::{DeviceType, StatusRegister};
pub use samples::{log_capacity, raw_to_celsius, MissionTimeline, Sample, LOG_BASE_ADDRESS};
#[cfg(feature = "std")]
pub use settings::{AlarmSettings, MissionSettings, SettingsError};

/// Memory function: read memory with CRC
pub const READ_MEMORY: u8 = 0x69;
/// Memory function: write scratchpad
pub const WRITE_SCRATCHPAD: u8 = 0x0F;
/// Memory function: read scratchpad
pub const READ_SCRATCHPAD: u8 = 0xAA;
/// Memory function: copy scratchpad
pub const COPY_SCRATCHPAD: u8 = 0x99;
/// Mission command: start mission
pub const START_MISSION: u8 = 0xCC;
/// Mission command: stop mission
pub const STOP_MISSION: u8 = 0x33;
/// Mission command: clear memory
pub const CLEAR_MEMORY: u8 = 0x96;

/// Address of the first configuration page
pub const REGISTER_ADDRESS: u16 = 0x0200;
/// Address of the calibration page
pub const CALIBRATION_ADDRESS: u16 = 0x0240;

/// Length of the password field in memory and mission commands
pub const PASSWORD_LEN: usize = 8;

/// E/S bit set once a copy scratchpad was accepted
pub const SCRATCHPAD_ACCEPTED: u8 = 0x80;

/// Time the device needs to copy the scratchpad into memory
pub const COMMIT_DELAY_MS: u32 = 1000;
