//! 1-Wire bus layer
//!
//! This module provides the bus master abstraction and everything that is
//! built on the bit and byte exchange primitives:
//!
//! - [`OneWireMaster`] - the trait a bus bridge implements
//! - [`frame`] - checked byte writes and broadcast command frames
//! - [`search`] - the ROM search that enumerates device identifiers
//! - [`RomCode`] - a 64-bit device identifier

pub mod frame;
pub mod rom;
pub mod search;
mod traits;

pub use frame::{frame_read, frame_write, read_byte, write_byte};
pub use rom::RomCode;
pub use search::{enumerate, RomSearch};
pub use traits::OneWireMaster;

/// ROM command: search ROM
pub const SEARCH_ROM: u8 = 0xF0;
/// ROM command: skip ROM (address every device, i.e. the only one)
pub const SKIP_ROM: u8 = 0xCC;
