//! thermolog-ds2490 - DS2490 USB 1-Wire bridge support
//!
//! This crate drives the DS2490 USB-to-1-Wire bridge found in the DS9490R
//! and DS9490B adapters and exposes it as a
//! [`OneWireMaster`](thermolog_core::onewire::OneWireMaster).
//!
//! # Protocol Overview
//!
//! Every 1-Wire primitive is a single vendor control request. The bridge
//! executes it immediately; the host polls the status endpoint until the
//! idle flag is set and then reads the result byte from the bulk endpoint.
//!
//! # Example
//!
//! ```no_run
//! use thermolog_ds2490::Ds2490;
//! use thermolog_core::onewire::enumerate;
//!
//! let mut bridge = Ds2490::open()?;
//! for rom in enumerate(&mut bridge)? {
//!     println!("{}", rom);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod device;
mod error;
pub mod protocol;

pub use device::{parse_options, Ds2490, Ds2490Config, Ds2490DeviceInfo};
pub use error::{Ds2490Error, Result};
pub use protocol::StatusPacket;
