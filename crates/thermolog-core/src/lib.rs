//! thermolog-core - 1-Wire bus protocol and DS1922 temperature logger support
//!
//! This crate contains the protocol engineering for reading Maxim DS1922
//! iButton temperature loggers through a 1-Wire bus master. It is designed
//! to be `no_std` compatible (an allocator is required).
//!
//! The crate is split in two layers:
//!
//! - [`onewire`] - the bus master abstraction (`OneWireMaster`), bit/byte
//!   exchange helpers, command frames and the ROM search algorithm
//! - [`ds1922`] - the logger's register image, mission control, calibration
//!   and sample decoding
//!
//! # Features
//!
//! - `std` - Enable standard library support and TOML mission settings
//!
//! # Example
//!
//! ```ignore
//! use thermolog_core::ds1922::Ds1922;
//!
//! fn dump<M: thermolog_core::onewire::OneWireMaster>(master: M) -> thermolog_core::Result<()> {
//!     let mut logger = Ds1922::new(master);
//!     logger.read_configuration()?;
//!     println!("{} samples logged", logger.registers().sample_count());
//!     for value in logger.read_samples(usize::MAX)? {
//!         println!("{:.3}", value);
//!     }
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod crc;
pub mod ds1922;
pub mod error;
pub mod onewire;

pub use error::{Error, ErrorKind, Result};
