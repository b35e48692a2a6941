//! CLI command implementations
//!
//! Every command works on a [`Ds1922`](thermolog_core::ds1922::Ds1922)
//! session over whichever bridge was selected, so the same code drives the
//! USB adapter and the emulator.

mod config;
mod data;
mod list;
mod mission;
mod scan;

pub use config::run_config;
pub use data::run_data;
pub use list::list_bridges;
pub use mission::{run_clear, run_configure, run_start, run_stop};
pub use scan::run_scan;

/// Session over a dynamically selected bridge
pub type Session = thermolog_core::ds1922::Ds1922<Box<dyn thermolog_core::onewire::OneWireMaster>>;
