//! thermolog - DS1922 temperature logger readout
//!
//! Reads the configuration and the logged samples of a DS1922 iButton
//! through a DS9490 USB 1-Wire adapter, and configures and controls its
//! missions.
//!
//! # Architecture
//!
//! Bridges implement the `OneWireMaster` trait from `thermolog-core`; the
//! logger protocol is written once against that trait. Every command opens
//! the selected bridge, wraps it in a `Ds1922` session and works through the
//! session's typed accessors.

mod bridges;
mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use thermolog_core::ds1922::Ds1922;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match &cli.command {
        Some(Commands::ListBridges) => {
            commands::list_bridges();
            Ok(())
        }
        Some(Commands::Start) => commands::run_start(&mut open_session(&cli.bridge)?),
        Some(Commands::Stop) => commands::run_stop(&mut open_session(&cli.bridge)?),
        Some(Commands::Clear) => commands::run_clear(&mut open_session(&cli.bridge)?),
        Some(Commands::Configure { file, sync_clock }) => {
            commands::run_configure(&mut open_session(&cli.bridge)?, file, *sync_clock)
        }
        None => {
            let mut session = open_session(&cli.bridge)?;
            let (scan, config, data) = cli.readout();
            if scan {
                commands::run_scan(&mut session)?;
            }
            if config {
                commands::run_config(&mut session)?;
            }
            if data {
                if config {
                    println!();
                }
                commands::run_data(&mut session, cli.count)?;
            }
            Ok(())
        }
    }
}

/// Open the selected bridge and wrap it in a logger session
fn open_session(bridge: &str) -> Result<commands::Session, Box<dyn std::error::Error>> {
    let master = bridges::open_bridge(bridge)?;
    Ok(Ds1922::new(master))
}
