//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "thermolog")]
#[command(
    author,
    version,
    about = "DS1922 temperature logger readout over a DS9490 USB 1-Wire adapter",
    long_about = None
)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Bridge to use, optionally with options (e.g. ds2490:index=1, dummy:type=t).
    /// See list-bridges for the available bridges.
    #[arg(short, long, default_value = "ds2490", global = true)]
    pub bridge: String,

    /// Search the bus and print the ROM codes found
    #[arg(short, long)]
    pub scan: bool,

    /// Show the logger configuration
    #[arg(short, long)]
    pub config: bool,

    /// Show the logged samples
    #[arg(short, long)]
    pub data: bool,

    /// Read at most this many samples
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Readout sections to run: scan, configuration, data
    ///
    /// Without any flag the configuration and the data are shown.
    pub fn readout(&self) -> (bool, bool, bool) {
        if self.scan || self.config || self.data {
            (self.scan, self.config, self.data)
        } else {
            (false, true, true)
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a mission with the configuration stored on the logger
    Start,

    /// Stop the running mission
    Stop,

    /// Clear the log memory and mission registers
    Clear,

    /// Write mission settings from a TOML file to the logger
    Configure {
        /// Settings file (TOML format)
        #[arg(short, long)]
        file: PathBuf,

        /// Also set the logger clock to the local time
        #[arg(long)]
        sync_clock: bool,
    },

    /// List supported bridges and connected adapters
    ListBridges,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_readout() {
        let cli = Cli::parse_from(["thermolog"]);
        assert_eq!(cli.readout(), (false, true, true));
        assert_eq!(cli.bridge, "ds2490");
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_combined_flags() {
        let cli = Cli::parse_from(["thermolog", "-s", "-d", "-b", "dummy"]);
        assert_eq!(cli.readout(), (true, false, true));
        assert_eq!(cli.bridge, "dummy");
    }

    #[test]
    fn test_configure_command() {
        let cli = Cli::parse_from([
            "thermolog",
            "configure",
            "--file",
            "mission.toml",
            "--sync-clock",
        ]);
        match cli.command {
            Some(Commands::Configure { file, sync_clock }) => {
                assert_eq!(file, PathBuf::from("mission.toml"));
                assert!(sync_clock);
            }
            _ => panic!("expected configure"),
        }
    }

    #[test]
    fn test_list_bridges_ignores_bridge() {
        // Listing never opens the bridge, so any name is accepted here
        let cli = Cli::parse_from(["thermolog", "-b", "ch341a", "list-bridges"]);
        assert!(matches!(cli.command, Some(Commands::ListBridges)));
        assert_eq!(cli.bridge, "ch341a");
    }
}
