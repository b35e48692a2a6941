//! thermolog-dummy - In-memory 1-Wire bus emulator for testing
//!
//! This crate provides a dummy bus master with a set of emulated devices on
//! it. Any number of plain devices answer the ROM search; one optional
//! DS1922 logger additionally understands the memory and mission commands.
//! It's useful for testing and development without real hardware.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod logger;

use alloc::collections::VecDeque;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use thermolog_core::crc::crc16;
use thermolog_core::ds1922::{
    DeviceType, CLEAR_MEMORY, COPY_SCRATCHPAD, PASSWORD_LEN, READ_MEMORY, READ_SCRATCHPAD,
    START_MISSION, STOP_MISSION, WRITE_SCRATCHPAD,
};
use thermolog_core::error::{Error, Result};
use thermolog_core::onewire::{OneWireMaster, RomCode, SEARCH_ROM, SKIP_ROM};

pub use logger::{DummyLogger, MEMORY_SIZE};

/// Configuration for the dummy bus
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Subfamily of the emulated logger
    pub device_type: DeviceType,
    /// Samples logged by the emulated mission
    pub samples: u32,
    /// Plain devices on the bus besides the logger
    pub extra_devices: usize,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            device_type: DeviceType::Ds1922L,
            samples: 144,
            extra_devices: 0,
        }
    }
}

/// Parse bridge options for the dummy bus
///
/// Supported options:
/// - `type=<l|t|e>` - logger subfamily (default l)
/// - `samples=<n>` - samples in the emulated mission (default 144)
/// - `devices=<n>` - additional plain devices on the bus (default 0)
pub fn parse_options(options: &[(&str, &str)]) -> core::result::Result<DummyConfig, String> {
    let mut config = DummyConfig::default();

    for (key, value) in options {
        match *key {
            "type" => {
                config.device_type = match value.to_ascii_lowercase().as_str() {
                    "l" => DeviceType::Ds1922L,
                    "t" => DeviceType::Ds1922T,
                    "e" => DeviceType::Ds1922E,
                    _ => return Err(format!("Invalid type: {} (must be l, t or e)", value)),
                };
            }
            "samples" => {
                config.samples = value
                    .parse()
                    .map_err(|_| format!("Invalid samples value: {}", value))?;
            }
            "devices" => {
                config.extra_devices = value
                    .parse()
                    .map_err(|_| format!("Invalid devices value: {}", value))?;
            }
            _ => return Err(format!("Unknown option: {}", key)),
        }
    }

    Ok(config)
}

/// Faults the bus can inject
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Flip a data bit when sending the memory page at this address
    pub corrupt_page: Option<u16>,
    /// Store the first byte written to the scratchpad inverted
    pub corrupt_scratchpad: bool,
    /// Never acknowledge a copy scratchpad
    pub refuse_copy: bool,
    /// Fail every bus primitive with a transfer error
    pub transfer_error: bool,
}

/// Traffic counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Bus resets
    pub resets: usize,
    /// Copy scratchpad commands received
    pub copy_commands: usize,
    /// Mission commands (start, stop, clear) executed
    pub mission_commands: usize,
    /// Total requested delay
    pub delay_ms: u64,
}

/// Where the emulated devices are in the current transaction
enum Phase {
    /// After reset, waiting for a ROM command
    Idle,
    /// ROM search in progress: bit position and slot (id, complement, direction)
    Search { position: u8, slot: u8 },
    /// The logger is selected and waits for a function command
    Selected,
    /// Collecting the parameter bytes of a function command
    Params {
        command: u8,
        params: Vec<u8>,
        needed: usize,
    },
    /// Receiving scratchpad data at this offset
    Scratchpad { offset: usize },
    /// Sending bytes to the master
    Reply(VecDeque<u8>),
    /// Not addressed until the next reset
    Ignore,
}

/// Dummy 1-Wire bus master
///
/// Emulates the bus and the devices on it at the level of bit and byte
/// time slots, so the real frame, search and logger protocol code runs
/// against it unchanged.
pub struct DummyBus {
    devices: Vec<RomCode>,
    logger: Option<DummyLogger>,
    active: Vec<bool>,
    phase: Phase,
    faults: Faults,
    stats: BusStats,
}

impl Default for DummyBus {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            logger: None,
            active: Vec::new(),
            phase: Phase::Idle,
            faults: Faults::default(),
            stats: BusStats::default(),
        }
    }

    /// Create a bus with a fresh logger of the given subfamily
    pub fn with_logger(device_type: DeviceType) -> Self {
        let mut bus = Self::new();
        bus.logger = Some(DummyLogger::new(DummyLogger::DEFAULT_ROM, device_type));
        bus
    }

    /// Create a bus from a configuration
    ///
    /// The logger holds a running mission with the configured number of
    /// samples.
    pub fn from_config(config: &DummyConfig) -> Self {
        let mut bus = Self::with_logger(config.device_type);
        if let Some(logger) = bus.logger.as_mut() {
            logger.record_demo_mission(config.samples);
        }
        for i in 0..config.extra_devices {
            bus.add_device(RomCode::new(0x10, 0x0000_0800_0000 + i as u64));
        }
        bus
    }

    /// Add a plain device that only answers the ROM search
    pub fn add_device(&mut self, rom: RomCode) {
        self.devices.push(rom);
    }

    /// Put a logger on the bus, replacing any previous one
    pub fn set_logger(&mut self, logger: DummyLogger) {
        self.logger = Some(logger);
    }

    /// The emulated logger
    pub fn logger(&self) -> Option<&DummyLogger> {
        self.logger.as_ref()
    }

    /// The emulated logger, mutably
    pub fn logger_mut(&mut self) -> Option<&mut DummyLogger> {
        self.logger.as_mut()
    }

    /// Faults to inject
    pub fn faults_mut(&mut self) -> &mut Faults {
        &mut self.faults
    }

    /// Traffic counters
    pub fn stats(&self) -> BusStats {
        self.stats
    }

    fn roms(&self) -> Vec<u64> {
        self.logger
            .iter()
            .map(|l| l.rom().value())
            .chain(self.devices.iter().map(|r| r.value()))
            .collect()
    }

    /// Wired-AND of the current bit of all devices still in the search
    fn search_bit(&self, position: u8, complement: bool) -> bool {
        self.roms()
            .iter()
            .zip(&self.active)
            .filter(|&(_, &active)| active)
            .all(|(rom, _)| ((rom >> position) & 1 != 0) != complement)
    }

    fn select_function(&mut self, command: u8) -> Phase {
        let needed = match command {
            READ_MEMORY => 2 + PASSWORD_LEN,
            WRITE_SCRATCHPAD => 2,
            COPY_SCRATCHPAD => 3 + PASSWORD_LEN,
            START_MISSION | STOP_MISSION | CLEAR_MEMORY => PASSWORD_LEN + 1,
            READ_SCRATCHPAD => {
                return match self.logger.as_ref() {
                    Some(logger) => Phase::Reply(logger.scratchpad_reply()),
                    None => Phase::Ignore,
                };
            }
            other => {
                log::debug!("dummy logger: unknown function command 0x{:02X}", other);
                return Phase::Ignore;
            }
        };
        Phase::Params {
            command,
            params: Vec::with_capacity(needed),
            needed,
        }
    }

    fn execute(&mut self, command: u8, params: &[u8]) -> Phase {
        let faults = self.faults.clone();
        let logger = match self.logger.as_mut() {
            Some(logger) => logger,
            None => return Phase::Ignore,
        };

        match command {
            READ_MEMORY => {
                let address = u16::from_le_bytes([params[0], params[1]]);
                let mut page = logger.page(address);
                let [lo, hi] = address.to_le_bytes();
                let mut frame = Vec::with_capacity(3 + page.len());
                frame.extend_from_slice(&[READ_MEMORY, lo, hi]);
                frame.extend_from_slice(&page);
                let crc = !crc16(0, &frame);
                if faults.corrupt_page == Some(address) {
                    page[0] ^= 0x01;
                }
                let mut reply: VecDeque<u8> = page.into_iter().collect();
                reply.extend(crc.to_le_bytes());
                Phase::Reply(reply)
            }
            WRITE_SCRATCHPAD => {
                let address = u16::from_le_bytes([params[0], params[1]]);
                let offset = logger.begin_scratchpad_write(address);
                Phase::Scratchpad { offset }
            }
            COPY_SCRATCHPAD => {
                self.stats.copy_commands += 1;
                if faults.refuse_copy {
                    log::debug!("dummy logger: refusing copy scratchpad");
                } else {
                    logger.copy_scratchpad([params[0], params[1], params[2]]);
                }
                Phase::Ignore
            }
            START_MISSION | STOP_MISSION | CLEAR_MEMORY => {
                self.stats.mission_commands += 1;
                match command {
                    START_MISSION => logger.start_mission(),
                    STOP_MISSION => logger.stop_mission(),
                    _ => logger.clear_memory(),
                }
                Phase::Ignore
            }
            _ => Phase::Ignore,
        }
    }
}

impl OneWireMaster for DummyBus {
    fn reset(&mut self) -> Result<()> {
        if self.faults.transfer_error {
            return Err(Error::TransferFailed);
        }
        self.stats.resets += 1;
        self.phase = Phase::Idle;
        Ok(())
    }

    fn touch_bit(&mut self, bit: bool) -> Result<bool> {
        if self.faults.transfer_error {
            return Err(Error::TransferFailed);
        }

        let (position, slot) = match self.phase {
            Phase::Search { position, slot } => (position, slot),
            _ => return Ok(bit),
        };

        let read = match slot {
            0 => self.search_bit(position, false),
            1 => self.search_bit(position, true),
            _ => {
                let roms = self.roms();
                for (rom, active) in roms.iter().zip(self.active.iter_mut()) {
                    if ((rom >> position) & 1 != 0) != bit {
                        *active = false;
                    }
                }
                bit
            }
        };

        self.phase = match (slot, position) {
            (0 | 1, _) => Phase::Search {
                position,
                slot: slot + 1,
            },
            (_, 63) => Phase::Ignore,
            _ => Phase::Search {
                position: position + 1,
                slot: 0,
            },
        };
        Ok(read && bit)
    }

    fn touch_byte(&mut self, byte: u8) -> Result<u8> {
        if self.faults.transfer_error {
            return Err(Error::TransferFailed);
        }

        let phase = core::mem::replace(&mut self.phase, Phase::Ignore);
        let (next, read) = match phase {
            Phase::Idle => match byte {
                SEARCH_ROM => {
                    self.active = alloc::vec![true; self.roms().len()];
                    (Phase::Search { position: 0, slot: 0 }, byte)
                }
                SKIP_ROM if self.logger.is_some() => (Phase::Selected, byte),
                _ => (Phase::Ignore, byte),
            },
            Phase::Selected => (self.select_function(byte), byte),
            Phase::Params {
                command,
                mut params,
                needed,
            } => {
                params.push(byte);
                if params.len() == needed {
                    (self.execute(command, &params), byte)
                } else {
                    (
                        Phase::Params {
                            command,
                            params,
                            needed,
                        },
                        byte,
                    )
                }
            }
            Phase::Scratchpad { offset } => {
                let corrupt = self.faults.corrupt_scratchpad;
                if let Some(logger) = self.logger.as_mut() {
                    logger.write_scratchpad(offset, byte, corrupt);
                }
                (Phase::Scratchpad { offset: offset + 1 }, byte)
            }
            Phase::Reply(mut reply) => {
                let data = reply.pop_front().unwrap_or(0xFF);
                (Phase::Reply(reply), byte & data)
            }
            Phase::Search { .. } | Phase::Ignore => (Phase::Ignore, byte),
        };

        self.phase = next;
        Ok(read)
    }

    fn delay_ms(&mut self, ms: u32) {
        self.stats.delay_ms += ms as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermolog_core::onewire::{enumerate, frame_read, frame_write};

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("type", "T"), ("samples", "10"), ("devices", "2")]).unwrap();
        assert_eq!(config.device_type, DeviceType::Ds1922T);
        assert_eq!(config.samples, 10);
        assert_eq!(config.extra_devices, 2);
        assert!(parse_options(&[("type", "x")]).is_err());
        assert!(parse_options(&[("speed", "1")]).is_err());
    }

    #[test]
    fn test_from_config_devices() {
        let config = DummyConfig {
            extra_devices: 2,
            ..Default::default()
        };
        let mut bus = DummyBus::from_config(&config);
        let roms = enumerate(&mut bus).unwrap();
        assert_eq!(roms.len(), 3);
        assert!(roms.iter().all(|rom| rom.crc_valid()));
        assert!(roms.contains(&DummyLogger::DEFAULT_ROM));
    }

    #[test]
    fn test_unaddressed_reads_float_high() {
        let mut bus = DummyBus::with_logger(DeviceType::Ds1922L);
        frame_write(&mut bus, &[0x55]).unwrap();
        let mut buf = [0u8; 2];
        frame_read(&mut bus, &mut buf).unwrap();
        assert_eq!(buf, [0xFF, 0xFF]);
    }

    #[test]
    fn test_transfer_error() {
        let mut bus = DummyBus::with_logger(DeviceType::Ds1922L);
        bus.faults_mut().transfer_error = true;
        assert_eq!(bus.reset(), Err(Error::TransferFailed));
        assert_eq!(bus.touch_byte(0xCC), Err(Error::TransferFailed));
    }
}
