//! DS1922 session

use alloc::vec::Vec;

use super::calibration::Calibration;
use super::registers::{StatusRegister, PAGE_SIZE, RTC_LEN};
use super::samples::{log_capacity, raw_to_celsius, LOG_BASE_ADDRESS};
use super::{
    CALIBRATION_ADDRESS, CLEAR_MEMORY, COMMIT_DELAY_MS, COPY_SCRATCHPAD, PASSWORD_LEN,
    READ_MEMORY, READ_SCRATCHPAD, REGISTER_ADDRESS, SCRATCHPAD_ACCEPTED, START_MISSION,
    STOP_MISSION, WRITE_SCRATCHPAD,
};
use crate::crc::{check_crc16, CRC16_RESIDUAL};
use crate::error::{Error, Result};
use crate::onewire::{enumerate, frame_read, frame_write, OneWireMaster, RomCode};

/// Read scratchpad reply: TA1, TA2, E/S and up to one page of data
const SCRATCHPAD_REPLY_LEN: usize = 3 + PAGE_SIZE;

/// Session with the DS1922 logger on a 1-Wire bus
///
/// The session owns the bus master, the register image and the calibration
/// cache. All device commands use skip ROM, so the bus must carry exactly
/// one device; the first [`read_configuration`](Self::read_configuration)
/// checks this with a ROM search.
pub struct Ds1922<M: OneWireMaster> {
    master: M,
    rom: Option<RomCode>,
    registers: StatusRegister,
    registers_valid: bool,
    calibration: Option<Calibration>,
    last_error: Option<Error>,
}

impl<M: OneWireMaster> Ds1922<M> {
    /// Create a session on `master`
    pub fn new(master: M) -> Self {
        Self {
            master,
            rom: None,
            registers: StatusRegister::default(),
            registers_valid: false,
            calibration: None,
            last_error: None,
        }
    }

    /// The bus master
    pub fn master(&self) -> &M {
        &self.master
    }

    /// The bus master, mutably
    pub fn master_mut(&mut self) -> &mut M {
        &mut self.master
    }

    /// End the session and return the bus master
    pub fn into_inner(self) -> M {
        self.master
    }

    /// ROM code of the device, once the bus has been checked
    pub fn rom(&self) -> Option<RomCode> {
        self.rom
    }

    /// Register image
    ///
    /// After a failed re-read this still holds the data of the last
    /// successful read, see [`registers_valid`](Self::registers_valid).
    pub fn registers(&self) -> &StatusRegister {
        &self.registers
    }

    /// Register image for modification; changes reach the device through
    /// [`write_configuration`](Self::write_configuration)
    pub fn registers_mut(&mut self) -> &mut StatusRegister {
        &mut self.registers
    }

    /// Whether the register image comes from a successful read
    pub fn registers_valid(&self) -> bool {
        self.registers_valid
    }

    /// Calibration, once it has been read
    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// Error of the most recent failed operation
    pub fn last_error(&self) -> Option<Error> {
        self.last_error
    }

    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.last_error = Some(*e);
        }
        result
    }

    fn ensure_open(&mut self) -> Result<()> {
        if !self.master.is_open() {
            self.master.open()?;
        }
        Ok(())
    }

    /// Search the bus and require exactly one device
    pub fn check_bus(&mut self) -> Result<RomCode> {
        let result = self.check_bus_inner();
        self.track(result)
    }

    fn check_bus_inner(&mut self) -> Result<RomCode> {
        self.ensure_open()?;
        let roms = enumerate(&mut self.master)?;
        let rom = match roms.as_slice() {
            [] => return Err(Error::NoDevice),
            [rom] => *rom,
            _ => return Err(Error::MultipleDevices { count: roms.len() }),
        };
        if rom.family() != RomCode::FAMILY_DS1922 {
            log::warn!(
                "device {} has family code 0x{:02X}, not a DS1922",
                rom,
                rom.family()
            );
        }
        log::info!("using device {}", rom);
        self.rom = Some(rom);
        Ok(rom)
    }

    /// Read one 32-byte memory page and verify its CRC-16
    pub fn read_memory_page(&mut self, address: u16) -> Result<[u8; PAGE_SIZE]> {
        let result = self.read_memory_page_inner(address);
        self.track(result)
    }

    fn read_memory_page_inner(&mut self, address: u16) -> Result<[u8; PAGE_SIZE]> {
        let [lo, hi] = address.to_le_bytes();
        let mut command = [0u8; 3 + PASSWORD_LEN];
        command[..3].copy_from_slice(&[READ_MEMORY, lo, hi]);
        frame_write(&mut self.master, &command)?;

        // Header, page and CRC in one buffer for the residual check
        let mut frame = [0u8; 3 + PAGE_SIZE + 2];
        frame[..3].copy_from_slice(&command[..3]);
        frame_read(&mut self.master, &mut frame[3..3 + PAGE_SIZE])?;
        frame_read(&mut self.master, &mut frame[3 + PAGE_SIZE..])?;

        if !check_crc16(&frame) {
            log::debug!(
                "page 0x{:04X} failed CRC check (expected residual 0x{:04X})",
                address,
                CRC16_RESIDUAL
            );
            return Err(Error::CrcMismatch { address });
        }

        let mut page = [0u8; PAGE_SIZE];
        page.copy_from_slice(&frame[3..3 + PAGE_SIZE]);
        log::debug!("read page 0x{:04X}", address);
        Ok(page)
    }

    /// Read both configuration pages into the register image
    ///
    /// Opens the bus session if needed. On failure the image keeps its
    /// previous content but is no longer valid for writing.
    pub fn read_configuration(&mut self) -> Result<()> {
        let result = self.read_configuration_inner();
        self.track(result)
    }

    fn read_configuration_inner(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.rom.is_none() {
            self.check_bus_inner()?;
        }

        let pages = self
            .read_memory_page_inner(REGISTER_ADDRESS)
            .and_then(|first| {
                let second = self.read_memory_page_inner(REGISTER_ADDRESS + PAGE_SIZE as u16)?;
                Ok((first, second))
            });

        match pages {
            Ok((first, second)) => {
                self.registers.load(&first, &second);
                self.registers_valid = true;
                log::info!(
                    "read configuration of {} logger",
                    self.registers.device_type()
                );
                Ok(())
            }
            Err(e) => {
                self.registers_valid = false;
                Err(e)
            }
        }
    }

    /// Commit the register image to the device
    ///
    /// Each page goes through write scratchpad, read-back verification,
    /// copy scratchpad and a check of the copy acknowledgment. The first
    /// page skips the clock bytes unless the clock was set. A failure on the
    /// first page leaves the second one untouched.
    pub fn write_configuration(&mut self) -> Result<()> {
        let result = self.write_configuration_inner();
        self.track(result)
    }

    fn write_configuration_inner(&mut self) -> Result<()> {
        if !self.registers_valid {
            return Err(Error::ConfigurationNotRead);
        }
        self.ensure_open()?;

        let image = *self.registers.as_bytes();
        let skip = if self.registers.clock_changed() {
            0
        } else {
            RTC_LEN
        };
        self.commit_page(REGISTER_ADDRESS + skip as u16, &image[skip..PAGE_SIZE])?;
        self.commit_page(
            REGISTER_ADDRESS + PAGE_SIZE as u16,
            &image[PAGE_SIZE..2 * PAGE_SIZE],
        )?;

        self.registers.clear_clock_changed();
        log::info!("configuration written");
        Ok(())
    }

    fn read_scratchpad(&mut self) -> Result<[u8; SCRATCHPAD_REPLY_LEN]> {
        frame_write(&mut self.master, &[READ_SCRATCHPAD])?;
        let mut reply = [0u8; SCRATCHPAD_REPLY_LEN];
        frame_read(&mut self.master, &mut reply)?;
        Ok(reply)
    }

    fn commit_page(&mut self, address: u16, payload: &[u8]) -> Result<()> {
        log::debug!(
            "committing {} bytes to 0x{:04X}",
            payload.len(),
            address
        );
        let [lo, hi] = address.to_le_bytes();

        let mut command = Vec::with_capacity(3 + payload.len());
        command.extend_from_slice(&[WRITE_SCRATCHPAD, lo, hi]);
        command.extend_from_slice(payload);
        frame_write(&mut self.master, &command)?;

        let reply = self.read_scratchpad()?;
        let found = u16::from_le_bytes([reply[0], reply[1]]);
        if found != address {
            return Err(Error::ScratchpadAddressMismatch {
                expected: address,
                found,
            });
        }
        if let Some(offset) = payload
            .iter()
            .zip(&reply[3..])
            .position(|(sent, read)| sent != read)
        {
            return Err(Error::ScratchpadDataMismatch {
                offset: offset as u8,
            });
        }

        let mut copy = [0u8; 4 + PASSWORD_LEN];
        copy[..4].copy_from_slice(&[COPY_SCRATCHPAD, reply[0], reply[1], reply[2]]);
        frame_write(&mut self.master, &copy)?;

        self.master.delay_ms(COMMIT_DELAY_MS);

        let reply = self.read_scratchpad()?;
        if reply[2] & SCRATCHPAD_ACCEPTED == 0 {
            return Err(Error::CopyNotAcknowledged { address });
        }
        Ok(())
    }

    fn mission_command(&mut self, command: u8) -> Result<()> {
        self.ensure_open()?;
        let mut frame = [0u8; 1 + PASSWORD_LEN + 1];
        frame[0] = command;
        frame[1 + PASSWORD_LEN] = 0xFF;
        frame_write(&mut self.master, &frame)
    }

    /// Start a mission with the committed configuration
    ///
    /// The device does not acknowledge mission commands; success only means
    /// the command reached the bus.
    pub fn start_mission(&mut self) -> Result<()> {
        let result = self.mission_command(START_MISSION);
        if result.is_ok() {
            log::info!("mission started");
        }
        self.track(result)
    }

    /// Stop the running mission
    pub fn stop_mission(&mut self) -> Result<()> {
        let result = self.mission_command(STOP_MISSION);
        if result.is_ok() {
            log::info!("mission stopped");
        }
        self.track(result)
    }

    /// Clear the log memory and mission registers
    pub fn clear_memory(&mut self) -> Result<()> {
        let result = self.mission_command(CLEAR_MEMORY);
        if result.is_ok() {
            log::info!("memory cleared");
        }
        self.track(result)
    }

    /// Read the calibration page and fit the correction
    ///
    /// Does nothing for devices without calibration data or when the
    /// calibration is already known. Degenerate calibration data is logged
    /// and leaves the session uncalibrated.
    pub fn read_calibration(&mut self) -> Result<()> {
        let result = self.read_calibration_inner();
        self.track(result)
    }

    fn read_calibration_inner(&mut self) -> Result<()> {
        if !self.registers_valid {
            return Err(Error::ConfigurationNotRead);
        }
        if self.calibration.is_some() {
            return Ok(());
        }
        let device = self.registers.device_type();
        if !device.supports_calibration() {
            log::debug!("{} has no calibration data", device);
            return Ok(());
        }
        self.ensure_open()?;

        let page = self.read_memory_page_inner(CALIBRATION_ADDRESS)?;
        match Calibration::from_page(&page, device) {
            Some(calibration) => {
                log::debug!("calibration coefficients: {:?}", calibration.coefficients());
                self.calibration = Some(calibration);
            }
            None => log::warn!("calibration data is degenerate, samples stay uncorrected"),
        }
        Ok(())
    }

    /// Convert one raw sample with the session's calibration
    pub fn convert(&self, hi: u8, lo: u8) -> f64 {
        let celsius = raw_to_celsius(hi, lo, self.registers.device_type());
        match &self.calibration {
            Some(calibration) => calibration.correct(celsius),
            None => celsius,
        }
    }

    /// Read up to `max_count` logged samples in log memory order
    ///
    /// See [`read_samples_with_progress`](Self::read_samples_with_progress).
    pub fn read_samples(&mut self, max_count: usize) -> Result<Vec<f64>> {
        self.read_samples_with_progress(max_count, |_, _| {})
    }

    /// Read up to `max_count` logged samples in log memory order
    ///
    /// The count is clamped to the samples of the current mission and to the
    /// log capacity. Calibration is read on first use; failing to read it
    /// only leaves the values uncorrected. `progress` is called after every
    /// page with the number of samples read and the total.
    ///
    /// The result is indexed by log position. Use
    /// [`MissionTimeline`](super::MissionTimeline) to order it when the log
    /// has rolled over.
    pub fn read_samples_with_progress<F>(&mut self, max_count: usize, progress: F) -> Result<Vec<f64>>
    where
        F: FnMut(usize, usize),
    {
        let result = self.read_samples_inner(max_count, progress);
        self.track(result)
    }

    fn read_samples_inner<F>(&mut self, max_count: usize, mut progress: F) -> Result<Vec<f64>>
    where
        F: FnMut(usize, usize),
    {
        if !self.registers_valid {
            return Err(Error::ConfigurationNotRead);
        }
        self.ensure_open()?;

        if self.calibration.is_none() {
            if let Err(e) = self.read_calibration_inner() {
                log::warn!("reading calibration failed ({}), samples stay uncorrected", e);
            }
        }

        let high_resolution = self.registers.high_resolution();
        let total = max_count
            .min(self.registers.sample_count() as usize)
            .min(log_capacity(high_resolution));
        let sample_size = if high_resolution { 2 } else { 1 };
        log::debug!(
            "reading {} samples ({} byte(s) each)",
            total,
            sample_size
        );

        let mut samples = Vec::with_capacity(total);
        let mut address = LOG_BASE_ADDRESS;
        while samples.len() < total {
            let page = self.read_memory_page_inner(address)?;
            for raw in page.chunks_exact(sample_size) {
                if samples.len() == total {
                    break;
                }
                let lo = raw.get(1).copied().unwrap_or(0);
                samples.push(self.convert(raw[0], lo));
            }
            address = address.wrapping_add(PAGE_SIZE as u16);
            progress(samples.len(), total);
        }

        log::info!("read {} samples", samples.len());
        Ok(samples)
    }
}
