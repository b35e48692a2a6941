//! Emulated DS1922 memory and scratchpad

use alloc::collections::VecDeque;
use alloc::vec;
use alloc::vec::Vec;

use thermolog_core::crc::crc16;
use thermolog_core::ds1922::registers::{
    GeneralStatus, MissionControl, RtcControl, ALARM_STATUS, DEVICE_CONFIGURATION,
    DEVICE_SAMPLE_COUNT, GENERAL_STATUS, MISSION_CONTROL, MISSION_SAMPLE_COUNT, MISSION_TIMESTAMP,
    PAGE_SIZE, REGISTER_SIZE, RTC, RTC_CONTROL, RTC_LEN, SAMPLE_RATE,
};
use thermolog_core::ds1922::{
    log_capacity, DeviceType, StatusRegister, CALIBRATION_ADDRESS, LOG_BASE_ADDRESS,
    READ_SCRATCHPAD, REGISTER_ADDRESS, SCRATCHPAD_ACCEPTED,
};
use thermolog_core::onewire::RomCode;

/// Emulated address space (registers, calibration and log memory)
pub const MEMORY_SIZE: usize = 0x3000;

/// Ending offset bits of the E/S byte
const ENDING_OFFSET: u8 = 0x1F;

/// Factory calibration used for new loggers: Tr2/Tc2 and Tr3/Tc3
const DEFAULT_CALIBRATION: [u8; 8] = [50, 0, 51, 0, 120, 0, 122, 0];

/// 2014-06-24 13:15:30
const DEFAULT_CLOCK: [u8; RTC_LEN] = [0x30, 0x15, 0x13, 0x24, 0x06, 0x14];
/// 2014-06-20 08:00:00
const DEMO_MISSION_START: [u8; RTC_LEN] = [0x00, 0x00, 0x08, 0x20, 0x06, 0x14];

const REGISTERS: usize = REGISTER_ADDRESS as usize;

/// An emulated DS1922 logger
#[derive(Debug, Clone)]
pub struct DummyLogger {
    rom: RomCode,
    memory: Vec<u8>,
    scratchpad: [u8; PAGE_SIZE],
    target: u16,
    status: u8,
}

impl DummyLogger {
    /// ROM code of the logger created by [`DummyBus::with_logger`](crate::DummyBus::with_logger)
    pub const DEFAULT_ROM: RomCode = RomCode(0x8900_0012_3456_7841);

    /// Create a logger with its clock running, a 10 minute sample rate and
    /// no mission
    pub fn new(rom: RomCode, device_type: DeviceType) -> Self {
        let mut logger = Self {
            rom,
            memory: vec![0xFF; MEMORY_SIZE],
            scratchpad: [0xFF; PAGE_SIZE],
            target: 0,
            status: 0,
        };

        logger.memory[REGISTERS..REGISTERS + REGISTER_SIZE].fill(0);
        logger.set_register_bytes(RTC, &DEFAULT_CLOCK);
        logger.set_register_bytes(SAMPLE_RATE, &10u16.to_le_bytes());
        logger.set_register_bytes(RTC_CONTROL, &[RtcControl::OSCILLATOR.bits()]);
        logger.set_register_bytes(DEVICE_CONFIGURATION, &[device_type.code()]);
        if device_type.supports_calibration() {
            logger.set_calibration(&DEFAULT_CALIBRATION);
        }
        logger
    }

    /// ROM code
    pub fn rom(&self) -> RomCode {
        self.rom
    }

    /// Whole address space
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Whole address space, mutably
    pub fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    /// Current register pages
    pub fn registers(&self) -> StatusRegister {
        let mut bytes = [0u8; REGISTER_SIZE];
        bytes.copy_from_slice(&self.memory[REGISTERS..REGISTERS + REGISTER_SIZE]);
        StatusRegister::from_bytes(bytes)
    }

    /// Overwrite register bytes starting at `offset` (relative to 0x0200)
    pub fn set_register_bytes(&mut self, offset: usize, bytes: &[u8]) {
        let start = REGISTERS + offset;
        self.memory[start..start + bytes.len()].copy_from_slice(bytes);
    }

    fn register(&self, offset: usize) -> u8 {
        self.memory[REGISTERS + offset]
    }

    fn u24(&self, offset: usize) -> u32 {
        let b = &self.memory[REGISTERS + offset..REGISTERS + offset + 3];
        u32::from_le_bytes([b[0], b[1], b[2], 0])
    }

    fn set_u24(&mut self, offset: usize, value: u32) {
        self.set_register_bytes(offset, &value.to_le_bytes()[..3]);
    }

    /// Write the calibration page (Tr2, Tc2, Tr3, Tc3 as high/low pairs)
    pub fn set_calibration(&mut self, bytes: &[u8; 8]) {
        let start = CALIBRATION_ADDRESS as usize;
        self.memory[start..start + bytes.len()].copy_from_slice(bytes);
    }

    /// The 32 bytes starting at `address`; unimplemented memory reads 0xFF
    pub fn page(&self, address: u16) -> [u8; PAGE_SIZE] {
        let mut page = [0xFF; PAGE_SIZE];
        let start = address as usize;
        if start < MEMORY_SIZE {
            let end = (start + PAGE_SIZE).min(MEMORY_SIZE);
            page[..end - start].copy_from_slice(&self.memory[start..end]);
        }
        page
    }

    /// Whether a mission is running
    pub fn mission_in_progress(&self) -> bool {
        GeneralStatus::from_bits_retain(self.register(GENERAL_STATUS))
            .contains(GeneralStatus::MISSION_IN_PROGRESS)
    }

    /// Log one sample the way the running mission would
    ///
    /// Returns `false` when the log is full and rollover is disabled.
    pub fn log_sample(&mut self, hi: u8, lo: u8) -> bool {
        let control = MissionControl::from_bits_retain(self.register(MISSION_CONTROL));
        let high_resolution = control.contains(MissionControl::HIGH_RESOLUTION);
        let capacity = log_capacity(high_resolution);
        let count = self.u24(MISSION_SAMPLE_COUNT);

        if count as usize >= capacity && !control.contains(MissionControl::ROLLOVER) {
            return false;
        }

        let position = count as usize % capacity;
        let base = LOG_BASE_ADDRESS as usize;
        if high_resolution {
            self.memory[base + 2 * position] = hi;
            self.memory[base + 2 * position + 1] = lo;
        } else {
            self.memory[base + position] = hi;
        }

        self.set_u24(MISSION_SAMPLE_COUNT, count + 1);
        let device_count = self.u24(DEVICE_SAMPLE_COUNT);
        self.set_u24(DEVICE_SAMPLE_COUNT, device_count + 1);
        true
    }

    /// Set up a running high resolution mission with rollover that logged
    /// `samples` readings around 21°C
    pub fn record_demo_mission(&mut self, samples: u32) {
        let device_type = self.registers().device_type();
        let control =
            MissionControl::LOGGING | MissionControl::HIGH_RESOLUTION | MissionControl::ROLLOVER;
        self.set_register_bytes(MISSION_CONTROL, &[control.bits()]);
        self.set_register_bytes(MISSION_TIMESTAMP, &DEMO_MISSION_START);
        self.set_register_bytes(
            GENERAL_STATUS,
            &[GeneralStatus::MISSION_IN_PROGRESS.bits()],
        );
        self.set_u24(MISSION_SAMPLE_COUNT, 0);

        let base = ((21.0 + device_type.temperature_offset()) * 2.0) as u8;
        for i in 0..samples {
            // Triangle wave over two days at 10 minute intervals
            let phase = (i % 144) as u8;
            let swing = if phase < 72 { phase } else { 144 - phase };
            let hi = base.saturating_add(swing / 6);
            let lo = ((i * 64) % 256) as u8;
            self.log_sample(hi, lo);
        }
    }

    pub(crate) fn begin_scratchpad_write(&mut self, address: u16) -> usize {
        self.target = address;
        let offset = (address as u8 & ENDING_OFFSET) as usize;
        self.status = offset as u8;
        offset
    }

    pub(crate) fn write_scratchpad(&mut self, offset: usize, byte: u8, corrupt: bool) {
        if offset >= PAGE_SIZE {
            return;
        }
        let start = (self.target as u8 & ENDING_OFFSET) as usize;
        self.scratchpad[offset] = if corrupt && offset == start {
            !byte
        } else {
            byte
        };
        self.status = offset as u8;
    }

    /// TA1, TA2, E/S, the scratchpad from the target offset and the
    /// inverted CRC-16
    pub(crate) fn scratchpad_reply(&self) -> VecDeque<u8> {
        let [lo, hi] = self.target.to_le_bytes();
        let start = (lo & ENDING_OFFSET) as usize;

        let mut frame = vec![READ_SCRATCHPAD, lo, hi, self.status];
        frame.extend_from_slice(&self.scratchpad[start..]);
        let crc = !crc16(0, &frame);

        let mut reply: VecDeque<u8> = frame.into_iter().skip(1).collect();
        reply.extend(crc.to_le_bytes());
        reply
    }

    pub(crate) fn copy_scratchpad(&mut self, authorization: [u8; 3]) {
        let [lo, hi] = self.target.to_le_bytes();
        if authorization != [lo, hi, self.status] {
            log::debug!(
                "dummy logger: copy authorization {:02X?} does not match",
                authorization
            );
            return;
        }

        let start = (lo & ENDING_OFFSET) as usize;
        let end = (self.status & ENDING_OFFSET) as usize;
        let base = (self.target & !(ENDING_OFFSET as u16)) as usize;
        if base + PAGE_SIZE <= MEMORY_SIZE && start <= end {
            self.memory[base + start..=base + end].copy_from_slice(&self.scratchpad[start..=end]);
        }
        self.status |= SCRATCHPAD_ACCEPTED;
    }

    pub(crate) fn start_mission(&mut self) {
        let mut clock = [0u8; RTC_LEN];
        clock.copy_from_slice(&self.memory[REGISTERS + RTC..REGISTERS + RTC + RTC_LEN]);
        self.set_register_bytes(MISSION_TIMESTAMP, &clock);
        self.set_u24(MISSION_SAMPLE_COUNT, 0);
        self.set_register_bytes(ALARM_STATUS, &[0]);

        let control = MissionControl::from_bits_retain(self.register(MISSION_CONTROL));
        let mut status = GeneralStatus::from_bits_retain(self.register(GENERAL_STATUS));
        status.insert(GeneralStatus::MISSION_IN_PROGRESS);
        status.set(
            GeneralStatus::WAITING_FOR_ALARM,
            control.contains(MissionControl::START_UPON_ALARM),
        );
        self.set_register_bytes(GENERAL_STATUS, &[status.bits()]);
    }

    pub(crate) fn stop_mission(&mut self) {
        let mut status = GeneralStatus::from_bits_retain(self.register(GENERAL_STATUS));
        status.remove(GeneralStatus::MISSION_IN_PROGRESS | GeneralStatus::WAITING_FOR_ALARM);
        self.set_register_bytes(GENERAL_STATUS, &[status.bits()]);
    }

    pub(crate) fn clear_memory(&mut self) {
        self.set_register_bytes(ALARM_STATUS, &[0]);
        self.set_register_bytes(MISSION_TIMESTAMP, &[0; RTC_LEN]);
        self.set_u24(MISSION_SAMPLE_COUNT, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rom_is_valid() {
        assert_eq!(
            DummyLogger::DEFAULT_ROM,
            RomCode::new(RomCode::FAMILY_DS1922, 0x0000_1234_5678)
        );
    }

    #[test]
    fn test_new_logger_registers() {
        let logger = DummyLogger::new(DummyLogger::DEFAULT_ROM, DeviceType::Ds1922T);
        let reg = logger.registers();
        assert_eq!(reg.device_type(), DeviceType::Ds1922T);
        assert_eq!(reg.sample_rate(), 10);
        assert!(reg.clock_enabled());
        assert!(reg.rtc().is_some());
        assert_eq!(reg.sample_count(), 0);
        assert!(!logger.mission_in_progress());
        assert_eq!(&logger.page(CALIBRATION_ADDRESS)[..8], &DEFAULT_CALIBRATION);
    }

    #[test]
    fn test_log_without_rollover_stops_when_full() {
        let mut logger = DummyLogger::new(DummyLogger::DEFAULT_ROM, DeviceType::Ds1922L);
        logger.set_register_bytes(MISSION_CONTROL, &[MissionControl::LOGGING.bits()]);
        for _ in 0..8192 {
            assert!(logger.log_sample(100, 0));
        }
        assert!(!logger.log_sample(100, 0));
        assert_eq!(logger.registers().sample_count(), 8192);
    }

    #[test]
    fn test_demo_mission_wraps() {
        let mut logger = DummyLogger::new(DummyLogger::DEFAULT_ROM, DeviceType::Ds1922L);
        logger.record_demo_mission(5000);
        let reg = logger.registers();
        assert_eq!(reg.sample_count(), 5000);
        assert_eq!(reg.device_sample_count(), 5000);
        assert!(reg.high_resolution());
        assert!(reg.rollover());
        assert!(reg.mission_in_progress());
    }

    #[test]
    fn test_page_beyond_memory() {
        let logger = DummyLogger::new(DummyLogger::DEFAULT_ROM, DeviceType::Ds1922L);
        assert_eq!(logger.page(0x3000), [0xFF; PAGE_SIZE]);
    }
}
