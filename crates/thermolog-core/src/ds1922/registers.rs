//! DS1922 register image
//!
//! The configuration of a DS1922 lives in two 32-byte memory pages at
//! 0x0200 and 0x0220. [`StatusRegister`] holds a copy of both pages and
//! provides typed views of the fields inside them. Setters only modify the
//! image; nothing reaches the device until it is committed.
//!
//! Offsets are relative to 0x0200:
//!
//! | Offset    | Field                                       |
//! |-----------|---------------------------------------------|
//! | 0x00-0x05 | real-time clock (BCD sec, min, hour, day, month, year) |
//! | 0x06-0x07 | sample rate (14 bits)                       |
//! | 0x08-0x09 | low/high temperature alarm thresholds       |
//! | 0x10      | temperature alarm enable                    |
//! | 0x12      | RTC control                                 |
//! | 0x13      | mission control                             |
//! | 0x14      | alarm status                                |
//! | 0x15      | general status                              |
//! | 0x16-0x18 | mission start delay (minutes)               |
//! | 0x19-0x1E | mission timestamp (BCD)                     |
//! | 0x20-0x22 | mission sample count                        |
//! | 0x23-0x25 | device sample count                         |
//! | 0x26      | device configuration (type code)            |
//! | 0x27      | password control                            |

use bitflags::bitflags;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Size of one memory page
pub const PAGE_SIZE: usize = 32;
/// Size of the register image (two pages)
pub const REGISTER_SIZE: usize = 2 * PAGE_SIZE;

/// Offset of the real-time clock
pub const RTC: usize = 0x00;
/// Offset of the sample rate (little endian, 14 bits)
pub const SAMPLE_RATE: usize = 0x06;
/// Offset of the low temperature alarm threshold
pub const ALARM_LOW_THRESHOLD: usize = 0x08;
/// Offset of the high temperature alarm threshold
pub const ALARM_HIGH_THRESHOLD: usize = 0x09;
/// Offset of the temperature alarm enable register
pub const ALARM_ENABLE: usize = 0x10;
/// Offset of the RTC control register
pub const RTC_CONTROL: usize = 0x12;
/// Offset of the mission control register
pub const MISSION_CONTROL: usize = 0x13;
/// Offset of the alarm status register
pub const ALARM_STATUS: usize = 0x14;
/// Offset of the general status register
pub const GENERAL_STATUS: usize = 0x15;
/// Offset of the mission start delay (24 bits)
pub const MISSION_START_DELAY: usize = 0x16;
/// Offset of the mission timestamp
pub const MISSION_TIMESTAMP: usize = 0x19;
/// Offset of the mission sample counter (24 bits)
pub const MISSION_SAMPLE_COUNT: usize = 0x20;
/// Offset of the device sample counter (24 bits)
pub const DEVICE_SAMPLE_COUNT: usize = 0x23;
/// Offset of the device configuration byte
pub const DEVICE_CONFIGURATION: usize = 0x26;
/// Offset of the password control register
pub const PASSWORD_CONTROL: usize = 0x27;

/// Number of clock bytes at the start of the first page
pub const RTC_LEN: usize = 6;

/// Password control value that enables passwords
const PASSWORD_ENABLED: u8 = 0xAA;

/// Largest sample rate that fits the register
pub const MAX_SAMPLE_RATE: u16 = 0x3FFF;

bitflags! {
    /// RTC control register (0x0212)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RtcControl: u8 {
        /// Oscillator enabled
        const OSCILLATOR = 0x01;
        /// Sample rate counts seconds instead of minutes
        const HIGH_SPEED = 0x02;
    }
}

bitflags! {
    /// Mission control register (0x0213)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MissionControl: u8 {
        /// Temperature logging enabled
        const LOGGING = 0x01;
        /// 16-bit samples instead of 8-bit
        const HIGH_RESOLUTION = 0x04;
        /// Overwrite the oldest samples when the log is full
        const ROLLOVER = 0x10;
        /// Delay the mission start until a temperature alarm
        const START_UPON_ALARM = 0x20;
    }
}

bitflags! {
    /// Temperature alarm bits, used by both the enable (0x0210) and the
    /// status (0x0214) register
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TemperatureAlarm: u8 {
        /// Low threshold
        const LOW = 0x01;
        /// High threshold
        const HIGH = 0x02;
    }
}

bitflags! {
    /// General status register (0x0215)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GeneralStatus: u8 {
        /// A mission is running
        const MISSION_IN_PROGRESS = 0x02;
        /// The mission waits for a temperature alarm to start
        const WAITING_FOR_ALARM = 0x08;
    }
}

/// DS1922 device subfamily, from the device configuration byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// DS1922L, -40°C to +85°C
    Ds1922L,
    /// DS1922T, 0°C to +125°C
    Ds1922T,
    /// DS1922E, +15°C to +140°C
    Ds1922E,
    /// Any other configuration code (DS1923, DS2422, ...)
    Other(u8),
}

impl DeviceType {
    /// Decode the device configuration byte
    pub fn from_code(code: u8) -> Self {
        match code {
            0x40 => DeviceType::Ds1922L,
            0x60 => DeviceType::Ds1922T,
            0x80 => DeviceType::Ds1922E,
            other => DeviceType::Other(other),
        }
    }

    /// Device configuration byte
    pub fn code(&self) -> u8 {
        match self {
            DeviceType::Ds1922L => 0x40,
            DeviceType::Ds1922T => 0x60,
            DeviceType::Ds1922E => 0x80,
            DeviceType::Other(code) => *code,
        }
    }

    /// Offset subtracted from raw half-degree values, in °C
    pub fn temperature_offset(&self) -> f64 {
        match self {
            DeviceType::Ds1922L => 41.0,
            _ => 1.0,
        }
    }

    /// Whether the device carries a calibration page
    pub fn supports_calibration(&self) -> bool {
        !matches!(self, DeviceType::Ds1922E)
    }

    /// Fixed reference temperature of the factory calibration, in °C
    pub fn calibration_reference(&self) -> f64 {
        match self {
            DeviceType::Ds1922L => 60.0,
            _ => 90.0,
        }
    }
}

impl core::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DeviceType::Ds1922L => write!(f, "DS1922L"),
            DeviceType::Ds1922T => write!(f, "DS1922T"),
            DeviceType::Ds1922E => write!(f, "DS1922E"),
            DeviceType::Other(code) => write!(f, "unknown (0x{:02X})", code),
        }
    }
}

/// Encode a value 0-99 as two BCD digits
pub fn bcd_encode(value: u8) -> u8 {
    let value = value % 100;
    (value / 10) << 4 | (value % 10)
}

/// Decode two BCD digits, rejecting nibbles above 9
pub fn bcd_decode(bcd: u8) -> Option<u8> {
    let (tens, ones) = (bcd >> 4, bcd & 0x0F);
    if tens > 9 || ones > 9 {
        return None;
    }
    Some(tens * 10 + ones)
}

/// Convert a half-degree byte to °C
pub fn threshold_to_celsius(raw: u8, device: DeviceType) -> f64 {
    raw as f64 / 2.0 - device.temperature_offset()
}

/// Convert °C to the nearest half-degree byte, saturating at the range ends
pub fn celsius_to_threshold(celsius: f64, device: DeviceType) -> u8 {
    let raw = (celsius + device.temperature_offset()) * 2.0;
    if raw.is_nan() || raw <= 0.0 {
        0
    } else if raw >= 255.0 {
        255
    } else {
        (raw + 0.5) as u8
    }
}

/// Image of the two configuration pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRegister {
    bytes: [u8; REGISTER_SIZE],
    clock_changed: bool,
}

impl Default for StatusRegister {
    fn default() -> Self {
        Self {
            bytes: [0; REGISTER_SIZE],
            clock_changed: false,
        }
    }
}

impl StatusRegister {
    /// Create an image from raw bytes
    pub fn from_bytes(bytes: [u8; REGISTER_SIZE]) -> Self {
        Self {
            bytes,
            clock_changed: false,
        }
    }

    /// Replace the image with two freshly read pages
    pub fn load(&mut self, first: &[u8; PAGE_SIZE], second: &[u8; PAGE_SIZE]) {
        self.bytes[..PAGE_SIZE].copy_from_slice(first);
        self.bytes[PAGE_SIZE..].copy_from_slice(second);
        self.clock_changed = false;
    }

    /// Raw image
    pub fn as_bytes(&self) -> &[u8; REGISTER_SIZE] {
        &self.bytes
    }

    /// One of the two pages (0 or 1)
    pub fn page(&self, index: usize) -> &[u8] {
        &self.bytes[index * PAGE_SIZE..(index + 1) * PAGE_SIZE]
    }

    /// Whether the clock was set since the image was loaded
    pub fn clock_changed(&self) -> bool {
        self.clock_changed
    }

    pub(crate) fn clear_clock_changed(&mut self) {
        self.clock_changed = false;
    }

    fn u24(&self, offset: usize) -> u32 {
        u32::from_le_bytes([
            self.bytes[offset],
            self.bytes[offset + 1],
            self.bytes[offset + 2],
            0,
        ])
    }

    fn set_u24(&mut self, offset: usize, value: u32) {
        self.bytes[offset..offset + 3].copy_from_slice(&value.to_le_bytes()[..3]);
    }

    fn datetime(&self, offset: usize) -> Option<NaiveDateTime> {
        let b = &self.bytes[offset..offset + RTC_LEN];
        let second = bcd_decode(b[0] & 0x7F)?;
        let minute = bcd_decode(b[1] & 0x7F)?;
        let hour = if b[2] & 0x40 != 0 {
            // 12-hour mode, bit 5 is PM
            let hour12 = bcd_decode(b[2] & 0x1F)? % 12;
            hour12 + if b[2] & 0x20 != 0 { 12 } else { 0 }
        } else {
            bcd_decode(b[2] & 0x3F)?
        };
        let day = bcd_decode(b[3])?;
        let month = bcd_decode(b[4] & 0x1F)?;
        let year = bcd_decode(b[5])?;

        NaiveDate::from_ymd_opt(2000 + year as i32, month as u32, day as u32)?.and_hms_opt(
            hour as u32,
            minute as u32,
            second as u32,
        )
    }

    // ------------------------------------------------------------------
    // Clock
    // ------------------------------------------------------------------

    /// Real-time clock, `None` if the registers hold no valid date
    pub fn rtc(&self) -> Option<NaiveDateTime> {
        self.datetime(RTC)
    }

    /// Set the real-time clock (24-hour mode, years 2000-2099)
    ///
    /// Marks the clock as changed, so the next commit writes the full first
    /// page.
    pub fn set_rtc(&mut self, time: &NaiveDateTime) {
        let year = (time.year() - 2000).clamp(0, 99) as u8;
        self.bytes[RTC] = bcd_encode(time.second() as u8);
        self.bytes[RTC + 1] = bcd_encode(time.minute() as u8);
        self.bytes[RTC + 2] = bcd_encode(time.hour() as u8);
        self.bytes[RTC + 3] = bcd_encode(time.day() as u8);
        self.bytes[RTC + 4] = bcd_encode(time.month() as u8);
        self.bytes[RTC + 5] = bcd_encode(year);
        self.clock_changed = true;
    }

    /// RTC control flags
    pub fn rtc_control(&self) -> RtcControl {
        RtcControl::from_bits_retain(self.bytes[RTC_CONTROL])
    }

    fn update_rtc_control(&mut self, flag: RtcControl, on: bool) {
        let mut control = self.rtc_control();
        control.set(flag, on);
        self.bytes[RTC_CONTROL] = control.bits();
    }

    /// Whether the clock oscillator runs
    pub fn clock_enabled(&self) -> bool {
        self.rtc_control().contains(RtcControl::OSCILLATOR)
    }

    /// Start or stop the clock oscillator
    pub fn set_clock_enabled(&mut self, enabled: bool) {
        self.update_rtc_control(RtcControl::OSCILLATOR, enabled);
    }

    /// Whether the sample rate is in seconds (otherwise minutes)
    pub fn high_speed(&self) -> bool {
        self.rtc_control().contains(RtcControl::HIGH_SPEED)
    }

    /// Select seconds (true) or minutes (false) as sample rate unit
    pub fn set_high_speed(&mut self, high_speed: bool) {
        self.update_rtc_control(RtcControl::HIGH_SPEED, high_speed);
    }

    // ------------------------------------------------------------------
    // Sampling
    // ------------------------------------------------------------------

    /// Raw sample rate, in seconds or minutes depending on [`high_speed`](Self::high_speed)
    pub fn sample_rate(&self) -> u16 {
        u16::from_le_bytes([self.bytes[SAMPLE_RATE], self.bytes[SAMPLE_RATE + 1]]) & MAX_SAMPLE_RATE
    }

    /// Set the raw sample rate
    ///
    /// Only the low 14 bits are used. A rate of zero leaves the device in an
    /// unrecoverable state and is rejected.
    pub fn set_sample_rate(&mut self, rate: u16) -> crate::Result<()> {
        let rate = rate & MAX_SAMPLE_RATE;
        if rate == 0 {
            return Err(crate::Error::InvalidSampleRate);
        }
        self.bytes[SAMPLE_RATE..SAMPLE_RATE + 2].copy_from_slice(&rate.to_le_bytes());
        Ok(())
    }

    /// Time between two samples in seconds
    pub fn sample_interval_secs(&self) -> u32 {
        let rate = self.sample_rate() as u32;
        if self.high_speed() {
            rate
        } else {
            rate * 60
        }
    }

    /// Mission control flags
    pub fn mission_control(&self) -> MissionControl {
        MissionControl::from_bits_retain(self.bytes[MISSION_CONTROL])
    }

    fn update_mission_control(&mut self, flag: MissionControl, on: bool) {
        let mut control = self.mission_control();
        control.set(flag, on);
        self.bytes[MISSION_CONTROL] = control.bits();
    }

    /// Whether temperature logging is enabled
    pub fn logging_enabled(&self) -> bool {
        self.mission_control().contains(MissionControl::LOGGING)
    }

    /// Enable or disable temperature logging
    pub fn set_logging_enabled(&mut self, enabled: bool) {
        self.update_mission_control(MissionControl::LOGGING, enabled);
    }

    /// Whether samples are logged with 16-bit resolution
    pub fn high_resolution(&self) -> bool {
        self.mission_control()
            .contains(MissionControl::HIGH_RESOLUTION)
    }

    /// Select 16-bit (true) or 8-bit (false) samples
    pub fn set_high_resolution(&mut self, high_resolution: bool) {
        self.update_mission_control(MissionControl::HIGH_RESOLUTION, high_resolution);
    }

    /// Whether the log overwrites the oldest samples when full
    ///
    /// Timestamps of the samples have to account for rollover, see
    /// [`MissionTimeline`](super::MissionTimeline).
    pub fn rollover(&self) -> bool {
        self.mission_control().contains(MissionControl::ROLLOVER)
    }

    /// Enable or disable rollover
    pub fn set_rollover(&mut self, rollover: bool) {
        self.update_mission_control(MissionControl::ROLLOVER, rollover);
    }

    /// Whether the mission start waits for a temperature alarm
    pub fn start_upon_alarm(&self) -> bool {
        self.mission_control()
            .contains(MissionControl::START_UPON_ALARM)
    }

    /// Make the mission start wait for a temperature alarm
    pub fn set_start_upon_alarm(&mut self, start_upon_alarm: bool) {
        self.update_mission_control(MissionControl::START_UPON_ALARM, start_upon_alarm);
    }

    // ------------------------------------------------------------------
    // Alarms
    // ------------------------------------------------------------------

    /// Enabled temperature alarms
    pub fn alarm_enable(&self) -> TemperatureAlarm {
        TemperatureAlarm::from_bits_retain(self.bytes[ALARM_ENABLE])
    }

    /// Whether the low temperature alarm is enabled
    pub fn alarm_low_enabled(&self) -> bool {
        self.alarm_enable().contains(TemperatureAlarm::LOW)
    }

    /// Whether the high temperature alarm is enabled
    pub fn alarm_high_enabled(&self) -> bool {
        self.alarm_enable().contains(TemperatureAlarm::HIGH)
    }

    /// Enable or disable the low and high temperature alarms
    pub fn set_alarm_enabled(&mut self, low: bool, high: bool) {
        let mut enable = self.alarm_enable();
        enable.set(TemperatureAlarm::LOW, low);
        enable.set(TemperatureAlarm::HIGH, high);
        self.bytes[ALARM_ENABLE] = enable.bits();
    }

    /// Low alarm threshold in °C
    pub fn alarm_low_threshold(&self) -> f64 {
        threshold_to_celsius(self.bytes[ALARM_LOW_THRESHOLD], self.device_type())
    }

    /// High alarm threshold in °C
    pub fn alarm_high_threshold(&self) -> f64 {
        threshold_to_celsius(self.bytes[ALARM_HIGH_THRESHOLD], self.device_type())
    }

    /// Set the low alarm threshold, rounded to half degrees
    pub fn set_alarm_low_threshold(&mut self, celsius: f64) {
        self.bytes[ALARM_LOW_THRESHOLD] = celsius_to_threshold(celsius, self.device_type());
    }

    /// Set the high alarm threshold, rounded to half degrees
    pub fn set_alarm_high_threshold(&mut self, celsius: f64) {
        self.bytes[ALARM_HIGH_THRESHOLD] = celsius_to_threshold(celsius, self.device_type());
    }

    /// Alarms that fired during the mission
    pub fn alarm_status(&self) -> TemperatureAlarm {
        TemperatureAlarm::from_bits_retain(self.bytes[ALARM_STATUS])
    }

    /// Whether the low temperature alarm fired
    pub fn alarm_low(&self) -> bool {
        self.alarm_status().contains(TemperatureAlarm::LOW)
    }

    /// Whether the high temperature alarm fired
    pub fn alarm_high(&self) -> bool {
        self.alarm_status().contains(TemperatureAlarm::HIGH)
    }

    // ------------------------------------------------------------------
    // Mission
    // ------------------------------------------------------------------

    /// General status flags
    pub fn general_status(&self) -> GeneralStatus {
        GeneralStatus::from_bits_retain(self.bytes[GENERAL_STATUS])
    }

    /// Whether a mission is running
    pub fn mission_in_progress(&self) -> bool {
        self.general_status()
            .contains(GeneralStatus::MISSION_IN_PROGRESS)
    }

    /// Whether the mission waits for a temperature alarm
    pub fn waiting_for_alarm(&self) -> bool {
        self.general_status()
            .contains(GeneralStatus::WAITING_FOR_ALARM)
    }

    /// Delay between mission start command and first sample, in minutes
    pub fn mission_start_delay(&self) -> u32 {
        self.u24(MISSION_START_DELAY)
    }

    /// Set the mission start delay in minutes (24 bits)
    pub fn set_mission_start_delay(&mut self, minutes: u32) {
        self.set_u24(MISSION_START_DELAY, minutes & 0xFF_FFFF);
    }

    /// Time of the first sample of the mission
    pub fn mission_timestamp(&self) -> Option<NaiveDateTime> {
        self.datetime(MISSION_TIMESTAMP)
    }

    /// Number of samples logged during the current mission
    pub fn sample_count(&self) -> u32 {
        self.u24(MISSION_SAMPLE_COUNT)
    }

    /// Number of samples logged over the lifetime of the device
    ///
    /// Not reset by a new mission; a measure of use and battery drain.
    pub fn device_sample_count(&self) -> u32 {
        self.u24(DEVICE_SAMPLE_COUNT)
    }

    // ------------------------------------------------------------------
    // Device
    // ------------------------------------------------------------------

    /// Device subfamily
    pub fn device_type(&self) -> DeviceType {
        DeviceType::from_code(self.bytes[DEVICE_CONFIGURATION])
    }

    /// Whether access passwords are enabled
    pub fn password_enabled(&self) -> bool {
        self.bytes[PASSWORD_CONTROL] == PASSWORD_ENABLED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    /// A DS1922L image as read from a device during a mission
    fn sample_image() -> StatusRegister {
        let mut bytes = [0u8; REGISTER_SIZE];
        bytes[..6].copy_from_slice(&[0x30, 0x15, 0x13, 0x24, 0x06, 0x14]);
        bytes[SAMPLE_RATE] = 0x0A;
        bytes[ALARM_LOW_THRESHOLD] = 0x50; // 40 - 41 = -1°C
        bytes[ALARM_HIGH_THRESHOLD] = 0x7A; // 61 - 41 = 20°C
        bytes[ALARM_ENABLE] = 0x02;
        bytes[RTC_CONTROL] = 0x01;
        bytes[MISSION_CONTROL] = 0x15;
        bytes[ALARM_STATUS] = 0x02;
        bytes[GENERAL_STATUS] = 0x02;
        bytes[MISSION_START_DELAY..MISSION_START_DELAY + 3].copy_from_slice(&[0x10, 0x27, 0x00]);
        bytes[MISSION_TIMESTAMP..MISSION_TIMESTAMP + 6]
            .copy_from_slice(&[0x00, 0x00, 0x08, 0x20, 0x06, 0x14]);
        bytes[MISSION_SAMPLE_COUNT..MISSION_SAMPLE_COUNT + 3].copy_from_slice(&[0x28, 0x23, 0x00]);
        bytes[DEVICE_SAMPLE_COUNT..DEVICE_SAMPLE_COUNT + 3].copy_from_slice(&[0x40, 0x42, 0x0F]);
        bytes[DEVICE_CONFIGURATION] = 0x40;
        StatusRegister::from_bytes(bytes)
    }

    #[test]
    fn test_decode_fields() {
        let reg = sample_image();
        assert_eq!(reg.rtc(), Some(datetime(2014, 6, 24, 13, 15, 30)));
        assert_eq!(reg.mission_timestamp(), Some(datetime(2014, 6, 20, 8, 0, 0)));
        assert_eq!(reg.sample_rate(), 10);
        assert_eq!(reg.sample_interval_secs(), 600);
        assert!(reg.clock_enabled());
        assert!(!reg.high_speed());
        assert!(reg.logging_enabled());
        assert!(reg.high_resolution());
        assert!(reg.rollover());
        assert!(!reg.start_upon_alarm());
        assert!(!reg.alarm_low_enabled());
        assert!(reg.alarm_high_enabled());
        assert!(!reg.alarm_low());
        assert!(reg.alarm_high());
        assert!(reg.mission_in_progress());
        assert!(!reg.waiting_for_alarm());
        assert_eq!(reg.mission_start_delay(), 10000);
        assert_eq!(reg.sample_count(), 9000);
        assert_eq!(reg.device_sample_count(), 1_000_000);
        assert_eq!(reg.device_type(), DeviceType::Ds1922L);
        assert_eq!(reg.alarm_low_threshold(), -1.0);
        assert_eq!(reg.alarm_high_threshold(), 20.0);
        assert!(!reg.password_enabled());
    }

    #[test]
    fn test_setters_preserve_other_bits() {
        let mut reg = sample_image();
        reg.set_rollover(false);
        reg.set_start_upon_alarm(true);
        assert_eq!(reg.as_bytes()[MISSION_CONTROL], 0x25);

        reg.set_high_speed(true);
        reg.set_clock_enabled(false);
        assert_eq!(reg.as_bytes()[RTC_CONTROL], 0x02);

        reg.set_alarm_enabled(true, false);
        assert_eq!(reg.as_bytes()[ALARM_ENABLE], 0x01);

        reg.set_mission_start_delay(0x0123_4567);
        assert_eq!(reg.mission_start_delay(), 0x23_4567);
        assert_eq!(reg.as_bytes()[MISSION_TIMESTAMP], 0x00);
    }

    #[test]
    fn test_sample_rate() {
        let mut reg = StatusRegister::default();
        assert_eq!(reg.set_sample_rate(0), Err(crate::Error::InvalidSampleRate));
        assert_eq!(reg.set_sample_rate(0x4000), Err(crate::Error::InvalidSampleRate));
        reg.set_sample_rate(0xFFFF).unwrap();
        assert_eq!(reg.sample_rate(), MAX_SAMPLE_RATE);
        assert_eq!(reg.as_bytes()[SAMPLE_RATE + 1], 0x3F);

        reg.set_sample_rate(5).unwrap();
        reg.set_high_speed(true);
        assert_eq!(reg.sample_interval_secs(), 5);
        reg.set_high_speed(false);
        assert_eq!(reg.sample_interval_secs(), 300);
    }

    #[test]
    fn test_thresholds() {
        let mut reg = sample_image();
        reg.set_alarm_low_threshold(-10.5);
        assert_eq!(reg.as_bytes()[ALARM_LOW_THRESHOLD], 61);
        assert_eq!(reg.alarm_low_threshold(), -10.5);

        // Nearest half degree
        reg.set_alarm_high_threshold(25.3);
        assert_eq!(reg.alarm_high_threshold(), 25.5);

        // Saturates at the ends of the range
        reg.set_alarm_low_threshold(-100.0);
        assert_eq!(reg.as_bytes()[ALARM_LOW_THRESHOLD], 0);
        reg.set_alarm_high_threshold(500.0);
        assert_eq!(reg.as_bytes()[ALARM_HIGH_THRESHOLD], 255);
    }

    #[test]
    fn test_threshold_offset_depends_on_type() {
        assert_eq!(threshold_to_celsius(100, DeviceType::Ds1922L), 9.0);
        assert_eq!(threshold_to_celsius(100, DeviceType::Ds1922T), 49.0);
        assert_eq!(celsius_to_threshold(49.0, DeviceType::Ds1922T), 100);
    }

    #[test]
    fn test_bcd_round_trip() {
        for value in 0..100u8 {
            assert_eq!(bcd_decode(bcd_encode(value)), Some(value));
        }
        assert_eq!(bcd_encode(59), 0x59);
        assert_eq!(bcd_decode(0x1A), None);
        assert_eq!(bcd_decode(0xA1), None);
    }

    #[test]
    fn test_rtc_round_trip() {
        let mut reg = StatusRegister::default();
        let check = |reg: &mut StatusRegister, t: NaiveDateTime| {
            reg.set_rtc(&t);
            assert_eq!(reg.rtc(), Some(t));
        };

        for second in 0..60 {
            check(&mut reg, datetime(2000, 1, 1, 0, 0, second));
        }
        for minute in 0..60 {
            check(&mut reg, datetime(2000, 1, 1, 0, minute, 0));
        }
        for hour in 0..24 {
            check(&mut reg, datetime(2000, 1, 1, hour, 0, 0));
        }
        for day in 1..=31 {
            check(&mut reg, datetime(2000, 1, day, 0, 0, 0));
        }
        for month in 1..=12 {
            check(&mut reg, datetime(2000, month, 28, 23, 59, 59));
        }
        for year in 0..100 {
            check(&mut reg, datetime(2000 + year, 12, 31, 12, 30, 45));
        }
        assert!(reg.clock_changed());
    }

    #[test]
    fn test_rtc_twelve_hour_mode() {
        let mut bytes = [0u8; REGISTER_SIZE];
        // 11:00 PM, 12-hour mode
        bytes[..6].copy_from_slice(&[0x00, 0x00, 0x71, 0x01, 0x01, 0x20]);
        let reg = StatusRegister::from_bytes(bytes);
        assert_eq!(reg.rtc(), Some(datetime(2020, 1, 1, 23, 0, 0)));
    }

    #[test]
    fn test_invalid_clock() {
        let reg = StatusRegister::default();
        // Month and day zero
        assert_eq!(reg.rtc(), None);

        let mut bytes = [0u8; REGISTER_SIZE];
        bytes[..6].copy_from_slice(&[0x5A, 0x00, 0x00, 0x01, 0x01, 0x00]);
        assert_eq!(StatusRegister::from_bytes(bytes).rtc(), None);
    }

    #[test]
    fn test_device_types() {
        assert_eq!(DeviceType::from_code(0x60), DeviceType::Ds1922T);
        assert_eq!(DeviceType::from_code(0x80), DeviceType::Ds1922E);
        assert_eq!(DeviceType::from_code(0x20), DeviceType::Other(0x20));
        assert_eq!(DeviceType::Other(0x20).code(), 0x20);
        assert!(!DeviceType::Ds1922E.supports_calibration());
        assert!(DeviceType::Ds1922L.supports_calibration());
        assert_eq!(DeviceType::Ds1922L.temperature_offset(), 41.0);
        assert_eq!(DeviceType::Ds1922E.temperature_offset(), 1.0);
    }
}
