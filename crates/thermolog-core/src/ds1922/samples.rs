//! Sample conversion and mission timeline

use alloc::vec::Vec;

use chrono::{NaiveDateTime, TimeDelta};

use super::registers::{DeviceType, StatusRegister};

/// First address of the log memory
pub const LOG_BASE_ADDRESS: u16 = 0x1000;

/// Log memory size in bytes
pub const LOG_SIZE: usize = 8192;

/// Convert a raw sample to °C, without calibration
///
/// `lo` is zero for 8-bit samples.
pub fn raw_to_celsius(hi: u8, lo: u8, device: DeviceType) -> f64 {
    hi as f64 / 2.0 - device.temperature_offset() + lo as f64 / 512.0
}

/// Number of samples the log memory holds
pub fn log_capacity(high_resolution: bool) -> usize {
    if high_resolution {
        LOG_SIZE / 2
    } else {
        LOG_SIZE
    }
}

/// A temperature sample placed on the mission timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Time the sample was taken
    pub timestamp: NaiveDateTime,
    /// Temperature in °C
    pub celsius: f64,
}

/// Mapping between log memory positions and sample times
///
/// Without rollover the log holds samples in chronological order starting
/// at the mission timestamp. With rollover and more samples logged than the
/// memory holds, the device keeps writing circularly: the oldest retained
/// sample sits at `logged % capacity` and was taken
/// `logged - capacity` intervals after the mission start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissionTimeline {
    start: NaiveDateTime,
    interval_secs: u32,
    logged: u32,
    capacity: usize,
}

impl MissionTimeline {
    /// Create a timeline
    ///
    /// Returns `None` for a zero capacity.
    pub fn new(
        start: NaiveDateTime,
        interval_secs: u32,
        logged: u32,
        capacity: usize,
    ) -> Option<Self> {
        if capacity == 0 {
            return None;
        }
        Some(Self {
            start,
            interval_secs,
            logged,
            capacity,
        })
    }

    /// Build the timeline of the mission described by a register image
    ///
    /// Returns `None` if the mission timestamp is not a valid date.
    pub fn from_registers(registers: &StatusRegister) -> Option<Self> {
        Self::new(
            registers.mission_timestamp()?,
            registers.sample_interval_secs(),
            registers.sample_count(),
            log_capacity(registers.high_resolution()),
        )
    }

    /// Whether older samples have been overwritten
    pub fn wrapped(&self) -> bool {
        self.logged as usize > self.capacity
    }

    /// Number of samples retained in memory
    pub fn len(&self) -> usize {
        (self.logged as usize).min(self.capacity)
    }

    /// Whether no sample was logged
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Log position of the oldest retained sample
    pub fn oldest_index(&self) -> usize {
        if self.wrapped() {
            self.logged as usize % self.capacity
        } else {
            0
        }
    }

    /// Seconds between samples
    pub fn interval_secs(&self) -> u32 {
        self.interval_secs
    }

    /// Time of the `n`-th oldest retained sample
    ///
    /// `None` if the time falls outside the representable date range, which
    /// happens with corrupt counters or rates.
    pub fn timestamp(&self, n: usize) -> Option<NaiveDateTime> {
        let skipped = if self.wrapped() {
            self.logged as usize - self.capacity
        } else {
            0
        };
        let offset = ((skipped + n) as i64).checked_mul(self.interval_secs as i64)?;
        self.start.checked_add_signed(TimeDelta::try_seconds(offset)?)
    }

    /// Time of the oldest retained sample
    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp(0)
    }

    /// Order samples read from log memory chronologically
    ///
    /// `log` is indexed by log position. Positions missing from a short read
    /// are skipped, as are samples whose time is out of range.
    pub fn arrange(&self, log: &[f64]) -> Vec<Sample> {
        let oldest = self.oldest_index();
        (0..self.len())
            .filter_map(|n| {
                let position = (oldest + n) % self.capacity;
                let celsius = *log.get(position)?;
                Some(Sample {
                    timestamp: self.timestamp(n)?,
                    celsius,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2014, 6, 20)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_raw_conversion() {
        assert_eq!(raw_to_celsius(100, 0, DeviceType::Ds1922L), 9.0);
        assert_eq!(raw_to_celsius(100, 0, DeviceType::Ds1922T), 49.0);
        assert_eq!(raw_to_celsius(100, 0x80, DeviceType::Ds1922E), 49.25);
        assert_eq!(raw_to_celsius(0, 0, DeviceType::Ds1922L), -41.0);
    }

    #[test]
    fn test_capacity() {
        assert_eq!(log_capacity(false), 8192);
        assert_eq!(log_capacity(true), 4096);
    }

    #[test]
    fn test_timeline_without_rollover() {
        let timeline = MissionTimeline::new(start(), 600, 3, 8192).unwrap();
        assert!(!timeline.wrapped());
        assert_eq!(timeline.oldest_index(), 0);
        assert_eq!(timeline.first_timestamp(), Some(start()));

        let samples = timeline.arrange(&[20.0, 20.5, 21.0]);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[2].celsius, 21.0);
        assert_eq!(samples[2].timestamp, start() + TimeDelta::seconds(1200));
    }

    #[test]
    fn test_timeline_rollover() {
        let timeline = MissionTimeline::new(start(), 60, 9000, 8192).unwrap();
        assert!(timeline.wrapped());
        assert_eq!(timeline.len(), 8192);
        assert_eq!(timeline.oldest_index(), 808);
        assert_eq!(
            timeline.first_timestamp(),
            Some(start() + TimeDelta::seconds(60 * 808))
        );

        let log: Vec<f64> = (0..8192).map(|i| i as f64).collect();
        let samples = timeline.arrange(&log);
        assert_eq!(samples.len(), 8192);
        assert_eq!(samples[0].celsius, 808.0);
        assert_eq!(samples[8192 - 808].celsius, 0.0);
        assert_eq!(
            samples[8191].timestamp,
            start() + TimeDelta::seconds(60 * 8999)
        );
    }

    #[test]
    fn test_timeline_short_log() {
        let timeline = MissionTimeline::new(start(), 60, 5, 8192).unwrap();
        assert_eq!(timeline.arrange(&[1.0, 2.0]).len(), 2);
        assert!(MissionTimeline::new(start(), 60, 0, 8192).unwrap().is_empty());
    }

    #[test]
    fn test_timeline_zero_capacity() {
        assert_eq!(MissionTimeline::new(start(), 60, 10, 0), None);
    }

    #[test]
    fn test_timeline_out_of_date_range() {
        let end = NaiveDate::from_ymd_opt(2099, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let timeline = MissionTimeline::new(end, 0x3FFF * 60, 0xFF_FFFF, 4096).unwrap();
        assert!(timeline.wrapped());
        assert_eq!(timeline.first_timestamp(), None);
        assert!(timeline.arrange(&[20.0; 4096]).is_empty());
    }
}
