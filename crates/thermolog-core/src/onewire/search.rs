//! ROM search
//!
//! The search walks the binary tree of ROM codes present on the bus. Each
//! pass reads, for every bit position, the bit of all still participating
//! devices and its complement, then writes the chosen direction so that
//! devices with the other bit value drop out.
//!
//! | id bit | complement | meaning                                  |
//! |--------|------------|------------------------------------------|
//! | 0      | 1          | every participant has 0                  |
//! | 1      | 0          | every participant has 1                  |
//! | 0      | 0          | discrepancy: both values present         |
//! | 1      | 1          | nobody answered                          |
//!
//! At a discrepancy the 0 branch is explored first. The pass remembers the
//! highest position where it took 0 although 1 was available; the next pass
//! replays the previous directions up to that position, takes 1 there and
//! then prefers 0 again. The search is complete when a pass takes no 0 at a
//! discrepancy.

use alloc::vec::Vec;

use super::{frame::write_byte, OneWireMaster, RomCode, SEARCH_ROM};
use crate::error::Result;

/// Number of bits in a ROM code
const ROM_BITS: u8 = 64;

/// Resumable ROM search state
#[derive(Debug, Clone, Default)]
pub struct RomSearch {
    /// Directions chosen in the previous pass
    previous: u64,
    /// Highest discrepancy where the previous pass took 0
    frontier: Option<u8>,
    /// No unexplored branch is left
    finished: bool,
}

impl RomSearch {
    /// Start a new search
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every branch has been explored
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Run one search pass and return the ROM code it selected
    ///
    /// Returns `Ok(None)` once the search is finished or when no device
    /// answers.
    pub fn next<M: OneWireMaster + ?Sized>(&mut self, master: &mut M) -> Result<Option<RomCode>> {
        if self.finished {
            return Ok(None);
        }

        master.reset()?;
        write_byte(master, SEARCH_ROM)?;

        let mut candidate = 0u64;
        let mut last_zero = None;

        for position in 0..ROM_BITS {
            let id_bit = master.touch_bit(true)?;
            let complement = master.touch_bit(true)?;

            let direction = match (id_bit, complement) {
                (true, true) => {
                    log::debug!("no device answered at bit {}", position);
                    self.finished = true;
                    return Ok(None);
                }
                (false, true) => false,
                (true, false) => true,
                (false, false) => {
                    let direction = match self.frontier {
                        Some(frontier) if position < frontier => {
                            (self.previous >> position) & 1 != 0
                        }
                        Some(frontier) if position == frontier => true,
                        _ => false,
                    };
                    if !direction {
                        last_zero = Some(position);
                    }
                    direction
                }
            };

            master.touch_bit(direction)?;
            if direction {
                candidate |= 1 << position;
            }
        }

        self.previous = candidate;
        self.frontier = last_zero;
        self.finished = last_zero.is_none();

        let rom = RomCode(candidate);
        log::debug!("search pass found {}", rom);
        Ok(Some(rom))
    }
}

/// Enumerate the ROM codes of all devices on the bus
///
/// Codes are returned in search order. An empty bus yields an empty list.
pub fn enumerate<M: OneWireMaster + ?Sized>(master: &mut M) -> Result<Vec<RomCode>> {
    let mut search = RomSearch::new();
    let mut found = Vec::new();

    while let Some(rom) = search.next(master)? {
        if !rom.crc_valid() {
            log::warn!("ROM code {} has a bad CRC-8", rom);
        }
        found.push(rom);
    }

    log::info!("found {} device(s) on the 1-Wire bus", found.len());
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[derive(PartialEq)]
    enum Phase {
        Idle,
        IdBit,
        Complement,
        Direction,
    }

    /// Wired-AND bus with a set of devices that only understand search ROM
    struct SearchBus {
        devices: Vec<u64>,
        active: Vec<bool>,
        phase: Phase,
        position: u8,
        passes: usize,
    }

    impl SearchBus {
        fn new(devices: &[u64]) -> Self {
            Self {
                devices: devices.to_vec(),
                active: vec![false; devices.len()],
                phase: Phase::Idle,
                position: 0,
                passes: 0,
            }
        }

        fn wired_and(&self, invert: bool) -> bool {
            self.devices
                .iter()
                .zip(&self.active)
                .filter(|&(_, &active)| active)
                .all(|(rom, _)| ((rom >> self.position) & 1 != 0) != invert)
        }
    }

    impl OneWireMaster for SearchBus {
        fn reset(&mut self) -> Result<()> {
            self.active.iter_mut().for_each(|a| *a = true);
            self.phase = Phase::Idle;
            Ok(())
        }

        fn touch_bit(&mut self, bit: bool) -> Result<bool> {
            let result = match self.phase {
                Phase::Idle => bit,
                Phase::IdBit => {
                    self.phase = Phase::Complement;
                    self.wired_and(false)
                }
                Phase::Complement => {
                    self.phase = Phase::Direction;
                    self.wired_and(true)
                }
                Phase::Direction => {
                    for (rom, active) in self.devices.iter().zip(self.active.iter_mut()) {
                        if ((rom >> self.position) & 1 != 0) != bit {
                            *active = false;
                        }
                    }
                    self.position += 1;
                    self.phase = if self.position == 64 {
                        Phase::Idle
                    } else {
                        Phase::IdBit
                    };
                    bit
                }
            };
            Ok(result)
        }

        fn touch_byte(&mut self, byte: u8) -> Result<u8> {
            if byte == SEARCH_ROM && self.phase == Phase::Idle {
                self.phase = Phase::IdBit;
                self.position = 0;
                self.passes += 1;
            }
            Ok(byte)
        }

        fn delay_ms(&mut self, _ms: u32) {}
    }

    #[test]
    fn test_search_three_devices() {
        let mut bus = SearchBus::new(&[0x0A, 0x0B, 0x15]);
        let mut found = enumerate(&mut bus).unwrap();
        assert_eq!(bus.passes, 3);
        found.sort();
        assert_eq!(found, [RomCode(0x0A), RomCode(0x0B), RomCode(0x15)]);
    }

    #[test]
    fn test_search_order_prefers_zero() {
        let mut bus = SearchBus::new(&[0x15, 0x0B, 0x0A]);
        let found = enumerate(&mut bus).unwrap();
        assert_eq!(found, [RomCode(0x0A), RomCode(0x15), RomCode(0x0B)]);
    }

    #[test]
    fn test_search_single_device() {
        let rom = 0xA200_0000_01B8_1C02;
        let mut bus = SearchBus::new(&[rom]);
        assert_eq!(enumerate(&mut bus).unwrap(), [RomCode(rom)]);
        assert_eq!(bus.passes, 1);
    }

    #[test]
    fn test_search_empty_bus() {
        let mut bus = SearchBus::new(&[]);
        let mut search = RomSearch::new();
        assert_eq!(search.next(&mut bus).unwrap(), None);
        assert!(search.is_finished());
        assert_eq!(search.next(&mut bus).unwrap(), None);
        assert_eq!(bus.passes, 1);
    }

    #[test]
    fn test_search_high_bit_discrepancy() {
        let a = 0x0000_0000_0000_0041;
        let b = 0x8000_0000_0000_0041;
        let mut bus = SearchBus::new(&[b, a]);
        assert_eq!(enumerate(&mut bus).unwrap(), [RomCode(a), RomCode(b)]);
    }
}
