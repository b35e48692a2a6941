//! Bus master trait definition

use crate::error::Result;

/// 1-Wire bus master
///
/// This trait represents a bridge that drives a 1-Wire bus. Everything above
/// it (frames, ROM search, the logger protocol) is built from these three
/// exchange primitives:
///
/// - `reset()` - reset pulse and presence detect
/// - `touch_bit()` - one time slot: write a bit, sample the line
/// - `touch_byte()` - eight time slots, LSB first
///
/// Every call blocks until the bridge reports the operation complete.
///
/// ## Example: Bridge implementation
///
/// ```ignore
/// impl OneWireMaster for MyBridge {
///     fn reset(&mut self) -> Result<()> {
///         self.send(CMD_RESET)?;
///         self.wait_idle()
///     }
///
///     fn touch_bit(&mut self, bit: bool) -> Result<bool> {
///         self.send(CMD_BIT | (bit as u16) << 3)?;
///         self.wait_idle()?;
///         Ok(self.read_data()? & 1 != 0)
///     }
///
///     fn touch_byte(&mut self, byte: u8) -> Result<u8> {
///         self.send_with_index(CMD_BYTE, byte)?;
///         self.wait_idle()?;
///         self.read_data()
///     }
///
///     fn delay_ms(&mut self, ms: u32) {
///         std::thread::sleep(std::time::Duration::from_millis(ms as u64));
///     }
/// }
/// ```
pub trait OneWireMaster {
    /// Acquire the bus session if it is not held yet
    ///
    /// Bridges that are always live (emulators) keep the default.
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    /// Whether the bus session is currently held
    fn is_open(&self) -> bool {
        true
    }

    /// Issue a bus reset and wait for it to complete
    fn reset(&mut self) -> Result<()>;

    /// Write one bit and return the bit sampled in the same time slot
    fn touch_bit(&mut self, bit: bool) -> Result<bool>;

    /// Write one byte and return the byte sampled in the same time slots
    ///
    /// Writing 0xFF leaves the line released, so the result is whatever the
    /// device drives (a read).
    fn touch_byte(&mut self, byte: u8) -> Result<u8>;

    /// Block for the given number of milliseconds
    fn delay_ms(&mut self, ms: u32);
}

impl<M: OneWireMaster + ?Sized> OneWireMaster for &mut M {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }

    fn touch_bit(&mut self, bit: bool) -> Result<bool> {
        (**self).touch_bit(bit)
    }

    fn touch_byte(&mut self, byte: u8) -> Result<u8> {
        (**self).touch_byte(byte)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

impl<M: OneWireMaster + ?Sized> OneWireMaster for alloc::boxed::Box<M> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }

    fn touch_bit(&mut self, bit: bool) -> Result<bool> {
        (**self).touch_bit(bit)
    }

    fn touch_byte(&mut self, byte: u8) -> Result<u8> {
        (**self).touch_byte(byte)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}
