//! Byte-level helpers and command frames
//!
//! A command frame is a bus reset, the skip ROM command and the payload.
//! Skip ROM addresses every device at once, so frames only make sense with a
//! single device on the bus.

use super::{OneWireMaster, SKIP_ROM};
use crate::error::{Error, Result};

/// Write a byte and check that the bus echoed it back unchanged
pub fn write_byte<M: OneWireMaster + ?Sized>(master: &mut M, byte: u8) -> Result<()> {
    let read = master.touch_byte(byte)?;
    if read != byte {
        log::debug!("write 0x{:02X} echoed as 0x{:02X}", byte, read);
        return Err(Error::EchoMismatch {
            written: byte,
            read,
        });
    }
    Ok(())
}

/// Read a byte from the bus
pub fn read_byte<M: OneWireMaster + ?Sized>(master: &mut M) -> Result<u8> {
    master.touch_byte(0xFF)
}

/// Reset the bus, address the device with skip ROM and write `bytes`
///
/// Stops at the first failing step.
pub fn frame_write<M: OneWireMaster + ?Sized>(master: &mut M, bytes: &[u8]) -> Result<()> {
    log::trace!("frame write: {:02X?}", bytes);
    master.reset()?;
    write_byte(master, SKIP_ROM)?;
    for &b in bytes {
        write_byte(master, b)?;
    }
    Ok(())
}

/// Fill `buf` with bytes read from the bus
///
/// No reset or addressing happens here; this continues the transaction a
/// preceding [`frame_write`] started.
pub fn frame_read<M: OneWireMaster + ?Sized>(master: &mut M, buf: &mut [u8]) -> Result<()> {
    for b in buf.iter_mut() {
        *b = read_byte(master)?;
    }
    log::trace!("frame read: {:02X?}", buf);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    /// Records traffic and echoes writes, answering reads from a queue
    struct Recorder {
        resets: usize,
        written: Vec<u8>,
        replies: Vec<u8>,
        stuck_low: bool,
    }

    impl Recorder {
        fn new(replies: &[u8]) -> Self {
            Self {
                resets: 0,
                written: Vec::new(),
                replies: replies.iter().rev().copied().collect(),
                stuck_low: false,
            }
        }
    }

    impl OneWireMaster for Recorder {
        fn reset(&mut self) -> Result<()> {
            self.resets += 1;
            Ok(())
        }

        fn touch_bit(&mut self, bit: bool) -> Result<bool> {
            Ok(bit)
        }

        fn touch_byte(&mut self, byte: u8) -> Result<u8> {
            if self.stuck_low {
                return Ok(0x00);
            }
            if byte == 0xFF {
                return Ok(self.replies.pop().unwrap_or(0xFF));
            }
            self.written.push(byte);
            Ok(byte)
        }

        fn delay_ms(&mut self, _ms: u32) {}
    }

    #[test]
    fn test_frame_write_sequence() {
        let mut bus = Recorder::new(&[]);
        frame_write(&mut bus, &[0x69, 0x00, 0x02]).unwrap();
        assert_eq!(bus.resets, 1);
        assert_eq!(bus.written, [SKIP_ROM, 0x69, 0x00, 0x02]);
    }

    #[test]
    fn test_frame_read() {
        let mut bus = Recorder::new(&[0x12, 0x34, 0x56]);
        let mut buf = [0u8; 3];
        frame_read(&mut bus, &mut buf).unwrap();
        assert_eq!(buf, [0x12, 0x34, 0x56]);
        assert_eq!(bus.resets, 0);
    }

    #[test]
    fn test_write_echo_mismatch() {
        let mut bus = Recorder::new(&[]);
        bus.stuck_low = true;
        assert_eq!(
            frame_write(&mut bus, &[0x33]),
            Err(Error::EchoMismatch {
                written: SKIP_ROM,
                read: 0x00
            })
        );
    }
}
