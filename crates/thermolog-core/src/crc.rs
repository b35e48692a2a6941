//! Dallas/Maxim CRC algorithms
//!
//! - CRC-16 (polynomial 0x8005, reflected) protects memory page transfers.
//!   The device sends the inverted CRC, so running the accumulator over the
//!   frame including the two received CRC bytes leaves the fixed residual
//!   [`CRC16_RESIDUAL`].
//! - CRC-8 (polynomial 0x31, reflected) is the last byte of a ROM code.

/// Register value left after a CRC-16 check over data plus its inverted CRC
pub const CRC16_RESIDUAL: u16 = 0xB001;

/// Odd parity of a nibble
const ODD_PARITY: [u8; 16] = [0, 1, 1, 0, 1, 0, 0, 1, 1, 0, 0, 1, 0, 1, 1, 0];

/// Feed one byte into a CRC-16 register
#[inline]
pub fn crc16_update(crc: u16, byte: u8) -> u16 {
    let mut data = (byte as u16 ^ crc) & 0xFF;
    let mut crc = crc >> 8;

    if ODD_PARITY[(data & 0x0F) as usize] ^ ODD_PARITY[(data >> 4) as usize] != 0 {
        crc ^= 0xC001;
    }

    data <<= 6;
    crc ^= data;
    data <<= 1;
    crc ^= data;
    crc
}

/// Compute the CRC-16 of `data` starting from `seed`
pub fn crc16(seed: u16, data: &[u8]) -> u16 {
    data.iter().fold(seed, |crc, &b| crc16_update(crc, b))
}

/// Check a frame whose last two bytes are the inverted CRC-16 (LSB first)
pub fn check_crc16(frame: &[u8]) -> bool {
    crc16(0, frame) == CRC16_RESIDUAL
}

/// Compute the 1-Wire CRC-8 of `data`
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x01 != 0 {
                (crc >> 1) ^ 0x8C
            } else {
                crc >> 1
            };
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    /// Build a read-memory frame the way a DS1922 sends it:
    /// command, address, page data, inverted CRC
    fn page_frame(address: u16) -> Vec<u8> {
        let mut frame = Vec::new();
        frame.push(0x69);
        frame.extend_from_slice(&address.to_le_bytes());
        frame.extend((0..32u8).map(|i| i.wrapping_mul(37).wrapping_add(5)));
        let crc = !crc16(0, &frame);
        frame.extend_from_slice(&crc.to_le_bytes());
        frame
    }

    #[test]
    fn test_crc16_residual() {
        let frame = page_frame(0x0200);
        assert_eq!(frame.len(), 37);
        assert!(check_crc16(&frame));
    }

    #[test]
    fn test_crc16_wrong_crc_rejected() {
        let mut frame = page_frame(0x0220);
        frame[36] ^= 0x5A;
        assert!(!check_crc16(&frame));
    }

    #[test]
    fn test_crc16_single_bit_flip_rejected() {
        let frame = page_frame(0x1040);
        for byte in 0..frame.len() {
            for bit in 0..8 {
                let mut corrupted = frame.clone();
                corrupted[byte] ^= 1 << bit;
                assert!(
                    !check_crc16(&corrupted),
                    "bit {} of byte {} flipped but CRC still matched",
                    bit,
                    byte
                );
            }
        }
    }

    #[test]
    fn test_crc8_known_rom() {
        // Example ROM code from Maxim application note 27
        let rom = [0x02, 0x1C, 0xB8, 0x01, 0x00, 0x00, 0x00];
        assert_eq!(crc8(&rom), 0xA2);

        let mut full = rom.to_vec();
        full.push(0xA2);
        assert_eq!(crc8(&full), 0);
    }
}
