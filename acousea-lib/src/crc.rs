//! CRC-16/CCITT-FALSE (poly 0x1021, init 0xFFFF, MSB first, no reflection, no final XOR).

use crate::constants::CRC_SIZE;
use crc::{CRC_16_IBM_3740, Crc};

// IBM-3740 is the catalogue name of CCITT-FALSE
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Compute the CRC over `data`.
pub fn calculate(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// Split `frame` into body and the big-endian CRC carried in its last two bytes.
pub fn split_trailer(frame: &[u8]) -> Option<(&[u8], u16)> {
    if frame.len() < CRC_SIZE {
        return None;
    }
    let (body, trailer) = frame.split_at(frame.len() - CRC_SIZE);
    Some((body, u16::from_be_bytes([trailer[0], trailer[1]])))
}

/// Check the trailing CRC of `frame` against one recomputed over everything before it.
pub fn verify(frame: &[u8]) -> bool {
    match split_trailer(frame) {
        Some((body, received)) => calculate(body) == received,
        None => false,
    }
}

/// Append the big-endian CRC of `buffer` to it.
pub fn append(buffer: &mut Vec<u8>) {
    let crc = calculate(buffer);
    buffer.extend_from_slice(&crc.to_be_bytes());
}
