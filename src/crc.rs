//! CRC-16/X.25 frame check sequence.
//!
//! Reflected CCITT polynomial (x¹⁶+x¹²+x⁵+1), initial value `0xffff`,
//! final complement. The FCS is appended low byte first.

use crate::consts::FCS_LEN;

/// Remainder left in the register after running a frame *and* its FCS through
/// [`crc_ccitt_update`].
pub const GOOD_RESIDUE: u16 = 0xf0b8;

pub(crate) fn crc_ccitt_update(crc: u16, data: &u8) -> u16 {
    let mut d = *data as u16;
    d = d ^ lo8(crc);
    d = d ^ (d << 4);
    d = (d as u8) as u16; // Ensure d is treated as a u8 for the next operations

    ((d << 8) | hi8(crc)) ^ (((d >> 4) as u8) as u16) ^ (d << 3)
}

pub(crate) fn lo8(x: u16) -> u16 {
    x & 0xff
}

pub(crate) fn hi8(x: u16) -> u16 {
    x >> 8
}

fn register(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0xffff, crc_ccitt_update)
}

/// Computes the two FCS bytes (low byte first) over `bytes`.
pub fn fcs(bytes: &[u8]) -> [u8; FCS_LEN] {
    let crc = !register(bytes);
    [lo8(crc) as u8, hi8(crc) as u8]
}

/// Returns `true` if `frame` ends in a matching FCS.
pub fn check(frame: &[u8]) -> bool {
    frame.len() >= FCS_LEN && register(frame) == GOOD_RESIDUE
}
