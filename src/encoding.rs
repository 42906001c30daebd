//! HDLC bit stuffing and NRZI line coding for AX.25 frames.
//!
//! The line encoder is a chain of lazy iterators consumed in a single forward
//! pass by the AFSK modulator:
//!
//! 1. [`HdlcBits`] walks the frame bytes LSB first, framed by flag octets, and
//!    inserts a `0` after every run of five `1` data bits. Flags are never stuffed.
//! 2. [`Nrzi`] turns data bits into line levels: a `0` toggles the level, a `1`
//!    holds it. Stuffed bits and flags go through NRZI like every other bit.
//!
//! The inverse adapters [`Destuff`] and [`NrziDecode`] recover the original bits
//! and are what a receiver applies.
//!
//! ## Functions
//!
//! - [`line_levels`]: the full chain, frame bytes in, line levels out
//! - [`destuff`] / [`nrzi_decode`]: the inverses

use crate::consts::AX25_FLAG;

/// Line level the encoder starts from. `true` is the mark tone.
pub const IDLE_LEVEL: bool = true;

const STUFF_AFTER: u8 = 5;

/// Bit-stuffed HDLC bit sequence of one frame, flags included.
#[derive(Debug, Clone)]
pub struct HdlcBits<'a> {
    frame: &'a [u8],
    head_flags: u16,
    tail_flags: u16,
    flag_bit: u8,
    data_bit: usize,
    ones: u8,
    stuff_pending: bool,
}

impl<'a> HdlcBits<'a> {
    /// Frames `frame` with `head_flags` leading and `tail_flags` trailing flag octets.
    ///
    /// Both counts are raised to at least one.
    pub fn new(frame: &'a [u8], head_flags: u16, tail_flags: u16) -> Self {
        Self {
            frame,
            head_flags: head_flags.max(1),
            tail_flags: tail_flags.max(1),
            flag_bit: 0,
            data_bit: 0,
            ones: 0,
            stuff_pending: false,
        }
    }

    fn next_flag_bit(&mut self) -> bool {
        let bit = (AX25_FLAG >> self.flag_bit) & 1 == 1;
        self.flag_bit += 1;
        if self.flag_bit == 8 {
            self.flag_bit = 0;
        }
        bit
    }
}

impl Iterator for HdlcBits<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.head_flags > 0 {
            let bit = self.next_flag_bit();
            if self.flag_bit == 0 {
                self.head_flags -= 1;
            }
            return Some(bit);
        }

        if self.stuff_pending {
            self.stuff_pending = false;
            self.ones = 0;
            return Some(false);
        }

        if self.data_bit < self.frame.len() * 8 {
            let byte = self.frame[self.data_bit / 8];
            let bit = (byte >> (self.data_bit % 8)) & 1 == 1;
            self.data_bit += 1;
            if bit {
                self.ones += 1;
                if self.ones == STUFF_AFTER {
                    self.stuff_pending = true;
                }
            } else {
                self.ones = 0;
            }
            return Some(bit);
        }

        if self.tail_flags > 0 {
            let bit = self.next_flag_bit();
            if self.flag_bit == 0 {
                self.tail_flags -= 1;
            }
            return Some(bit);
        }
        None
    }
}

/// NRZI encoder: `0` toggles the line level, `1` keeps it.
#[derive(Debug, Clone)]
pub struct Nrzi<I> {
    bits: I,
    level: bool,
}

impl<I: Iterator<Item = bool>> Nrzi<I> {
    /// Encodes `bits` starting from `initial` line level.
    pub fn new(bits: I, initial: bool) -> Self {
        Self {
            bits,
            level: initial,
        }
    }
}

impl<I: Iterator<Item = bool>> Iterator for Nrzi<I> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if !self.bits.next()? {
            self.level = !self.level;
        }
        Some(self.level)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.bits.size_hint()
    }
}

/// Line levels for a whole frame, starting from [`IDLE_LEVEL`].
pub fn line_levels(frame: &[u8], head_flags: u16, tail_flags: u16) -> Nrzi<HdlcBits<'_>> {
    Nrzi::new(HdlcBits::new(frame, head_flags, tail_flags), IDLE_LEVEL)
}

/// NRZI decoder: a bit is `1` when the level did not change.
#[derive(Debug, Clone)]
pub struct NrziDecode<I> {
    levels: I,
    last: bool,
}

impl<I: Iterator<Item = bool>> Iterator for NrziDecode<I> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        let level = self.levels.next()?;
        let bit = level == self.last;
        self.last = level;
        Some(bit)
    }
}

/// Decodes NRZI `levels` that were encoded from `initial`.
pub fn nrzi_decode<I: IntoIterator<Item = bool>>(
    levels: I,
    initial: bool,
) -> NrziDecode<I::IntoIter> {
    NrziDecode {
        levels: levels.into_iter(),
        last: initial,
    }
}

/// Removes the `0` inserted after every five consecutive `1`s.
#[derive(Debug, Clone)]
pub struct Destuff<I> {
    bits: I,
    ones: u8,
}

impl<I: Iterator<Item = bool>> Iterator for Destuff<I> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.ones == STUFF_AFTER {
            // The stuffed zero
            let _ = self.bits.next()?;
            self.ones = 0;
        }
        let bit = self.bits.next()?;
        if bit {
            self.ones += 1;
        } else {
            self.ones = 0;
        }
        Some(bit)
    }
}

/// De-stuffs the data portion of an HDLC bit sequence (flags excluded).
pub fn destuff<I: IntoIterator<Item = bool>>(bits: I) -> Destuff<I::IntoIter> {
    Destuff {
        bits: bits.into_iter(),
        ones: 0,
    }
}
