//! Bell 202 AFSK modulator.
//!
//! Consumes NRZI line levels and yields PWM samples. Each bit period selects
//! the mark (1200 Hz) or space (2200 Hz) tone and synthesises it with a single
//! [`PhaseAccumulator`], so the phase stays continuous across tone changes.
//!
//! ## Bit timing
//!
//! `sample_rate / baud` is rarely an integer (22050 / 1200 = 18.375). Instead of
//! truncating each period, a bit clock accumulates `sample_rate` per bit and
//! emits `bit_clock / baud` samples, keeping the remainder. After `N` bits the
//! sample count is `floor(N * sample_rate / baud)`, so it never drifts.

use crate::consts::{BAUD_RATE, MARK_FREQ_HZ, SPACE_FREQ_HZ};
use crate::dds::{PhaseAccumulator, Volume, phase_step, pwm_level};
use crate::error::ValidationError;

/// Lazy, finite AFSK sample stream over a sequence of line levels.
///
/// `true` levels are sent as mark, `false` as space.
#[derive(Debug, Clone)]
pub struct AfskModulator<I> {
    levels: I,
    osc: PhaseAccumulator,
    mark_step: u32,
    space_step: u32,
    step: u32,
    sample_rate: u32,
    bit_clock: u64,
    samples_left: u32,
    bits: u32,
    volume: Volume,
}

impl<I: Iterator<Item = bool>> AfskModulator<I> {
    /// Creates a modulator at `sample_rate_hz`.
    ///
    /// Fails with [`ValidationError::InvalidSampleRate`] if the rate cannot
    /// represent the space tone.
    pub fn new(levels: I, sample_rate_hz: u32, volume: Volume) -> Result<Self, ValidationError> {
        if sample_rate_hz <= 2 * SPACE_FREQ_HZ {
            return Err(ValidationError::InvalidSampleRate);
        }
        let mark_step = phase_step(MARK_FREQ_HZ, sample_rate_hz);
        Ok(Self {
            levels,
            osc: PhaseAccumulator::new(),
            mark_step,
            space_step: phase_step(SPACE_FREQ_HZ, sample_rate_hz),
            step: mark_step,
            sample_rate: sample_rate_hz,
            bit_clock: 0,
            samples_left: 0,
            bits: 0,
            volume,
        })
    }

    /// Number of bit periods started so far.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// The oscillator phase (`2^32` = one turn).
    pub fn phase(&self) -> u32 {
        self.osc.phase()
    }

    fn next_bit(&mut self) -> Option<()> {
        let level = self.levels.next()?;
        self.step = if level {
            self.mark_step
        } else {
            self.space_step
        };
        self.bit_clock += u64::from(self.sample_rate);
        // Below u32::MAX / BAUD_RATE + 1 for any u32 sample rate
        self.samples_left = (self.bit_clock / u64::from(BAUD_RATE)) as u32;
        self.bit_clock %= u64::from(BAUD_RATE);
        self.bits += 1;
        Some(())
    }
}

impl<I: Iterator<Item = bool>> Iterator for AfskModulator<I> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        while self.samples_left == 0 {
            self.next_bit()?;
        }
        self.samples_left -= 1;
        Some(pwm_level(self.osc.advance(self.step), self.volume))
    }
}
