//! Calibration sine tone.
//!
//! A single-frequency oscillator built on the same [`PhaseAccumulator`] as the
//! AFSK modulator. Useful for setting transmitter deviation and checking the
//! PWM output path without generating a packet.

use crate::dds::{PhaseAccumulator, Volume, phase_step, pwm_level};
use crate::error::ValidationError;

/// How long a tone plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Duration {
    /// A fixed number of samples.
    Samples(u64),
    /// Until cancelled by the caller.
    Unbounded,
}

impl Duration {
    /// Converts a millisecond duration; negative values mean [`Duration::Unbounded`].
    pub fn from_millis(duration_ms: i32, sample_rate_hz: u32) -> Self {
        match u64::try_from(duration_ms) {
            Ok(ms) => Duration::Samples(ms * sample_rate_hz as u64 / 1_000),
            Err(_) => Duration::Unbounded,
        }
    }
}

/// Sine wave sample stream.
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    osc: PhaseAccumulator,
    step: u32,
    remaining: Option<u64>,
    volume: Volume,
}

impl ToneGenerator {
    /// Creates a tone of `freq_hz` sampled at `sample_rate_hz`.
    ///
    /// # Errors
    /// - [`ValidationError::InvalidFrequency`] for a zero frequency
    /// - [`ValidationError::InvalidSampleRate`] if `sample_rate_hz` is not above
    ///   twice the tone frequency
    pub fn new(
        freq_hz: u32,
        sample_rate_hz: u32,
        volume: Volume,
        duration: Duration,
    ) -> Result<Self, ValidationError> {
        if freq_hz == 0 {
            return Err(ValidationError::InvalidFrequency);
        }
        if (sample_rate_hz as u64) <= 2 * freq_hz as u64 {
            return Err(ValidationError::InvalidSampleRate);
        }
        Ok(Self {
            osc: PhaseAccumulator::new(),
            step: phase_step(freq_hz, sample_rate_hz),
            remaining: match duration {
                Duration::Samples(n) => Some(n),
                Duration::Unbounded => None,
            },
            volume,
        })
    }

    /// The oscillator phase (`2^32` = one turn).
    pub fn phase(&self) -> u32 {
        self.osc.phase()
    }
}

impl Iterator for ToneGenerator {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        Some(pwm_level(self.osc.advance(self.step), self.volume))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining {
            Some(n) => {
                let n = usize::try_from(n).unwrap_or(usize::MAX);
                (n, Some(n))
            }
            None => (usize::MAX, None),
        }
    }
}
