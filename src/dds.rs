//! Direct digital synthesis shared by the AFSK modulator and the calibration tone.
//!
//! The phase accumulator is a 32-bit fixed-point fraction of a full turn, so
//! wrapping at 2π is the natural integer overflow and the phase is never reset
//! when the step (frequency) changes.

use core::f32::consts::TAU;

use crate::consts::{MAX_VOLUME, PWM_IDLE_LEVEL, PWM_MAX_LEVEL};
use crate::error::ValidationError;

const TURN: f32 = 4_294_967_296.0; // 2^32

/// Output amplitude on a 0-256 scale. 256 spans the full PWM range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Volume(u16);

impl Volume {
    /// Full scale.
    pub const MAX: Volume = Volume(MAX_VOLUME);

    /// Validates a raw volume level.
    pub fn new(level: u16) -> Result<Self, ValidationError> {
        if level > MAX_VOLUME {
            return Err(ValidationError::InvalidVolume);
        }
        Ok(Self(level))
    }

    /// The raw level.
    pub fn level(&self) -> u16 {
        self.0
    }
}

/// Phase increment per sample for `freq_hz` at `sample_rate_hz`.
///
/// `phase_inc = freq * 2^32 / sample_rate`
pub const fn phase_step(freq_hz: u32, sample_rate_hz: u32) -> u32 {
    (((freq_hz as u64) << 32) / sample_rate_hz as u64) as u32
}

/// Running phase of an oscillator.
#[derive(Debug, Clone, Default)]
pub struct PhaseAccumulator {
    phase: u32,
}

impl PhaseAccumulator {
    /// Starts at phase zero.
    pub const fn new() -> Self {
        Self { phase: 0 }
    }

    /// The current phase as a fraction of a turn (`2^32` = 2π).
    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// The current phase in radians, in `[0, 2π)`.
    pub fn radians(&self) -> f32 {
        self.phase as f32 / TURN * TAU
    }

    /// Returns the sine at the current phase, then advances by `step`.
    #[inline]
    pub fn advance(&mut self, step: u32) -> f32 {
        let value = libm::sinf(self.radians());
        self.phase = self.phase.wrapping_add(step);
        value
    }
}

/// Maps a sine value in `[-1, 1]` to a PWM duty-cycle level.
#[inline]
pub fn pwm_level(value: f32, volume: Volume) -> u16 {
    let level = PWM_IDLE_LEVEL as f32 + libm::roundf(value * volume.level() as f32);
    level.clamp(0.0, PWM_MAX_LEVEL as f32) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_range() {
        assert_eq!(Volume::new(256), Ok(Volume::MAX));
        assert_eq!(Volume::new(0).map(|v| v.level()), Ok(0));
        assert_eq!(Volume::new(257), Err(ValidationError::InvalidVolume));
    }

    #[test]
    fn test_phase_step() {
        // Quarter of the sample rate is a quarter turn per sample
        assert_eq!(phase_step(11_025, 44_100), 1 << 30);
        assert_eq!(phase_step(0, 22_050), 0);
    }

    #[test]
    fn test_accumulator_wraps_without_reset() {
        let mut acc = PhaseAccumulator::new();
        let step = 3u32 << 30;
        for i in 1..=10u32 {
            let _ = acc.advance(step);
            assert_eq!(acc.phase(), step.wrapping_mul(i));
        }
        assert!(acc.radians() < TAU);
    }

    #[test]
    fn test_pwm_level_bounds() {
        assert_eq!(pwm_level(0.0, Volume::MAX), PWM_IDLE_LEVEL);
        assert_eq!(pwm_level(1.0, Volume::MAX), PWM_MAX_LEVEL);
        assert_eq!(pwm_level(-1.0, Volume::MAX), 0);
        assert_eq!(pwm_level(1.0, Volume::new(0).unwrap()), PWM_IDLE_LEVEL);
        assert_eq!(pwm_level(-1.0, Volume::new(128).unwrap()), PWM_IDLE_LEVEL - 128);
    }
}
