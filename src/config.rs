//! Runtime configuration of the transmitter.

use crate::consts::{DEFAULT_SAMPLE_RATE_HZ, SPACE_FREQ_HZ};
use crate::error::ValidationError;

/// Transmitter settings that depend on the target hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Config {
    /// Output sample rate of the PWM audio sink (Hz).
    pub sample_rate: u32,
    /// Flag octets sent before the frame (transmitter key-up time). At least one is sent.
    pub head_flags: u16,
    /// Flag octets sent after the frame. At least one is sent.
    pub tail_flags: u16,
    /// How often the producer polls for a free buffer while waiting (µs).
    pub poll_interval_us: u32,
    /// Longest wait for a free buffer before reporting starvation (µs).
    pub starvation_timeout_us: u32,
}

impl Config {
    /// Checks that the sample rate can carry the space tone.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sample_rate <= 2 * SPACE_FREQ_HZ {
            return Err(ValidationError::InvalidSampleRate);
        }
        Ok(())
    }

    /// Playback time of one `samples`-long buffer at this sample rate (µs).
    pub fn buffer_interval_us(&self, samples: usize) -> u32 {
        if self.sample_rate == 0 {
            return 0;
        }
        (samples as u64 * 1_000_000 / self.sample_rate as u64) as u32
    }

    /// Sets the starvation timeout to `intervals` buffer playback times.
    pub fn with_starvation_intervals(mut self, samples: usize, intervals: u32) -> Self {
        self.starvation_timeout_us = self.buffer_interval_us(samples).saturating_mul(intervals);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE_HZ,
            head_flags: 1,
            tail_flags: 1,
            poll_interval_us: 100,
            // Roughly four 256-sample buffers at 22.05 kHz
            starvation_timeout_us: 50_000,
        }
    }
}
