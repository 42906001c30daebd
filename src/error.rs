//! Error types for frame assembly and the audio buffer pipeline.
//!
//! Failures fall into two families:
//!
//! - [`ValidationError`]: the request is malformed. Always detected before any
//!   buffer is taken from the pool, so nothing is transmitted.
//! - [`ResourceError`]: the real-time pipeline could not make progress. Buffers
//!   already submitted for the transmission are left to play out.

use thiserror::Error;

/// A transmit request was rejected before touching the audio hardware.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ValidationError {
    /// The call sign base is empty or longer than six characters.
    #[error("call sign must be 1 to 6 characters long")]
    CallSignLength,
    /// The call sign contains something other than ASCII letters and digits.
    #[error("call sign must be alphanumeric")]
    CallSignCharacter,
    /// The SSID suffix is not a number in `0..=15`.
    #[error("SSID must be a number between 0 and 15")]
    InvalidSsid,
    /// More digipeater entries were supplied than a frame carries.
    #[error("too many digipeater path entries")]
    TooManyPathEntries,
    /// Latitude is not a finite value within ±90°.
    #[error("latitude out of range")]
    InvalidLatitude,
    /// Longitude is not a finite value within ±180°.
    #[error("longitude out of range")]
    InvalidLongitude,
    /// The symbol table identifier is not `/`, `\` or an overlay character.
    #[error("invalid symbol table identifier")]
    InvalidSymbolTable,
    /// The symbol code is not printable ASCII.
    #[error("invalid symbol code")]
    InvalidSymbolCode,
    /// The comment contains non-printable or non-ASCII characters.
    #[error("comment must be printable ASCII")]
    InvalidComment,
    /// The encoded information field does not fit the fixed cap.
    #[error("information field too long")]
    InfoFieldTooLong,
    /// Volume is above the full-scale value of 256.
    #[error("volume must be between 0 and 256")]
    InvalidVolume,
    /// Sample rate is zero or too low to represent the requested tone.
    #[error("sample rate cannot represent the requested tone")]
    InvalidSampleRate,
    /// Tone frequency is zero.
    #[error("tone frequency must be non-zero")]
    InvalidFrequency,
}

/// The buffer pipeline failed while streaming samples.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ResourceError {
    /// No free buffer was returned by the hardware within the bounded wait.
    #[error("no free audio buffer became available (hardware starvation)")]
    Starved,
    /// The play queue refused a buffer. Only possible if a buffer was duplicated.
    #[error("audio play queue is full")]
    PlayQueueFull,
    /// The global audio pool has not been set up.
    #[error("audio buffer pool not initialized")]
    NotInitialized,
    /// The global audio pool was already set up.
    #[error("audio buffer pool already initialized")]
    AlreadyInitialized,
}

/// Any error produced by this crate.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Error {
    /// See [`ValidationError`].
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// See [`ResourceError`].
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl Error {
    /// Returns `true` for errors raised before any hardware interaction.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Returns `true` for errors raised by the real-time pipeline.
    pub fn is_resource(&self) -> bool {
        matches!(self, Error::Resource(_))
    }
}
