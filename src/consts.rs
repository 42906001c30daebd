//! Constants used across the APRS transmit pipeline.
//!
//! This module defines the protocol-wide values for AX.25 framing, the
//! APRS information field, AFSK1200 tone generation and the PWM sample
//! range of the audio output.
//!
//! ## Key Concepts
//!
//! - **Framing**: HDLC flag, UI control byte and "no layer 3" PID.
//! - **Addresses**: fixed 7-byte address fields, at most two digipeater entries.
//! - **Information field**: capped at [`MAX_INFO_LEN`] bytes.
//! - **Tones**: Bell 202 mark/space frequencies at 1200 baud.
//! - **PWM**: unsigned duty-cycle levels in `0..=PWM_MAX_LEVEL`, idling at the midpoint.
//!
//! These values should be used wherever framing or sample-buffer logic is
//! implemented so that every stage agrees on the same limits.

/// HDLC flag octet delimiting an AX.25 frame. Never bit-stuffed.
pub const AX25_FLAG: u8 = 0x7e;

/// Control byte of an unnumbered-information (UI) frame, poll/final bit clear.
pub const AX25_CONTROL_UI: u8 = 0x03;

/// Protocol identifier for "no layer 3 protocol".
pub const AX25_PID_NO_LAYER3: u8 = 0xf0;

/// Length (in bytes) of one encoded address field.
pub const AX25_ADDRESS_LEN: usize = 7;

/// Maximum number of characters in a call sign, excluding the SSID.
pub const CALL_SIGN_MAX_LEN: usize = 6;

/// Largest SSID that fits in the 4-bit SSID field.
pub const SSID_MAX: u8 = 15;

/// Maximum number of digipeater path entries carried in a frame.
pub const MAX_PATH_LEN: usize = 2;

/// Maximum length (in bytes) of the APRS information field.
///
/// Comments are truncated to fit; the fixed position part always fits.
pub const MAX_INFO_LEN: usize = 256;

/// Length (in bytes) of the frame check sequence.
pub const FCS_LEN: usize = 2;

/// Maximum length of the address field: destination, source and the path entries.
pub const MAX_ADDRESS_FIELD_LEN: usize = AX25_ADDRESS_LEN * (2 + MAX_PATH_LEN);

/// Maximum size (in bytes) of a complete frame, from the first address byte to the FCS.
pub const MAX_FRAME_LEN: usize = MAX_ADDRESS_FIELD_LEN + 2 + MAX_INFO_LEN + FCS_LEN;

/// APRS data type identifier for a position report without timestamp or messaging.
pub const APRS_POSITION_TYPE: char = '!';

/// Conversion factor from meters to feet for the `/A=` altitude token.
///
/// The product is truncated toward zero, so 35 m renders as `/A=000114`.
pub const FEET_PER_METER: f64 = 3.28084;

/// Smallest altitude (in feet) representable in the six-character token.
pub const ALTITUDE_MIN_FT: i32 = -99_999;

/// Largest altitude (in feet) representable in the six-character token.
pub const ALTITUDE_MAX_FT: i32 = 999_999;

/// Symbol rate of AFSK1200.
pub const BAUD_RATE: u32 = 1_200;

/// Mark tone frequency (Hz).
pub const MARK_FREQ_HZ: u32 = 1_200;

/// Space tone frequency (Hz).
pub const SPACE_FREQ_HZ: u32 = 2_200;

/// Default output sample rate of the PWM audio sink.
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 22_050;

/// Highest PWM duty-cycle level produced by the synthesiser.
pub const PWM_MAX_LEVEL: u16 = 512;

/// Idle (silence) duty-cycle level, the midpoint of the PWM range.
pub const PWM_IDLE_LEVEL: u16 = PWM_MAX_LEVEL / 2;

/// Full-scale volume. A volume of 256 spans the whole PWM range.
pub const MAX_VOLUME: u16 = 256;

/// Number of samples held by each audio buffer of the default pool.
pub const SAMPLES_PER_BUFFER: usize = 256;

/// Number of audio buffers in the default pool.
pub const BUFFER_COUNT: usize = 3;
