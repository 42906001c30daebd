//! Station identifiers and their AX.25 address-field encoding.
//!
//! A [`CallSign`] is a 1-6 character alphanumeric base plus a 4-bit SSID.
//! Input is upper-cased; anything else is rejected with a [`ValidationError`].
//!
//! ## Address field layout
//!
//! Each address occupies [`AX25_ADDRESS_LEN`] bytes:
//!
//! | Byte  | Content                                                          |
//! |-------|------------------------------------------------------------------|
//! | 0..6  | base characters, ASCII × 2, space padded on the right            |
//! | 6     | `C/H` bit 7, reserved bits 6-5 (set), SSID bits 4-1, last bit 0  |
//!
//! The `C/H` bit is the command bit on the destination and source addresses and
//! the has-been-repeated bit on digipeater entries.

use core::fmt;

use crate::consts::{AX25_ADDRESS_LEN, CALL_SIGN_MAX_LEN, SSID_MAX};
use crate::error::ValidationError;

const RESERVED_BITS: u8 = 0x60;
const HIGH_BIT: u8 = 0x80;
const LAST_ADDRESS_BIT: u8 = 0x01;

/// A validated station identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct CallSign {
    base: [u8; CALL_SIGN_MAX_LEN],
    len: u8,
    ssid: u8,
}

impl CallSign {
    /// Creates a call sign from a base string and an SSID.
    ///
    /// The base is upper-cased. Fails if it is empty, longer than six characters,
    /// contains anything but ASCII letters and digits, or if `ssid > 15`.
    pub fn new(base: &str, ssid: u8) -> Result<Self, ValidationError> {
        let bytes = base.as_bytes();
        if bytes.is_empty() || bytes.len() > CALL_SIGN_MAX_LEN {
            return Err(ValidationError::CallSignLength);
        }
        if ssid > SSID_MAX {
            return Err(ValidationError::InvalidSsid);
        }
        let mut upper = [b' '; CALL_SIGN_MAX_LEN];
        for (slot, &c) in upper.iter_mut().zip(bytes) {
            if !c.is_ascii_alphanumeric() {
                return Err(ValidationError::CallSignCharacter);
            }
            *slot = c.to_ascii_uppercase();
        }
        Ok(Self {
            base: upper,
            len: bytes.len() as u8,
            ssid,
        })
    }

    /// Parses `BASE` or `BASE-SSID` (e.g. `N0CALL`, `WIDE1-1`).
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.split_once('-') {
            Some((base, ssid)) => {
                let ssid = parse_ssid(ssid)?;
                Self::new(base, ssid)
            }
            None => Self::new(s, 0),
        }
    }

    /// The upper-cased base, without padding.
    pub fn base(&self) -> &str {
        // Only ASCII alphanumerics are ever stored
        core::str::from_utf8(&self.base[..self.len as usize]).unwrap_or("")
    }

    /// The secondary station identifier.
    pub fn ssid(&self) -> u8 {
        self.ssid
    }

    /// Encodes the address with the `C/H` bit clear.
    ///
    /// `last` sets the end-of-address-field marker.
    pub fn encode(&self, last: bool) -> [u8; AX25_ADDRESS_LEN] {
        self.encode_with(false, last)
    }

    pub(crate) fn encode_with(&self, high_bit: bool, last: bool) -> [u8; AX25_ADDRESS_LEN] {
        let mut field = [0u8; AX25_ADDRESS_LEN];
        for (out, &c) in field.iter_mut().zip(self.base.iter()) {
            *out = c << 1;
        }
        let mut ssid_byte = RESERVED_BITS | (self.ssid << 1);
        if high_bit {
            ssid_byte |= HIGH_BIT;
        }
        if last {
            ssid_byte |= LAST_ADDRESS_BIT;
        }
        field[AX25_ADDRESS_LEN - 1] = ssid_byte;
        field
    }
}

impl fmt::Display for CallSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ssid == 0 {
            write!(f, "{}", self.base())
        } else {
            write!(f, "{}-{}", self.base(), self.ssid)
        }
    }
}

fn parse_ssid(s: &str) -> Result<u8, ValidationError> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidSsid);
    }
    let ssid = s.bytes().fold(0u8, |acc, c| acc * 10 + (c - b'0'));
    if ssid > SSID_MAX {
        return Err(ValidationError::InvalidSsid);
    }
    Ok(ssid)
}

/// A digipeater path entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct PathAddress {
    /// The alias or station, e.g. `WIDE1-1`.
    pub call_sign: CallSign,
    /// Set by a digipeater once it has repeated the frame. Always clear on transmit.
    pub repeated: bool,
}

impl PathAddress {
    /// Parses a path entry. Returns `Ok(None)` for an empty string.
    pub fn parse(s: &str) -> Result<Option<Self>, ValidationError> {
        if s.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self {
            call_sign: CallSign::parse(s)?,
            repeated: false,
        }))
    }

    /// Encodes the entry with its has-been-repeated bit.
    pub fn encode(&self, last: bool) -> [u8; AX25_ADDRESS_LEN] {
        self.call_sign.encode_with(self.repeated, last)
    }
}

impl fmt::Display for PathAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.call_sign)?;
        if self.repeated {
            write!(f, "*")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_sign_upper_cases_input() {
        let call = CallSign::new("n0call", 7).unwrap();
        assert_eq!(call.base(), "N0CALL");
        assert_eq!(call.ssid(), 7);
    }

    #[test]
    fn test_call_sign_rejects_bad_length() {
        assert_eq!(CallSign::new("", 0), Err(ValidationError::CallSignLength));
        assert_eq!(
            CallSign::new("N0CALLX", 0),
            Err(ValidationError::CallSignLength)
        );
    }

    #[test]
    fn test_call_sign_rejects_non_alphanumeric() {
        assert_eq!(
            CallSign::new("N0/AL", 0),
            Err(ValidationError::CallSignCharacter)
        );
        assert_eq!(
            CallSign::new("N0 AL", 0),
            Err(ValidationError::CallSignCharacter)
        );
    }

    #[test]
    fn test_parse_with_ssid() {
        let call = CallSign::parse("WIDE2-1").unwrap();
        assert_eq!(call.base(), "WIDE2");
        assert_eq!(call.ssid(), 1);

        assert_eq!(CallSign::parse("WIDE2-16"), Err(ValidationError::InvalidSsid));
        assert_eq!(CallSign::parse("WIDE2-"), Err(ValidationError::InvalidSsid));
        assert_eq!(CallSign::parse("WIDE2-x"), Err(ValidationError::InvalidSsid));
        assert_eq!(CallSign::parse("-1"), Err(ValidationError::CallSignLength));
    }

    #[test]
    fn test_encode_shifts_and_pads() {
        let field = CallSign::new("APRS", 0).unwrap().encode(false);
        assert_eq!(
            field,
            [b'A' << 1, b'P' << 1, b'R' << 1, b'S' << 1, 0x40, 0x40, 0x60]
        );
    }

    #[test]
    fn test_encode_ssid_and_last_bit_for_all_ssids() {
        for ssid in 0..=SSID_MAX {
            let call = CallSign::new("N0CALL", ssid).unwrap();
            for last in [false, true] {
                let field = call.encode(last);
                assert_eq!((field[6] >> 1) & 0x0f, ssid);
                assert_eq!(field[6] & 0x01 == 1, last);
                assert_eq!(field[6] & 0x60, 0x60);
            }
        }
    }

    #[test]
    fn test_encode_command_bit() {
        let call = CallSign::new("APRS", 0).unwrap();
        assert_eq!(call.encode_with(true, false)[6], 0xe0);
    }

    #[test]
    fn test_path_address_parse() {
        assert_eq!(PathAddress::parse(""), Ok(None));
        let path = PathAddress::parse("wide1-1").unwrap().unwrap();
        assert_eq!(path.call_sign.base(), "WIDE1");
        assert_eq!(path.call_sign.ssid(), 1);
        assert!(!path.repeated);
        assert_eq!(path.encode(true)[6], 0x63);
    }
}
