//! APRS position report rendering.
//!
//! Produces the information field of an uncompressed position report without
//! timestamp:
//!
//! ```text
//! !DDMM.hhN/DDDMM.hhW-/A=000114 comment
//! ^ lat      ^ lon    ^ symbol code
//!          ^ symbol table
//! ```
//!
//! Latitude and longitude are rounded to hundredths of a minute. Altitude, when
//! present, becomes an `/A=` token in feet ahead of the free-text comment. A
//! missing comment yields a position-only report. Comments are truncated so the
//! field never exceeds [`MAX_INFO_LEN`].

use core::fmt::Write;

use heapless::{String, Vec};

use crate::consts::{
    ALTITUDE_MAX_FT, ALTITUDE_MIN_FT, APRS_POSITION_TYPE, FEET_PER_METER, MAX_INFO_LEN,
};
use crate::error::ValidationError;

/// An encoded information field.
pub type InfoField = Vec<u8, MAX_INFO_LEN>;

/// A single position report, immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionReport<'a> {
    /// Latitude in decimal degrees, north positive.
    pub latitude: f64,
    /// Longitude in decimal degrees, east positive.
    pub longitude: f64,
    /// Altitude in meters.
    pub altitude_m: Option<f64>,
    /// Symbol table identifier (`/` primary, `\` alternate, or an overlay).
    pub symbol_table: char,
    /// Symbol code within the table.
    pub symbol_code: char,
    /// Free-text comment. `None` means a position-only report.
    pub comment: Option<&'a str>,
}

impl PositionReport<'_> {
    /// Renders the report into an information field.
    pub fn encode(&self) -> Result<InfoField, ValidationError> {
        let (lat, lon) = self.validate()?;

        let mut text: String<MAX_INFO_LEN> = String::new();
        write!(
            text,
            "{}{}{}{}{}",
            APRS_POSITION_TYPE, lat, self.symbol_table, lon, self.symbol_code
        )
        .map_err(|_| ValidationError::InfoFieldTooLong)?;

        if let Some(altitude_m) = self.altitude_m {
            write!(text, "/A={:06}", altitude_feet(altitude_m))
                .map_err(|_| ValidationError::InfoFieldTooLong)?;
        }

        let mut info = Vec::new();
        info.extend_from_slice(text.as_bytes())
            .map_err(|_| ValidationError::InfoFieldTooLong)?;

        if let Some(comment) = self.comment {
            let room = MAX_INFO_LEN - info.len();
            let comment = &comment.as_bytes()[..comment.len().min(room)];
            info.extend_from_slice(comment)
                .map_err(|_| ValidationError::InfoFieldTooLong)?;
        }
        Ok(info)
    }

    fn validate(&self) -> Result<(Coordinate, Coordinate), ValidationError> {
        let lat = Coordinate::latitude(self.latitude)?;
        let lon = Coordinate::longitude(self.longitude)?;
        if !is_symbol_table(self.symbol_table) {
            return Err(ValidationError::InvalidSymbolTable);
        }
        if !is_printable(self.symbol_code) || self.symbol_code == ' ' {
            return Err(ValidationError::InvalidSymbolCode);
        }
        if let Some(comment) = self.comment {
            if !comment.chars().all(is_printable) {
                return Err(ValidationError::InvalidComment);
            }
        }
        Ok((lat, lon))
    }
}

fn is_symbol_table(c: char) -> bool {
    matches!(c, '/' | '\\' | '0'..='9' | 'A'..='Z')
}

fn is_printable(c: char) -> bool {
    matches!(c, ' '..='~')
}

/// Converts meters to whole feet (truncated) within the token's range.
pub fn altitude_feet(altitude_m: f64) -> i32 {
    let feet = libm::trunc(altitude_m * FEET_PER_METER);
    if feet.is_nan() {
        return 0;
    }
    (feet as i64).clamp(ALTITUDE_MIN_FT as i64, ALTITUDE_MAX_FT as i64) as i32
}

/// A coordinate rounded to hundredths of a minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Coordinate {
    degrees: u16,
    hundredths: u16,
    hemisphere: char,
    width: usize,
}

impl Coordinate {
    fn latitude(deg: f64) -> Result<Self, ValidationError> {
        if !deg.is_finite() || !(-90.0..=90.0).contains(&deg) {
            return Err(ValidationError::InvalidLatitude);
        }
        Ok(Self::new(deg, 2, if deg < 0.0 { 'S' } else { 'N' }))
    }

    fn longitude(deg: f64) -> Result<Self, ValidationError> {
        if !deg.is_finite() || !(-180.0..=180.0).contains(&deg) {
            return Err(ValidationError::InvalidLongitude);
        }
        Ok(Self::new(deg, 3, if deg < 0.0 { 'W' } else { 'E' }))
    }

    fn new(deg: f64, width: usize, hemisphere: char) -> Self {
        // Hundredths of a minute: 6000 per degree
        let total = libm::round(libm::fabs(deg) * 6000.0) as u32;
        Self {
            degrees: (total / 6000) as u16,
            hundredths: (total % 6000) as u16,
            hemisphere,
            width,
        }
    }
}

impl core::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:0width$}{:02}.{:02}{}",
            self.degrees,
            self.hundredths / 100,
            self.hundredths % 100,
            self.hemisphere,
            width = self.width
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(comment: Option<&str>) -> PositionReport<'_> {
        PositionReport {
            latitude: 51.5074,
            longitude: -0.1278,
            altitude_m: Some(35.0),
            symbol_table: '/',
            symbol_code: '-',
            comment,
        }
    }

    #[test]
    fn test_position_with_altitude() {
        let info = report(None).encode().unwrap();
        assert_eq!(&info[..], b"!5130.44N/00007.67W-/A=000114");
    }

    #[test]
    fn test_position_with_comment() {
        let info = report(Some("Hello")).encode().unwrap();
        assert_eq!(&info[..], b"!5130.44N/00007.67W-/A=000114Hello");
    }

    #[test]
    fn test_position_without_altitude_or_comment() {
        let mut r = report(None);
        r.altitude_m = None;
        assert_eq!(&r.encode().unwrap()[..], b"!5130.44N/00007.67W-");
    }

    #[test]
    fn test_southern_eastern_hemispheres() {
        let r = PositionReport {
            latitude: -33.8688,
            longitude: 151.2093,
            altitude_m: None,
            symbol_table: '\\',
            symbol_code: 'k',
            comment: None,
        };
        // 33.8688° = 33° 52.128', 151.2093° = 151° 12.558'
        assert_eq!(&r.encode().unwrap()[..], b"!3352.13S\\15112.56Ek");
    }

    #[test]
    fn test_minute_rounding_carries_into_degrees() {
        let mut r = report(None);
        r.altitude_m = None;
        r.latitude = 10.999_999;
        r.longitude = 0.0;
        assert_eq!(&r.encode().unwrap()[..], b"!1100.00N/00000.00E-");
    }

    #[test]
    fn test_comment_is_truncated_to_cap() {
        let long = [b'x'; 400];
        let long = core::str::from_utf8(&long).unwrap();
        let info = report(Some(long)).encode().unwrap();
        assert_eq!(info.len(), MAX_INFO_LEN);
        assert!(info.starts_with(b"!5130.44N/00007.67W-/A=000114xxx"));
    }

    #[test]
    fn test_altitude_feet_truncates_and_clamps() {
        assert_eq!(altitude_feet(35.0), 114);
        assert_eq!(altitude_feet(0.0), 0);
        assert_eq!(altitude_feet(-10.0), -32);
        assert_eq!(altitude_feet(1.0e9), ALTITUDE_MAX_FT);
        assert_eq!(altitude_feet(f64::NAN), 0);
    }

    #[test]
    fn test_negative_altitude_token() {
        let mut r = report(None);
        r.altitude_m = Some(-10.0);
        assert!(r.encode().unwrap().ends_with(b"/A=-00032"));
    }

    #[test]
    fn test_rejects_invalid_fields() {
        let mut r = report(None);
        r.latitude = 91.0;
        assert_eq!(r.encode(), Err(ValidationError::InvalidLatitude));

        let mut r = report(None);
        r.longitude = f64::NAN;
        assert_eq!(r.encode(), Err(ValidationError::InvalidLongitude));

        let mut r = report(None);
        r.symbol_table = 'x';
        assert_eq!(r.encode(), Err(ValidationError::InvalidSymbolTable));

        let mut r = report(None);
        r.symbol_code = '\n';
        assert_eq!(r.encode(), Err(ValidationError::InvalidSymbolCode));

        assert_eq!(
            report(Some("caf\u{e9}")).encode(),
            Err(ValidationError::InvalidComment)
        );
    }

    #[test]
    fn test_overlay_symbol_table_accepted() {
        let mut r = report(None);
        r.symbol_table = 'S';
        assert!(r.encode().is_ok());
    }
}
