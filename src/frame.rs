//! AX.25 UI frame assembly.
//!
//! Wire order: destination, source, up to two digipeater entries, control
//! (`0x03`), PID (`0xf0`), information field, FCS (low byte first). The
//! last-address bit is set on the final path entry, or on the source when no
//! path is given.

use heapless::Vec;

use crate::address::{CallSign, PathAddress};
use crate::consts::{
    AX25_CONTROL_UI, AX25_PID_NO_LAYER3, FCS_LEN, MAX_FRAME_LEN, MAX_INFO_LEN, MAX_PATH_LEN,
};
use crate::crc;
use crate::error::ValidationError;

/// A complete UI frame, FCS included. Built fresh per transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8, MAX_FRAME_LEN>,
    info_start: usize,
}

impl Frame {
    /// Assembles a UI frame and appends its FCS.
    ///
    /// # Errors
    /// - [`ValidationError::TooManyPathEntries`] for more than two path entries
    /// - [`ValidationError::InfoFieldTooLong`] if `info` exceeds the cap
    pub fn ui(
        destination: &CallSign,
        source: &CallSign,
        path: &[PathAddress],
        info: &[u8],
    ) -> Result<Self, ValidationError> {
        if path.len() > MAX_PATH_LEN {
            return Err(ValidationError::TooManyPathEntries);
        }
        if info.len() > MAX_INFO_LEN {
            return Err(ValidationError::InfoFieldTooLong);
        }

        let mut bytes: Vec<u8, MAX_FRAME_LEN> = Vec::new();
        let overflow = |_| ValidationError::InfoFieldTooLong;

        bytes
            .extend_from_slice(&destination.encode_with(true, false))
            .map_err(overflow)?;
        bytes
            .extend_from_slice(&source.encode_with(false, path.is_empty()))
            .map_err(overflow)?;
        for (i, entry) in path.iter().enumerate() {
            bytes
                .extend_from_slice(&entry.encode(i + 1 == path.len()))
                .map_err(overflow)?;
        }
        bytes
            .extend_from_slice(&[AX25_CONTROL_UI, AX25_PID_NO_LAYER3])
            .map_err(overflow)?;

        let info_start = bytes.len();
        bytes.extend_from_slice(info).map_err(overflow)?;

        let fcs = crc::fcs(&bytes);
        bytes.extend_from_slice(&fcs).map_err(overflow)?;

        Ok(Self { bytes, info_start })
    }

    /// Every byte of the frame, FCS included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The bytes covered by the FCS: addresses through the information field.
    pub fn body(&self) -> &[u8] {
        &self.bytes[..self.bytes.len() - FCS_LEN]
    }

    /// The information field.
    pub fn info(&self) -> &[u8] {
        &self.bytes[self.info_start..self.bytes.len() - FCS_LEN]
    }

    /// The appended FCS, low byte first.
    pub fn fcs(&self) -> [u8; FCS_LEN] {
        let n = self.bytes.len();
        [self.bytes[n - 2], self.bytes[n - 1]]
    }

    /// Total frame length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false`; a frame carries at least two addresses.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
