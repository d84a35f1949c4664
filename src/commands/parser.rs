//! Parser for incoming status and response frames
//!
//! Views borrow from the decoded [`ApiFrame`]; nothing is copied.

use crate::commands::types::{AtCommand, AtStatus, ModemStatus};
use crate::protocol::framing::{ApiFrame, FrameType};

/// Offset of the command data inside an AT response:
/// `[frame_id][cmd 0][cmd 1][status]`
const AT_RESPONSE_HEADER: usize = 4;

/// A decoded AT command response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtResponse<'a> {
    pub frame_id: u8,
    pub mnemonic: [u8; 2],
    pub status: AtStatus,
    /// Response data; `frame.length - 5` bytes
    pub data: &'a [u8],
}

impl<'a> AtResponse<'a> {
    /// The command this responds to, if known
    pub fn command(&self) -> Option<AtCommand> {
        AtCommand::from_mnemonic(&self.mnemonic)
    }

    /// Mnemonic as text
    pub fn mnemonic_str(&self) -> &str {
        core::str::from_utf8(&self.mnemonic).unwrap_or("??")
    }
}

/// A decoded transmit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxStatus {
    pub frame_id: u8,
    pub status: u8,
}

/// Parser for response frames
pub struct FrameParser;

impl FrameParser {
    /// Create a new frame parser
    pub fn new() -> Self {
        Self
    }

    /// Parse an AT response frame
    ///
    /// Returns `None` if the frame is not an AT response or is too short to
    /// carry the response header.
    pub fn at_response<'a>(&self, frame: &'a ApiFrame) -> Option<AtResponse<'a>> {
        if frame.kind() != Some(FrameType::AtResponse) || frame.data.len() < AT_RESPONSE_HEADER {
            return None;
        }

        Some(AtResponse {
            frame_id: frame.data[0],
            mnemonic: [frame.data[1], frame.data[2]],
            status: AtStatus::from_byte(frame.data[3]),
            data: &frame.data[AT_RESPONSE_HEADER..],
        })
    }

    /// Parse a transmit status frame: `[frame_id][status]`
    pub fn tx_status(&self, frame: &ApiFrame) -> Option<TxStatus> {
        if frame.kind() != Some(FrameType::TxStatus) || frame.data.len() < 2 {
            return None;
        }

        Some(TxStatus {
            frame_id: frame.data[0],
            status: frame.data[1],
        })
    }

    /// Parse a modem status frame: `[status]`
    pub fn modem_status(&self, frame: &ApiFrame) -> Option<ModemStatus> {
        if frame.kind() != Some(FrameType::ModemStatus) {
            return None;
        }

        frame.data.first().map(|&byte| ModemStatus::from_byte(byte))
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}
