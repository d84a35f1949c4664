//! API frame encoding
//!
//! # Wire Format
//!
//! ```text
//! [0x7E][len_hi][len_lo][frame_type][payload...][checksum]
//! ```
//!
//! - `len`: big-endian count of bytes from `frame_type` through the end of
//!   the payload (delimiter, length and checksum excluded)
//! - `checksum`: `0xFF - (frame_type + sum(payload))`, truncated to 8 bits,
//!   so that `checksum + frame_type + sum(payload) == 0xFF (mod 256)`

use core::fmt;

use crate::config::protocol::{CHECKSUM_TARGET, MAX_FRAME_DATA, MAX_WIRE_FRAME, START_DELIMITER};
use heapless::Vec;

/// API frame type identifiers
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    /// AT command request (0x08)
    AtCommand = 0x08,
    /// Generic transmit request (0x10)
    TxRequest = 0x10,
    /// LoRaWAN join request (0x14)
    LrJoinRequest = 0x14,
    /// LoRaWAN transmit request (0x50)
    LrTxRequest = 0x50,
    /// AT command response (0x88)
    AtResponse = 0x88,
    /// Transmit status (0x89)
    TxStatus = 0x89,
    /// Modem status (0x8A)
    ModemStatus = 0x8A,
    /// Generic receive packet (0x90)
    RxPacket = 0x90,
    /// LoRaWAN receive packet (0xD0)
    LrRxPacket = 0xD0,
    /// LoRaWAN receive packet with link metadata (0xD1)
    LrExplicitRxPacket = 0xD1,
}

impl FrameType {
    /// Every frame type the driver builds or understands
    pub const ALL: [FrameType; 10] = [
        Self::AtCommand,
        Self::TxRequest,
        Self::LrJoinRequest,
        Self::LrTxRequest,
        Self::AtResponse,
        Self::TxStatus,
        Self::ModemStatus,
        Self::RxPacket,
        Self::LrRxPacket,
        Self::LrExplicitRxPacket,
    ];

    /// Try to convert a byte to a FrameType
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x08 => Some(Self::AtCommand),
            0x10 => Some(Self::TxRequest),
            0x14 => Some(Self::LrJoinRequest),
            0x50 => Some(Self::LrTxRequest),
            0x88 => Some(Self::AtResponse),
            0x89 => Some(Self::TxStatus),
            0x8A => Some(Self::ModemStatus),
            0x90 => Some(Self::RxPacket),
            0xD0 => Some(Self::LrRxPacket),
            0xD1 => Some(Self::LrExplicitRxPacket),
            _ => None,
        }
    }
}

/// Errors raised before any bytes are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// Frame type plus payload exceeds [`MAX_FRAME_DATA`]
    FrameTooLarge { len: usize },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::FrameTooLarge { len } => write!(
                f,
                "frame data of {} bytes exceeds maximum of {}",
                len, MAX_FRAME_DATA
            ),
        }
    }
}

/// A validated API frame
///
/// `data` holds the payload only; the frame type byte is kept in
/// `frame_type`. `length` is the on-wire length field and always equals
/// `data.len() + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFrame {
    pub frame_type: u8,
    pub length: u16,
    pub checksum: u8,
    pub data: Vec<u8, MAX_FRAME_DATA>,
}

impl ApiFrame {
    /// Build a frame from a type and payload
    pub fn new(frame_type: u8, payload: &[u8]) -> Result<Self, EncodeError> {
        let len = payload.len() + 1;
        if len > MAX_FRAME_DATA {
            return Err(EncodeError::FrameTooLarge { len });
        }

        let mut data = Vec::new();
        data.extend_from_slice(payload)
            .map_err(|_| EncodeError::FrameTooLarge { len })?;

        Ok(Self {
            frame_type,
            length: len as u16,
            checksum: checksum(frame_type, payload),
            data,
        })
    }

    /// The frame type, if it is one this crate knows
    pub fn kind(&self) -> Option<FrameType> {
        FrameType::from_byte(self.frame_type)
    }

    /// Encode this frame for the wire
    pub fn encode(&self) -> Vec<u8, MAX_WIRE_FRAME> {
        let mut out = Vec::new();
        // Capacity is guaranteed by construction: data.len() + 1 <= MAX_FRAME_DATA
        let _ = out.push(START_DELIMITER);
        let _ = out.extend_from_slice(&self.length.to_be_bytes());
        let _ = out.push(self.frame_type);
        let _ = out.extend_from_slice(&self.data);
        let _ = out.push(self.checksum);
        out
    }
}

/// Compute the checksum over a frame type and its payload
pub fn checksum(frame_type: u8, payload: &[u8]) -> u8 {
    let sum = payload
        .iter()
        .fold(frame_type, |acc, &byte| acc.wrapping_add(byte));
    CHECKSUM_TARGET.wrapping_sub(sum)
}

/// Check a received checksum against the frame data it covers
///
/// `frame_data` is the type byte followed by the payload.
pub fn verify_checksum(frame_data: &[u8], received: u8) -> Result<(), u8> {
    let total = frame_data
        .iter()
        .fold(received, |acc, &byte| acc.wrapping_add(byte));
    if total == CHECKSUM_TARGET {
        Ok(())
    } else {
        Err(total)
    }
}

/// Encode a frame type and payload into wire bytes
///
/// Rejects oversize payloads instead of truncating them.
pub fn encode_frame(frame_type: u8, payload: &[u8]) -> Result<Vec<u8, MAX_WIRE_FRAME>, EncodeError> {
    Ok(ApiFrame::new(frame_type, payload)?.encode())
}
