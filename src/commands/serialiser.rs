//! Serialiser for outgoing API frames
//!
//! Builds the frame data for every request the host sends and wraps it in
//! the checksummed API envelope.

use crate::commands::types::AtCommand;
use crate::config::protocol::{MAX_AT_PARAMETER, MAX_FRAME_DATA, MAX_WIRE_FRAME};
use crate::protocol::framing::{encode_frame, EncodeError, FrameType};
use heapless::Vec;

/// Serialiser for request frames
pub struct FrameSerialiser;

impl FrameSerialiser {
    /// Create a new frame serialiser
    pub fn new() -> Self {
        Self
    }

    /// Serialise an AT command frame
    ///
    /// Frame data: `[frame_id][mnemonic 0][mnemonic 1][parameter...]`
    pub fn at_command(
        &self,
        frame_id: u8,
        command: AtCommand,
        parameter: &[u8],
    ) -> Result<Vec<u8, MAX_WIRE_FRAME>, EncodeError> {
        if parameter.len() > MAX_AT_PARAMETER {
            return Err(EncodeError::FrameTooLarge {
                len: parameter.len() + 4,
            });
        }

        let mut data: Vec<u8, MAX_FRAME_DATA> = Vec::new();
        let mnemonic = command.mnemonic();
        let _ = data.push(frame_id);
        let _ = data.extend_from_slice(&mnemonic);
        let _ = data.extend_from_slice(parameter);

        encode_frame(FrameType::AtCommand as u8, &data)
    }

    /// Serialise a LoRaWAN join request
    ///
    /// Frame data: `[frame_id]`
    pub fn join_request(&self, frame_id: u8) -> Result<Vec<u8, MAX_WIRE_FRAME>, EncodeError> {
        encode_frame(FrameType::LrJoinRequest as u8, &[frame_id])
    }

    /// Serialise a LoRaWAN transmit request
    ///
    /// Frame data: `[frame_id][port][ack][payload...]`
    pub fn lr_tx_request(
        &self,
        frame_id: u8,
        port: u8,
        ack: bool,
        payload: &[u8],
    ) -> Result<Vec<u8, MAX_WIRE_FRAME>, EncodeError> {
        // Header (3) + type byte (1)
        let len = payload.len() + 4;
        if len > MAX_FRAME_DATA {
            return Err(EncodeError::FrameTooLarge { len });
        }

        let mut data: Vec<u8, MAX_FRAME_DATA> = Vec::new();
        let _ = data.push(frame_id);
        let _ = data.push(port);
        let _ = data.push(ack as u8);
        let _ = data.extend_from_slice(payload);

        encode_frame(FrameType::LrTxRequest as u8, &data)
    }
}

impl Default for FrameSerialiser {
    fn default() -> Self {
        Self::new()
    }
}
