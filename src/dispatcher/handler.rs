//! Frame dispatcher
//!
//! Routes decoded frames by type. AT responses and modem status frames are
//! reported here; transmit status and receive packets go to the radio
//! variant through [`FrameHandler`]. Unknown types are counted and dropped.

use crate::commands::parser::{AtResponse, FrameParser, TxStatus};
use crate::commands::types::ModemStatus;
use crate::protocol::framing::{ApiFrame, FrameType};

/// Variant hooks for frames the core does not interpret itself
///
/// Every hook defaults to a no-op, so a variant only implements the ones it
/// cares about.
pub trait FrameHandler {
    /// A transmit status arrived
    fn on_tx_status(&mut self, _status: TxStatus) {}

    /// A receive packet arrived (generic, LR or explicit LR)
    fn on_rx_packet(&mut self, _frame: &ApiFrame) {}
}

/// No handlers registered
impl FrameHandler for () {}

impl<H: FrameHandler + ?Sized> FrameHandler for &mut H {
    fn on_tx_status(&mut self, status: TxStatus) {
        (**self).on_tx_status(status)
    }

    fn on_rx_packet(&mut self, frame: &ApiFrame) {
        (**self).on_rx_packet(frame)
    }
}

/// What a dispatch did with a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// Unsolicited AT response, logged
    AtResponse,
    /// Modem status, logged
    ModemStatus(ModemStatus),
    /// Handed to the variant's transmit status hook
    TxStatus(TxStatus),
    /// Handed to the variant's receive hook
    RxPacket,
    /// Known type that is too short to interpret
    Malformed(u8),
    /// Frame type not routed anywhere
    Unknown(u8),
}

/// Counters kept by the dispatcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub frames_dispatched: u32,
    pub unknown_frames: u32,
    pub malformed_frames: u32,
    pub last_modem_status: Option<ModemStatus>,
}

/// Frame dispatcher
pub struct FrameDispatcher {
    parser: FrameParser,
    stats: DispatchStats,
}

impl FrameDispatcher {
    /// Create a new frame dispatcher
    pub fn new() -> Self {
        Self {
            parser: FrameParser::new(),
            stats: DispatchStats::default(),
        }
    }

    /// Dispatch counters
    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Route one frame
    pub fn dispatch<H: FrameHandler + ?Sized>(
        &mut self,
        frame: &ApiFrame,
        handler: &mut H,
    ) -> Dispatched {
        self.stats.frames_dispatched = self.stats.frames_dispatched.wrapping_add(1);

        let result = match frame.kind() {
            Some(FrameType::AtResponse) => match self.parser.at_response(frame) {
                Some(response) => {
                    self.handle_at_response(&response);
                    Dispatched::AtResponse
                }
                None => Dispatched::Malformed(frame.frame_type),
            },
            Some(FrameType::ModemStatus) => match self.parser.modem_status(frame) {
                Some(status) => {
                    log::debug!("Modem status: {:?}", status);
                    self.stats.last_modem_status = Some(status);
                    Dispatched::ModemStatus(status)
                }
                None => Dispatched::Malformed(frame.frame_type),
            },
            Some(FrameType::TxStatus) => match self.parser.tx_status(frame) {
                Some(status) => {
                    handler.on_tx_status(status);
                    Dispatched::TxStatus(status)
                }
                None => Dispatched::Malformed(frame.frame_type),
            },
            Some(FrameType::RxPacket)
            | Some(FrameType::LrRxPacket)
            | Some(FrameType::LrExplicitRxPacket) => {
                handler.on_rx_packet(frame);
                Dispatched::RxPacket
            }
            _ => {
                log::warn!("Received unknown frame type: 0x{:02X}", frame.frame_type);
                self.stats.unknown_frames = self.stats.unknown_frames.wrapping_add(1);
                Dispatched::Unknown(frame.frame_type)
            }
        };

        if let Dispatched::Malformed(frame_type) = result {
            log::warn!(
                "Dropping short 0x{:02X} frame ({} data bytes)",
                frame_type,
                frame.data.len()
            );
            self.stats.malformed_frames = self.stats.malformed_frames.wrapping_add(1);
        }

        result
    }

    /// Report an AT response nobody was waiting for
    fn handle_at_response(&self, response: &AtResponse<'_>) {
        log::debug!(
            "AT response: frame id {} command {} status {:?}",
            response.frame_id,
            response.mnemonic_str(),
            response.status
        );
        if response.data.is_empty() {
            log::debug!("  No additional data");
        } else {
            log::debug!("  Data: {:02X?}", response.data);
        }
    }
}

impl Default for FrameDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
