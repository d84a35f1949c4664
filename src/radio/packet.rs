//! LoRaWAN data packet
//!
//! # LR Receive Packet (0xD0)
//!
//! ```text
//! [port: u8][payload...]
//! ```
//!
//! # LR Explicit Receive Packet (0xD1)
//!
//! ```text
//! [port: u8][rssi: i8][snr: i8][data_rate: u8][counter: u32 BE][payload...]
//! ```

use crate::protocol::framing::{ApiFrame, FrameType};

/// Header length of an explicit receive packet
const EXPLICIT_HEADER: usize = 8;

/// A packet sent to or received from the network
///
/// `frame_id` and `status` are filled in on send. `rssi`, `snr`,
/// `data_rate` and `counter` are only set for explicit receive frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LrPacket<'a> {
    pub port: u8,
    pub payload: &'a [u8],
    pub ack: bool,
    pub frame_id: u8,
    pub status: u8,
    pub rssi: i8,
    pub snr: i8,
    pub data_rate: u8,
    /// Downlink frame counter
    pub counter: u32,
}

impl<'a> LrPacket<'a> {
    /// A packet for `port` carrying `payload`, no acknowledgement requested
    pub fn new(port: u8, payload: &'a [u8]) -> Self {
        Self {
            port,
            payload,
            ..Self::default()
        }
    }

    /// Request (or not) a network acknowledgement
    pub fn with_ack(mut self, ack: bool) -> Self {
        self.ack = ack;
        self
    }

    /// Decode a receive frame, borrowing the payload from it
    ///
    /// Returns `None` for other frame types or frames too short for their
    /// header.
    pub fn from_frame(frame: &'a ApiFrame) -> Option<Self> {
        let data = frame.data.as_slice();

        match frame.kind()? {
            FrameType::LrRxPacket => {
                let (&port, payload) = data.split_first()?;
                Some(Self::new(port, payload))
            }
            FrameType::LrExplicitRxPacket => {
                if data.len() < EXPLICIT_HEADER {
                    return None;
                }
                Some(Self {
                    port: data[0],
                    payload: &data[EXPLICIT_HEADER..],
                    rssi: data[1] as i8,
                    snr: data[2] as i8,
                    data_rate: data[3],
                    counter: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
                    ..Self::default()
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_lr_rx_packet() {
        let frame = ApiFrame::new(0xD0, &[0x02, b'h', b'i']).unwrap();
        let packet = LrPacket::from_frame(&frame).expect("Should decode");

        assert_eq!(packet.port, 2);
        assert_eq!(packet.payload, b"hi");
        assert_eq!(packet.rssi, 0);
        assert_eq!(packet.counter, 0);
    }

    #[test]
    fn test_decode_explicit_rx_packet() {
        let frame = ApiFrame::new(
            0xD1,
            &[0x05, 0xB5, 0xF9, 0x03, 0x00, 0x00, 0x01, 0x2C, 0xDE, 0xAD],
        )
        .unwrap();
        let packet = LrPacket::from_frame(&frame).expect("Should decode");

        assert_eq!(packet.port, 5);
        assert_eq!(packet.rssi, -75);
        assert_eq!(packet.snr, -7);
        assert_eq!(packet.data_rate, 3);
        assert_eq!(packet.counter, 300);
        assert_eq!(packet.payload, &[0xDE, 0xAD]);
    }

    #[test]
    fn test_explicit_header_only() {
        let frame = ApiFrame::new(0xD1, &[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07]).unwrap();
        let packet = LrPacket::from_frame(&frame).expect("Should decode");
        assert!(packet.payload.is_empty());
        assert_eq!(packet.counter, 7);
    }

    #[test]
    fn test_short_frames_rejected() {
        let empty = ApiFrame::new(0xD0, &[]).unwrap();
        assert!(LrPacket::from_frame(&empty).is_none());

        let short = ApiFrame::new(0xD1, &[0x01, 0x00, 0x00]).unwrap();
        assert!(LrPacket::from_frame(&short).is_none());
    }

    #[test]
    fn test_other_types_rejected() {
        let frame = ApiFrame::new(0x90, &[0x01, 0x02]).unwrap();
        assert!(LrPacket::from_frame(&frame).is_none());
    }

    #[test]
    fn test_builder() {
        let packet = LrPacket::new(3, &[0x01]).with_ack(true);
        assert!(packet.ack);
        assert_eq!(packet.frame_id, 0);
    }
}
