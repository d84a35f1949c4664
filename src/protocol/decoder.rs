//! API frame decoder
//!
//! Pulls exactly one frame off a [`Transport`]. Each read phase (delimiter,
//! length, body, checksum) has its own timeout and its own error variant, so
//! callers can tell an idle line from garbled data.

use core::fmt;

use crate::config::protocol::{MAX_FRAME_DATA, START_DELIMITER};
use crate::protocol::framing::{verify_checksum, ApiFrame};
use crate::transport::{Transport, TransportError};
use heapless::Vec;

/// Timeouts for one decode attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadTimeouts {
    /// Wait for the start delimiter
    pub delimiter_ms: u32,
    /// Wait for each later phase once a frame has started
    pub body_ms: u32,
}

impl ReadTimeouts {
    /// Use the same timeout for every phase
    pub const fn uniform(ms: u32) -> Self {
        Self {
            delimiter_ms: ms,
            body_ms: ms,
        }
    }
}

/// Why a decode attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Nothing arrived while waiting for the start delimiter
    DelimiterTimeout,
    /// First byte was not 0x7E
    InvalidDelimiter(u8),
    /// Length field incomplete
    LengthTimeout { received: usize },
    /// Advertised length exceeds the frame buffer
    Oversize(u16),
    /// Advertised length is zero (no frame type byte)
    EmptyFrame,
    /// Frame data incomplete
    DataTimeout { expected: u16, received: usize },
    /// Checksum byte never arrived
    ChecksumTimeout,
    /// `checksum + sum(frame data)` was not 0xFF
    ChecksumMismatch { total: u8 },
    /// Transport failure other than a timeout
    Transport(TransportError),
}

impl DecodeError {
    /// The line was simply quiet; poll again
    pub fn is_idle(&self) -> bool {
        matches!(self, DecodeError::DelimiterTimeout)
    }

    /// The receive buffer holds garbage and should be flushed before the
    /// next attempt resynchronises on a delimiter
    ///
    /// Transport failures leave the buffer alone: nothing was read that
    /// could be out of step.
    pub fn needs_resync(&self) -> bool {
        !matches!(self, DecodeError::DelimiterTimeout | DecodeError::Transport(_))
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::DelimiterTimeout => f.write_str("timed out waiting for start delimiter"),
            DecodeError::InvalidDelimiter(byte) => {
                write!(f, "invalid start delimiter 0x{:02X}", byte)
            }
            DecodeError::LengthTimeout { received } => {
                write!(f, "timed out reading length ({} of 2 bytes)", received)
            }
            DecodeError::Oversize(len) => write!(
                f,
                "frame length {} exceeds maximum of {}",
                len, MAX_FRAME_DATA
            ),
            DecodeError::EmptyFrame => f.write_str("frame length of zero"),
            DecodeError::DataTimeout { expected, received } => write!(
                f,
                "timed out reading frame data ({} of {} bytes)",
                received, expected
            ),
            DecodeError::ChecksumTimeout => f.write_str("timed out reading checksum"),
            DecodeError::ChecksumMismatch { total } => {
                write!(f, "checksum mismatch (sum 0x{:02X}, expected 0xFF)", total)
            }
            DecodeError::Transport(e) => write!(f, "{}", e),
        }
    }
}

/// Fill `buf` from the transport within `timeout_ms`.
///
/// Returns how many bytes arrived; fewer than `buf.len()` means the phase
/// timed out.
async fn read_phase<T: Transport>(
    transport: &mut T,
    buf: &mut [u8],
    timeout_ms: u32,
) -> Result<usize, TransportError> {
    let start = transport.now_millis();
    let mut filled = 0;

    while filled < buf.len() {
        let elapsed = transport.now_millis().wrapping_sub(start);
        if elapsed >= timeout_ms {
            break;
        }

        match transport.read(&mut buf[filled..], timeout_ms - elapsed).await {
            Ok(n) => filled += n,
            Err(TransportError::Timeout) => break,
            Err(e) => return Err(e),
        }
    }

    Ok(filled)
}

/// Read and validate one API frame
pub async fn read_frame<T: Transport>(
    transport: &mut T,
    timeouts: ReadTimeouts,
) -> Result<ApiFrame, DecodeError> {
    let mut delimiter = [0u8; 1];
    let n = read_phase(transport, &mut delimiter, timeouts.delimiter_ms)
        .await
        .map_err(DecodeError::Transport)?;
    if n == 0 {
        return Err(DecodeError::DelimiterTimeout);
    }
    if delimiter[0] != START_DELIMITER {
        return Err(DecodeError::InvalidDelimiter(delimiter[0]));
    }

    let mut length_bytes = [0u8; 2];
    let n = read_phase(transport, &mut length_bytes, timeouts.body_ms)
        .await
        .map_err(DecodeError::Transport)?;
    if n < length_bytes.len() {
        return Err(DecodeError::LengthTimeout { received: n });
    }

    let length = u16::from_be_bytes(length_bytes);
    if length as usize > MAX_FRAME_DATA {
        return Err(DecodeError::Oversize(length));
    }
    if length == 0 {
        return Err(DecodeError::EmptyFrame);
    }

    let mut body = [0u8; MAX_FRAME_DATA];
    let body = &mut body[..length as usize];
    let n = read_phase(transport, body, timeouts.body_ms)
        .await
        .map_err(DecodeError::Transport)?;
    if n < body.len() {
        return Err(DecodeError::DataTimeout {
            expected: length,
            received: n,
        });
    }

    let mut checksum = [0u8; 1];
    let n = read_phase(transport, &mut checksum, timeouts.body_ms)
        .await
        .map_err(DecodeError::Transport)?;
    if n == 0 {
        return Err(DecodeError::ChecksumTimeout);
    }

    verify_checksum(body, checksum[0]).map_err(|total| DecodeError::ChecksumMismatch { total })?;

    log::trace!("RX frame 0x{:02X}: {:02X?}", body[0], &body[1..]);

    let mut data = Vec::new();
    // body[1..] is at most MAX_FRAME_DATA - 1 bytes
    let _ = data.extend_from_slice(&body[1..]);

    Ok(ApiFrame {
        frame_type: body[0],
        length,
        checksum: checksum[0],
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::framing::{encode_frame, FrameType};
    use crate::transport::traits::mock::MockTransport;

    const TIMEOUTS: ReadTimeouts = ReadTimeouts::uniform(100);

    fn decode(port: &mut MockTransport) -> Result<ApiFrame, DecodeError> {
        futures::executor::block_on(read_frame(port, TIMEOUTS))
    }

    #[test]
    fn test_decode_join_request_bytes() {
        let mut port = MockTransport::new();
        port.queue_rx_data(&[0x7E, 0x00, 0x02, 0x14, 0x01, 0xEA]);

        let frame = decode(&mut port).expect("Should decode");
        assert_eq!(frame.frame_type, FrameType::LrJoinRequest as u8);
        assert_eq!(frame.length, 2);
        assert_eq!(frame.data.as_slice(), &[0x01]);
        assert_eq!(frame.checksum, 0xEA);
    }

    #[test]
    fn test_decode_matches_encoder() {
        let largest = [0xA5u8; MAX_FRAME_DATA - 1];
        let payloads: [&[u8]; 4] = [&[], &[0x00, 0x7E, 0xFF], &[0x55; 200], &largest];

        for kind in FrameType::ALL {
            for payload in payloads {
                let mut port = MockTransport::new();
                port.queue_rx_data(&encode_frame(kind as u8, payload).unwrap());

                let frame = decode(&mut port).expect("Should decode");
                assert_eq!(frame, ApiFrame::new(kind as u8, payload).unwrap());
                assert_eq!(frame.kind(), Some(kind));
                assert_eq!(frame.length as usize, payload.len() + 1);
            }
        }
    }

    #[test]
    fn test_single_bit_flip_fails_checksum() {
        let encoded = encode_frame(0x88, &[0x01, b'J', b'S', 0x00, 0x01]).unwrap();

        // Every bit of the type byte and payload, never the checksum
        for index in 3..encoded.len() - 1 {
            for bit in 0..8 {
                let mut corrupted = encoded.clone();
                corrupted[index] ^= 1 << bit;

                let mut port = MockTransport::new();
                port.queue_rx_data(&corrupted);

                match decode(&mut port) {
                    Err(DecodeError::ChecksumMismatch { .. }) => {}
                    other => panic!("byte {} bit {}: expected checksum error, got {:?}", index, bit, other),
                }
            }
        }
    }

    #[test]
    fn test_oversize_consumes_only_header() {
        let mut port = MockTransport::new();
        port.queue_rx_data(&[0x7E, 0x01, 0x01]);
        port.queue_rx_data(&[0xAA; 8]);

        assert_eq!(decode(&mut port), Err(DecodeError::Oversize(0x0101)));
        assert_eq!(port.rx_pending(), 8);
    }

    #[test]
    fn test_idle_line() {
        let mut port = MockTransport::new();

        let result = decode(&mut port);
        assert_eq!(result, Err(DecodeError::DelimiterTimeout));
        assert!(result.unwrap_err().is_idle());
        assert_eq!(port.now_millis(), 100);
    }

    #[test]
    fn test_invalid_delimiter() {
        let mut port = MockTransport::new();
        port.queue_rx_data(&[0x55, 0x7E]);

        let result = decode(&mut port);
        assert_eq!(result, Err(DecodeError::InvalidDelimiter(0x55)));
        assert!(result.unwrap_err().needs_resync());
    }

    #[test]
    fn test_truncated_length() {
        let mut port = MockTransport::new();
        port.queue_rx_data(&[0x7E, 0x00]);

        assert_eq!(
            decode(&mut port),
            Err(DecodeError::LengthTimeout { received: 1 })
        );
    }

    #[test]
    fn test_truncated_data_is_not_a_partial_frame() {
        let mut port = MockTransport::new();
        port.queue_rx_data(&[0x7E, 0x00, 0x05, 0x88, 0x01]);

        assert_eq!(
            decode(&mut port),
            Err(DecodeError::DataTimeout {
                expected: 5,
                received: 2
            })
        );
    }

    #[test]
    fn test_missing_checksum() {
        let mut port = MockTransport::new();
        port.queue_rx_data(&[0x7E, 0x00, 0x02, 0x14, 0x01]);

        assert_eq!(decode(&mut port), Err(DecodeError::ChecksumTimeout));
    }

    #[test]
    fn test_zero_length() {
        let mut port = MockTransport::new();
        port.queue_rx_data(&[0x7E, 0x00, 0x00, 0xFF]);

        assert_eq!(decode(&mut port), Err(DecodeError::EmptyFrame));
    }

    #[test]
    fn test_transport_error_propagates() {
        let mut port = MockTransport::new();
        port.set_next_read_error(TransportError::Overrun);

        let result = decode(&mut port);
        assert_eq!(result, Err(DecodeError::Transport(TransportError::Overrun)));
        assert!(!result.unwrap_err().needs_resync());
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut port = MockTransport::new();
        port.queue_rx_data(&encode_frame(0x8A, &[0x02]).unwrap());
        port.queue_rx_data(&encode_frame(0x89, &[0x07, 0x00]).unwrap());

        assert_eq!(decode(&mut port).unwrap().frame_type, 0x8A);
        let second = decode(&mut port).unwrap();
        assert_eq!(second.frame_type, 0x89);
        assert_eq!(second.data.as_slice(), &[0x07, 0x00]);
    }
}
