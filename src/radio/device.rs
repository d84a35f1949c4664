//! Shared driver core
//!
//! Owns the transport, the frame-id counter and the lifecycle state, and
//! runs the AT command correlator. Variants build on top of it and supply a
//! [`FrameHandler`] for the frames only they understand.

use crate::commands::parser::FrameParser;
use crate::commands::serialiser::FrameSerialiser;
use crate::commands::types::{AtCommand, ModemStatus};
use crate::config::RadioConfig;
use crate::dispatcher::{FrameDispatcher, FrameHandler};
use crate::protocol::decoder::{read_frame, DecodeError, ReadTimeouts};
use crate::protocol::framing::ApiFrame;
use crate::radio::traits::{CommandError, RadioState};
use crate::transport::{Transport, TransportError};

/// Driver counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RadioStats {
    /// Frames that passed checksum verification
    pub frames_received: u32,
    /// Frames of a type nothing handles
    pub unknown_frames: u32,
    /// Frames of a known type too short to interpret
    pub malformed_frames: u32,
    /// Decode attempts that failed for any reason other than an idle line
    pub decode_errors: u32,
    /// Receive buffer flushes after garbled input
    pub resync_flushes: u32,
    pub last_modem_status: Option<ModemStatus>,
}

/// Transport, frame ids, state and correlator shared by every variant
pub struct XBeeCore<T: Transport> {
    transport: T,
    config: RadioConfig,
    serialiser: FrameSerialiser,
    parser: FrameParser,
    dispatcher: FrameDispatcher,
    frame_id: u8,
    state: RadioState,
    frames_received: u32,
    decode_errors: u32,
    resync_flushes: u32,
}

impl<T: Transport> XBeeCore<T> {
    pub fn new(transport: T, config: RadioConfig) -> Self {
        Self {
            transport,
            config,
            serialiser: FrameSerialiser::new(),
            parser: FrameParser::new(),
            dispatcher: FrameDispatcher::new(),
            frame_id: 1,
            state: RadioState::Uninitialized,
            frames_received: 0,
            decode_errors: 0,
            resync_flushes: 0,
        }
    }

    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    pub fn serialiser(&self) -> &FrameSerialiser {
        &self.serialiser
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn state(&self) -> RadioState {
        self.state
    }

    pub fn set_state(&mut self, state: RadioState) {
        if state != self.state {
            log::debug!("Radio state {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    pub fn stats(&self) -> RadioStats {
        let dispatch = self.dispatcher.stats();
        RadioStats {
            frames_received: self.frames_received,
            unknown_frames: dispatch.unknown_frames,
            malformed_frames: dispatch.malformed_frames,
            decode_errors: self.decode_errors,
            resync_flushes: self.resync_flushes,
            last_modem_status: dispatch.last_modem_status,
        }
    }

    /// Take the current frame id and advance the counter
    ///
    /// Wraps from 255 to 1; 0 is never handed out.
    pub fn next_frame_id(&mut self) -> u8 {
        let id = self.frame_id;
        self.frame_id = match self.frame_id.wrapping_add(1) {
            0 => 1,
            next => next,
        };
        id
    }

    /// Open the transport
    pub async fn open(&mut self, baud_rate: u32, device: Option<&str>) -> Result<(), TransportError> {
        match self.transport.open(baud_rate, device).await {
            Ok(()) => {
                log::info!("Transport open at {} baud", baud_rate);
                self.set_state(RadioState::Initialized);
                Ok(())
            }
            Err(e) => {
                log::warn!("Transport open failed: {}", e);
                Err(e)
            }
        }
    }

    /// Write an encoded frame
    pub async fn send_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        log::trace!("TX frame: {:02X?}", frame);
        self.transport.write(frame).await
    }

    /// One decode attempt
    ///
    /// Garbled input flushes the receive buffer so the next attempt
    /// resynchronises on a fresh delimiter.
    async fn receive(&mut self, delimiter_ms: u32) -> Result<ApiFrame, DecodeError> {
        let timeouts = ReadTimeouts {
            delimiter_ms,
            body_ms: self.config.read_timeout_ms,
        };

        match read_frame(&mut self.transport, timeouts).await {
            Ok(frame) => {
                self.frames_received = self.frames_received.wrapping_add(1);
                Ok(frame)
            }
            Err(e) if e.is_idle() => Err(e),
            Err(e) => {
                self.decode_errors = self.decode_errors.wrapping_add(1);
                if e.needs_resync() {
                    log::warn!("Frame decode failed: {}; flushing receive buffer", e);
                    self.transport.flush_rx().await;
                    self.resync_flushes = self.resync_flushes.wrapping_add(1);
                } else {
                    log::warn!("Frame receive failed: {}", e);
                }
                Err(e)
            }
        }
    }

    /// Decode at most one frame and dispatch it
    ///
    /// An idle line is not an error.
    pub async fn process<H: FrameHandler + ?Sized>(&mut self, handler: &mut H) -> Result<(), DecodeError> {
        match self.receive(self.config.idle_poll_ms).await {
            Ok(frame) => {
                self.dispatcher.dispatch(&frame, handler);
                Ok(())
            }
            Err(e) if e.is_idle() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Send an AT command and wait for its response
    ///
    /// Any AT response frame completes the wait; other frames arriving in
    /// the meantime are dispatched to `handler`. Response data is copied
    /// into `response` and its length returned.
    pub async fn send_at_command<H: FrameHandler + ?Sized>(
        &mut self,
        command: AtCommand,
        parameter: &[u8],
        response: &mut [u8],
        timeout_ms: u32,
        handler: &mut H,
    ) -> Result<usize, CommandError> {
        let frame_id = self.frame_id;
        let frame = self.serialiser.at_command(frame_id, command, parameter)?;
        self.send_frame(&frame).await?;
        self.next_frame_id();

        log::debug!("AT {} sent (frame id {})", command.as_str(), frame_id);

        let start = self.transport.now_millis();
        loop {
            let elapsed = self.transport.now_millis().wrapping_sub(start);
            if elapsed >= timeout_ms {
                log::warn!("AT {} timed out after {} ms", command.as_str(), elapsed);
                return Err(CommandError::ResponseTimeout);
            }
            let wait = self.config.idle_poll_ms.min(timeout_ms - elapsed);

            let frame = match self.receive(wait).await {
                Ok(frame) => frame,
                Err(e) if e.is_idle() => continue,
                Err(_) => {
                    self.transport.delay(1).await;
                    continue;
                }
            };

            let Some(reply) = self.parser.at_response(&frame) else {
                self.dispatcher.dispatch(&frame, handler);
                continue;
            };

            if reply.frame_id != frame_id {
                log::debug!(
                    "AT {} answered by frame id {} (sent {})",
                    reply.mnemonic_str(),
                    reply.frame_id,
                    frame_id
                );
            }

            if !reply.status.is_ok() {
                log::warn!(
                    "AT {} failed with status 0x{:02X}",
                    command.as_str(),
                    reply.status.as_byte()
                );
                return Err(CommandError::CommandFailed(reply.status));
            }

            let len = reply.data.len();
            if len > response.len() {
                return Err(CommandError::ResponseTooLarge {
                    len,
                    capacity: response.len(),
                });
            }
            response[..len].copy_from_slice(reply.data);
            return Ok(len);
        }
    }
}
