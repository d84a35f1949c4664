//! XBee LR (LoRaWAN) driver
//!
//! Implements [`Radio`] for the LoRaWAN module: join with status polling,
//! data transmission correlated with transmit status frames, receive packet
//! decoding, and the identity and key provisioning commands.

use crate::commands::parser::TxStatus;
use crate::commands::types::AtCommand;
use crate::config::lorawan::{EUI_HEX_LEN, EUI_LEN, KEY_HEX_LEN, KEY_LEN};
use crate::config::protocol::MAX_FRAME_DATA;
use crate::config::RadioConfig;
use crate::dispatcher::FrameHandler;
use crate::protocol::decoder::DecodeError;
use crate::protocol::framing::ApiFrame;
use crate::radio::device::{RadioStats, XBeeCore};
use crate::radio::packet::LrPacket;
use crate::radio::traits::{Callbacks, CommandError, DeliveryStatus, Radio, RadioState, SendError};
use crate::transport::{Transport, TransportError};

/// LR transmit request header: type, frame id, port, ack flag
const TX_REQUEST_OVERHEAD: usize = 4;

/// Delivery status latch and the last status seen
#[derive(Debug, Default)]
struct LinkState {
    /// Set only by the transmit status handler; cleared only by `send_data`
    status_pending: bool,
    last_status: u8,
    last_frame_id: u8,
}

/// Frame handler for the LR variant
struct LrHandler<'a, C: Callbacks> {
    link: &'a mut LinkState,
    callbacks: &'a mut C,
}

impl<C: Callbacks> FrameHandler for LrHandler<'_, C> {
    fn on_tx_status(&mut self, status: TxStatus) {
        log::debug!(
            "TX status: frame id {} status 0x{:02X}",
            status.frame_id,
            status.status
        );
        self.link.last_status = status.status;
        self.link.last_frame_id = status.frame_id;
        self.link.status_pending = true;

        let packet = LrPacket {
            frame_id: status.frame_id,
            status: status.status,
            ..LrPacket::default()
        };
        self.callbacks.on_send(&packet);
    }

    fn on_rx_packet(&mut self, frame: &ApiFrame) {
        match LrPacket::from_frame(frame) {
            Some(packet) => {
                log::debug!(
                    "RX packet: port {} ({} bytes) rssi {} snr {}",
                    packet.port,
                    packet.payload.len(),
                    packet.rssi,
                    packet.snr
                );
                self.callbacks.on_receive(&packet);
            }
            None => log::debug!(
                "Ignoring 0x{:02X} receive frame ({} bytes)",
                frame.frame_type,
                frame.data.len()
            ),
        }
    }
}

/// XBee LR modem
pub struct XBeeLr<T: Transport, C: Callbacks = ()> {
    core: XBeeCore<T>,
    callbacks: C,
    link: LinkState,
}

impl<T: Transport, C: Callbacks> XBeeLr<T, C> {
    /// Create a driver with the default timings
    pub fn new(transport: T, callbacks: C) -> Self {
        Self::with_config(transport, callbacks, RadioConfig::default())
    }

    /// Create a driver with explicit timings
    pub fn with_config(transport: T, callbacks: C, config: RadioConfig) -> Self {
        Self {
            core: XBeeCore::new(transport, config),
            callbacks,
            link: LinkState::default(),
        }
    }

    pub fn transport(&self) -> &T {
        self.core.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.core.transport_mut()
    }

    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    pub fn callbacks_mut(&mut self) -> &mut C {
        &mut self.callbacks
    }

    pub fn stats(&self) -> RadioStats {
        self.core.stats()
    }

    /// A transmit status has arrived and not yet been consumed by a send
    pub fn status_pending(&self) -> bool {
        self.link.status_pending
    }

    /// Delivery status of the most recent transmit status frame
    pub fn last_delivery_status(&self) -> DeliveryStatus {
        DeliveryStatus::from_byte(self.link.last_status)
    }

    /// Run an AT command with the configured command timeout
    async fn at_command(
        &mut self,
        command: AtCommand,
        parameter: &[u8],
        response: &mut [u8],
    ) -> Result<usize, CommandError> {
        let timeout_ms = self.core.config().command_timeout_ms;
        self.at_command_within(command, parameter, response, timeout_ms)
            .await
    }

    async fn at_command_within(
        &mut self,
        command: AtCommand,
        parameter: &[u8],
        response: &mut [u8],
        timeout_ms: u32,
    ) -> Result<usize, CommandError> {
        let mut handler = LrHandler {
            link: &mut self.link,
            callbacks: &mut self.callbacks,
        };
        self.core
            .send_at_command(command, parameter, response, timeout_ms, &mut handler)
            .await
    }

    /// Read the device EUI
    ///
    /// A short response is treated as a big-endian number and right-aligned.
    pub async fn get_dev_eui(&mut self) -> Result<[u8; EUI_LEN], CommandError> {
        let mut response = [0u8; EUI_LEN];
        let len = self.at_command(AtCommand::DevEui, &[], &mut response).await?;
        if len == 0 {
            return Err(CommandError::EmptyResponse);
        }

        let mut eui = [0u8; EUI_LEN];
        eui[EUI_LEN - len..].copy_from_slice(&response[..len]);
        Ok(eui)
    }

    /// Read the device EUI as 16 upper-case hex characters written to `out`
    pub async fn get_dev_eui_hex<'b>(&mut self, out: &'b mut [u8]) -> Result<&'b str, CommandError> {
        if out.len() < EUI_HEX_LEN {
            return Err(CommandError::BufferTooSmall {
                needed: EUI_HEX_LEN,
                provided: out.len(),
            });
        }

        let eui = self.get_dev_eui().await?;
        let out = &mut out[..EUI_HEX_LEN];
        hex::encode_to_slice(eui, out).map_err(|_| CommandError::BufferTooSmall {
            needed: EUI_HEX_LEN,
            provided: EUI_HEX_LEN,
        })?;
        out.make_ascii_uppercase();

        core::str::from_utf8(out).map_err(|_| CommandError::InvalidParameter)
    }

    /// Set the application EUI from 16 hex characters
    pub async fn set_app_eui(&mut self, app_eui: &str) -> Result<(), CommandError> {
        validate_hex::<EUI_LEN>(app_eui, EUI_HEX_LEN)?;
        self.at_command(AtCommand::AppEui, app_eui.as_bytes(), &mut []).await?;
        Ok(())
    }

    /// Set the application key from 32 hex characters
    pub async fn set_app_key(&mut self, app_key: &str) -> Result<(), CommandError> {
        validate_hex::<KEY_LEN>(app_key, KEY_HEX_LEN)?;
        self.at_command(AtCommand::AppKey, app_key.as_bytes(), &mut []).await?;
        Ok(())
    }

    /// Set the network key from 32 hex characters
    pub async fn set_nwk_key(&mut self, nwk_key: &str) -> Result<(), CommandError> {
        validate_hex::<KEY_LEN>(nwk_key, KEY_HEX_LEN)?;
        self.at_command(AtCommand::NwkKey, nwk_key.as_bytes(), &mut []).await?;
        Ok(())
    }

    /// Set the API options byte
    pub async fn set_api_options(&mut self, options: u8) -> Result<(), CommandError> {
        self.at_command(AtCommand::ApiOptions, &[options], &mut []).await?;
        Ok(())
    }

    /// Read the firmware version
    pub async fn firmware_version(&mut self) -> Result<u32, CommandError> {
        let mut response = [0u8; 4];
        let len = self
            .at_command(AtCommand::FirmwareVersion, &[], &mut response)
            .await?;

        Ok(response[..len]
            .iter()
            .fold(0u32, |acc, &byte| (acc << 8) | byte as u32))
    }

    /// Query JS, waiting at most `timeout_ms` for the answer
    async fn join_status(&mut self, timeout_ms: u32) -> bool {
        let mut response = [0u8; 1];
        match self
            .at_command_within(AtCommand::JoinStatus, &[], &mut response, timeout_ms)
            .await
        {
            Ok(len) => len == 1 && response[0] == 1,
            Err(e) => {
                log::debug!("Join status query failed: {}", e);
                false
            }
        }
    }

    /// One `process` pass with this variant's handlers
    async fn poll(&mut self) -> Result<(), DecodeError> {
        let mut handler = LrHandler {
            link: &mut self.link,
            callbacks: &mut self.callbacks,
        };
        self.core.process(&mut handler).await
    }
}

/// Check that `value` is exactly `hex_len` hex characters encoding `N` bytes
fn validate_hex<const N: usize>(value: &str, hex_len: usize) -> Result<(), CommandError> {
    if value.len() != hex_len {
        return Err(CommandError::InvalidParameter);
    }
    let mut bytes = [0u8; N];
    hex::decode_to_slice(value, &mut bytes).map_err(|_| CommandError::InvalidParameter)
}

impl<T: Transport, C: Callbacks> Radio for XBeeLr<T, C> {
    type Packet<'a> = LrPacket<'a>;

    async fn init(&mut self, baud_rate: u32, device: Option<&str>) -> Result<(), TransportError> {
        self.core.open(baud_rate, device).await
    }

    async fn connect(&mut self) -> bool {
        self.core.set_state(RadioState::Joining);

        let frame_id = self.core.next_frame_id();
        let sent = match self.core.serialiser().join_request(frame_id) {
            Ok(frame) => self.core.send_frame(&frame).await.map_err(CommandError::from),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = sent {
            log::warn!("Join request failed: {}", e);
            self.core.set_state(RadioState::Initialized);
            return false;
        }
        log::info!("Join request sent (frame id {})", frame_id);

        let timeout_ms = self.core.config().connect_timeout_ms;
        let interval_ms = self.core.config().connect_poll_interval_ms;
        let start = self.core.transport().now_millis();

        loop {
            let elapsed = self.core.transport().now_millis().wrapping_sub(start);
            if elapsed >= timeout_ms {
                log::warn!("Join timed out after {} ms", elapsed);
                self.core.set_state(RadioState::Initialized);
                return false;
            }

            // Every wait is clamped to what is left of the connect budget
            let remaining = timeout_ms - elapsed;
            let query_ms = self.core.config().command_timeout_ms.min(remaining);
            if self.join_status(query_ms).await {
                log::info!("Joined network");
                self.core.set_state(RadioState::Connected);
                self.callbacks.on_connect();
                return true;
            }

            let elapsed = self.core.transport().now_millis().wrapping_sub(start);
            if elapsed >= timeout_ms {
                continue;
            }
            let remaining = timeout_ms - elapsed;
            self.core
                .transport_mut()
                .delay(interval_ms.min(remaining))
                .await;
        }
    }

    async fn disconnect(&mut self) -> bool {
        let previous = self.core.state();
        if previous == RadioState::Uninitialized {
            return false;
        }
        self.core.set_state(RadioState::Initialized);
        if previous == RadioState::Connected {
            self.callbacks.on_disconnect();
        }
        true
    }

    async fn connected(&mut self) -> bool {
        let timeout_ms = self.core.config().command_timeout_ms;
        self.join_status(timeout_ms).await
    }

    async fn send_data<'a>(&mut self, packet: &mut Self::Packet<'a>) -> Result<DeliveryStatus, SendError> {
        let len = packet.payload.len() + TX_REQUEST_OVERHEAD;
        if len > MAX_FRAME_DATA {
            return Err(SendError::PayloadTooLarge { len });
        }

        self.link.status_pending = false;
        let frame_id = self.core.next_frame_id();
        packet.frame_id = frame_id;

        let frame = self
            .core
            .serialiser()
            .lr_tx_request(frame_id, packet.port, packet.ack, packet.payload)?;
        self.core.send_frame(&frame).await?;

        let timeout_ms = self.core.config().send_timeout_ms;
        let start = self.core.transport().now_millis();

        while !self.link.status_pending {
            let elapsed = self.core.transport().now_millis().wrapping_sub(start);
            if elapsed >= timeout_ms {
                log::warn!("No TX status for frame id {} after {} ms", frame_id, elapsed);
                return Err(SendError::Timeout);
            }

            if let Err(e) = self.poll().await {
                log::debug!("Receive error while awaiting TX status: {}", e);
                self.core.transport_mut().delay(1).await;
            }
        }

        self.link.status_pending = false;
        if self.link.last_frame_id != frame_id {
            log::debug!(
                "TX status for frame id {} (sent {})",
                self.link.last_frame_id,
                frame_id
            );
        }

        packet.status = self.link.last_status;
        Ok(DeliveryStatus::from_byte(self.link.last_status))
    }

    async fn process(&mut self) -> Result<(), DecodeError> {
        self.poll().await
    }

    async fn soft_reset(&mut self) -> Result<(), CommandError> {
        self.at_command(AtCommand::SoftwareReset, &[], &mut []).await?;
        let previous = self.core.state();
        if previous != RadioState::Uninitialized {
            self.core.set_state(RadioState::Initialized);
        }
        if previous == RadioState::Connected {
            self.callbacks.on_disconnect();
        }
        Ok(())
    }

    async fn write_config(&mut self) -> Result<(), CommandError> {
        self.at_command(AtCommand::Write, &[], &mut []).await?;
        Ok(())
    }

    async fn apply_changes(&mut self) -> Result<(), CommandError> {
        self.at_command(AtCommand::ApplyChanges, &[], &mut []).await?;
        Ok(())
    }

    fn state(&self) -> RadioState {
        self.core.state()
    }
}
