//! Radio trait for abstraction and testability
//!
//! This trait defines the contract every modem variant implements, so an
//! application can drive join, send and receive without knowing which module
//! is fitted.

use core::fmt;
use core::future::Future;

use crate::commands::types::AtStatus;
use crate::protocol::decoder::DecodeError;
use crate::protocol::framing::EncodeError;
use crate::radio::packet::LrPacket;
use crate::transport::TransportError;

/// Driver lifecycle
///
/// `Uninitialized -> Initialized -> Joining -> Connected`, falling back to
/// `Initialized` on disconnect or a failed join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioState {
    Uninitialized,
    Initialized,
    Joining,
    Connected,
}

/// Delivery status byte from a transmit status frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Delivered (and acknowledged, if requested)
    Success,
    /// Acknowledgement requested but not received
    AckFailed,
    /// Module has not joined a network
    NotConnected,
    /// Any other status value
    Other(u8),
}

impl DeliveryStatus {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => DeliveryStatus::Success,
            0x01 => DeliveryStatus::AckFailed,
            0x22 => DeliveryStatus::NotConnected,
            other => DeliveryStatus::Other(other),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            DeliveryStatus::Success => 0x00,
            DeliveryStatus::AckFailed => 0x01,
            DeliveryStatus::NotConnected => 0x22,
            DeliveryStatus::Other(byte) => byte,
        }
    }

    pub fn is_success(self) -> bool {
        self == DeliveryStatus::Success
    }
}

/// Errors from an AT command exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Parameter does not fit in a frame
    Encode(EncodeError),
    /// Parameter is not valid for the command (bad hex, wrong length)
    InvalidParameter,
    /// Caller-supplied buffer cannot hold the result
    BufferTooSmall { needed: usize, provided: usize },
    /// Writing the command failed
    Transport(TransportError),
    /// The module answered with a non-OK status
    CommandFailed(AtStatus),
    /// No AT response arrived in time
    ResponseTimeout,
    /// Response data longer than the response buffer
    ResponseTooLarge { len: usize, capacity: usize },
    /// The module answered OK but a value was expected and none came back
    EmptyResponse,
}

impl From<EncodeError> for CommandError {
    fn from(e: EncodeError) -> Self {
        CommandError::Encode(e)
    }
}

impl From<TransportError> for CommandError {
    fn from(e: TransportError) -> Self {
        CommandError::Transport(e)
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Encode(e) => write!(f, "{}", e),
            CommandError::InvalidParameter => f.write_str("invalid command parameter"),
            CommandError::BufferTooSmall { needed, provided } => write!(
                f,
                "buffer too small ({} bytes, need {})",
                provided, needed
            ),
            CommandError::Transport(e) => write!(f, "{}", e),
            CommandError::CommandFailed(status) => {
                write!(f, "AT command failed with status 0x{:02X}", status.as_byte())
            }
            CommandError::ResponseTimeout => f.write_str("timed out waiting for AT response"),
            CommandError::ResponseTooLarge { len, capacity } => write!(
                f,
                "AT response of {} bytes exceeds buffer of {}",
                len, capacity
            ),
            CommandError::EmptyResponse => f.write_str("AT response carried no data"),
        }
    }
}

/// Errors from a data send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// Payload does not fit in a transmit request
    PayloadTooLarge { len: usize },
    /// Writing the request failed
    Transport(TransportError),
    /// No transmit status arrived in time
    Timeout,
}

impl From<EncodeError> for SendError {
    fn from(e: EncodeError) -> Self {
        match e {
            EncodeError::FrameTooLarge { len } => SendError::PayloadTooLarge { len },
        }
    }
}

impl From<TransportError> for SendError {
    fn from(e: TransportError) -> Self {
        SendError::Transport(e)
    }
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::PayloadTooLarge { len } => {
                write!(f, "transmit request of {} bytes is too large", len)
            }
            SendError::Transport(e) => write!(f, "{}", e),
            SendError::Timeout => f.write_str("timed out waiting for transmit status"),
        }
    }
}

/// Link and traffic notifications
///
/// Packet notifications are invoked synchronously from inside
/// [`Radio::process`] and [`Radio::send_data`]. The packet (and its payload)
/// is only valid for the duration of the call. `on_connect` fires when a join
/// succeeds; `on_disconnect` fires when the driver leaves the connected state
/// through [`Radio::disconnect`] or [`Radio::soft_reset`]. Unimplemented
/// notifications are no-ops.
pub trait Callbacks {
    /// A data packet arrived from the network
    fn on_receive(&mut self, _packet: &LrPacket<'_>) {}

    /// A transmit status arrived for an earlier send
    fn on_send(&mut self, _packet: &LrPacket<'_>) {}

    /// The network join completed
    fn on_connect(&mut self) {}

    /// The driver left the connected state
    fn on_disconnect(&mut self) {}
}

/// No callbacks registered
impl Callbacks for () {}

impl<C: Callbacks + ?Sized> Callbacks for &mut C {
    fn on_receive(&mut self, packet: &LrPacket<'_>) {
        (**self).on_receive(packet)
    }

    fn on_send(&mut self, packet: &LrPacket<'_>) {
        (**self).on_send(packet)
    }

    fn on_connect(&mut self) {
        (**self).on_connect()
    }

    fn on_disconnect(&mut self) {
        (**self).on_disconnect()
    }
}

/// Abstract modem interface
///
/// Every blocking operation is bounded by a timeout measured on the
/// transport clock; none of them can be cancelled mid-wait.
pub trait Radio {
    /// Packet type exchanged by this variant
    type Packet<'a>;

    /// Open the transport; moves to [`RadioState::Initialized`] on success
    fn init(
        &mut self,
        baud_rate: u32,
        device: Option<&str>,
    ) -> impl Future<Output = Result<(), TransportError>>;

    /// Join the network; moves to [`RadioState::Connected`] on success
    fn connect(&mut self) -> impl Future<Output = bool>;

    /// Leave the network; moves back to [`RadioState::Initialized`]
    fn disconnect(&mut self) -> impl Future<Output = bool>;

    /// Ask the module whether it is joined
    fn connected(&mut self) -> impl Future<Output = bool>;

    /// Transmit a packet and wait for its delivery status
    ///
    /// The packet's `frame_id` and `status` are filled in.
    fn send_data<'a>(
        &mut self,
        packet: &mut Self::Packet<'a>,
    ) -> impl Future<Output = Result<DeliveryStatus, SendError>>;

    /// One decode attempt, dispatching whatever arrived
    ///
    /// An idle line is `Ok(())`. Must be called continuously by the
    /// application.
    fn process(&mut self) -> impl Future<Output = Result<(), DecodeError>>;

    /// Restart the module firmware
    fn soft_reset(&mut self) -> impl Future<Output = Result<(), CommandError>>;

    /// Persist settings to non-volatile memory
    fn write_config(&mut self) -> impl Future<Output = Result<(), CommandError>>;

    /// Apply pending settings
    fn apply_changes(&mut self) -> impl Future<Output = Result<(), CommandError>>;

    /// Current lifecycle state
    fn state(&self) -> RadioState;
}
