#![cfg_attr(not(test), no_std)]

pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod protocol;
pub mod radio;
pub mod transport;

pub use config::RadioConfig;
pub use radio::{Callbacks, CommandError, DeliveryStatus, LrPacket, Radio, RadioState, SendError, XBeeLr};
pub use transport::{Transport, TransportError};
