//! Protocol constants and runtime timing configuration for XBee LR modems

/// API frame constants
pub mod protocol {
    /// Start delimiter of every API frame
    pub const START_DELIMITER: u8 = 0x7E;

    /// Maximum frame data size (frame type byte + payload)
    pub const MAX_FRAME_DATA: usize = 256;

    /// Maximum size of an encoded frame on the wire
    /// (delimiter + 2 length bytes + frame data + checksum)
    pub const MAX_WIRE_FRAME: usize = MAX_FRAME_DATA + 4;

    /// Maximum AT command parameter length
    pub const MAX_AT_PARAMETER: usize = 128;

    /// Checksum target: checksum + sum(frame data) == 0xFF
    pub const CHECKSUM_TARGET: u8 = 0xFF;
}

/// Default timings in milliseconds
pub mod timing {
    /// Per-phase UART read timeout while inside a frame
    pub const READ_TIMEOUT_MS: u32 = 1000;

    /// How long `process()` waits for a start delimiter before returning
    pub const IDLE_POLL_MS: u32 = 100;

    /// Default wait for an AT command response
    pub const AT_COMMAND_TIMEOUT_MS: u32 = 5000;

    /// Overall join timeout
    pub const CONNECT_TIMEOUT_MS: u32 = 60_000;

    /// Delay between join status checks
    pub const CONNECT_POLL_INTERVAL_MS: u32 = 500;

    /// Wait for a TX status after a send
    pub const SEND_TIMEOUT_MS: u32 = 5000;
}

/// LoRaWAN provisioning value sizes
pub mod lorawan {
    /// EUI size in bytes
    pub const EUI_LEN: usize = 8;
    /// EUI rendered as hex characters
    pub const EUI_HEX_LEN: usize = EUI_LEN * 2;
    /// AppKey / NwkKey size in bytes
    pub const KEY_LEN: usize = 16;
    /// Key rendered as hex characters
    pub const KEY_HEX_LEN: usize = KEY_LEN * 2;
}

/// Runtime timing configuration for a radio instance.
///
/// Every blocking operation is bounded by one of these values, measured
/// against the transport clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioConfig {
    /// Per-phase read timeout once a start delimiter has been seen
    pub read_timeout_ms: u32,
    /// Start delimiter wait used by `process()`
    pub idle_poll_ms: u32,
    /// AT command response timeout
    pub command_timeout_ms: u32,
    /// Overall join timeout used by `connect()`
    pub connect_timeout_ms: u32,
    /// Interval between join status checks
    pub connect_poll_interval_ms: u32,
    /// TX status wait used by `send_data()`
    pub send_timeout_ms: u32,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: timing::READ_TIMEOUT_MS,
            idle_poll_ms: timing::IDLE_POLL_MS,
            command_timeout_ms: timing::AT_COMMAND_TIMEOUT_MS,
            connect_timeout_ms: timing::CONNECT_TIMEOUT_MS,
            connect_poll_interval_ms: timing::CONNECT_POLL_INTERVAL_MS,
            send_timeout_ms: timing::SEND_TIMEOUT_MS,
        }
    }
}
