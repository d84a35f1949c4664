//! Transport trait for abstraction and testability
//!
//! This trait defines the byte-level link to the modem (normally a UART),
//! allowing the real platform driver to be swapped with a mock for testing.

use core::fmt;
use core::future::Future;

/// Errors that can occur during transport operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Port could not be opened or configured
    InitFailed,
    /// No data arrived before the timeout elapsed
    Timeout,
    /// Receive buffer overrun
    Overrun,
    /// Write did not complete
    WriteFailed,
    /// Any other hardware or driver failure
    Unknown,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::InitFailed => f.write_str("transport init failed"),
            TransportError::Timeout => f.write_str("transport read timed out"),
            TransportError::Overrun => f.write_str("transport receive overrun"),
            TransportError::WriteFailed => f.write_str("transport write failed"),
            TransportError::Unknown => f.write_str("transport error"),
        }
    }
}

/// Abstract byte-stream link to the modem
///
/// Implemented once per platform (UART driver, host serial port) and by the
/// mock used in unit tests. All waits are bounded: nothing here may block
/// longer than the timeout it is given.
pub trait Transport {
    /// Open and configure the link.
    ///
    /// `device` names the port on hosts that have one (e.g. `/dev/ttyUSB0`).
    fn open(
        &mut self,
        baud_rate: u32,
        device: Option<&str>,
    ) -> impl Future<Output = Result<(), TransportError>>;

    /// Read up to `buf.len()` bytes, waiting at most `timeout_ms`.
    ///
    /// Returns the number of bytes read, which may be fewer than requested.
    /// Returns [`TransportError::Timeout`] if nothing arrived in time.
    fn read(
        &mut self,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> impl Future<Output = Result<usize, TransportError>>;

    /// Write all bytes
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<(), TransportError>>;

    /// Milliseconds since an arbitrary epoch. Wraps at `u32::MAX`.
    fn now_millis(&self) -> u32;

    /// Discard any bytes waiting in the receive buffer
    fn flush_rx(&mut self) -> impl Future<Output = ()>;

    /// Wait for `ms` milliseconds
    fn delay(&mut self, ms: u32) -> impl Future<Output = ()>;
}

/// A borrowed transport is a transport; lets a radio run over a link it does
/// not own.
impl<T: Transport> Transport for &mut T {
    fn open(
        &mut self,
        baud_rate: u32,
        device: Option<&str>,
    ) -> impl Future<Output = Result<(), TransportError>> {
        (**self).open(baud_rate, device)
    }

    fn read(
        &mut self,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> impl Future<Output = Result<usize, TransportError>> {
        (**self).read(buf, timeout_ms)
    }

    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<(), TransportError>> {
        (**self).write(data)
    }

    fn now_millis(&self) -> u32 {
        (**self).now_millis()
    }

    fn flush_rx(&mut self) -> impl Future<Output = ()> {
        (**self).flush_rx()
    }

    fn delay(&mut self, ms: u32) -> impl Future<Output = ()> {
        (**self).delay(ms)
    }
}
