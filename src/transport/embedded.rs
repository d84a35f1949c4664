//! Transport over an `embedded_io_async` UART with the Embassy time driver.
//!
//! The UART is configured by the HAL before it is handed over, so `open()`
//! only records the requested baud rate.

use embassy_time::{with_timeout, Duration, Instant, Timer};
use embedded_io_async::{Error as _, ErrorKind, Read, Write};

use crate::transport::traits::{Transport, TransportError};

/// Poll window used while draining the receive buffer
const FLUSH_POLL_MS: u64 = 2;

/// [`Transport`] for any async UART implementing `embedded_io_async`.
pub struct EmbassyTransport<U> {
    uart: U,
    baud_rate: Option<u32>,
}

impl<U> EmbassyTransport<U>
where
    U: Read + Write,
{
    /// Wrap an already configured UART
    pub fn new(uart: U) -> Self {
        Self {
            uart,
            baud_rate: None,
        }
    }

    /// Baud rate requested by the last `open()`
    pub fn baud_rate(&self) -> Option<u32> {
        self.baud_rate
    }

    /// Give the UART back
    pub fn release(self) -> U {
        self.uart
    }
}

fn map_error(kind: ErrorKind) -> TransportError {
    match kind {
        ErrorKind::TimedOut => TransportError::Timeout,
        ErrorKind::OutOfMemory => TransportError::Overrun,
        _ => TransportError::Unknown,
    }
}

impl<U> Transport for EmbassyTransport<U>
where
    U: Read + Write,
{
    async fn open(&mut self, baud_rate: u32, _device: Option<&str>) -> Result<(), TransportError> {
        self.baud_rate = Some(baud_rate);
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, TransportError> {
        let timeout = Duration::from_millis(timeout_ms as u64);
        match with_timeout(timeout, self.uart.read(buf)).await {
            Ok(Ok(0)) | Err(_) => Err(TransportError::Timeout),
            Ok(Ok(n)) => Ok(n),
            Ok(Err(e)) => Err(map_error(e.kind())),
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.uart
            .write_all(data)
            .await
            .map_err(|_| TransportError::WriteFailed)?;
        self.uart
            .flush()
            .await
            .map_err(|_| TransportError::WriteFailed)
    }

    fn now_millis(&self) -> u32 {
        Instant::now().as_millis() as u32
    }

    async fn flush_rx(&mut self) {
        let mut scratch = [0u8; 32];
        // Drain until the line goes quiet
        while let Ok(Ok(n)) =
            with_timeout(Duration::from_millis(FLUSH_POLL_MS), self.uart.read(&mut scratch)).await
        {
            if n == 0 {
                break;
            }
        }
    }

    async fn delay(&mut self, ms: u32) {
        Timer::after_millis(ms as u64).await;
    }
}
