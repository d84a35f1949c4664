//! Host serial port transport for the modem.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use serialport::{SerialPort, SerialPortType};
use xbee_modem::{Transport, TransportError};

/// Find the first USB serial adapter.
pub fn find_usb_port() -> Result<String> {
    let ports = serialport::available_ports()?;
    ports
        .into_iter()
        .find(|info| matches!(info.port_type, SerialPortType::UsbPort(_)))
        .map(|info| info.port_name)
        .ok_or_else(|| anyhow::anyhow!("No USB serial port found - ensure the modem is connected"))
}

/// Resolve a port argument - returns the port path if not "auto", otherwise auto-detects.
pub fn resolve_port(port_arg: &str) -> Result<String> {
    if port_arg == "auto" {
        find_usb_port()
    } else {
        Ok(port_arg.to_string())
    }
}

/// Blocking serial port wrapped in the driver's transport interface.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    epoch: Instant,
}

impl SerialTransport {
    pub fn new() -> Self {
        Self {
            port: None,
            epoch: Instant::now(),
        }
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>, TransportError> {
        self.port.as_mut().ok_or(TransportError::InitFailed)
    }
}

impl Default for SerialTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SerialTransport {
    async fn open(&mut self, baud_rate: u32, device: Option<&str>) -> Result<(), TransportError> {
        let path = device.ok_or(TransportError::InitFailed)?;
        let port = serialport::new(path, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(|e| {
                log::error!("Failed to open {}: {}", path, e);
                TransportError::InitFailed
            })?;

        self.port = Some(port);
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, TransportError> {
        let port = self.port()?;
        port.set_timeout(Duration::from_millis(timeout_ms.max(1) as u64))
            .map_err(|_| TransportError::Unknown)?;

        match port.read(buf) {
            Ok(0) => Err(TransportError::Timeout),
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Err(TransportError::Timeout),
            Err(e) => {
                log::error!("Serial read failed: {}", e);
                Err(TransportError::Unknown)
            }
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let port = self.port()?;
        port.write_all(data).map_err(|_| TransportError::WriteFailed)?;
        port.flush().map_err(|_| TransportError::WriteFailed)
    }

    fn now_millis(&self) -> u32 {
        self.epoch.elapsed().as_millis() as u32
    }

    async fn flush_rx(&mut self) {
        if let Ok(port) = self.port() {
            let _ = port.clear(serialport::ClearBuffer::Input);
        }
    }

    async fn delay(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}
