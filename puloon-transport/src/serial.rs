//! Serial port link
//!
//! The LCDM-4000 talks RS-232, 8 data bits, no parity, one stop bit,
//! no flow control.

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::{Instant, timeout_at};
use tokio_serial::{
    ClearBuffer, DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits,
};
use tracing::{debug, trace, warn};

use crate::{Link, error::*};

/// Default line speed of the dispenser
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default driver-level port timeout
pub const DEFAULT_PORT_TIMEOUT: Duration = Duration::from_millis(100);

/// Serial port link to a dispenser
pub struct SerialLink {
    path: String,
    baud_rate: u32,
    timeout: Duration,
    port: Option<SerialStream>,
}

impl SerialLink {
    /// Create a new serial link
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_PORT_TIMEOUT,
            port: None,
        }
    }

    /// Set line speed
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Get line speed
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Set the port timeout handed to the serial driver
    ///
    /// Protocol waits are bounded per read; this only limits how long the
    /// driver itself may block.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Link for SerialLink {
    async fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Err(Error::AlreadyOpen);
        }

        debug!("Opening {} at {} baud...", self.path, self.baud_rate);

        let port = tokio_serial::new(&self.path, self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.timeout)
            .open_native_async()?;

        // Stale bytes from a previous session would be taken for an ACK
        tokio_serial::SerialPort::clear(&port, ClearBuffer::All)?;

        debug!("Opened {}", self.path);

        self.port = Some(port);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            debug!("Closing {}...", self.path);
            let _ = port.flush().await;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotOpen)?;

        trace!("Writing {} bytes: {:02X?}", data.len(), data);

        port.write_all(data).await?;
        port.flush().await?;

        Ok(())
    }

    async fn read(&mut self, n: usize, timeout: Duration) -> Result<BytesMut> {
        let port = self.port.as_mut().ok_or(Error::NotOpen)?;

        let deadline = Instant::now() + timeout;
        let mut buf = vec![0u8; n];
        let mut filled = 0;

        while filled < n {
            match timeout_at(deadline, port.read(&mut buf[filled..])).await {
                Err(_) => {
                    trace!("Read timeout after {:?} ({}/{} bytes)", timeout, filled, n);
                    break;
                }
                Ok(Ok(0)) => {
                    warn!("Serial port {} returned end of stream", self.path);
                    return Err(Error::Closed);
                }
                Ok(Ok(count)) => filled += count,
                Ok(Err(e)) => {
                    warn!("Read error: {}", e);
                    return Err(Error::Io(e));
                }
            }
        }

        trace!("Read {} bytes: {:02X?}", filled, &buf[..filled]);

        Ok(BytesMut::from(&buf[..filled]))
    }

    async fn clear_input(&mut self) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotOpen)?;
        tokio_serial::SerialPort::clear(port, ClearBuffer::Input)?;
        Ok(())
    }

    fn name(&self) -> String {
        self.path.clone()
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        if self.is_open() {
            warn!("Serial link {} dropped while still open", self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serial_link_create() {
        let link = SerialLink::new("/dev/ttyUSB0");
        assert!(!link.is_open());
        assert_eq!(link.baud_rate(), DEFAULT_BAUD_RATE);
        assert_eq!(link.name(), "/dev/ttyUSB0");
    }

    #[tokio::test]
    async fn test_serial_link_missing_port() {
        let mut link = SerialLink::new("/dev/puloon-does-not-exist")
            .with_baud_rate(19200)
            .with_timeout(Duration::from_millis(50));

        let result = link.open().await;
        assert!(result.is_err());
        assert!(!link.is_open());
    }

    #[tokio::test]
    async fn test_io_requires_open() {
        let mut link = SerialLink::new("/dev/ttyUSB0");

        assert!(matches!(link.write(&[0x06]).await, Err(Error::NotOpen)));
        assert!(matches!(
            link.read(1, Duration::from_millis(10)).await,
            Err(Error::NotOpen)
        ));
    }
}
