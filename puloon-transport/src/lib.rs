//! Transport layer for the LCDM-4000 protocol
//!
//! Provides the byte link the protocol engine drives, and a serial port
//! implementation of it.

pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod scripted;
pub mod serial;

pub use error::{Error, Result};
#[cfg(any(test, feature = "test-util"))]
pub use scripted::ScriptedLink;
pub use serial::SerialLink;

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;

/// Half-duplex byte link to a dispenser
///
/// A link is owned by exactly one engine; the protocol alternates turns
/// with the device and does not tolerate interleaved use.
#[async_trait]
pub trait Link: Send {
    /// Open the link
    async fn open(&mut self) -> Result<()>;

    /// Close the link
    async fn close(&mut self) -> Result<()>;

    /// Check if open
    fn is_open(&self) -> bool;

    /// Write all bytes
    async fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read up to `n` bytes, waiting at most `timeout`
    ///
    /// A timeout is not an error: whatever arrived before the deadline is
    /// returned, possibly nothing.
    async fn read(&mut self, n: usize, timeout: Duration) -> Result<BytesMut>;

    /// Discard any bytes waiting to be read
    async fn clear_input(&mut self) -> Result<()>;

    /// Human-readable name of the link (port path)
    fn name(&self) -> String;
}
