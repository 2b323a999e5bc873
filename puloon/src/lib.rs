//! # puloon
//!
//! Rust driver for Puloon LCDM-4000 banknote dispensers.
//!
//! ## Features
//!
//! - Typed commands and responses for the whole LCDM-4000 command set
//! - Async/await API using Tokio
//! - Bounded retries: a command is never resent once acknowledged
//! - Device errors carry the response frame that reported them
//!
//! ## Quick Start
//!
//! ```no_run
//! use puloon::Dispenser;
//!
//! #[tokio::main]
//! async fn main() -> puloon::Result<()> {
//!     let mut dispenser = Dispenser::serial("/dev/ttyUSB0");
//!     dispenser.open().await?;
//!
//!     match dispenser.status().await {
//!         Ok(status) => println!("{:?}", status),
//!         Err(e) => println!("{} ({})", e.code(), e.message()),
//!     }
//!
//!     dispenser.close().await?;
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod dispenser;
pub mod engine;
pub mod error;

// Re-exports
pub use dispenser::Dispenser;
pub use engine::{ProtocolEngine, Timeouts};
pub use error::{Error, Result};

// Re-export protocol and domain types
pub use puloon_core::{Command, ErrorCode, Frame, Opcode, Response};
pub use puloon_transport::{Link, SerialLink};
pub use puloon_types::{
    Cassette, CassetteCount, CassetteSlot, DispenseOrder, DispenseRequest, SensorFlags,
};
