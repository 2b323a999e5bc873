//! # puloon-core
//!
//! Core protocol implementation for Puloon LCDM-4000 banknote dispensers.
//!
//! This crate provides the low-level protocol primitives:
//! - Frame structure and encoding/decoding
//! - BCC calculation
//! - Biased numeric fields
//! - Opcode definitions and the typed command/response traits
//! - Device error code table

pub mod bias;
pub mod checksum;
pub mod constants;
pub mod error;
pub mod error_code;
pub mod frame;
pub mod message;
pub mod opcode;

pub use bias::Bias;
pub use error::{Error, Result};
pub use error_code::ErrorCode;
pub use frame::{Frame, FrameKind, decode_response, encode_command};
pub use message::{Command, Response};
pub use opcode::Opcode;

/// Protocol version information
pub const PROTOCOL_VERSION: &str = "LCDM-4000";
