//! Error types for puloon-core
//!
//! Everything here is a framing error: bytes that do not fit the shape the
//! codec expects. These are programming or data errors and are never
//! retried.

/// Result type alias for puloon-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core framing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Frame is too short to be valid
    #[error("Frame too short: expected at least {expected} bytes, got {actual} bytes")]
    FrameTooShort {
        expected: usize,
        actual: usize,
    },

    /// Read returned a different number of bytes than the response layout declares
    #[error("Frame length mismatch: expected {expected} bytes, got {actual} bytes")]
    FrameLength {
        expected: usize,
        actual: usize,
    },

    /// First byte is neither EOT nor SOH
    #[error("Unknown frame marker: 0x{0:02X}")]
    UnknownMarker(u8),

    /// A command frame was found where a response was expected, or vice versa
    #[error("Unexpected frame kind: expected {expected}, got {actual}")]
    UnexpectedKind {
        expected: crate::frame::FrameKind,
        actual: crate::frame::FrameKind,
    },

    /// Frame failed marker or BCC validation
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Response opcode does not echo the command opcode
    #[error("Opcode mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    OpcodeMismatch {
        expected: u8,
        actual: u8,
    },

    /// Unknown opcode
    #[error("Unknown opcode: 0x{0:02X}")]
    UnknownOpcode(u8),

    /// Frame body does not have the length the response layout declares
    #[error("Body length mismatch: expected {expected} bytes, got {actual} bytes")]
    BodyLength {
        expected: usize,
        actual: usize,
    },

    /// Value does not fit in a byte once biased
    #[error("Value {value} out of range for bias 0x{bias:02X}")]
    BiasOverflow {
        value: u8,
        bias: u8,
    },

    /// Wire byte lies below its bias
    #[error("Byte 0x{byte:02X} below bias 0x{bias:02X}")]
    BiasUnderflow {
        byte: u8,
        bias: u8,
    },

    /// Hex digit outside 0x30..=0x3F
    #[error("Invalid hex digit byte: 0x{0:02X}")]
    InvalidHexDigit(u8),
}
