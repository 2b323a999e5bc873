//! Protocol constants

use std::time::Duration;

/// Start of header, leading marker of every response frame
pub const SOH: u8 = 0x01;

/// Start of text
pub const STX: u8 = 0x02;

/// End of text, last byte before the BCC
pub const ETX: u8 = 0x03;

/// End of transmission.
///
/// Leading marker of every command frame, and the standalone byte the
/// dispenser sends after it has seen our ACK.
pub const EOT: u8 = 0x04;

/// Acknowledge
pub const ACK: u8 = 0x06;

/// Negative acknowledge
pub const NAK: u8 = 0x15;

/// Communications ID of the dispenser
pub const DEVICE_ID: u8 = 0x30;

/// Status byte reported when an operation finished without error
pub const NO_ERROR: u8 = 0x20;

/// Bytes every frame carries besides its body:
/// marker, ID, STX, opcode, ETX, BCC
pub const FRAME_OVERHEAD: usize = 6;

/// Attempts to get an ACK for a command before giving up
pub const MAX_ACK_ATTEMPTS: usize = 3;

/// Attempts to read a valid response once the command was acknowledged
pub const MAX_RESPONSE_ATTEMPTS: usize = 3;

/// Window for the ACK that follows a command
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_millis(550);

/// Window for the response; mechanical operations can take up to a minute
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(60);

/// Window for the EOT that follows our ACK
pub const DEFAULT_EOT_TIMEOUT: Duration = Duration::from_millis(550);

/// Time the dispenser needs to reinitialize after a software reset
pub const RESET_SETTLE_TIME: Duration = Duration::from_secs(2);

/// Number of cassette positions
pub const CASSETTE_COUNT: usize = 4;

/// Dispense command parameters
pub mod dispense {
    /// Filler for unused or reserved parameter bytes
    pub const FILLER: u8 = 0x20;

    /// TO1 value announcing that TO2 carries a timeout
    pub const TIMEOUT_MARKER: u8 = 0x1C;

    /// Number of reserved bytes trailing the dispense payload and response
    pub const RESERVED_LEN: usize = 9;
}
