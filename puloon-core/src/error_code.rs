//! Dispenser error codes
//!
//! The status byte of a response is `NO_ERROR + code`. Three synthetic codes
//! above the device range are produced locally when the handshake itself
//! fails.

use std::fmt;

use crate::constants::NO_ERROR;

/// Error code reported by the dispenser or synthesized by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub u8);

impl ErrorCode {
    /// No ACK after every command attempt
    pub const ACK_TIMEOUT: Self = Self(0xF1);

    /// No valid response after every response attempt
    pub const RESPONSE_TIMEOUT: Self = Self(0xF2);

    /// Anything not in the table
    pub const UNKNOWN: Self = Self(0xFF);

    /// Map a status byte from a response to its error code
    ///
    /// # Examples
    ///
    /// ```
    /// use puloon_core::ErrorCode;
    ///
    /// assert_eq!(ErrorCode::from_status_byte(0x25), ErrorCode(0x05));
    /// assert_eq!(ErrorCode::from_status_byte(0x10), ErrorCode::UNKNOWN);
    /// ```
    pub fn from_status_byte(status: u8) -> Self {
        status.checked_sub(NO_ERROR).map(Self).unwrap_or(Self::UNKNOWN)
    }

    /// Raw code
    pub fn code(self) -> u8 {
        self.0
    }

    /// Check if the code was produced locally rather than by the dispenser
    pub fn is_synthetic(self) -> bool {
        matches!(self, Self::ACK_TIMEOUT | Self::RESPONSE_TIMEOUT | Self::UNKNOWN)
    }

    /// Check if the code has an entry in the table
    pub fn is_documented(self) -> bool {
        self.lookup().is_some()
    }

    /// Human-readable message, falling back to the unknown-error message
    pub fn message(self) -> &'static str {
        self.lookup().unwrap_or("Unknown Error")
    }

    fn lookup(self) -> Option<&'static str> {
        let message = match self.0 {
            0x01 => "Bill Pick Up Error",
            0x02 => "Jam on the path between CHK Sensor and DVT Sensor",
            0x03 => "Jam on the path between DVT Sensor and EJT Sensor",
            0x04 => "Jam on the path between EJT Sensor and EXIT Sensor",
            0x05 => "A note Staying in EXIT Sensor",
            0x06 => "Ejecting the note suspected as rejected",
            0x07 => "Note count mis - match on eject sensor due to unexpected reason",
            0x08 => "The note which should be rejected is passed on eject sensor",
            0x09 => "The media length on eject sensor is too long due to slip or abnormal reason",
            0x0A => "The media length on exit sensor is too long due to slip or abnormal reason",
            0x0B => "Detecting notes on the path before start of pick-up",
            0x0C => "Dispensing too many notes for one transaction (Default limit: 100 notes including the rejected)",
            0x0D => "Rejecting too many notes for one transaction (Default limit: 10 notes)",
            0x0E => "Abnormal termination during purge operation",
            0x20 | 0x21 => "Detecting sensor trouble or abnormal material before start",
            0x22 => "Detecting trouble of solenoid operation before dispense",
            0x23 => "Detecting trouble in motor or slit sensor before dispense",
            0x24 => "Detecting no cassette requested to dispense bills",
            0x25 => "Detecting NEAREND status in the cassette requested to dispense (When NEAREND detection mode is turned on)",
            0x26 => "Detecting no reject tray before start or for operation",
            0x30 => "Recognizing abnormal command",
            0x31 => "Recognizing abnormal parameter on the command",
            0x32 => "Not to Operate VERIFY Command after Downloading and Reset",
            0x33 => "Program area writing Failure",
            0x34 => "Verify Failure",
            0x35 => "EEPROM Write Failure",
            0x36 => "Check Sum Error on Writing EEPROM",
            0x40 => "During dispensing from the 2nd, 3rd or Bottom Cassette, the banknote coming from the Top Cassette is detected",
            0x41 => "During dispensing from the 1st, 3rd or Bottom Cassette, the banknote coming from the 2nd Cassette is detected",
            0x42 => "During dispensing from the 1st, 2nd or Bottom Cassette, the banknote coming from the 3rd Cassette is detected",
            0x43 => "During dispensing from the 1st, 2nd or 3rd Cassette, the banknote coming from the 4th Cassette is detected",
            0xF1 => "ACK timed out",
            0xF2 => "Response timed out",
            0xFF => "Unknown Error",
            _ => return None,
        };
        Some(message)
    }
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> u8 {
        code.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X} - {}", self.0, self.message())
    }
}
