//! Cassette positions and reports

use std::fmt;

use crate::error::{Error, Result};

/// Cassette pick position, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Cassette {
    Top = 1,
    Second = 2,
    Third = 3,
    Bottom = 4,
}

impl Cassette {
    /// All positions in pick order
    pub const ALL: [Cassette; 4] = [Self::Top, Self::Second, Self::Third, Self::Bottom];

    /// Position number, 1 for the top cassette
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Zero-based index into per-cassette arrays
    pub fn index(self) -> usize {
        self as usize - 1
    }
}

impl TryFrom<u8> for Cassette {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Top),
            2 => Ok(Self::Second),
            3 => Ok(Self::Third),
            4 => Ok(Self::Bottom),
            _ => Err(Error::Validation(format!(
                "cassette position must be 1..=4, got {}",
                value
            ))),
        }
    }
}

impl fmt::Display for Cassette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Top => "top",
            Self::Second => "second",
            Self::Third => "third",
            Self::Bottom => "bottom",
        };
        f.write_str(name)
    }
}

/// Cassette type as reported in status and dispense responses
///
/// The device reports `0` for an empty slot and the slot number when a
/// cassette is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CassetteSlot {
    Removed,
    Present(Cassette),
}

impl CassetteSlot {
    /// Decode an unbiased type value
    pub fn from_type(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Removed),
            n => Cassette::try_from(n)
                .map(Self::Present)
                .map_err(|_| Error::Parse(format!("invalid cassette type {}", n))),
        }
    }

    /// Check if a cassette is loaded
    pub fn is_present(self) -> bool {
        matches!(self, Self::Present(_))
    }
}

/// Notes moved from one cassette during a dispense, test dispense or purge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CassetteCount {
    /// Notes that reached the exit
    pub exit: u8,

    /// Notes diverted to the reject tray
    pub rejected: u8,

    /// Whether a cassette was loaded
    pub present: bool,
}

impl CassetteCount {
    /// Notes picked from the cassette
    pub fn picked(&self) -> u16 {
        u16::from(self.exit) + u16::from(self.rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cassette_numbers() {
        assert_eq!(Cassette::Top.number(), 1);
        assert_eq!(Cassette::Bottom.index(), 3);
        assert_eq!(Cassette::try_from(3).unwrap(), Cassette::Third);
        assert!(Cassette::try_from(0).is_err());
        assert!(Cassette::try_from(5).is_err());
    }

    #[test]
    fn test_slot_from_type() {
        assert_eq!(CassetteSlot::from_type(0).unwrap(), CassetteSlot::Removed);
        assert_eq!(
            CassetteSlot::from_type(2).unwrap(),
            CassetteSlot::Present(Cassette::Second)
        );
        assert!(matches!(CassetteSlot::from_type(9), Err(Error::Parse(_))));
    }

    #[test]
    fn test_picked() {
        let count = CassetteCount {
            exit: 200,
            rejected: 100,
            present: true,
        };
        assert_eq!(count.picked(), 300);
    }
}
