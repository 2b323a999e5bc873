//! Dispenser path sensors

use bitflags::bitflags;

bitflags! {
    /// Path sensors reported blocked in the DISP byte of a status response
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SensorFlags: u8 {
        /// Left diverter sensor
        const DVTL = 1;
        /// Right diverter sensor
        const DVTR = 1 << 1;
        /// Eject sensor
        const EJT = 1 << 2;
        /// Exit sensor
        const EXIT = 1 << 3;
        /// Reject tray sensor
        const RJT = 1 << 4;
    }
}

impl SensorFlags {
    /// Decode a DISP byte; bits above the five sensors are ignored
    pub fn from_disp(disp: u8) -> Self {
        Self::from_bits_truncate(disp)
    }

    /// Check if the note path is clear
    pub fn path_clear(self) -> bool {
        !self.intersects(Self::DVTL | Self::DVTR | Self::EJT | Self::EXIT)
    }
}
