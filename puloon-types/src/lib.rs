//! Type definitions for puloon

pub mod cassette;
pub mod error;
pub mod request;
pub mod sensors;

pub use cassette::{Cassette, CassetteCount, CassetteSlot};
pub use error::{Error, Result};
pub use request::{DispenseOrder, DispenseRequest};
pub use sensors::SensorFlags;
