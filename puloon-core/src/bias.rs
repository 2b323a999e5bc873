//! Biased numeric fields
//!
//! Numbers travel as `value + bias` so every byte on the wire stays in the
//! printable range. Counts and measured values use `0x20`; cassette
//! positions, cassette types and hexadecimal digits use `0x30`.

use crate::error::{Error, Result};

/// Offset added to a numeric field before transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Bias {
    /// Counts, opacities, lengths, times
    Count = 0x20,

    /// Cassette numbers, cassette types, single hex digits
    Digit = 0x30,
}

impl Bias {
    /// Raw offset
    pub const fn offset(self) -> u8 {
        self as u8
    }

    /// Largest value that can be encoded with this bias
    pub const fn max_value(self) -> u8 {
        u8::MAX - self.offset()
    }

    /// Encode a value for transmission
    ///
    /// # Examples
    ///
    /// ```
    /// use puloon_core::Bias;
    ///
    /// assert_eq!(Bias::Count.encode(5).unwrap(), 0x25);
    /// assert_eq!(Bias::Digit.encode(1).unwrap(), b'1');
    /// ```
    pub fn encode(self, value: u8) -> Result<u8> {
        value.checked_add(self.offset()).ok_or(Error::BiasOverflow {
            value,
            bias: self.offset(),
        })
    }

    /// Decode a byte received from the device
    pub fn decode(self, byte: u8) -> Result<u8> {
        byte.checked_sub(self.offset()).ok_or(Error::BiasUnderflow {
            byte,
            bias: self.offset(),
        })
    }
}

/// Encode a byte as two hex digits, high nibble first, each biased by 0x30
///
/// # Examples
///
/// ```
/// use puloon_core::bias;
///
/// assert_eq!(bias::encode_hex_pair(0xA7), [0x3A, 0x37]);
/// ```
pub fn encode_hex_pair(value: u8) -> [u8; 2] {
    let digit = Bias::Digit.offset();
    [(value >> 4) + digit, (value & 0x0F) + digit]
}

/// Decode two hex digits produced by [`encode_hex_pair`]
pub fn decode_hex_pair(pair: [u8; 2]) -> Result<u8> {
    let high = decode_hex_digit(pair[0])?;
    let low = decode_hex_digit(pair[1])?;
    Ok((high << 4) | low)
}

fn decode_hex_digit(byte: u8) -> Result<u8> {
    match Bias::Digit.decode(byte) {
        Ok(nibble) if nibble <= 0x0F => Ok(nibble),
        _ => Err(Error::InvalidHexDigit(byte)),
    }
}
