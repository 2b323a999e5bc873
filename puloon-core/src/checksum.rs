//! Block Check Character (BCC)
//!
//! The BCC is a running XOR over every byte of a frame except the BCC
//! itself. The first byte of the frame acts as the seed, which makes the
//! seed `EOT` for commands and `SOH` for responses:
//!
//! ```text
//! command:  EOT ^ ID ^ STX ^ CMD ^ params... ^ ETX
//! response: SOH ^ ID ^ STX ^ RSP ^ error ^ params... ^ ETX
//! ```

use tracing::trace;

/// Fold `bytes` into a running XOR starting at `seed`
///
/// # Examples
///
/// ```
/// use puloon_core::{checksum, constants::EOT};
///
/// let bcc = checksum::fold(EOT, &[0x30, 0x02, 0x50, 0x03]);
/// assert_eq!(bcc, 0x65);
/// ```
pub fn fold(seed: u8, bytes: &[u8]) -> u8 {
    bytes.iter().fold(seed, |acc, b| acc ^ b)
}

/// Calculate the BCC of a frame given every byte that precedes it
///
/// An empty slice yields `0`.
pub fn calculate(frame_without_bcc: &[u8]) -> u8 {
    let bcc = match frame_without_bcc.split_first() {
        Some((seed, rest)) => fold(*seed, rest),
        None => 0,
    };

    trace!(
        len = frame_without_bcc.len(),
        bcc = format!("0x{:02X}", bcc),
        "Calculated BCC"
    );

    bcc
}

/// Verify a complete frame whose last byte is the BCC
pub fn verify(frame: &[u8]) -> bool {
    match frame.split_last() {
        Some((bcc, rest)) if !rest.is_empty() => calculate(rest) == *bcc,
        _ => false,
    }
}
