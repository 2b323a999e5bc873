//! Frame structure and encoding/decoding

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::{
    checksum,
    constants::{DEVICE_ID, EOT, ETX, FRAME_OVERHEAD, SOH, STX},
    error::{Error, Result},
    opcode::Opcode,
};

/// Direction of a frame, given by its leading marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Host to dispenser, leads with `EOT`
    Command,

    /// Dispenser to host, leads with `SOH`
    Response,
}

impl FrameKind {
    /// Leading marker byte, which is also the BCC seed
    pub const fn marker(self) -> u8 {
        match self {
            Self::Command => EOT,
            Self::Response => SOH,
        }
    }

    /// Identify a frame kind from its leading marker
    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            EOT => Some(Self::Command),
            SOH => Some(Self::Response),
            _ => None,
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => f.write_str("command"),
            Self::Response => f.write_str("response"),
        }
    }
}

/// LCDM-4000 frame
///
/// # Frame Structure
///
/// ```text
/// ┌────────┬──────┬──────┬────────┬──────────────┬──────┬──────┐
/// │ Marker │  ID  │ STX  │ Opcode │     Body     │ ETX  │ BCC  │
/// │ EOT/SOH│ 0x30 │ 0x02 │ 1 byte │   N bytes    │ 0x03 │ XOR  │
/// └────────┴──────┴──────┴────────┴──────────────┴──────┴──────┘
/// ```
///
/// For commands the body holds the parameters. For responses it starts with
/// the status byte (for most opcodes) followed by the response parameters.
///
/// # Examples
///
/// ```
/// use puloon_core::{Frame, Opcode};
///
/// let frame = Frame::command(Opcode::Status, Vec::new());
/// let encoded = frame.encode();
/// assert_eq!(&encoded[..], &[0x04, 0x30, 0x02, 0x50, 0x03, 0x65]);
///
/// let decoded = Frame::decode(&encoded).unwrap();
/// assert!(decoded.is_valid());
/// assert_eq!(decoded.opcode, 0x50);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame direction
    pub kind: FrameKind,

    /// Opcode byte
    pub opcode: u8,

    /// Bytes between the opcode and ETX
    pub body: Bytes,

    /// Block check character, as computed or as received
    pub bcc: u8,

    valid: bool,
}

impl Frame {
    /// Smallest possible frame: marker, ID, STX, opcode, ETX, BCC
    pub const MIN_SIZE: usize = FRAME_OVERHEAD;

    /// Build a command frame and compute its BCC
    pub fn command(opcode: impl Into<u8>, payload: impl Into<Bytes>) -> Self {
        Self::build(FrameKind::Command, opcode.into(), payload.into())
    }

    /// Build a well-formed response frame and compute its BCC
    ///
    /// Used by simulators and tests standing in for a dispenser.
    pub fn response(opcode: impl Into<u8>, body: impl Into<Bytes>) -> Self {
        Self::build(FrameKind::Response, opcode.into(), body.into())
    }

    fn build(kind: FrameKind, opcode: u8, body: Bytes) -> Self {
        let bcc = Self::compute_bcc(kind, opcode, &body);
        Self {
            kind,
            opcode,
            body,
            bcc,
            valid: true,
        }
    }

    fn compute_bcc(kind: FrameKind, opcode: u8, body: &[u8]) -> u8 {
        let head = checksum::fold(kind.marker(), &[DEVICE_ID, STX, opcode]);
        checksum::fold(head, body) ^ ETX
    }

    /// Encode frame to bytes
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.size());

        buf.put_u8(self.kind.marker());
        buf.put_u8(DEVICE_ID);
        buf.put_u8(STX);
        buf.put_u8(self.opcode);
        buf.put_slice(&self.body);
        buf.put_u8(ETX);
        buf.put_u8(self.bcc);

        buf
    }

    /// Decode a frame of either kind from raw bytes
    ///
    /// Fixed markers and the BCC are checked but a mismatch does not fail the
    /// decode: it is reported through [`Frame::is_valid`] so that the caller
    /// can reject the frame on the wire.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Buffer is shorter than [`Frame::MIN_SIZE`]
    /// - First byte is neither `EOT` nor `SOH`
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() < Self::MIN_SIZE {
            return Err(Error::FrameTooShort {
                expected: Self::MIN_SIZE,
                actual: raw.len(),
            });
        }

        let kind = FrameKind::from_marker(raw[0]).ok_or(Error::UnknownMarker(raw[0]))?;
        let opcode = raw[3];
        let (bcc_pos, etx_pos) = (raw.len() - 1, raw.len() - 2);
        let body = Bytes::copy_from_slice(&raw[4..etx_pos]);

        let markers_ok = raw[1] == DEVICE_ID && raw[2] == STX && raw[etx_pos] == ETX;
        let valid = markers_ok && checksum::verify(raw);

        Ok(Self {
            kind,
            opcode,
            body,
            bcc: raw[bcc_pos],
            valid,
        })
    }

    /// Check if markers and BCC matched when the frame was decoded
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Parse the opcode byte
    pub fn opcode(&self) -> Result<Opcode> {
        Opcode::try_from(self.opcode)
    }

    /// Byte at `index` in the body, typically the status byte
    pub fn body_byte(&self, index: usize) -> Option<u8> {
        self.body.get(index).copied()
    }

    /// Get total frame size
    pub fn size(&self) -> usize {
        FRAME_OVERHEAD + self.body.len()
    }
}

/// Encode a command frame: `[EOT, ID, STX, opcode, ...payload, ETX, BCC]`
pub fn encode_command(opcode: impl Into<u8>, payload: &[u8]) -> BytesMut {
    Frame::command(opcode, Bytes::copy_from_slice(payload)).encode()
}

/// Decode a response frame: `[SOH, ID, STX, opcode, error, ...payload, ETX, BCC]`
///
/// # Errors
///
/// Fails like [`Frame::decode`], and also when the bytes form a command frame.
pub fn decode_response(raw: &[u8]) -> Result<Frame> {
    let frame = Frame::decode(raw)?;
    if frame.kind != FrameKind::Response {
        return Err(Error::UnexpectedKind {
            expected: FrameKind::Response,
            actual: frame.kind,
        });
    }
    Ok(frame)
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("kind", &self.kind)
            .field("opcode", &format!("0x{:02X}", self.opcode))
            .field("body", &hex::encode_upper(&self.body))
            .field("bcc", &format!("0x{:02X}", self.bcc))
            .field("valid", &self.valid)
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Opcode::try_from(self.opcode) {
            Ok(opcode) => write!(f, "{}[{}](len={})", self.kind, opcode, self.body.len()),
            Err(_) => write!(f, "{}[0x{:02X}](len={})", self.kind, self.opcode, self.body.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NO_ERROR;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_status_command_bytes() {
        let encoded = encode_command(Opcode::Status, &[]);
        assert_eq!(&encoded[..], &[0x04, 0x30, 0x02, 0x50, 0x03, 0x65]);
    }

    #[test]
    fn test_command_with_payload() {
        // Sensor diagnostics on the top cassette
        let frame = Frame::command(Opcode::SensorDiagnostics, vec![0x31]);
        let encoded = frame.encode();

        assert_eq!(&encoded[..6], &[0x04, 0x30, 0x02, 0x58, 0x31, 0x03]);
        assert_eq!(encoded[6], 0x04 ^ 0x30 ^ 0x02 ^ 0x58 ^ 0x31 ^ 0x03);
        assert_eq!(frame.size(), 7);
    }

    #[test]
    fn test_response_decode() {
        let raw = Frame::response(Opcode::SetBillLengths, vec![NO_ERROR]).encode();
        assert_eq!(raw[0], SOH);

        let frame = decode_response(&raw).unwrap();
        assert!(frame.is_valid());
        assert_eq!(frame.kind, FrameKind::Response);
        assert_eq!(frame.opcode().unwrap(), Opcode::SetBillLengths);
        assert_eq!(frame.body_byte(0), Some(NO_ERROR));
    }

    #[test]
    fn test_response_bcc_uses_soh_seed() {
        let command = Frame::command(Opcode::Status, vec![0x20]);
        let response = Frame::response(Opcode::Status, vec![0x20]);
        assert_eq!(command.bcc ^ response.bcc, EOT ^ SOH);
    }

    #[test]
    fn test_bad_bcc_is_invalid() {
        let mut raw = Frame::response(Opcode::Status, vec![NO_ERROR]).encode();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;

        let frame = decode_response(&raw).unwrap();
        assert!(!frame.is_valid());
    }

    #[test]
    fn test_bad_marker_is_invalid() {
        // Correct BCC over a frame whose ETX is wrong
        let mut raw = vec![SOH, DEVICE_ID, STX, 0x50, NO_ERROR, 0x04];
        raw.push(checksum::calculate(&raw));

        let frame = Frame::decode(&raw).unwrap();
        assert!(!frame.is_valid());
    }

    #[test]
    fn test_frame_too_short() {
        let result = Frame::decode(&[SOH, DEVICE_ID, STX]);
        assert_eq!(
            result,
            Err(Error::FrameTooShort {
                expected: 6,
                actual: 3
            })
        );
    }

    #[test]
    fn test_unknown_marker() {
        let result = Frame::decode(&[0x06, 0x30, 0x02, 0x50, 0x03, 0x00]);
        assert_eq!(result, Err(Error::UnknownMarker(0x06)));
    }

    #[test]
    fn test_decode_response_rejects_command() {
        let raw = encode_command(Opcode::Status, &[]);
        assert_eq!(
            decode_response(&raw),
            Err(Error::UnexpectedKind {
                expected: FrameKind::Response,
                actual: FrameKind::Command
            })
        );
    }

    proptest! {
        #[test]
        fn prop_encode_decode_recovers_payload(
            opcode in any::<u8>(),
            payload in proptest::collection::vec(any::<u8>(), 0..48),
        ) {
            let encoded = encode_command(opcode, &payload);
            let decoded = Frame::decode(&encoded).unwrap();

            prop_assert!(decoded.is_valid());
            prop_assert_eq!(decoded.kind, FrameKind::Command);
            prop_assert_eq!(decoded.opcode, opcode);
            prop_assert_eq!(&decoded.body[..], &payload[..]);
        }

        #[test]
        fn prop_single_bit_flip_invalidates(
            opcode in any::<u8>(),
            payload in proptest::collection::vec(any::<u8>(), 0..48),
            index in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let mut raw = Frame::response(opcode, payload).encode();
            let i = index.index(raw.len());
            raw[i] ^= 1 << bit;

            let valid = Frame::decode(&raw).map(|f| f.is_valid()).unwrap_or(false);
            prop_assert!(!valid);
        }
    }
}
