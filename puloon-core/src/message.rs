//! Typed commands and responses
//!
//! Concrete messages only describe their payload layout. Framing, BCC and
//! validation are shared through [`Frame`].

use bytes::Bytes;
use std::fmt;

use crate::{
    constants::FRAME_OVERHEAD,
    error::{Error, Result},
    frame::{Frame, FrameKind},
    opcode::Opcode,
};

/// A command sent to the dispenser
pub trait Command: fmt::Debug + Send + Sync {
    /// Response the dispenser answers this command with
    type Response: Response;

    /// Opcode of the command, echoed in the response
    const OPCODE: Opcode;

    /// Command parameters, already biased for transmission
    fn payload(&self) -> Bytes {
        Bytes::new()
    }

    /// Build the command frame
    fn frame(&self) -> Frame {
        Frame::command(Self::OPCODE, self.payload())
    }
}

/// A response received from the dispenser
pub trait Response: fmt::Debug + Sized + Send {
    /// Number of bytes between the opcode and ETX
    const BODY_LEN: usize;

    /// Position of the status byte in the body
    const ERROR_INDEX: usize = 0;

    /// Total number of bytes to read off the link for this response
    fn frame_len() -> usize {
        FRAME_OVERHEAD + Self::BODY_LEN
    }

    /// Parse a body of exactly [`Response::BODY_LEN`] bytes
    ///
    /// Implementations index the body directly. Call
    /// [`Response::from_body`] instead, which checks the length first.
    fn parse_body(body: &[u8]) -> Result<Self>;

    /// Build the response from a frame body
    ///
    /// # Errors
    ///
    /// Returns [`Error::BodyLength`] unless `body` is exactly
    /// [`Response::BODY_LEN`] bytes long.
    fn from_body(body: &[u8]) -> Result<Self> {
        if body.len() != Self::BODY_LEN {
            return Err(Error::BodyLength {
                expected: Self::BODY_LEN,
                actual: body.len(),
            });
        }

        Self::parse_body(body)
    }

    /// Decode a validated response frame
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is not a valid response to `opcode` or
    /// its body does not match the declared layout.
    fn decode(frame: &Frame, opcode: Opcode) -> Result<Self> {
        if frame.kind != FrameKind::Response {
            return Err(Error::UnexpectedKind {
                expected: FrameKind::Response,
                actual: frame.kind,
            });
        }

        if !frame.is_valid() {
            return Err(Error::InvalidFrame(format!("{}", frame)));
        }

        if frame.opcode != u8::from(opcode) {
            return Err(Error::OpcodeMismatch {
                expected: opcode.into(),
                actual: frame.opcode,
            });
        }

        Self::from_body(&frame.body)
    }
}
