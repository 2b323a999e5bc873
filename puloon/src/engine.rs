//! Command/acknowledge/response exchange with the dispenser
//!
//! ```text
//! host                       dispenser
//!  │ ── command ────────────────▶ │   up to 3 times until ACK
//!  │ ◀──────────────────── ACK ── │
//!  │ ◀─────────────── response ── │   up to 3 reads, NAK between them
//!  │ ── ACK ────────────────────▶ │
//!  │ ◀──────────────────── EOT ── │
//! ```
//!
//! A command is transmitted at most three times, and only while no ACK has
//! been seen. Once the dispenser acknowledged it, the command is never sent
//! again: a mechanical operation may already be running.

use std::time::Duration;

use tracing::{debug, trace, warn};

use puloon_core::{
    Command, Frame, Response, decode_response,
    constants::{
        ACK, DEFAULT_ACK_TIMEOUT, DEFAULT_EOT_TIMEOUT, DEFAULT_RESPONSE_TIMEOUT, EOT,
        MAX_ACK_ATTEMPTS, MAX_RESPONSE_ATTEMPTS, NAK, NO_ERROR,
    },
};
use puloon_transport::Link;

use crate::error::{Error, Result};

/// Read windows of the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Wait for the ACK after each command transmission
    pub ack: Duration,

    /// Wait for each response read
    pub response: Duration,

    /// Wait for the EOT after our ACK
    pub eot: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            ack: DEFAULT_ACK_TIMEOUT,
            response: DEFAULT_RESPONSE_TIMEOUT,
            eot: DEFAULT_EOT_TIMEOUT,
        }
    }
}

/// Drives one link through the dispenser handshake
///
/// Calls are strictly sequential: `&mut self` on every exchange keeps a
/// second command off the wire until the first one has finished.
pub struct ProtocolEngine {
    link: Box<dyn Link>,
    timeouts: Timeouts,
}

impl ProtocolEngine {
    /// Create an engine over `link` with default timeouts
    pub fn new(link: Box<dyn Link>) -> Self {
        Self {
            link,
            timeouts: Timeouts::default(),
        }
    }

    /// Set the ACK window
    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.ack = timeout;
        self
    }

    /// Set the response window
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.response = timeout;
        self
    }

    /// Set the EOT window
    pub fn with_eot_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.eot = timeout;
        self
    }

    /// Replace all windows at once
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Current windows
    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Open the underlying link
    pub async fn open(&mut self) -> Result<()> {
        self.link.open().await?;
        Ok(())
    }

    /// Close the underlying link
    pub async fn close(&mut self) -> Result<()> {
        self.link.close().await?;
        Ok(())
    }

    /// Check if the underlying link is open
    pub fn is_open(&self) -> bool {
        self.link.is_open()
    }

    /// Access the underlying link
    pub fn link_mut(&mut self) -> &mut dyn Link {
        self.link.as_mut()
    }

    /// Run a typed command and decode its response
    ///
    /// # Errors
    ///
    /// Fails like [`ProtocolEngine::transact`], or with a framing error when
    /// a valid frame does not fit the response layout.
    pub async fn execute<C: Command>(&mut self, command: &C) -> Result<C::Response> {
        if C::OPCODE.is_mechanical() {
            debug!("{} moves notes, allowing {:?}", C::OPCODE, self.timeouts.response);
        }

        let frame = self
            .transact(
                &command.frame(),
                C::Response::frame_len(),
                C::Response::ERROR_INDEX,
            )
            .await?;

        Ok(C::Response::decode(&frame, C::OPCODE)?)
    }

    /// Run one exchange and return the validated response frame
    ///
    /// `response_len` is the full frame length to read, and `error_index` the
    /// position of the status byte in the response body.
    ///
    /// # Errors
    ///
    /// - [`Error::AckTimeout`] when no ACK followed any of the transmissions
    /// - [`Error::ResponseTimeout`] when no valid, EOT-confirmed response
    ///   arrived in any of the response attempts
    /// - [`Error::Device`] when the dispenser reported an error; the
    ///   response frame is attached and the exchange is not retried
    /// - [`Error::Transport`] when the link itself fails
    pub async fn transact(
        &mut self,
        command: &Frame,
        response_len: usize,
        error_index: usize,
    ) -> Result<Frame> {
        self.send_until_ack(command).await?;

        for attempt in 1..=MAX_RESPONSE_ATTEMPTS {
            let raw = self.link.read(response_len, self.timeouts.response).await?;
            debug!("<- {}", hex::encode_upper(&raw));

            match validate(&raw, command.opcode, response_len) {
                Ok(frame) => {
                    self.link.write(&[ACK]).await?;

                    let eot = self.link.read(1, self.timeouts.eot).await?;
                    trace!("EOT: {:02X?}", &eot[..]);

                    if eot.first() == Some(&EOT) {
                        return check_status(frame, error_index);
                    }

                    warn!(
                        "No EOT after ACK for {} (attempt {}/{})",
                        frame, attempt, MAX_RESPONSE_ATTEMPTS
                    );
                }
                Err(e) => {
                    warn!(
                        "Invalid response to 0x{:02X} (attempt {}/{}): {}",
                        command.opcode, attempt, MAX_RESPONSE_ATTEMPTS, e
                    );
                }
            }

            self.link.write(&[NAK]).await?;
        }

        Err(Error::ResponseTimeout)
    }

    /// Write a command that the dispenser does not answer
    pub async fn send(&mut self, command: &Frame) -> Result<()> {
        if command.opcode().is_ok_and(|opcode| opcode.expects_response()) {
            warn!("Sending {} without waiting for its response", command);
        }

        let encoded = command.encode();
        debug!("-> {}", hex::encode_upper(&encoded));
        self.link.write(&encoded).await?;
        Ok(())
    }

    async fn send_until_ack(&mut self, command: &Frame) -> Result<()> {
        let encoded = command.encode();

        for attempt in 1..=MAX_ACK_ATTEMPTS {
            // A late reply to an earlier transmission must not pass for this one
            self.link.clear_input().await?;

            debug!("-> {}", hex::encode_upper(&encoded));
            self.link.write(&encoded).await?;

            let reply = self.link.read(1, self.timeouts.ack).await?;
            trace!("ACK: {:02X?}", &reply[..]);

            if reply.first() == Some(&ACK) {
                return Ok(());
            }

            warn!(
                "No ACK for {} (attempt {}/{})",
                command, attempt, MAX_ACK_ATTEMPTS
            );
        }

        Err(Error::AckTimeout)
    }
}

/// Accept only a well-formed response to `opcode` of exactly `len` bytes
fn validate(raw: &[u8], opcode: u8, len: usize) -> puloon_core::Result<Frame> {
    if raw.len() != len {
        return Err(puloon_core::Error::FrameLength {
            expected: len,
            actual: raw.len(),
        });
    }

    let frame = decode_response(raw)?;

    if !frame.is_valid() {
        return Err(puloon_core::Error::InvalidFrame(format!(
            "bad markers or BCC in {}",
            hex::encode_upper(raw)
        )));
    }

    if frame.opcode != opcode {
        return Err(puloon_core::Error::OpcodeMismatch {
            expected: opcode,
            actual: frame.opcode,
        });
    }

    Ok(frame)
}

fn check_status(frame: Frame, error_index: usize) -> Result<Frame> {
    match frame.body_byte(error_index) {
        Some(NO_ERROR) => Ok(frame),
        Some(status) => {
            let error = Error::device(status, frame);
            warn!("{}", error);
            Err(error)
        }
        None => Err(puloon_core::Error::BodyLength {
            expected: error_index + 1,
            actual: frame.body.len(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::BytesMut;
    use mockall::mock;
    use pretty_assertions::assert_eq;
    use puloon_core::{ErrorCode, Opcode};
    use puloon_transport::ScriptedLink;

    mock! {
        Port {}

        #[async_trait]
        impl Link for Port {
            async fn open(&mut self) -> puloon_transport::Result<()>;
            async fn close(&mut self) -> puloon_transport::Result<()>;
            fn is_open(&self) -> bool;
            async fn write(&mut self, data: &[u8]) -> puloon_transport::Result<()>;
            async fn read(&mut self, n: usize, timeout: Duration) -> puloon_transport::Result<BytesMut>;
            async fn clear_input(&mut self) -> puloon_transport::Result<()>;
            fn name(&self) -> String;
        }
    }

    const STATUS_LEN: usize = 24;

    fn status_command() -> Frame {
        Frame::command(Opcode::Status, Vec::new())
    }

    fn status_response(error: u8) -> Vec<u8> {
        let mut body = vec![error, 0x20];
        body.extend_from_slice(&[0x30, 0x31, 0x20, 0x20].repeat(4));
        Frame::response(Opcode::Status, body).encode().to_vec()
    }

    fn engine(link: &ScriptedLink) -> ProtocolEngine {
        ProtocolEngine::new(Box::new(link.clone()))
    }

    #[tokio::test]
    async fn test_successful_exchange() {
        let link = ScriptedLink::new();
        link.push_read([ACK])
            .push_read(status_response(NO_ERROR))
            .push_read([EOT]);

        let frame = engine(&link)
            .transact(&status_command(), STATUS_LEN, 0)
            .await
            .unwrap();

        assert_eq!(frame.opcode, 0x50);
        assert_eq!(
            link.writes(),
            vec![vec![0x04, 0x30, 0x02, 0x50, 0x03, 0x65], vec![ACK]]
        );
    }

    #[tokio::test]
    async fn test_read_windows() {
        let link = ScriptedLink::new();
        link.push_read([ACK])
            .push_read(status_response(NO_ERROR))
            .push_read([EOT]);

        let mut engine = engine(&link).with_response_timeout(Duration::from_secs(5));
        engine.transact(&status_command(), STATUS_LEN, 0).await.unwrap();

        assert_eq!(
            link.read_requests(),
            vec![
                (1, DEFAULT_ACK_TIMEOUT),
                (STATUS_LEN, Duration::from_secs(5)),
                (1, DEFAULT_EOT_TIMEOUT),
            ]
        );
    }

    #[tokio::test]
    async fn test_ack_after_resend() {
        let link = ScriptedLink::new();
        link.push_silence()
            .push_read([NAK])
            .push_read([ACK])
            .push_read(status_response(NO_ERROR))
            .push_read([EOT]);

        engine(&link)
            .transact(&status_command(), STATUS_LEN, 0)
            .await
            .unwrap();

        let command = status_command().encode().to_vec();
        assert_eq!(
            link.writes(),
            vec![command.clone(), command.clone(), command, vec![ACK]]
        );
    }

    #[tokio::test]
    async fn test_ack_timeout_after_three_transmissions() {
        let link = ScriptedLink::new();

        let result = engine(&link).transact(&status_command(), STATUS_LEN, 0).await;

        let error = result.unwrap_err();
        assert!(matches!(error, Error::AckTimeout));
        assert_eq!(error.code(), ErrorCode::ACK_TIMEOUT);
        assert_eq!(link.writes().len(), MAX_ACK_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_ack_bound_with_mock() {
        let mut port = MockPort::new();
        port.expect_clear_input().times(3).returning(|| Ok(()));
        port.expect_write()
            .withf(|data| data == [0x04u8, 0x30, 0x02, 0x50, 0x03, 0x65])
            .times(3)
            .returning(|_| Ok(()));
        port.expect_read()
            .withf(|n, _| *n == 1)
            .times(3)
            .returning(|_, _| Ok(BytesMut::new()));

        let mut engine = ProtocolEngine::new(Box::new(port));
        let result = engine.transact(&status_command(), STATUS_LEN, 0).await;

        assert!(matches!(result, Err(Error::AckTimeout)));
    }

    #[tokio::test]
    async fn test_response_timeout_never_resends_command() {
        let link = ScriptedLink::new();
        link.push_read([ACK]);

        let result = engine(&link).transact(&status_command(), STATUS_LEN, 0).await;

        let error = result.unwrap_err();
        assert!(matches!(error, Error::ResponseTimeout));
        assert_eq!(error.code(), ErrorCode::RESPONSE_TIMEOUT);

        let command = status_command().encode().to_vec();
        assert_eq!(
            link.writes(),
            vec![command, vec![NAK], vec![NAK], vec![NAK]]
        );
    }

    #[tokio::test]
    async fn test_stale_input_cleared_before_transmission() {
        let link = ScriptedLink::new();
        link.push_stale([NAK, EOT])
            .push_read([ACK])
            .push_read(status_response(NO_ERROR))
            .push_read([EOT]);

        engine(&link)
            .transact(&status_command(), STATUS_LEN, 0)
            .await
            .unwrap();

        let command = status_command().encode().to_vec();
        assert_eq!(link.writes(), vec![command, vec![ACK]]);
        assert_eq!(link.clears(), 1);
    }

    #[tokio::test]
    async fn test_input_cleared_before_every_transmission() {
        let link = ScriptedLink::new();
        link.push_silence().push_silence().push_read([ACK]);

        let _ = engine(&link).transact(&status_command(), STATUS_LEN, 0).await;

        assert_eq!(link.clears(), MAX_ACK_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_bad_bcc_on_every_read_is_response_timeout() {
        let mut corrupt = status_response(NO_ERROR);
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0xFF;

        let link = ScriptedLink::new();
        link.push_read([ACK])
            .push_read(&corrupt)
            .push_read(&corrupt)
            .push_read(&corrupt);

        let result = engine(&link).transact(&status_command(), STATUS_LEN, 0).await;

        assert!(matches!(result, Err(Error::ResponseTimeout)));

        let command = status_command().encode().to_vec();
        assert_eq!(
            link.writes(),
            vec![command, vec![NAK], vec![NAK], vec![NAK]]
        );
        assert_eq!(link.pending_reads(), 0);
    }

    #[test]
    fn test_length_mismatch_either_way() {
        let mut long = status_response(NO_ERROR);
        long.push(EOT);
        let short = &long[..STATUS_LEN - 1];

        assert_eq!(
            validate(&long, 0x50, STATUS_LEN).unwrap_err(),
            puloon_core::Error::FrameLength {
                expected: STATUS_LEN,
                actual: STATUS_LEN + 1,
            }
        );
        assert_eq!(
            validate(short, 0x50, STATUS_LEN).unwrap_err(),
            puloon_core::Error::FrameLength {
                expected: STATUS_LEN,
                actual: STATUS_LEN - 1,
            }
        );
        assert!(validate(&long[..STATUS_LEN], 0x50, STATUS_LEN).is_ok());
    }

    #[tokio::test]
    async fn test_corrupt_response_is_nakked_and_reread() {
        let mut corrupt = status_response(NO_ERROR);
        corrupt[6] ^= 0x01;

        let link = ScriptedLink::new();
        link.push_read([ACK])
            .push_read(corrupt)
            .push_read(status_response(NO_ERROR))
            .push_read([EOT]);

        engine(&link)
            .transact(&status_command(), STATUS_LEN, 0)
            .await
            .unwrap();

        assert_eq!(&link.writes()[1..], &[vec![NAK], vec![ACK]]);
    }

    #[tokio::test]
    async fn test_short_response_is_invalid() {
        let mut short = status_response(NO_ERROR);
        short.truncate(10);

        let link = ScriptedLink::new();
        link.push_read([ACK])
            .push_read(short)
            .push_read(status_response(NO_ERROR))
            .push_read([EOT]);

        engine(&link)
            .transact(&status_command(), STATUS_LEN, 0)
            .await
            .unwrap();

        assert_eq!(&link.writes()[1..], &[vec![NAK], vec![ACK]]);
    }

    #[tokio::test]
    async fn test_wrong_opcode_is_invalid() {
        let mut body = vec![NO_ERROR, 0x20];
        body.extend_from_slice(&[0x20; 16]);
        let purge_sized = Frame::response(Opcode::Purge, body).encode().to_vec();

        let link = ScriptedLink::new();
        link.push_read([ACK]).push_read(purge_sized);

        let result = engine(&link).transact(&status_command(), STATUS_LEN, 0).await;

        assert!(matches!(result, Err(Error::ResponseTimeout)));
        assert_eq!(&link.writes()[1..], &[vec![NAK], vec![NAK], vec![NAK]]);
    }

    #[tokio::test]
    async fn test_missing_eot_is_retried() {
        let link = ScriptedLink::new();
        link.push_read([ACK])
            .push_read(status_response(NO_ERROR))
            .push_silence()
            .push_read(status_response(NO_ERROR))
            .push_read([EOT]);

        engine(&link)
            .transact(&status_command(), STATUS_LEN, 0)
            .await
            .unwrap();

        assert_eq!(&link.writes()[1..], &[vec![ACK], vec![NAK], vec![ACK]]);
    }

    #[tokio::test]
    async fn test_device_error_is_not_retried() {
        let response = status_response(NO_ERROR + 0x05);

        let link = ScriptedLink::new();
        link.push_read([ACK]).push_read(&response).push_read([EOT]);

        let error = engine(&link)
            .transact(&status_command(), STATUS_LEN, 0)
            .await
            .unwrap_err();

        assert_eq!(error.code(), ErrorCode(0x05));
        assert_eq!(error.message(), "A note Staying in EXIT Sensor");
        assert_eq!(
            error.response().map(|frame| frame.encode().to_vec()),
            Some(response)
        );
        assert_eq!(link.writes().len(), 2);
        assert_eq!(link.pending_reads(), 0);
    }

    #[tokio::test]
    async fn test_status_byte_at_error_index() {
        // Last status echoes the previous opcode before the status byte
        let body = {
            let mut body = vec![0x52, NO_ERROR, 0x30];
            body.extend_from_slice(&[0x22, 0x20, 0x31].repeat(4));
            body
        };
        let response = Frame::response(Opcode::LastStatus, body).encode().to_vec();

        let link = ScriptedLink::new();
        link.push_read([ACK]).push_read(&response).push_read([EOT]);

        let frame = engine(&link)
            .transact(&Frame::command(Opcode::LastStatus, Vec::new()), 21, 1)
            .await
            .unwrap();

        assert_eq!(frame.body_byte(0), Some(0x52));
    }

    #[tokio::test]
    async fn test_send_writes_once_without_reading() {
        let link = ScriptedLink::new();

        engine(&link)
            .send(&Frame::command(Opcode::Reset, Vec::new()))
            .await
            .unwrap();

        assert_eq!(link.writes().len(), 1);
        assert!(link.read_requests().is_empty());
    }

    #[tokio::test]
    async fn test_closed_link_is_transport_error() {
        let link = ScriptedLink::new();
        let mut engine = engine(&link);
        engine.close().await.unwrap();

        let result = engine.transact(&status_command(), STATUS_LEN, 0).await;

        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[test]
    fn test_default_timeouts() {
        let timeouts = Timeouts::default();
        assert_eq!(timeouts.ack, Duration::from_millis(550));
        assert_eq!(timeouts.response, Duration::from_secs(60));
        assert_eq!(timeouts.eot, Duration::from_millis(550));
    }
}
