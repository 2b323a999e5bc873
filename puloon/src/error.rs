//! High-level error types

use puloon_core::{ErrorCode, Frame};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Framing error: {0}")]
    Framing(#[from] puloon_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] puloon_transport::Error),

    #[error("Invalid parameter: {0}")]
    Types(#[from] puloon_types::Error),

    #[error("{}", ErrorCode::ACK_TIMEOUT)]
    AckTimeout,

    #[error("{}", ErrorCode::RESPONSE_TIMEOUT)]
    ResponseTimeout,

    #[error("Device error {code}")]
    Device { code: ErrorCode, response: Frame },
}

impl Error {
    /// Build a device error from the status byte of `response`
    pub fn device(status: u8, response: Frame) -> Self {
        Self::Device {
            code: ErrorCode::from_status_byte(status),
            response,
        }
    }

    /// Dispenser error code; host-side failures map to the synthetic codes
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::AckTimeout => ErrorCode::ACK_TIMEOUT,
            Self::ResponseTimeout => ErrorCode::RESPONSE_TIMEOUT,
            Self::Device { code, .. } => *code,
            Self::Framing(_) | Self::Transport(_) | Self::Types(_) => ErrorCode::UNKNOWN,
        }
    }

    /// Human-readable message for [`Error::code`]
    pub fn message(&self) -> &'static str {
        self.code().message()
    }

    /// Response frame that carried a device error
    pub fn response(&self) -> Option<&Frame> {
        match self {
            Self::Device { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Check if the command may be worth sending again
    ///
    /// Only handshake failures qualify. A device error means the dispenser
    /// did process the command, so repeating it may move notes twice.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AckTimeout | Self::ResponseTimeout | Self::Transport(_))
    }

    /// Check if the dispenser reported the error
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::Device { .. })
    }
}
