use std::error::Error;
use std::fmt;

/// Error taxonomy for the emulation core. Handler-level and codec-level
/// variants are always recovered by the dispatcher (STALL + log); only
/// [`UsbError::Transport`] is allowed to propagate out of the emulation loop.
#[derive(Debug, Clone, PartialEq)]
pub enum UsbError {
    /// A setup packet could not be parsed from the 8 bytes on the wire.
    MalformedSetupPacket,
    /// No standard/class/vendor handler matched the request.
    UnsupportedRequest { request: u8 },
    /// A class or vendor handler raised while producing its response.
    HandlerFailure { detail: String },
    /// A descriptor response exceeds the 0xFFFF wire length limit.
    DescriptorTooLong { actual: usize },
    /// The phy's I/O with the downstream controller failed.
    Transport(String),
    /// The CLI was given a device name or phy spec that does not exist.
    Configuration(String),
    /// The strings REPL was given data that violates a string's constraints.
    UserValidation(String),
}

impl fmt::Display for UsbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsbError::MalformedSetupPacket => write!(f, "malformed setup packet"),
            UsbError::UnsupportedRequest { request } => {
                write!(f, "unsupported request 0x{request:02x}")
            }
            UsbError::HandlerFailure { detail } => write!(f, "handler failed: {detail}"),
            UsbError::DescriptorTooLong { actual } => {
                write!(f, "descriptor response too long: {actual} bytes")
            }
            UsbError::Transport(msg) => write!(f, "transport error: {msg}"),
            UsbError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            UsbError::UserValidation(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl Error for UsbError {}

pub type UsbResult<T> = Result<T, UsbError>;
