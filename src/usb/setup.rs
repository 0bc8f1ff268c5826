//! The 8-byte setup packet that begins every control transfer, plus the
//! request-log entry the emulation loop appends one of for every setup
//! packet it observes.
use std::time::Duration;

use super::types::{Direction, Recipient, RequestKind, StandardRequest};
use crate::error::{UsbError, UsbResult};

/// A decoded 8-byte USB setup packet, plus any data-stage payload already
/// collected for an OUT transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct SetupPacket {
    pub bm_request_type: u8,
    pub b_request: u8,
    pub w_value: u16,
    pub w_index: u16,
    pub w_length: u16,
    pub data: Option<Vec<u8>>,
}

impl SetupPacket {
    pub fn direction(&self) -> Direction {
        if self.bm_request_type & 0x80 != 0 {
            Direction::DeviceToHost
        } else {
            Direction::HostToDevice
        }
    }

    pub fn kind(&self) -> RequestKind {
        match (self.bm_request_type >> 5) & 0x03 {
            0 => RequestKind::Standard,
            1 => RequestKind::Class,
            2 => RequestKind::Vendor,
            _ => RequestKind::Reserved,
        }
    }

    pub fn recipient(&self) -> Recipient {
        match self.bm_request_type & 0x1f {
            0 => Recipient::Device,
            1 => Recipient::Interface,
            2 => Recipient::Endpoint,
            _ => Recipient::Other,
        }
    }

    pub fn standard_request(&self) -> StandardRequest {
        StandardRequest::from_u8(self.b_request)
    }

    /// High byte of wValue — the descriptor type for GET/SET_DESCRIPTOR.
    pub fn descriptor_type_byte(&self) -> u8 {
        (self.w_value >> 8) as u8
    }

    /// Low byte of wValue — the descriptor index for GET/SET_DESCRIPTOR.
    pub fn descriptor_index(&self) -> u8 {
        (self.w_value & 0x00ff) as u8
    }

    /// Parse a setup packet from the 8 raw bytes as they appear on the wire
    /// (little-endian wValue/wIndex/wLength).
    pub fn from_bytes(bytes: &[u8]) -> UsbResult<Self> {
        if bytes.len() != 8 {
            return Err(UsbError::MalformedSetupPacket);
        }
        Ok(Self {
            bm_request_type: bytes[0],
            b_request: bytes[1],
            w_value: u16::from_le_bytes([bytes[2], bytes[3]]),
            w_index: u16::from_le_bytes([bytes[4], bytes[5]]),
            w_length: u16::from_le_bytes([bytes[6], bytes[7]]),
            data: None,
        })
    }

    pub fn to_bytes(&self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[0] = self.bm_request_type;
        out[1] = self.b_request;
        out[2..4].copy_from_slice(&self.w_value.to_le_bytes());
        out[4..6].copy_from_slice(&self.w_index.to_le_bytes());
        out[6..8].copy_from_slice(&self.w_length.to_le_bytes());
        out
    }
}

/// What a handler returned for a dispatched request, captured in the log
/// after the handler runs.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    Data(Vec<u8>),
    NoData,
    Stall,
}

/// One append-only entry in the request log consumed by the fingerprint
/// harness (component K).
#[derive(Debug, Clone)]
pub struct RequestLogEntry {
    pub setup: SetupPacket,
    pub recipient: Recipient,
    pub request_number_string: String,
    pub descriptor_number_string: Option<String>,
    pub value: u16,
    pub outcome: Option<RequestOutcome>,
    pub elapsed: Duration,
}

impl RequestLogEntry {
    pub fn get_request_number_string(&self) -> &str {
        &self.request_number_string
    }

    pub fn get_descriptor_number_string(&self) -> Option<&str> {
        self.descriptor_number_string.as_deref()
    }
}
