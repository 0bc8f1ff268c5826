//! SCSI command sub-dispatcher for bulk-only mass storage, built in the
//! same shape as the class/vendor `HandlerRegistry` (4.G) but keyed by SCSI
//! opcode instead of USB request number, and fed Command Block Wrapper
//! bytes arriving on the bulk OUT endpoint instead of setup packets. The
//! CBW/CSW layout and opcode set are grounded on
//! `pdh11-cotton/cotton-usb-host/src/device/mass_storage/mass_storage_interface.rs`
//! and `scsi_device.rs` (host-side, but describing the same wire format).
use std::collections::HashMap;

use packed_struct::prelude::*;

use crate::error::UsbResult;

pub const CBW_SIGNATURE: u32 = 0x4342_5355; // "USBC"
pub const CSW_SIGNATURE: u32 = 0x5342_5355; // "USBS"

#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "31")]
pub struct CommandBlockWrapper {
    #[packed_field(bytes = "0..=3", endian = "lsb")]
    pub d_cbw_signature: Integer<u32, packed_bits::Bits<32>>,
    #[packed_field(bytes = "4..=7", endian = "lsb")]
    pub d_cbw_tag: Integer<u32, packed_bits::Bits<32>>,
    #[packed_field(bytes = "8..=11", endian = "lsb")]
    pub d_cbw_data_transfer_length: Integer<u32, packed_bits::Bits<32>>,
    #[packed_field(bytes = "12")]
    pub bm_cbw_flags: u8,
    #[packed_field(bytes = "13")]
    pub b_cbw_lun: u8,
    #[packed_field(bytes = "14")]
    pub b_cbw_cb_length: u8,
    #[packed_field(bytes = "15..=30")]
    pub cbwcb: [u8; 16],
}

#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "13")]
pub struct CommandStatusWrapper {
    #[packed_field(bytes = "0..=3", endian = "lsb")]
    pub d_csw_signature: Integer<u32, packed_bits::Bits<32>>,
    #[packed_field(bytes = "4..=7", endian = "lsb")]
    pub d_csw_tag: Integer<u32, packed_bits::Bits<32>>,
    #[packed_field(bytes = "8..=11", endian = "lsb")]
    pub d_csw_data_residue: Integer<u32, packed_bits::Bits<32>>,
    #[packed_field(bytes = "12")]
    pub b_csw_status: u8,
}

impl CommandStatusWrapper {
    pub fn ok(tag: u32) -> Self {
        Self {
            d_csw_signature: Integer::from_primitive(CSW_SIGNATURE),
            d_csw_tag: Integer::from_primitive(tag),
            d_csw_data_residue: Integer::from_primitive(0),
            b_csw_status: 0,
        }
    }

    pub fn failed(tag: u32) -> Self {
        Self {
            d_csw_signature: Integer::from_primitive(CSW_SIGNATURE),
            d_csw_tag: Integer::from_primitive(tag),
            d_csw_data_residue: Integer::from_primitive(0),
            b_csw_status: 1,
        }
    }
}

/// SCSI primary/block command opcodes this sub-dispatcher answers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ScsiOpcode {
    TestUnitReady = 0x00,
    RequestSense = 0x03,
    Inquiry = 0x12,
    ModeSense6 = 0x1a,
    ReadCapacity10 = 0x25,
    Read10 = 0x28,
    Write10 = 0x2a,
}

impl ScsiOpcode {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x00 => Some(Self::TestUnitReady),
            0x03 => Some(Self::RequestSense),
            0x12 => Some(Self::Inquiry),
            0x1a => Some(Self::ModeSense6),
            0x25 => Some(Self::ReadCapacity10),
            0x28 => Some(Self::Read10),
            0x2a => Some(Self::Write10),
            _ => None,
        }
    }
}

pub type ScsiHandlerFn = Box<dyn FnMut(&CommandBlockWrapper) -> UsbResult<Vec<u8>>>;

/// Opcode-keyed handler table, mirroring `HandlerRegistry`'s local-over-
/// inherited precedence so device templates can override one SCSI command
/// (e.g. a custom INQUIRY vendor string) while keeping the stock responses
/// for the rest.
#[derive(Default)]
pub struct ScsiRegistry {
    inherited: HashMap<u8, ScsiHandlerFn>,
    local: HashMap<u8, ScsiHandlerFn>,
}

impl ScsiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inherit(&mut self, opcode: ScsiOpcode, handler: ScsiHandlerFn) -> &mut Self {
        self.inherited.insert(opcode as u8, handler);
        self
    }

    pub fn set_local(&mut self, opcode: ScsiOpcode, handler: ScsiHandlerFn) -> &mut Self {
        self.local.insert(opcode as u8, handler);
        self
    }

    /// Execute the CBW against the effective table, producing the CSW and
    /// any data-in payload. Unrecognized opcodes fail the command rather
    /// than stalling the endpoint, per bulk-only transport semantics.
    pub fn execute(&mut self, cbw: &CommandBlockWrapper) -> (CommandStatusWrapper, Vec<u8>) {
        let opcode = cbw.cbwcb[0];
        let tag: u32 = cbw.d_cbw_tag.into();
        let handler = self.local.get_mut(&opcode).or_else(|| self.inherited.get_mut(&opcode));
        match handler {
            Some(handler) => match handler(cbw) {
                Ok(data) => (CommandStatusWrapper::ok(tag), data),
                Err(_) => (CommandStatusWrapper::failed(tag), Vec::new()),
            },
            None => (CommandStatusWrapper::failed(tag), Vec::new()),
        }
    }
}

/// Default INQUIRY response: 36 bytes, Direct Access Block device,
/// removable, SCSI-2 compliant.
pub fn stock_inquiry_response(vendor: &str, product: &str, revision: &str) -> Vec<u8> {
    let mut out = vec![0u8; 36];
    out[0] = 0x00; // peripheral device type: direct access block device
    out[1] = 0x80; // removable
    out[2] = 0x04; // version: SCSI-2
    out[3] = 0x02; // response data format
    out[4] = 31; // additional length
    pad_ascii(&mut out[8..16], vendor);
    pad_ascii(&mut out[16..32], product);
    pad_ascii(&mut out[32..36], revision);
    out
}

/// 8-byte READ CAPACITY(10) response: last LBA, block size, big-endian.
pub fn stock_read_capacity10_response(last_lba: u32, block_size: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(8);
    out.extend_from_slice(&last_lba.to_be_bytes());
    out.extend_from_slice(&block_size.to_be_bytes());
    out
}

fn pad_ascii(slot: &mut [u8], text: &str) {
    let bytes = text.as_bytes();
    for (i, byte) in slot.iter_mut().enumerate() {
        *byte = bytes.get(i).copied().unwrap_or(b' ');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cbw_with_opcode(opcode: u8, tag: u32) -> CommandBlockWrapper {
        let mut cbwcb = [0u8; 16];
        cbwcb[0] = opcode;
        CommandBlockWrapper {
            d_cbw_signature: Integer::from_primitive(CBW_SIGNATURE),
            d_cbw_tag: Integer::from_primitive(tag),
            d_cbw_data_transfer_length: Integer::from_primitive(36),
            bm_cbw_flags: 0x80,
            b_cbw_lun: 0,
            b_cbw_cb_length: 6,
            cbwcb,
        }
    }

    #[test]
    fn local_handler_overrides_inherited_for_same_opcode() {
        let mut reg = ScsiRegistry::new();
        reg.inherit(ScsiOpcode::Inquiry, Box::new(|_cbw| Ok(vec![0xaa])));
        reg.set_local(ScsiOpcode::Inquiry, Box::new(|_cbw| Ok(vec![0xbb])));

        let cbw = cbw_with_opcode(ScsiOpcode::Inquiry as u8, 7);
        let (csw, data) = reg.execute(&cbw);
        assert_eq!(data, vec![0xbb]);
        assert_eq!(csw.b_csw_status, 0);
        let tag: u32 = csw.d_csw_tag.into();
        assert_eq!(tag, 7);
    }

    #[test]
    fn unrecognized_opcode_fails_the_command() {
        let mut reg = ScsiRegistry::new();
        let cbw = cbw_with_opcode(0xff, 3);
        let (csw, data) = reg.execute(&cbw);
        assert_eq!(csw.b_csw_status, 1);
        assert!(data.is_empty());
    }

    #[test]
    fn stock_inquiry_response_is_36_bytes_and_carries_vendor_string() {
        let resp = stock_inquiry_response("usbmimic", "MassStor", "1.0 ");
        assert_eq!(resp.len(), 36);
        assert_eq!(&resp[8..16], b"usbmimic");
    }
}
