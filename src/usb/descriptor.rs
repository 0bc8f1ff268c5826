//! Wire-format standard descriptors (component A — descriptor codec).
//! Fixed-size descriptors are packed with [`packed_struct`] exactly the way
//! the teacher crate encodes `DeviceDescriptor`; variable-length ones
//! (configuration, string) are assembled by hand into a `Vec<u8>` since
//! `packed_struct` cannot express a descriptor whose length depends on its
//! contents.
use packed_struct::prelude::*;

use crate::error::{UsbError, UsbResult};

/// The root descriptor of a device. Always 18 bytes.
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "18")]
pub struct DeviceDescriptor {
    #[packed_field(bytes = "0")]
    pub b_length: u8,
    #[packed_field(bytes = "1")]
    pub b_descriptor_type: u8,
    #[packed_field(bytes = "2..=3", endian = "lsb")]
    pub bcd_usb: Integer<u16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "4")]
    pub b_device_class: u8,
    #[packed_field(bytes = "5")]
    pub b_device_sub_class: u8,
    #[packed_field(bytes = "6")]
    pub b_device_protocol: u8,
    #[packed_field(bytes = "7")]
    pub b_max_packet_size_0: u8,
    #[packed_field(bytes = "8..=9", endian = "lsb")]
    pub id_vendor: Integer<u16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "10..=11", endian = "lsb")]
    pub id_product: Integer<u16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "12..=13", endian = "lsb")]
    pub bcd_device: Integer<u16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "14")]
    pub i_manufacturer: u8,
    #[packed_field(bytes = "15")]
    pub i_product: u8,
    #[packed_field(bytes = "16")]
    pub i_serial_number: u8,
    #[packed_field(bytes = "17")]
    pub b_num_configurations: u8,
}

impl DeviceDescriptor {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            b_length: 18,
            b_descriptor_type: 0x01,
            bcd_usb: Integer::from_primitive(0x0200),
            b_device_class: 0x00,
            b_device_sub_class: 0x00,
            b_device_protocol: 0x00,
            b_max_packet_size_0: 64,
            id_vendor: Integer::from_primitive(vendor_id),
            id_product: Integer::from_primitive(product_id),
            bcd_device: Integer::from_primitive(0x0100),
            i_manufacturer: 0,
            i_product: 0,
            i_serial_number: 0,
            b_num_configurations: 1,
        }
    }
}

/// Mirrors `DeviceDescriptor`'s fields for the speed the device is *not*
/// currently running at. Devices that are not high-speed capable stall
/// GET_DESCRIPTOR(DEVICE_QUALIFIER) instead of returning one.
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "10")]
pub struct DeviceQualifierDescriptor {
    #[packed_field(bytes = "0")]
    pub b_length: u8,
    #[packed_field(bytes = "1")]
    pub b_descriptor_type: u8,
    #[packed_field(bytes = "2..=3", endian = "lsb")]
    pub bcd_usb: Integer<u16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "4")]
    pub b_device_class: u8,
    #[packed_field(bytes = "5")]
    pub b_device_sub_class: u8,
    #[packed_field(bytes = "6")]
    pub b_device_protocol: u8,
    #[packed_field(bytes = "7")]
    pub b_max_packet_size_0: u8,
    #[packed_field(bytes = "8")]
    pub b_num_configurations: u8,
    #[packed_field(bytes = "9")]
    pub b_reserved: u8,
}

impl DeviceQualifierDescriptor {
    pub fn from_device(dev: &DeviceDescriptor) -> Self {
        Self {
            b_length: 10,
            b_descriptor_type: 0x06,
            bcd_usb: dev.bcd_usb,
            b_device_class: dev.b_device_class,
            b_device_sub_class: dev.b_device_sub_class,
            b_device_protocol: dev.b_device_protocol,
            b_max_packet_size_0: dev.b_max_packet_size_0,
            b_num_configurations: dev.b_num_configurations,
            b_reserved: 0,
        }
    }
}

#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "9")]
pub struct ConfigurationDescriptor {
    #[packed_field(bytes = "0")]
    pub b_length: u8,
    #[packed_field(bytes = "1")]
    pub b_descriptor_type: u8,
    #[packed_field(bytes = "2..=3", endian = "lsb")]
    pub w_total_length: Integer<u16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "4")]
    pub b_num_interfaces: u8,
    #[packed_field(bytes = "5")]
    pub b_configuration_value: u8,
    #[packed_field(bytes = "6")]
    pub i_configuration: u8,
    #[packed_field(bytes = "7")]
    pub bm_attributes: u8,
    #[packed_field(bytes = "8")]
    pub b_max_power: u8,
}

/// Bit 7 of bmAttributes is reserved and must read as 1 (USB 2.0 table 9-10).
pub const CONFIG_ATTR_RESERVED: u8 = 0x80;
pub const CONFIG_ATTR_SELF_POWERED: u8 = 0x40;
pub const CONFIG_ATTR_REMOTE_WAKEUP: u8 = 0x20;

impl ConfigurationDescriptor {
    pub fn new(index: u8, string_index: u8, num_interfaces: u8, attributes: u8, max_power: u8) -> Self {
        Self {
            b_length: 9,
            b_descriptor_type: 0x02,
            w_total_length: Integer::from_primitive(9),
            b_num_interfaces: num_interfaces,
            b_configuration_value: index,
            i_configuration: string_index,
            bm_attributes: attributes | CONFIG_ATTR_RESERVED,
            b_max_power: max_power,
        }
    }
}

#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "9")]
pub struct InterfaceDescriptor {
    #[packed_field(bytes = "0")]
    pub b_length: u8,
    #[packed_field(bytes = "1")]
    pub b_descriptor_type: u8,
    #[packed_field(bytes = "2")]
    pub b_interface_number: u8,
    #[packed_field(bytes = "3")]
    pub b_alternate_setting: u8,
    #[packed_field(bytes = "4")]
    pub b_num_endpoints: u8,
    #[packed_field(bytes = "5")]
    pub b_interface_class: u8,
    #[packed_field(bytes = "6")]
    pub b_interface_sub_class: u8,
    #[packed_field(bytes = "7")]
    pub b_interface_protocol: u8,
    #[packed_field(bytes = "8")]
    pub i_interface: u8,
}

impl InterfaceDescriptor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        interface_number: u8,
        alternate_setting: u8,
        num_endpoints: u8,
        class: u8,
        subclass: u8,
        protocol: u8,
        string_index: u8,
    ) -> Self {
        Self {
            b_length: 9,
            b_descriptor_type: 0x04,
            b_interface_number: interface_number,
            b_alternate_setting: alternate_setting,
            b_num_endpoints: num_endpoints,
            b_interface_class: class,
            b_interface_sub_class: subclass,
            b_interface_protocol: protocol,
            i_interface: string_index,
        }
    }
}

#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "7")]
pub struct EndpointDescriptor {
    #[packed_field(bytes = "0")]
    pub b_length: u8,
    #[packed_field(bytes = "1")]
    pub b_descriptor_type: u8,
    #[packed_field(bytes = "2")]
    pub b_endpoint_address: u8,
    #[packed_field(bytes = "3")]
    pub bm_attributes: u8,
    #[packed_field(bytes = "4..=5", endian = "lsb")]
    pub w_max_packet_size: Integer<u16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "6")]
    pub b_interval: u8,
}

impl EndpointDescriptor {
    pub fn new(address: u8, bm_attributes: u8, max_packet_size: u16, interval: u8) -> Self {
        Self {
            b_length: 7,
            b_descriptor_type: 0x05,
            b_endpoint_address: address,
            bm_attributes,
            w_max_packet_size: Integer::from_primitive(max_packet_size),
            b_interval: interval,
        }
    }
}

/// A string table slot. Index 0 holds the LANGID list; any other index
/// holds either text (encoded to UTF-16LE on the wire) or an opaque byte
/// payload written through verbatim (used by the REPL's "hex input" mode).
#[derive(Debug, Clone, PartialEq)]
pub enum StringSlot {
    LangIds(Vec<u16>),
    Text(String),
    Bytes(Vec<u8>),
}

impl StringSlot {
    /// Encode this slot to a standard STRING descriptor:
    /// `bLength, bDescriptorType=0x03, payload`.
    pub fn to_descriptor_bytes(&self) -> UsbResult<Vec<u8>> {
        let payload: Vec<u8> = match self {
            StringSlot::LangIds(ids) => ids.iter().flat_map(|id| id.to_le_bytes()).collect(),
            StringSlot::Text(text) => {
                let encoded = encode_utf16le(text);
                if encoded.len() > 255 {
                    return Err(UsbError::UserValidation(format!(
                        "string encodes to {} bytes, exceeding the 255-byte STRING descriptor limit",
                        encoded.len()
                    )));
                }
                encoded
            }
            StringSlot::Bytes(bytes) => {
                if bytes.len() > 255 {
                    return Err(UsbError::UserValidation(format!(
                        "raw string payload is {} bytes, exceeding the 255-byte STRING descriptor limit",
                        bytes.len()
                    )));
                }
                bytes.clone()
            }
        };
        let b_length = payload.len() + 2;
        if b_length > 255 {
            return Err(UsbError::DescriptorTooLong { actual: b_length });
        }
        let mut out = Vec::with_capacity(b_length);
        out.push(b_length as u8);
        out.push(0x03);
        out.extend_from_slice(&payload);
        Ok(out)
    }
}

impl From<&str> for StringSlot {
    fn from(value: &str) -> Self {
        StringSlot::Text(value.to_string())
    }
}

impl From<String> for StringSlot {
    fn from(value: String) -> Self {
        StringSlot::Text(value)
    }
}

impl From<Vec<u8>> for StringSlot {
    fn from(value: Vec<u8>) -> Self {
        StringSlot::Bytes(value)
    }
}

/// Encode `text` to UTF-16LE, the wire encoding for STRING descriptor
/// payloads (property 4, "string round-trip", requires this to be exact
/// for arbitrary printable text).
pub fn encode_utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}

/// Truncate a descriptor response to `min(wLength, real_len)`, per property
/// 6 ("Truncation").
pub fn truncate_to_requested(data: Vec<u8>, w_length: u16) -> Vec<u8> {
    let limit = w_length as usize;
    if data.len() > limit {
        data[..limit].to_vec()
    } else {
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_descriptor_is_18_bytes() {
        let desc = DeviceDescriptor::new(0x1234, 0x5678);
        assert_eq!(desc.pack_to_vec().unwrap().len(), 18);
    }

    #[test]
    fn string_round_trip_any_length() {
        for len in [0usize, 1, 32, 127] {
            let bytes = vec![0x41u8; len];
            let slot = StringSlot::Bytes(bytes.clone());
            let encoded = slot.to_descriptor_bytes().unwrap();
            assert_eq!(encoded[0] as usize, len + 2);
            assert_eq!(encoded[1], 0x03);
            assert_eq!(&encoded[2..], bytes.as_slice());
        }
    }

    #[test]
    fn string_over_255_bytes_rejected() {
        let slot = StringSlot::Bytes(vec![0u8; 256]);
        assert!(slot.to_descriptor_bytes().is_err());
    }

    #[test]
    fn truncation_never_exceeds_requested_length() {
        let data = vec![0u8; 64];
        assert_eq!(truncate_to_requested(data.clone(), 18).len(), 18);
        assert_eq!(truncate_to_requested(data.clone(), 128).len(), 64);
    }
}
