//! HID class-specific descriptor (component C's "functional descriptors")
//! and the GET_DESCRIPTOR(HID)/GET_DESCRIPTOR(REPORT) class requests the
//! keyboard device template answers over endpoint 0.
//! https://www.usb.org/sites/default/files/hid1_11.pdf
use packed_struct::prelude::*;

#[derive(PrimitiveEnum_u8, Debug, Copy, Clone, PartialEq, Eq)]
pub enum HidDescriptorType {
    Hid = 0x21,
    Report = 0x22,
    Physical = 0x23,
}

/// HID class-specific request codes (bRequest on the interface-class
/// recipient), registered into the interface's `usb_class` handler table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HidRequest {
    GetReport = 0x01,
    GetIdle = 0x02,
    GetProtocol = 0x03,
    SetReport = 0x09,
    SetIdle = 0x0a,
    SetProtocol = 0x0b,
}

#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "6")]
pub struct HidDescriptor {
    #[packed_field(bytes = "0")]
    pub b_length: u8,
    #[packed_field(bytes = "1")]
    pub b_descriptor_type: u8,
    #[packed_field(bytes = "2..=3", endian = "lsb")]
    pub bcd_hid: Integer<u16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "4")]
    pub b_country_code: u8,
    #[packed_field(bytes = "5")]
    pub b_num_descriptors: u8,
}

/// Builds the HID functional descriptor bytes for a single Report
/// descriptor of `report_descriptor_len` bytes, ready to be appended to an
/// `AltSetting`'s `functional_descriptors` between the INTERFACE descriptor
/// and the endpoint descriptors.
pub fn hid_functional_descriptor(report_descriptor_len: u16) -> Vec<u8> {
    let header = HidDescriptor {
        b_length: 9,
        b_descriptor_type: HidDescriptorType::Hid as u8,
        bcd_hid: Integer::from_primitive(0x0111),
        b_country_code: 0,
        b_num_descriptors: 1,
    };
    let mut out = packed_struct::PackedStructSlice::pack_to_vec(&header).unwrap();
    out.push(HidDescriptorType::Report as u8);
    out.extend_from_slice(&report_descriptor_len.to_le_bytes());
    out
}

/// The fixed 8-scancode boot keyboard report descriptor (modifier byte,
/// reserved byte, 6 scancode bytes), used by the keyboard device template.
pub const BOOT_KEYBOARD_REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xa1, 0x01, // Collection (Application)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0xe0, //   Usage Minimum (224)
    0x29, 0xe7, //   Usage Maximum (231)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute) ; modifier byte
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant) ; reserved byte
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x65, //   Logical Maximum (101)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0x65, //   Usage Maximum (101)
    0x81, 0x00, //   Input (Data, Array) ; scancodes
    0xc0, // End Collection
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn functional_descriptor_embeds_report_length() {
        let bytes = hid_functional_descriptor(BOOT_KEYBOARD_REPORT_DESCRIPTOR.len() as u16);
        assert_eq!(bytes.len(), 9);
        assert_eq!(bytes[0], 9);
        assert_eq!(bytes[1], HidDescriptorType::Hid as u8);
        let declared_len = u16::from_le_bytes([bytes[7], bytes[8]]);
        assert_eq!(declared_len as usize, BOOT_KEYBOARD_REPORT_DESCRIPTOR.len());
    }
}
