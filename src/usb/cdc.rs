//! CDC (Communications Device Class) functional descriptors and the
//! Abstract Control Model (ACM) class requests used by the CDC-ACM and
//! RNDIS device templates.
use packed_struct::prelude::*;

pub const CDC_SUBCLASS_ACM: u8 = 0x02;
pub const CDC_SUBCLASS_ETHERNET: u8 = 0x06;
pub const CDC_PROTOCOL_AT_COMMANDS: u8 = 0x01;

/// ACM class-specific requests (bRequest on the CDC control interface).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AcmRequest {
    SetLineCoding = 0x20,
    GetLineCoding = 0x21,
    SetControlLineState = 0x22,
}

#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "5")]
pub struct HeaderFunctionalDescriptor {
    #[packed_field(bytes = "0")]
    pub b_function_length: u8,
    #[packed_field(bytes = "1")]
    pub b_descriptor_type: u8,
    #[packed_field(bytes = "2")]
    pub b_descriptor_subtype: u8,
    #[packed_field(bytes = "3..=4", endian = "lsb")]
    pub bcd_cdc: Integer<u16, packed_bits::Bits<16>>,
}

impl HeaderFunctionalDescriptor {
    pub fn new() -> Self {
        Self {
            b_function_length: 5,
            b_descriptor_type: 0x24, // CS_INTERFACE
            b_descriptor_subtype: 0x00,
            bcd_cdc: Integer::from_primitive(0x0110),
        }
    }
}

impl Default for HeaderFunctionalDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "4")]
pub struct AbstractControlManagementFunctionalDescriptor {
    #[packed_field(bytes = "0")]
    pub b_function_length: u8,
    #[packed_field(bytes = "1")]
    pub b_descriptor_type: u8,
    #[packed_field(bytes = "2")]
    pub b_descriptor_subtype: u8,
    #[packed_field(bytes = "3")]
    pub bm_capabilities: u8,
}

impl AbstractControlManagementFunctionalDescriptor {
    pub fn new(bm_capabilities: u8) -> Self {
        Self {
            b_function_length: 4,
            b_descriptor_type: 0x24,
            b_descriptor_subtype: 0x02,
            bm_capabilities,
        }
    }
}

#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "5")]
pub struct UnionFunctionalDescriptor {
    #[packed_field(bytes = "0")]
    pub b_function_length: u8,
    #[packed_field(bytes = "1")]
    pub b_descriptor_type: u8,
    #[packed_field(bytes = "2")]
    pub b_descriptor_subtype: u8,
    #[packed_field(bytes = "3")]
    pub b_master_interface: u8,
    #[packed_field(bytes = "4")]
    pub b_slave_interface0: u8,
}

impl UnionFunctionalDescriptor {
    pub fn new(master_interface: u8, slave_interface: u8) -> Self {
        Self {
            b_function_length: 5,
            b_descriptor_type: 0x24,
            b_descriptor_subtype: 0x06,
            b_master_interface: master_interface,
            b_slave_interface0: slave_interface,
        }
    }
}

#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "5")]
pub struct CallManagementFunctionalDescriptor {
    #[packed_field(bytes = "0")]
    pub b_function_length: u8,
    #[packed_field(bytes = "1")]
    pub b_descriptor_type: u8,
    #[packed_field(bytes = "2")]
    pub b_descriptor_subtype: u8,
    #[packed_field(bytes = "3")]
    pub bm_capabilities: u8,
    #[packed_field(bytes = "4")]
    pub b_data_interface: u8,
}

impl CallManagementFunctionalDescriptor {
    pub fn new(bm_capabilities: u8, data_interface: u8) -> Self {
        Self {
            b_function_length: 5,
            b_descriptor_type: 0x24,
            b_descriptor_subtype: 0x01,
            bm_capabilities,
            b_data_interface: data_interface,
        }
    }
}

/// Assembles the Header + Call Management + ACM + Union functional
/// descriptors in the order real CDC-ACM devices present them, ready to be
/// appended to the control interface's `functional_descriptors`.
pub fn cdc_acm_functional_descriptors(control_interface: u8, data_interface: u8) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&packed_struct::PackedStructSlice::pack_to_vec(&HeaderFunctionalDescriptor::new()).unwrap());
    out.extend_from_slice(
        &packed_struct::PackedStructSlice::pack_to_vec(&CallManagementFunctionalDescriptor::new(0x01, data_interface))
            .unwrap(),
    );
    out.extend_from_slice(
        &packed_struct::PackedStructSlice::pack_to_vec(&AbstractControlManagementFunctionalDescriptor::new(0x06))
            .unwrap(),
    );
    out.extend_from_slice(
        &packed_struct::PackedStructSlice::pack_to_vec(&UnionFunctionalDescriptor::new(
            control_interface,
            data_interface,
        ))
        .unwrap(),
    );
    out
}

/// SET_LINE_CODING / GET_LINE_CODING payload (dwDTERate, bCharFormat,
/// bParityType, bDataBits).
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "7")]
pub struct LineCoding {
    #[packed_field(bytes = "0..=3", endian = "lsb")]
    pub dw_dte_rate: Integer<u32, packed_bits::Bits<32>>,
    #[packed_field(bytes = "4")]
    pub b_char_format: u8,
    #[packed_field(bytes = "5")]
    pub b_parity_type: u8,
    #[packed_field(bytes = "6")]
    pub b_data_bits: u8,
}

impl LineCoding {
    pub fn new(baud_rate: u32) -> Self {
        Self {
            dw_dte_rate: Integer::from_primitive(baud_rate),
            b_char_format: 0,
            b_parity_type: 0,
            b_data_bits: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acm_functional_descriptors_concatenate_in_presentation_order() {
        let bytes = cdc_acm_functional_descriptors(0, 1);
        assert_eq!(bytes.len(), 5 + 5 + 4 + 5);
        assert_eq!(bytes[2], 0x00); // Header subtype
        assert_eq!(bytes[5 + 2], 0x01); // Call Management subtype
        assert_eq!(bytes[5 + 5 + 2], 0x02); // ACM subtype
        assert_eq!(bytes[5 + 5 + 4 + 2], 0x06); // Union subtype
    }

    #[test]
    fn line_coding_round_trips_through_packed_struct() {
        let lc = LineCoding::new(115200);
        let bytes = packed_struct::PackedStructSlice::pack_to_vec(&lc).unwrap();
        let parsed = LineCoding::unpack_from_slice(&bytes).unwrap();
        assert_eq!(parsed.dw_dte_rate, lc.dw_dte_rate);
    }
}
