//! Binary Object Store and Device Capability descriptors (component H).
//! Grounded on `original_source/numap/dev/billboard.py`'s `DCBillboard` and
//! `DCContainerId`; packed by hand since each capability has its own,
//! variable-length TLV body.

/// BOS descriptor header: `bLength=5, bDescriptorType=0x0F, wTotalLength,
/// bNumDeviceCaps`, followed by each capability's bytes.
#[derive(Debug, Clone, Default)]
pub struct Bos {
    pub capabilities: Vec<DeviceCapability>,
}

impl Bos {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cap: DeviceCapability) -> &mut Self {
        self.capabilities.push(cap);
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for cap in &self.capabilities {
            body.extend_from_slice(&cap.to_bytes());
        }
        let total_length = (5 + body.len()) as u16;
        let mut out = Vec::with_capacity(total_length as usize);
        out.push(5); // bLength
        out.push(0x0f); // bDescriptorType = BOS
        out.extend_from_slice(&total_length.to_le_bytes());
        out.push(self.capabilities.len() as u8);
        out.extend_from_slice(&body);
        out
    }
}

/// Device Capability Type codes (USB 3.2 table 9-14).
pub const DC_TYPE_WIRELESS_USB: u8 = 0x01;
pub const DC_TYPE_USB2_EXTENSION: u8 = 0x02;
pub const DC_TYPE_SUPERSPEED_USB: u8 = 0x03;
pub const DC_TYPE_CONTAINER_ID: u8 = 0x04;
pub const DC_TYPE_BILLBOARD: u8 = 0x0d;

/// One Billboard alternate-mode record: `(wSVID, bAlternateMode,
/// iAlternateModeString)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlternateMode {
    pub svid: u16,
    pub alternate_mode: u8,
    pub string_index: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCapability {
    ContainerId([u8; 16]),
    Usb2Extension { attributes: u32 },
    Billboard {
        additional_info_index: u8,
        preferred_alternate_mode: u8,
        vconn_power: u16,
        bm_configured: [u8; 16],
        alternate_modes: Vec<AlternateMode>,
    },
}

impl DeviceCapability {
    /// Serialize to a length-prefixed TLV:
    /// `bLength, bDescriptorType=0x10, bDevCapabilityType, body`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let (cap_type, body): (u8, Vec<u8>) = match self {
            DeviceCapability::ContainerId(id) => (DC_TYPE_CONTAINER_ID, {
                let mut b = vec![0u8]; // reserved
                b.extend_from_slice(id);
                b
            }),
            DeviceCapability::Usb2Extension { attributes } => {
                (DC_TYPE_USB2_EXTENSION, attributes.to_le_bytes().to_vec())
            }
            DeviceCapability::Billboard {
                additional_info_index,
                preferred_alternate_mode,
                vconn_power,
                bm_configured,
                alternate_modes,
            } => {
                // Layout exactly per USB Billboard rev 1.0 section 3.1.5.2:
                // iAdditionalInfoURL(1) bNumberOfAlternateModes(1)
                // bPreferredAlternateMode(1) VCONNPower(2 LE) bmConfigured(16)
                // reserved(4) then 4 bytes per mode.
                let mut b = Vec::new();
                b.push(*additional_info_index);
                b.push(alternate_modes.len() as u8);
                b.push(*preferred_alternate_mode);
                b.extend_from_slice(&vconn_power.to_le_bytes());
                b.extend_from_slice(bm_configured);
                b.extend_from_slice(&0u32.to_le_bytes());
                for mode in alternate_modes {
                    b.extend_from_slice(&mode.svid.to_le_bytes());
                    b.push(mode.alternate_mode);
                    b.push(mode.string_index);
                }
                (DC_TYPE_BILLBOARD, b)
            }
        };
        let b_length = (3 + body.len()) as u8;
        let mut out = Vec::with_capacity(b_length as usize);
        out.push(b_length);
        out.push(0x10); // bDescriptorType = DEVICE CAPABILITY
        out.push(cap_type);
        out.extend_from_slice(&body);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billboard_bos_matches_fixed_layout() {
        // Scenario S3: one ContainerID + one Billboard capability with a
        // single alternate mode.
        let mut bos = Bos::new();
        bos.push(DeviceCapability::ContainerId([0x55; 16]));
        bos.push(DeviceCapability::Billboard {
            additional_info_index: 4,
            preferred_alternate_mode: 0,
            vconn_power: 0x8000,
            bm_configured: [0xff; 16],
            alternate_modes: vec![AlternateMode {
                svid: 0x8312,
                alternate_mode: 0,
                string_index: 5,
            }],
        });
        let bytes = bos.to_bytes();
        assert_eq!(bytes[0], 5);
        assert_eq!(bytes[1], 0x0f);
        assert_eq!(bytes[4], 2); // bNumDeviceCaps

        // ContainerID cap: header(3) + reserved(1) + id(16) = 20 bytes,
        // starting right after the 5-byte BOS header.
        let container_cap = &bytes[5..5 + 20];
        assert_eq!(container_cap[0], 20);
        assert_eq!(container_cap[2], DC_TYPE_CONTAINER_ID);

        // Billboard cap starts right after the ContainerID cap (offset
        // 0x19 for this exact device assembly), and its body begins at
        // 0x1c, matching the spec'd fixed offset for the alternate-mode
        // record's preceding fields.
        let billboard_offset = 5 + 20;
        assert_eq!(billboard_offset, 0x19);
        let body_offset = billboard_offset + 3; // past the TLV header
        assert_eq!(body_offset, 0x1c);
        let mode_offset = body_offset + 1 + 1 + 1 + 2 + 16 + 4;
        assert_eq!(bytes[mode_offset], 0x12); // wSVID low byte of 0x8312
        assert_eq!(bytes[mode_offset + 1], 0x83); // wSVID high byte
    }

    #[test]
    fn bos_total_length_matches_actual_bytes() {
        let mut bos = Bos::new();
        bos.push(DeviceCapability::Usb2Extension { attributes: 0 });
        let bytes = bos.to_bytes();
        let total = u16::from_le_bytes([bytes[2], bytes[3]]) as usize;
        assert_eq!(total, bytes.len());
    }
}
