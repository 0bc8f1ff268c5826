//! USB Billboard device (alternate-mode capability advertisement), grounded
//! on `original_source/numap/dev/billboard.py`'s `USBBillboardDevice` and
//! `DCBillboard`.
use crate::usb::bos::{AlternateMode, Bos, DeviceCapability};
use crate::usb::device::Device;
use crate::usb::interface::{AltSetting, Interface};
use crate::usb::Configuration;

const VENDOR_ID: u16 = 0x8312;
const PRODUCT_ID: u16 = 0x8312;

pub fn build() -> (Device, &'static str) {
    let mut device = Device::new(VENDOR_ID, PRODUCT_ID);
    device.device_class = 0x11; // Billboard
    device.usb_spec_version = 0x0210;
    device.max_packet_size_ep0 = 64;

    device.manufacturer_string_index = device.push_string("numap Inc.".into());
    device.product_string_index = device.push_string("numap Billboard".into());
    device.serial_string_index = device.push_string("UMAP2-BILL-0123".into());
    let additional_info_index = device.push_string("https://additional.info/numap".into());
    let alt_mode_string_index = device.push_string("alternate_mode_0".into());

    let alt0 = AltSetting::new(0, 0, 0, 0);
    let iface = Interface::new(0, alt0);

    let mut config = Configuration::new(1, 0, 0xc0, 0xfa);
    config.add_interface(iface);
    device.configurations.push(config);

    let mut container_id = [0u8; 16];
    container_id[..15].copy_from_slice(b"UMAP2-BILL-1234");

    let mut bos = Bos::new();
    bos.push(DeviceCapability::ContainerId(container_id));
    bos.push(DeviceCapability::Billboard {
        additional_info_index,
        preferred_alternate_mode: 0,
        vconn_power: 0x8000,
        bm_configured: [0xff; 16],
        alternate_modes: vec![AlternateMode {
            svid: VENDOR_ID,
            alternate_mode: 0,
            string_index: alt_mode_string_index,
        }],
    });
    device.bos = Some(bos);

    (device, "billboard")
}

pub fn string_locations() -> &'static [(&'static str, usize)] {
    &[
        ("manufacturer", 1),
        ("product", 2),
        ("serial", 3),
        ("billboard_url", 4),
        ("alternate_mode_name", 5),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billboard_device_carries_a_bos_with_two_capabilities() {
        let (device, name) = build();
        assert_eq!(name, "billboard");
        let bos = device.bos.as_ref().expect("billboard device must have a BOS");
        assert_eq!(bos.capabilities.len(), 2);
    }
}
