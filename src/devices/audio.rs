//! USB Audio Class 1 device stub. No original Python template exists for
//! this one either; grounded on the generic `AltSetting`/`HandlerRegistry`
//! shape and on the fingerprint rule that needs it ("Set Audio Properties",
//! `fingerprints.py`'s class-request-1/4 check).
use crate::usb::device::Device;
use crate::usb::handlers::HandlerRegistry;
use crate::usb::interface::{AltSetting, Interface};
use crate::usb::types::DeviceClass;
use crate::usb::Configuration;

const VENDOR_ID: u16 = 0x046d; // Logitech
const PRODUCT_ID: u16 = 0x0a01; // USB Headset

/// UAC1 Audio Class-Specific Request Codes (UAC1 spec, table A-9).
const UAC_SET_CUR: u8 = 0x01;
const UAC_SET_RES: u8 = 0x04;

pub fn build() -> (Device, &'static str) {
    let mut device = Device::new(VENDOR_ID, PRODUCT_ID);
    device.device_class = DeviceClass::Unspecified as u8;

    device.manufacturer_string_index = device.push_string("Logitech".into());
    device.product_string_index = device.push_string("Logitech USB Headset".into());
    device.serial_string_index = device.push_string("00000001".into());

    // AudioControl interface: class 1 (Audio), subclass 1 (AudioControl),
    // no endpoints of its own — volume/mute live behind class requests.
    let alt0 = AltSetting::new(DeviceClass::Audio as u8, 0x01, 0x00, 0);
    let mut iface = Interface::new(0, alt0);
    setup_handlers(&mut iface.usb_class);

    let mut config = Configuration::new(1, 0, 0, 50);
    config.add_interface(iface);
    device.configurations.push(config);

    (device, "audio")
}

fn setup_handlers(registry: &mut HandlerRegistry) {
    registry.inherit(UAC_SET_CUR, "set_cur", Box::new(|_setup| Ok(None)));
    registry.inherit(UAC_SET_RES, "set_res", Box::new(|_setup| Ok(None)));
}

pub fn string_locations() -> &'static [(&'static str, usize)] {
    &[("manufacturer", 1), ("product", 2), ("serial", 3)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_control_interface_answers_set_cur_and_set_res() {
        let (mut device, name) = build();
        assert_eq!(name, "audio");
        let iface = &mut device.configurations[0].interfaces[0];
        let setup = crate::usb::setup::SetupPacket {
            bm_request_type: 0x21,
            b_request: UAC_SET_CUR,
            w_value: 0,
            w_index: 0,
            w_length: 0,
            data: None,
        };
        let result = iface.usb_class.dispatch(UAC_SET_CUR, &setup);
        assert_eq!(result.unwrap().unwrap(), None);
    }
}
