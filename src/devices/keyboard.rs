//! Boot-protocol USB HID keyboard. No original Python template exists for
//! this one; it is grounded directly on [`crate::usb::hid`] and on the
//! generic interface/endpoint shape every other `numap` device template
//! uses.
use crate::usb::device::Device;
use crate::usb::handlers::HandlerRegistry;
use crate::usb::hid::{hid_functional_descriptor, HidDescriptorType, HidRequest, BOOT_KEYBOARD_REPORT_DESCRIPTOR};
use crate::usb::interface::{AltSetting, Interface};
use crate::usb::types::{DeviceClass, EndpointDirection, SyncType, TransferType, UsageType};
use crate::usb::{Configuration, Endpoint};

const VENDOR_ID: u16 = 0x413c; // Dell Inc.
const PRODUCT_ID: u16 = 0x2107; // KB216 Wired Keyboard

pub fn build() -> (Device, &'static str) {
    let mut device = Device::new(VENDOR_ID, PRODUCT_ID);
    device.device_class = DeviceClass::Unspecified as u8;

    device.manufacturer_string_index = device.push_string("Dell".into());
    device.product_string_index = device.push_string("Dell KB216 Wired Keyboard".into());
    device.serial_string_index = device.push_string("0001".into());

    let hid_descriptor = hid_functional_descriptor(BOOT_KEYBOARD_REPORT_DESCRIPTOR.len() as u16);
    let mut alt0 = AltSetting::new(DeviceClass::Hid as u8, 1, 1, 0); // boot subclass, keyboard protocol
    alt0.functional_descriptors = hid_descriptor.clone();
    alt0.endpoints.push(Endpoint::new(
        1,
        EndpointDirection::In,
        TransferType::Interrupt,
        SyncType::NoSync,
        UsageType::Data,
        8,
        10,
    ));
    let alt0 = alt0
        .with_class_descriptor(HidDescriptorType::Hid as u8, hid_descriptor)
        .with_class_descriptor(HidDescriptorType::Report as u8, BOOT_KEYBOARD_REPORT_DESCRIPTOR.to_vec());

    let mut iface = Interface::new(0, alt0);
    setup_handlers(&mut iface.usb_class);

    let mut config = Configuration::new(1, 0, 0, 50);
    config.add_interface(iface);
    device.configurations.push(config);

    (device, "keyboard")
}

fn setup_handlers(registry: &mut HandlerRegistry) {
    registry.inherit(
        HidRequest::GetReport as u8,
        "get_report",
        Box::new(|_setup| Ok(Some(vec![0u8; 8]))),
    );
    registry.inherit(HidRequest::GetIdle as u8, "get_idle", Box::new(|_setup| Ok(Some(vec![0]))));
    registry.inherit(
        HidRequest::GetProtocol as u8,
        "get_protocol",
        Box::new(|_setup| Ok(Some(vec![1]))), // report protocol
    );
    registry.inherit(HidRequest::SetIdle as u8, "set_idle", Box::new(|_setup| Ok(None)));
    registry.inherit(HidRequest::SetProtocol as u8, "set_protocol", Box::new(|_setup| Ok(None)));
    registry.inherit(HidRequest::SetReport as u8, "set_report", Box::new(|_setup| Ok(None)));
}

pub fn string_locations() -> &'static [(&'static str, usize)] {
    &[("manufacturer", 1), ("product", 2), ("serial", 3)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_keyboard_exposes_one_interrupt_in_endpoint() {
        let (device, name) = build();
        assert_eq!(name, "keyboard");
        let iface = &device.configurations[0].interfaces[0];
        assert_eq!(iface.active_endpoints().len(), 1);
        assert_eq!(iface.active_endpoints()[0].direction, EndpointDirection::In);
    }
}
