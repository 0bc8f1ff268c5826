//! Vendor-specific Bluetooth dongle template. SPEC_FULL.md names this
//! device alongside the Wi-Fi adapters but no original_source/ file covers
//! it; grounded on the same vendor-class full-range-fill shape used by
//! [`super::wifi`] (itself grounded on `wifi_qualcomm.py`/`wifi_realtek.py`),
//! with the Bluetooth-specific class/subclass/protocol and endpoint layout
//! of a generic USB-BT 2.0+EDR HCI adapter (interrupt event, bulk ACL in/out,
//! isochronous SCO).
use crate::usb::device::Device;
use crate::usb::handlers::HandlerRegistry;
use crate::usb::interface::{AltSetting, Interface};
use crate::usb::types::{EndpointDirection, SyncType, TransferType, UsageType};
use crate::usb::{Configuration, Endpoint};

const VENDOR_ID: u16 = 0x0a12; // Cambridge Silicon Radio
const PRODUCT_ID: u16 = 0x0001; // Bluetooth Dongle (HCI mode)
const WIRELESS_CONTROLLER_CLASS: u8 = 0xe0;
const BLUETOOTH_SUBCLASS: u8 = 0x01;
const BLUETOOTH_PROTOCOL: u8 = 0x01;

pub fn build() -> (Device, &'static str) {
    let mut device = Device::new(VENDOR_ID, PRODUCT_ID);
    device.device_class = WIRELESS_CONTROLLER_CLASS;
    device.device_subclass = BLUETOOTH_SUBCLASS;
    device.device_protocol = BLUETOOTH_PROTOCOL;

    device.manufacturer_string_index = device.push_string("Cambridge Silicon Radio".into());
    device.product_string_index = device.push_string("Bluetooth Dongle".into());
    device.serial_string_index = device.push_string("0123456789".into());

    let mut alt0 = AltSetting::new(WIRELESS_CONTROLLER_CLASS, BLUETOOTH_SUBCLASS, BLUETOOTH_PROTOCOL, 0);
    for (number, direction, transfer_type, max_packet_size, interval) in [
        (1, EndpointDirection::In, TransferType::Interrupt, 16, 1),
        (2, EndpointDirection::Out, TransferType::Bulk, 64, 0),
        (2, EndpointDirection::In, TransferType::Bulk, 64, 0),
        (3, EndpointDirection::Out, TransferType::Isochronous, 49, 1),
        (3, EndpointDirection::In, TransferType::Isochronous, 49, 1),
    ] {
        alt0.endpoints.push(Endpoint::new(
            number,
            direction,
            transfer_type,
            SyncType::Adaptive,
            UsageType::Data,
            max_packet_size,
            interval,
        ));
    }

    let mut iface = Interface::new(0, alt0);
    iface.usb_vendor = Some(HandlerRegistry::new());
    iface
        .usb_vendor
        .as_mut()
        .unwrap()
        .fill_range(0x00..=0xff, "handle_unknown", || Box::new(|_setup| Ok(Some(Vec::new()))));

    let mut config = Configuration::new(1, 0, 0, 50);
    config.add_interface(iface);
    device.configurations.push(config);

    (device, "bluetooth")
}

pub fn string_locations() -> &'static [(&'static str, usize)] {
    &[("manufacturer", 1), ("product", 2), ("serial", 3)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bluetooth_device_has_hci_transport_endpoints_and_vendor_stub() {
        let (device, name) = build();
        assert_eq!(name, "bluetooth");
        let iface = &device.configurations[0].interfaces[0];
        assert_eq!(iface.active_endpoints().len(), 5);
        assert!(iface.usb_vendor.as_ref().unwrap().has_handler(0x00));
        assert!(iface.usb_vendor.as_ref().unwrap().has_handler(0xff));
    }
}
