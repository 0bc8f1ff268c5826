//! Vendor-specific Wi-Fi adapter templates, grounded on
//! `original_source/numap/dev/wifi_qualcomm.py` and `wifi_realtek.py`: both
//! answer every class and vendor request across the full 0..256 range with
//! an empty payload (the range-fill pattern of 4.G), differing only in
//! endpoint layout and device identity.
use crate::usb::device::Device;
use crate::usb::handlers::HandlerRegistry;
use crate::usb::interface::{AltSetting, Interface};
use crate::usb::types::{EndpointDirection, SyncType, TransferType, UsageType};
use crate::usb::{Configuration, Endpoint};

fn fill_vendor_stub(registry: &mut HandlerRegistry) {
    registry.fill_range(0x00..=0xff, "handle_unknown", || Box::new(|_setup| Ok(Some(Vec::new()))));
}

pub fn build_qualcomm() -> (Device, &'static str) {
    let mut device = Device::new(0x0cf3, 0x9271); // Qualcomm Atheros AR9271 802.11n
    device.device_class = 0xff;
    device.device_subclass = 0xff;
    device.device_protocol = 0xff;

    device.manufacturer_string_index = device.push_string("ATHEROS".into());
    device.product_string_index = device.push_string("USB2.0 WLAN".into());
    device.serial_string_index = device.push_string("12345".into());

    let mut alt0 = AltSetting::new(0xff, 0x00, 0x00, 0);
    for (number, direction, transfer_type, max_packet_size, interval) in [
        (1, EndpointDirection::Out, TransferType::Bulk, 0x200, 0),
        (2, EndpointDirection::In, TransferType::Bulk, 0x200, 0),
        (3, EndpointDirection::In, TransferType::Interrupt, 0x40, 1),
        (4, EndpointDirection::Out, TransferType::Interrupt, 0x40, 1),
        (5, EndpointDirection::Out, TransferType::Bulk, 0x200, 0),
        (6, EndpointDirection::Out, TransferType::Bulk, 0x200, 0),
    ] {
        alt0.endpoints.push(Endpoint::new(
            number,
            direction,
            transfer_type,
            SyncType::NoSync,
            UsageType::Data,
            max_packet_size,
            interval,
        ));
    }

    let mut iface = Interface::new(0, alt0);
    fill_vendor_stub(&mut iface.usb_class);
    iface.usb_vendor = Some(HandlerRegistry::new());
    fill_vendor_stub(iface.usb_vendor.as_mut().unwrap());

    let mut config = Configuration::new(1, 0, 0, 50);
    config.add_interface(iface);
    device.configurations.push(config);

    (device, "wifi_qualcomm")
}

pub fn build_realtek() -> (Device, &'static str) {
    let mut device = Device::new(0x0bda, 0x8812); // Realtek RTL8812AU 802.11a/b/g/n/ac
    device.device_class = 0x00;

    device.manufacturer_string_index = device.push_string("Realtek".into());
    device.product_string_index = device.push_string("802.11n NIC".into());
    device.serial_string_index = device.push_string("123456".into());

    let mut alt0 = AltSetting::new(0xff, 0xff, 0xff, 0);
    for (number, direction, transfer_type, max_packet_size, interval) in [
        (1, EndpointDirection::In, TransferType::Bulk, 0x200, 0),
        (2, EndpointDirection::Out, TransferType::Bulk, 0x200, 0),
        (3, EndpointDirection::Out, TransferType::Bulk, 0x200, 0),
        (4, EndpointDirection::Out, TransferType::Bulk, 0x200, 0),
        (5, EndpointDirection::In, TransferType::Interrupt, 0x40, 1),
    ] {
        alt0.endpoints.push(Endpoint::new(
            number,
            direction,
            transfer_type,
            SyncType::NoSync,
            UsageType::Data,
            max_packet_size,
            interval,
        ));
    }

    let mut iface = Interface::new(0, alt0);
    fill_vendor_stub(&mut iface.usb_class);
    // wifi_realtek.py names its vendor handler "USB FTDI vendor" (a
    // leftover copy-paste label in the original); the stub behavior is
    // identical so it is not worth preserving the mislabeling here.
    iface.usb_vendor = Some(HandlerRegistry::new());
    fill_vendor_stub(iface.usb_vendor.as_mut().unwrap());

    let mut config = Configuration::new(1, 0, 0, 50);
    config.add_interface(iface);
    device.configurations.push(config);

    (device, "wifi_realtek")
}

pub fn string_locations() -> &'static [(&'static str, usize)] {
    &[("manufacturer", 1), ("product", 2), ("serial", 3)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualcomm_variant_has_six_endpoints_and_full_range_vendor_stub() {
        let (device, name) = build_qualcomm();
        assert_eq!(name, "wifi_qualcomm");
        let iface = &device.configurations[0].interfaces[0];
        assert_eq!(iface.active_endpoints().len(), 6);
        assert!(iface.usb_vendor.as_ref().unwrap().has_handler(0xff));
    }

    #[test]
    fn realtek_variant_has_five_endpoints() {
        let (device, name) = build_realtek();
        assert_eq!(name, "wifi_realtek");
        assert_eq!(device.configurations[0].interfaces[0].active_endpoints().len(), 5);
    }
}
