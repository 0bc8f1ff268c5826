//! RNDIS (Microsoft's USB 802.3 Ethernet adapter protocol), grounded on
//! `original_source/numap/dev/rndis.py`'s `CCInterface`/`DCInterface`.
use crate::usb::device::Device;
use crate::usb::handlers::HandlerRegistry;
use crate::usb::interface::{AltSetting, Interface};
use crate::usb::types::{DeviceClass, EndpointDirection, SyncType, TransferType, UsageType};
use crate::usb::{Configuration, Endpoint};

const VENDOR_ID: u16 = 0x2001; // D-Link Corp.
const PRODUCT_ID: u16 = 0x4a00; // DUB-1312 Gigabit Ethernet Adapter

pub fn build() -> (Device, &'static str) {
    let mut device = Device::new(VENDOR_ID, PRODUCT_ID);
    device.device_class = DeviceClass::Cdc as u8;

    device.manufacturer_string_index = device.push_string("numap Inc.".into());
    device.product_string_index = device.push_string("numap RNDIS Network Interface".into());
    device.serial_string_index = device.push_string("0123456789-1337".into());

    // Communications Control interface: one interrupt IN notification
    // endpoint, vendor-protocol 0xff (rndis.py's `interface_protocol=0xff`).
    let mut cc_alt = AltSetting::new(0x02, 0x02, 0xff, 0);
    cc_alt.endpoints.push(Endpoint::new(
        1,
        EndpointDirection::In,
        TransferType::Bulk,
        SyncType::NoSync,
        UsageType::Data,
        8,
        1,
    ));
    let mut cc_iface = Interface::new(0, cc_alt);
    setup_handlers(&mut cc_iface.usb_class);

    // Data Control interface: bulk IN/OUT pair.
    let mut dc_alt = AltSetting::new(DeviceClass::CdcData as u8, 0x00, 0x00, 0);
    dc_alt.endpoints.push(Endpoint::new(
        2,
        EndpointDirection::In,
        TransferType::Bulk,
        SyncType::NoSync,
        UsageType::Data,
        64,
        0,
    ));
    dc_alt.endpoints.push(Endpoint::new(
        3,
        EndpointDirection::Out,
        TransferType::Bulk,
        SyncType::NoSync,
        UsageType::Data,
        64,
        0,
    ));
    let mut dc_iface = Interface::new(1, dc_alt);
    setup_handlers(&mut dc_iface.usb_class);

    let mut config = Configuration::new(1, 0, 0, 50);
    config.add_interface(cc_iface);
    config.add_interface(dc_iface);
    device.configurations.push(config);

    (device, "rndis")
}

/// RNDIS control messages (0x20 SEND_ENCAPSULATED_COMMAND, 0x21
/// GET_ENCAPSULATED_RESPONSE) are answered uniformly with an empty ACK, per
/// rndis.py's `handle_unknown` range-fill across 0x20..=0x22.
fn setup_handlers(registry: &mut HandlerRegistry) {
    registry.fill_range(0x20..=0x22, "handle_unknown", || Box::new(|_setup| Ok(Some(Vec::new()))));
}

pub fn string_locations() -> &'static [(&'static str, usize)] {
    &[("manufacturer", 1), ("product", 2), ("serial", 3)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cc_and_dc_interfaces_share_the_range_fill_handler_table() {
        let (device, name) = build();
        assert_eq!(name, "rndis");
        assert_eq!(device.configurations[0].interfaces.len(), 2);
        assert!(device.configurations[0].interfaces[0].usb_class.has_handler(0x20));
        assert!(device.configurations[0].interfaces[1].usb_class.has_handler(0x22));
    }
}
