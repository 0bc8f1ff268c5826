//! CDC Network Control Model device, grounded on
//! `original_source/numap/dev/cdc_ncm.py`'s `USBCdcNcmDevice`.
use crate::usb::cdc::{CallManagementFunctionalDescriptor, HeaderFunctionalDescriptor, UnionFunctionalDescriptor};
use crate::usb::device::Device;
use crate::usb::interface::{AltSetting, Interface};
use crate::usb::types::{DeviceClass, EndpointDirection, SyncType, TransferType, UsageType};
use crate::usb::{Configuration, Endpoint};

const VENDOR_ID: u16 = 0x2548;
const PRODUCT_ID: u16 = 0x1001;
const CDC_SUBCLASS_NCM: u8 = 0x0d;
const CDC_PROTOCOL_NONE: u8 = 0x00;
const DATA_PROTOCOL_NCM: u8 = 0x01;
const COMM_INTERFACE: u8 = 0;
const DATA_INTERFACE: u8 = 1;

/// NCM Functional Descriptor (NCM10 table 6-2): bcdNcmVersion +
/// bmNetworkCapabilities.
fn ncm_functional_descriptor() -> Vec<u8> {
    vec![6, 0x24, 0x1a, 0x00, 0x01, 0xff]
}

fn ethernet_networking_functional_descriptor(mac_string_index: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(13);
    out.push(13);
    out.push(0x24);
    out.push(0x0f);
    out.push(mac_string_index);
    out.extend_from_slice(&0xffff_ffffu32.to_le_bytes());
    out.extend_from_slice(&1514u16.to_le_bytes());
    out.extend_from_slice(&0xffffu16.to_le_bytes());
    out.push(0);
    out
}

pub fn build() -> (Device, &'static str) {
    let mut device = Device::new(VENDOR_ID, PRODUCT_ID);
    device.device_class = DeviceClass::Cdc as u8;
    device.device_release = 0x0010;

    device.manufacturer_string_index = device.push_string("numap Inc.".into());
    device.product_string_index = device.push_string("numap CDC-NCM Interface".into());
    device.serial_string_index = device.push_string("0123456789-NCM".into());
    let mac_string_index = device.push_string("001122334455".into());

    let mut comm_alt = AltSetting::new(DeviceClass::Cdc as u8, CDC_SUBCLASS_NCM, CDC_PROTOCOL_NONE, 0);
    comm_alt.functional_descriptors = {
        let mut bytes = packed_struct::PackedStructSlice::pack_to_vec(&HeaderFunctionalDescriptor::new()).unwrap();
        bytes.extend_from_slice(&ncm_functional_descriptor());
        bytes.extend_from_slice(&ethernet_networking_functional_descriptor(mac_string_index));
        bytes.extend_from_slice(
            &packed_struct::PackedStructSlice::pack_to_vec(&UnionFunctionalDescriptor::new(
                COMM_INTERFACE,
                DATA_INTERFACE,
            ))
            .unwrap(),
        );
        bytes
    };
    let comm_iface = Interface::new(COMM_INTERFACE, comm_alt);

    let mut data_alt = AltSetting::new(DeviceClass::CdcData as u8, 0, DATA_PROTOCOL_NCM, 0);
    let arp = Box::new(|| {
        Ok(Some(vec![
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, 0x08, 0x06, 0x00, 0x01, 0x08,
            0x00, 0x06, 0x04, 0x00, 0x01, 0x60, 0x03, 0x08, 0xaa, 0xaa, 0xaa, 0xc0, 0xa8, 0x00, 0x65, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0xc0, 0xa8, 0x01, 0x00,
        ]))
    });
    data_alt.endpoints.push(
        Endpoint::new(1, EndpointDirection::Out, TransferType::Bulk, SyncType::NoSync, UsageType::Data, 64, 0)
            .with_on_data(Box::new(|data| {
                log::debug!("cdc_ncm received {} bytes on the AT-command channel", data.len());
                Ok(())
            })),
    );
    data_alt.endpoints.push(
        Endpoint::new(2, EndpointDirection::In, TransferType::Bulk, SyncType::NoSync, UsageType::Data, 64, 0)
            .with_on_buffer_available(arp),
    );
    let data_iface = Interface::new(DATA_INTERFACE, data_alt);

    let mut config = Configuration::new(1, 0, 0, 50);
    config.add_interface(comm_iface);
    config.add_interface(data_iface);
    device.configurations.push(config);

    (device, "cdc_ncm")
}

pub fn string_locations() -> &'static [(&'static str, usize)] {
    &[("manufacturer", 1), ("product", 2), ("serial", 3), ("mac_address", 4)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_interface_in_endpoint_answers_with_an_arp_packet() {
        let (mut device, name) = build();
        assert_eq!(name, "cdc_ncm");
        let data_iface = &mut device.configurations[0].interfaces[1];
        let ep = data_iface.find_endpoint_mut(2, EndpointDirection::In).unwrap();
        let packet = ep.on_buffer_available().unwrap().unwrap();
        assert_eq!(packet.len(), 42);
    }
}
