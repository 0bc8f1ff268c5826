//! CDC Ethernet Emulation Model device, grounded on
//! `original_source/numap/dev/cdc_eem.py`'s `USBCdcEemDevice`.
//!
//! The original skips the CDC base class's control interface entirely
//! (`super(USBCDCDevice, self).__init__(...)`, bypassing one level of
//! inheritance) and puts the EEM functional descriptors directly on its
//! single data-class interface. This assembly keeps the control interface
//! instead, for consistency with [`super::cdc_acm`] and [`super::cdc_ncm`]
//! (see DESIGN.md for the resolution).
use crate::usb::cdc::{
    CallManagementFunctionalDescriptor, HeaderFunctionalDescriptor, UnionFunctionalDescriptor,
};
use crate::usb::device::Device;
use crate::usb::interface::{AltSetting, Interface};
use crate::usb::types::{DeviceClass, EndpointDirection, SyncType, TransferType, UsageType};
use crate::usb::{Configuration, Endpoint};

const VENDOR_ID: u16 = 0x1b6b;
const PRODUCT_ID: u16 = 0x0102;
const CDC_SUBCLASS_EEM: u8 = 0x0c;
const CDC_PROTOCOL_EEM: u8 = 0x07;
const COMM_INTERFACE: u8 = 0;
const DATA_INTERFACE: u8 = 1;

/// The Ethernet Networking functional descriptor (CDC120 table 22), built
/// by hand since only EEM/NCM use it and a single fixed instance suffices.
fn ethernet_networking_functional_descriptor(mac_string_index: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(13);
    out.push(13); // bFunctionLength
    out.push(0x24); // CS_INTERFACE
    out.push(0x0f); // Ethernet Networking subtype
    out.push(mac_string_index); // iMACAddress
    out.extend_from_slice(&0xffff_ffffu32.to_le_bytes()); // bmEthernetStatistics
    out.extend_from_slice(&1514u16.to_le_bytes()); // wMaxSegmentSize
    out.extend_from_slice(&0xffffu16.to_le_bytes()); // wNumberMCFilters
    out.push(0); // bNumberPowerFilters
    out
}

pub fn build() -> (Device, &'static str) {
    let mut device = Device::new(VENDOR_ID, PRODUCT_ID);
    device.device_class = DeviceClass::Cdc as u8;

    device.manufacturer_string_index = device.push_string("UMAP2 NetSolutions".into());
    device.product_string_index = device.push_string("UMAP2 CDC-TRON".into());
    device.serial_string_index = device.push_string("UMAP2-13337-CDC".into());
    let mac_string_index = device.push_string("001122334455".into());

    let mut comm_alt = AltSetting::new(DeviceClass::Cdc as u8, CDC_SUBCLASS_EEM, CDC_PROTOCOL_EEM, 0);
    comm_alt.functional_descriptors = {
        let mut bytes = packed_struct::PackedStructSlice::pack_to_vec(&HeaderFunctionalDescriptor::new()).unwrap();
        bytes.extend_from_slice(
            &packed_struct::PackedStructSlice::pack_to_vec(&CallManagementFunctionalDescriptor::new(
                0x01,
                DATA_INTERFACE,
            ))
            .unwrap(),
        );
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

    let mut data_alt = AltSetting::new(DeviceClass::CdcData as u8, 0, 0, 0);
    data_alt.endpoints.push(Endpoint::new(
        1,
        EndpointDirection::In,
        TransferType::Bulk,
        SyncType::NoSync,
        UsageType::Data,
        64,
        0,
    ));
    data_alt.endpoints.push(Endpoint::new(
        2,
        EndpointDirection::Out,
        TransferType::Bulk,
        SyncType::NoSync,
        UsageType::Data,
        64,
        0,
    ));
    let data_iface = Interface::new(DATA_INTERFACE, data_alt);

    let mut config = Configuration::new(1, 0, 0, 50);
    config.add_interface(comm_iface);
    config.add_interface(data_iface);
    device.configurations.push(config);

    (device, "cdc_eem")
}

pub fn string_locations() -> &'static [(&'static str, usize)] {
    &[("manufacturer", 1), ("product", 2), ("serial", 3), ("mac_address", 4)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comm_interface_carries_ethernet_networking_descriptor() {
        let (device, name) = build();
        assert_eq!(name, "cdc_eem");
        let comm = &device.configurations[0].interfaces[0];
        assert_eq!(device.configurations[0].interfaces.len(), 2);
        assert!(comm.to_descriptor_bytes().len() > 9);
    }
}
