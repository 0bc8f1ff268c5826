//! CDC Abstract Control Model device: one comm interface (Union: controls
//! interface 1, carries the Header/CallManagement/ACM/Union functional
//! descriptors and the interrupt IN notification endpoint) plus one data
//! interface (bulk IN/OUT), grounded on the CDC functional-descriptor
//! layout shared by `rndis.py`/`cdc_eem.py`/`cdc_ncm.py`.
use std::cell::RefCell;
use std::rc::Rc;

use crate::usb::cdc::{cdc_acm_functional_descriptors, AcmRequest, LineCoding, CDC_SUBCLASS_ACM};
use crate::usb::device::Device;
use crate::usb::handlers::HandlerRegistry;
use crate::usb::interface::{AltSetting, Interface};
use crate::usb::types::{DeviceClass, EndpointDirection, SyncType, TransferType, UsageType};
use crate::usb::{Configuration, Endpoint};

const VENDOR_ID: u16 = 0x2341; // Arduino SA
const PRODUCT_ID: u16 = 0x0043; // Uno (CDC-ACM)
const COMM_INTERFACE: u8 = 0;
const DATA_INTERFACE: u8 = 1;

pub fn build() -> (Device, &'static str) {
    let mut device = Device::new(VENDOR_ID, PRODUCT_ID);
    device.device_class = DeviceClass::Cdc as u8;

    device.manufacturer_string_index = device.push_string("Arduino LLC".into());
    device.product_string_index = device.push_string("Arduino Uno".into());
    device.serial_string_index = device.push_string("85735313938351F0B01".into());

    let mut comm_alt = AltSetting::new(DeviceClass::Cdc as u8, CDC_SUBCLASS_ACM, 0x00, 0);
    comm_alt.functional_descriptors = cdc_acm_functional_descriptors(COMM_INTERFACE, DATA_INTERFACE);
    comm_alt.endpoints.push(Endpoint::new(
        1,
        EndpointDirection::In,
        TransferType::Interrupt,
        SyncType::NoSync,
        UsageType::Data,
        8,
        16,
    ));
    let mut comm_iface = Interface::new(COMM_INTERFACE, comm_alt);
    setup_handlers(&mut comm_iface.usb_class);

    let mut data_alt = AltSetting::new(DeviceClass::CdcData as u8, 0, 0, 0);
    data_alt.endpoints.push(Endpoint::new(
        2,
        EndpointDirection::Out,
        TransferType::Bulk,
        SyncType::NoSync,
        UsageType::Data,
        64,
        0,
    ));
    data_alt.endpoints.push(Endpoint::new(
        3,
        EndpointDirection::In,
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

    (device, "cdc_acm")
}

fn setup_handlers(registry: &mut HandlerRegistry) {
    let line_coding = Rc::new(RefCell::new(LineCoding::new(9600)));

    let get_line_coding = line_coding.clone();
    registry.inherit(
        AcmRequest::GetLineCoding as u8,
        "get_line_coding",
        Box::new(move |_setup| {
            Ok(Some(
                packed_struct::PackedStructSlice::pack_to_vec(&*get_line_coding.borrow()).unwrap(),
            ))
        }),
    );

    let set_line_coding = line_coding;
    registry.inherit(
        AcmRequest::SetLineCoding as u8,
        "set_line_coding",
        Box::new(move |setup| {
            if let Some(data) = setup.data.as_ref() {
                if let Ok(parsed) = packed_struct::PackedStructSlice::unpack_from_slice(data) {
                    *set_line_coding.borrow_mut() = parsed;
                }
            }
            Ok(None)
        }),
    );

    registry.inherit(
        AcmRequest::SetControlLineState as u8,
        "set_control_line_state",
        Box::new(|_setup| Ok(None)),
    );
}

pub fn string_locations() -> &'static [(&'static str, usize)] {
    &[("manufacturer", 1), ("product", 2), ("serial", 3)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comm_interface_carries_four_functional_descriptors_worth_of_bytes() {
        let (device, name) = build();
        assert_eq!(name, "cdc_acm");
        let comm = &device.configurations[0].interfaces[0];
        assert_eq!(comm.to_descriptor_bytes().len() > 9, true);
    }

    #[test]
    fn get_line_coding_defaults_to_9600_baud() {
        let (mut device, _) = build();
        let comm = &mut device.configurations[0].interfaces[0];
        let setup = crate::usb::setup::SetupPacket {
            bm_request_type: 0xa1,
            b_request: AcmRequest::GetLineCoding as u8,
            w_value: 0,
            w_index: 0,
            w_length: 7,
            data: None,
        };
        let bytes = comm
            .usb_class
            .dispatch(AcmRequest::GetLineCoding as u8, &setup)
            .unwrap()
            .unwrap()
            .unwrap();
        let lc: LineCoding = packed_struct::PackedStructSlice::unpack_from_slice(&bytes).unwrap();
        let rate: u32 = lc.dw_dte_rate.into();
        assert_eq!(rate, 9600);
    }
}
