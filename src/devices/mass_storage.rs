//! USB Mass Storage (Bulk-Only Transport) device. No original Python
//! template names this one, but it is grounded structurally on 4.G's
//! class/vendor registry shape, carried over to [`crate::usb::scsi`]'s
//! opcode-keyed `ScsiRegistry` (see DESIGN.md).
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use packed_struct::PackedStructSlice;

use crate::usb::device::Device;
use crate::usb::interface::{AltSetting, Interface};
use crate::usb::scsi::{
    stock_inquiry_response, stock_read_capacity10_response, CommandBlockWrapper, ScsiOpcode, ScsiRegistry,
};
use crate::usb::types::{DeviceClass, EndpointDirection, SyncType, TransferType, UsageType};
use crate::usb::{Configuration, Endpoint};

const VENDOR_ID: u16 = 0x0781; // SanDisk Corp.
const PRODUCT_ID: u16 = 0x5567; // Cruzer Blade
const MASS_STORAGE_SUBCLASS_SCSI: u8 = 0x06;
const MASS_STORAGE_PROTOCOL_BULK_ONLY: u8 = 0x50;

pub fn build() -> (Device, &'static str) {
    let mut device = Device::new(VENDOR_ID, PRODUCT_ID);
    device.device_class = DeviceClass::Unspecified as u8;

    device.manufacturer_string_index = device.push_string("SanDisk".into());
    device.product_string_index = device.push_string("Cruzer Blade".into());
    device.serial_string_index = device.push_string("4C531001331122117202".into());

    let mut alt0 = AltSetting::new(
        DeviceClass::MassStorage as u8,
        MASS_STORAGE_SUBCLASS_SCSI,
        MASS_STORAGE_PROTOCOL_BULK_ONLY,
        0,
    );

    let outgoing: Rc<RefCell<VecDeque<Vec<u8>>>> = Rc::new(RefCell::new(VecDeque::new()));
    let registry = Rc::new(RefCell::new(default_registry()));

    let out_outgoing = outgoing.clone();
    let out_registry = registry.clone();
    alt0.endpoints.push(
        Endpoint::new(1, EndpointDirection::Out, TransferType::Bulk, SyncType::NoSync, UsageType::Data, 64, 0)
            .with_on_data(Box::new(move |data| {
                if let Ok(cbw) = CommandBlockWrapper::unpack_from_slice(data) {
                    let (csw, payload) = out_registry.borrow_mut().execute(&cbw);
                    let mut queue = out_outgoing.borrow_mut();
                    if !payload.is_empty() {
                        queue.push_back(payload);
                    }
                    queue.push_back(PackedStructSlice::pack_to_vec(&csw).unwrap());
                }
                Ok(())
            })),
    );

    alt0.endpoints.push(
        Endpoint::new(2, EndpointDirection::In, TransferType::Bulk, SyncType::NoSync, UsageType::Data, 64, 0)
            .with_on_buffer_available(Box::new(move || Ok(outgoing.borrow_mut().pop_front()))),
    );

    let iface = Interface::new(0, alt0);
    let mut config = Configuration::new(1, 0, 0, 50);
    config.add_interface(iface);
    device.configurations.push(config);

    (device, "mass_storage")
}

fn default_registry() -> ScsiRegistry {
    let mut reg = ScsiRegistry::new();
    reg.inherit(
        ScsiOpcode::TestUnitReady,
        Box::new(|_cbw| Ok(Vec::new())),
    );
    reg.inherit(
        ScsiOpcode::Inquiry,
        Box::new(|_cbw| Ok(stock_inquiry_response("SanDisk ", "Cruzer Blade    ", "8.02"))),
    );
    reg.inherit(
        ScsiOpcode::ReadCapacity10,
        Box::new(|_cbw| Ok(stock_read_capacity10_response(0x0074_9fff, 512))),
    );
    reg.inherit(ScsiOpcode::RequestSense, Box::new(|_cbw| Ok(vec![0u8; 18])));
    reg.inherit(ScsiOpcode::ModeSense6, Box::new(|_cbw| Ok(vec![0u8; 4])));
    reg.inherit(ScsiOpcode::Read10, Box::new(|_cbw| Ok(vec![0u8; 512])));
    reg.inherit(ScsiOpcode::Write10, Box::new(|_cbw| Ok(Vec::new())));
    reg
}

pub fn string_locations() -> &'static [(&'static str, usize)] {
    &[("manufacturer", 1), ("product", 2), ("serial", 3)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usb::scsi::CBW_SIGNATURE;
    use packed_struct::types::Integer;

    #[test]
    fn inquiry_cbw_produces_data_then_csw_on_the_in_endpoint() {
        let (mut device, name) = build();
        assert_eq!(name, "mass_storage");
        let iface = &mut device.configurations[0].interfaces[0];

        let mut cbwcb = [0u8; 16];
        cbwcb[0] = ScsiOpcode::Inquiry as u8;
        let cbw = CommandBlockWrapper {
            d_cbw_signature: Integer::from_primitive(CBW_SIGNATURE),
            d_cbw_tag: Integer::from_primitive(42),
            d_cbw_data_transfer_length: Integer::from_primitive(36),
            bm_cbw_flags: 0x80,
            b_cbw_lun: 0,
            b_cbw_cb_length: 6,
            cbwcb,
        };
        let bytes = PackedStructSlice::pack_to_vec(&cbw).unwrap();

        let out = iface.find_endpoint_mut(1, EndpointDirection::Out).unwrap();
        out.on_data(&bytes).unwrap();

        let inp = iface.find_endpoint_mut(2, EndpointDirection::In).unwrap();
        let data = inp.on_buffer_available().unwrap().unwrap();
        assert_eq!(data.len(), 36);
        let csw = inp.on_buffer_available().unwrap().unwrap();
        assert_eq!(csw.len(), 13);
    }
}
