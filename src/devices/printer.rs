//! USB printer device, grounded on `original_source/numap/dev/printer.py`'s
//! `USBPrinterDevice`/`USBPrinterClass`/`USBPrinterInterface`.
use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::Write;
use std::rc::Rc;

use crate::usb::device::Device;
use crate::usb::handlers::HandlerRegistry;
use crate::usb::interface::{AltSetting, Interface};
use crate::usb::types::{DeviceClass, EndpointDirection, SyncType, TransferType, UsageType};
use crate::usb::{Configuration, Endpoint};

const VENDOR_ID: u16 = 0x03f0; // Hewlett-Packard
const PRODUCT_ID: u16 = 0x4417; // Color LaserJet CP1515n
const INTERFACE_SUBCLASS: u8 = 0x01; // printer
const INTERFACE_PROTOCOL: u8 = 0x02; // bidirectional

/// Class request 0x00, `GET_DEVICE_ID` (IEEE 1284 device ID string).
const GET_DEVICE_ID: u8 = 0x00;

const DEFAULT_DEVICE_ID: &str = "MFG:Hewlett-Packard;CMD:PJL,PML,PCLXL,POSTSCRIPT,PCL;\
MDL:HP Color LaserJet CP1515n;CLS:PRINTER;\
DES:Hewlett-Packard Color LaserJet CP1515n;MEM:MEM=55MB;COMMENT:RES=600x8;";

struct PclSink {
    filename: String,
    file: Option<std::fs::File>,
    buffer: String,
}

impl PclSink {
    fn new() -> Self {
        Self {
            filename: format!("capture-{}.pcl", std::process::id()),
            file: None,
            buffer: String::new(),
        }
    }

    fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        if self.file.is_none() {
            log::info!("writing PCL file: {}", self.filename);
            self.file = Some(OpenOptions::new().create(true).append(true).open(&self.filename)?);
        }
        if let Some(file) = self.file.as_mut() {
            file.write_all(data)?;
        }
        self.buffer.extend(data.iter().map(|&b| b as char));
        if self.buffer.contains("EOJ\n") {
            self.close();
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.file.take().is_some() {
            log::info!("PCL file write complete: {}", self.filename);
        }
        self.buffer.clear();
    }
}

pub fn build() -> (Device, &'static str) {
    let mut device = Device::new(VENDOR_ID, PRODUCT_ID);
    device.device_class = DeviceClass::Unspecified as u8;

    device.manufacturer_string_index = device.push_string("Hewlett-Packard".into());
    device.product_string_index = device.push_string("HP Color LaserJet CP1515n".into());
    device.serial_string_index = device.push_string("00CNC2618971".into());
    // The device ID also gets a plain string slot for GET_DESCRIPTOR(STRING)
    // visibility (printer.py: "the device_id is the last string in
    // strings"), but GET_DEVICE_ID answers from `device_id` below so a REPL
    // edit through that shared cell takes effect immediately rather than
    // waiting on a dispatcher that has no route from a class handler back
    // to the device's string table.
    device.push_string(DEFAULT_DEVICE_ID.into());
    let device_id = Rc::new(RefCell::new(DEFAULT_DEVICE_ID.to_string()));

    let mut alt0 = AltSetting::new(DeviceClass::Printer as u8, INTERFACE_SUBCLASS, INTERFACE_PROTOCOL, 0);

    let sink = Rc::new(RefCell::new(PclSink::new()));
    let out_sink = sink.clone();
    alt0.endpoints.push(
        Endpoint::new(1, EndpointDirection::Out, TransferType::Bulk, SyncType::NoSync, UsageType::Data, 64, 0x80)
            .with_on_data(Box::new(move |data| {
                let _ = out_sink.borrow_mut().write(data);
                Ok(())
            })),
    );
    alt0.endpoints.push(Endpoint::new(
        2,
        EndpointDirection::In,
        TransferType::Bulk,
        SyncType::NoSync,
        UsageType::Data,
        64,
        0,
    ));

    let mut iface = Interface::new(0, alt0);
    setup_handlers(&mut iface.usb_class, device_id);

    let mut config = Configuration::new(1, 0, 0, 50);
    config.add_interface(iface);
    device.configurations.push(config);

    device.set_on_disconnect(Box::new(move || {
        sink.borrow_mut().close();
    }));

    (device, "printer")
}

fn setup_handlers(registry: &mut HandlerRegistry, device_id: Rc<RefCell<String>>) {
    registry.inherit(
        GET_DEVICE_ID,
        "get_device_id_response",
        Box::new(move |_setup| {
            // 2-byte big-endian length prefix, per IEEE 1284 device ID strings.
            let payload = device_id.borrow().clone().into_bytes();
            let mut out = Vec::with_capacity(payload.len() + 2);
            out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
            out.extend_from_slice(&payload);
            Ok(Some(out))
        }),
    );
}

pub fn string_locations() -> &'static [(&'static str, usize)] {
    &[("manufacturer", 1), ("product", 2), ("serial", 3), ("device_id", 4)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_device_id_response_is_length_prefixed() {
        let (mut device, name) = build();
        assert_eq!(name, "printer");
        let iface = &mut device.configurations[0].interfaces[0];
        let setup = crate::usb::setup::SetupPacket {
            bm_request_type: 0xa1,
            b_request: GET_DEVICE_ID,
            w_value: 0,
            w_index: 0,
            w_length: 1024,
            data: None,
        };
        let response = iface.usb_class.dispatch(GET_DEVICE_ID, &setup).unwrap().unwrap().unwrap();
        let declared_len = u16::from_be_bytes([response[0], response[1]]) as usize;
        assert_eq!(declared_len, response.len() - 2);
    }
}
