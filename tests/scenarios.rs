//! Integration tests for the six concrete scenarios and the six invariants.
//! Unlike the colocated unit tests, these exercise whole device assemblies
//! (`devices::*::build()`) through the public dispatcher entry point, the
//! way a real host conversation would.
use std::time::Duration;

use usbmimic::devices::{keyboard, printer};
use usbmimic::fingerprint::rules;
use usbmimic::usb::setup::{RequestOutcome, SetupPacket};
use usbmimic::usb::{Dispatcher, NullObserver, StandardRequest};

fn get_descriptor(desc_type: u8, index: u8, w_length: u16) -> SetupPacket {
    SetupPacket {
        bm_request_type: 0x80,
        b_request: StandardRequest::GetDescriptor as u8,
        w_value: ((desc_type as u16) << 8) | index as u16,
        w_index: 0,
        w_length,
        data: None,
    }
}

#[test]
fn s1_enumeration_of_a_default_keyboard() {
    let (mut device, name) = keyboard::build();
    assert_eq!(name, "keyboard");

    let setup = get_descriptor(0x01, 0, 64);
    let entry = Dispatcher::dispatch(&mut device, &setup, &mut NullObserver);
    let RequestOutcome::Data(bytes) = entry.outcome.unwrap() else {
        panic!("GET_DESCRIPTOR(DEVICE) must answer with data");
    };

    assert_eq!(bytes.len(), 18);
    assert_eq!(&bytes[..8], &[0x12, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x40]);
}

#[test]
fn s2_set_address_moves_default_device_to_address_state() {
    use usbmimic::usb::DeviceState;

    let (mut device, _name) = keyboard::build();
    device.state = DeviceState::Default;

    let setup = SetupPacket {
        bm_request_type: 0x00,
        b_request: StandardRequest::SetAddress as u8,
        w_value: 7,
        w_index: 0,
        w_length: 0,
        data: None,
    };
    let entry = Dispatcher::dispatch(&mut device, &setup, &mut NullObserver);

    assert_eq!(entry.outcome.unwrap(), RequestOutcome::NoData);
    assert_eq!(device.address, 7);
    assert_eq!(device.state, DeviceState::Address);
}

#[test]
fn s3_billboard_bos_has_container_id_and_one_alternate_mode() {
    let (device, name) = usbmimic::devices::billboard::build();
    assert_eq!(name, "billboard");

    let bytes = device.bos_bytes().expect("billboard device must carry a BOS");
    assert_eq!(bytes[0], 5); // BOS header bLength
    assert_eq!(bytes[1], 0x0f); // bDescriptorType = BOS
    assert_eq!(bytes[4], 2); // bNumDeviceCaps: ContainerID + Billboard

    let container_cap = &bytes[5..5 + 20];
    assert_eq!(container_cap[0], 20); // header(3) + reserved(1) + id(16)
    assert_eq!(container_cap[2], usbmimic::usb::bos::DC_TYPE_CONTAINER_ID);

    let billboard_offset = 5 + 20;
    assert_eq!(billboard_offset, 0x19);
    let mode_record_offset = billboard_offset + 3 + 1 + 1 + 1 + 2 + 16 + 4;
    assert_eq!(mode_record_offset, 0x1c);
    assert_eq!(bytes[billboard_offset + 4], 1); // bNumberOfAlternateModes
}

#[test]
fn s4_printer_device_id_reports_the_default_hp_identity() {
    let (mut device, name) = printer::build();
    assert_eq!(name, "printer");

    let setup = SetupPacket {
        bm_request_type: 0xa1,
        b_request: 0x00, // GET_DEVICE_ID
        w_value: 0,
        w_index: 0,
        w_length: 1024,
        data: None,
    };
    let iface = &mut device.configurations[0].interfaces[0];
    let response = iface.usb_class.dispatch(0x00, &setup).unwrap().unwrap().unwrap();

    let declared_len = u16::from_be_bytes([response[0], response[1]]) as usize;
    let ascii = std::str::from_utf8(&response[2..]).unwrap();
    assert_eq!(declared_len, ascii.len());
    assert!(ascii.starts_with("MFG:Hewlett-Packard;CMD:PJL,"));
}

fn descriptor_read(descriptor: &str, value: u16) -> usbmimic::usb::RequestLogEntry {
    usbmimic::usb::RequestLogEntry {
        setup: get_descriptor(0x02, 0, 64),
        recipient: usbmimic::usb::Recipient::Device,
        request_number_string: "GET_DESCRIPTOR".to_string(),
        descriptor_number_string: Some(descriptor.to_string()),
        value,
        outcome: Some(RequestOutcome::NoData),
        elapsed: Duration::from_millis(0),
    }
}

#[test]
fn s5_four_config_reads_fingerprint_windows_two_fingerprint_linux() {
    let four: Vec<_> = (0..4).map(|_| descriptor_read("CONFIGURATION", 0x0200)).collect();
    let votes = rules::evaluate("keyboard", &four, &four);
    assert!(votes.contains(&rules::Os::Windows));

    let two: Vec<_> = (0..2).map(|_| descriptor_read("CONFIGURATION", 0x0200)).collect();
    let votes = rules::evaluate("keyboard", &two, &two);
    assert!(votes.contains(&rules::Os::Linux));
    assert!(!votes.contains(&rules::Os::Windows));
}

#[test]
fn s6_ms_os_descriptor_request_fingerprints_windows() {
    let with_ms_os = vec![descriptor_read("DEVICE", 0x03ee)];
    let votes = rules::evaluate("mass_storage", &with_ms_os, &[]);
    assert!(votes.contains(&rules::Os::Windows));

    let without = Vec::new();
    let votes = rules::evaluate("mass_storage", &without, &[]);
    assert!(votes.contains(&rules::Os::Unknown));
}

#[test]
fn property_descriptor_length_matches_configuration_w_total_length() {
    let (mut device, _name) = keyboard::build();
    let setup = get_descriptor(0x02, 0, 512);
    let entry = Dispatcher::dispatch(&mut device, &setup, &mut NullObserver);
    let RequestOutcome::Data(bytes) = entry.outcome.unwrap() else {
        panic!("GET_DESCRIPTOR(CONFIGURATION) must answer with data");
    };
    let w_total_length = u16::from_le_bytes([bytes[2], bytes[3]]) as usize;
    assert_eq!(w_total_length, bytes.len());
}

#[test]
fn property_truncation_never_exceeds_requested_length() {
    let (mut device, _name) = keyboard::build();
    let setup = get_descriptor(0x01, 0, 8);
    let entry = Dispatcher::dispatch(&mut device, &setup, &mut NullObserver);
    let RequestOutcome::Data(bytes) = entry.outcome.unwrap() else {
        panic!("GET_DESCRIPTOR(DEVICE) must answer with data");
    };
    assert_eq!(bytes.len(), 8);
}

#[test]
fn property_request_log_has_one_entry_per_setup_packet_regardless_of_outcome() {
    let (mut device, _name) = keyboard::build();
    let packets = vec![get_descriptor(0x01, 0, 64), get_descriptor(0xee, 0, 64), get_descriptor(0x03, 0, 64)];
    let mut log = Vec::new();
    for setup in &packets {
        log.push(Dispatcher::dispatch(&mut device, setup, &mut NullObserver));
    }
    assert_eq!(log.len(), packets.len());
    assert!(log.iter().all(|entry| entry.outcome.is_some()));
}
