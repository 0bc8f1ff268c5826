//! Component C — a collection of endpoints under one (interface_number,
//! alternate_setting) pair, plus its class/vendor handler tables.
use std::collections::HashMap;

use super::descriptor::InterfaceDescriptor;
use super::endpoint::Endpoint;
use super::handlers::HandlerRegistry;
use super::types::EndpointDirection;
use crate::error::{UsbError, UsbResult};

/// One alternate setting of an interface: its own class/subclass/protocol,
/// functional descriptors, and endpoint set. Endpoints present in alt 0
/// but absent from alt N are simply not part of alt N's `endpoints` — they
/// become dormant when alt N is selected, per 4.C.
pub struct AltSetting {
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
    pub string_index: u8,
    /// Class-specific functional descriptor bytes, inserted between the
    /// INTERFACE descriptor and its ENDPOINT descriptors (CDC's Header/
    /// ACM/Union/CallManagement blocks, HID's HID+Report descriptors).
    pub functional_descriptors: Vec<u8>,
    pub endpoints: Vec<Endpoint>,
    /// Standalone class-specific descriptors fetched by their own
    /// GET_DESCRIPTOR(interface-recipient) request rather than embedded in
    /// the CONFIGURATION descriptor walk, keyed by descriptor type byte
    /// (HID 0x21, REPORT 0x22, PHYSICAL 0x23).
    class_descriptors: HashMap<u8, Vec<u8>>,
}

impl AltSetting {
    pub fn new(class: u8, subclass: u8, protocol: u8, string_index: u8) -> Self {
        Self {
            class,
            subclass,
            protocol,
            string_index,
            functional_descriptors: Vec::new(),
            endpoints: Vec::new(),
            class_descriptors: HashMap::new(),
        }
    }

    /// Registers the bytes GET_DESCRIPTOR(interface-recipient) should
    /// return for `descriptor_type`, e.g. the HID REPORT descriptor.
    pub fn with_class_descriptor(mut self, descriptor_type: u8, bytes: Vec<u8>) -> Self {
        self.class_descriptors.insert(descriptor_type, bytes);
        self
    }

    fn to_descriptor_bytes(&self, interface_number: u8, alternate_setting: u8) -> Vec<u8> {
        let desc = InterfaceDescriptor::new(
            interface_number,
            alternate_setting,
            self.endpoints.len() as u8,
            self.class,
            self.subclass,
            self.protocol,
            self.string_index,
        );
        let mut out = packed_struct::PackedStructSlice::pack_to_vec(&desc).unwrap();
        out.extend_from_slice(&self.functional_descriptors);
        for ep in &self.endpoints {
            let ep_desc = ep.to_descriptor();
            out.extend_from_slice(&packed_struct::PackedStructSlice::pack_to_vec(&ep_desc).unwrap());
        }
        out
    }
}

pub struct Interface {
    pub interface_number: u8,
    /// Alt settings in ascending order, always containing at least alt 0.
    alt_settings: Vec<(u8, AltSetting)>,
    active_alt: u8,
    pub usb_class: HandlerRegistry,
    pub usb_vendor: Option<HandlerRegistry>,
}

impl Interface {
    pub fn new(interface_number: u8, alt0: AltSetting) -> Self {
        Self {
            interface_number,
            alt_settings: vec![(0, alt0)],
            active_alt: 0,
            usb_class: HandlerRegistry::new(),
            usb_vendor: None,
        }
    }

    pub fn add_alt_setting(&mut self, alt: u8, setting: AltSetting) -> &mut Self {
        self.alt_settings.push((alt, setting));
        self.alt_settings.sort_by_key(|(n, _)| *n);
        self
    }

    pub fn active_alt_number(&self) -> u8 {
        self.active_alt
    }

    pub fn has_alt(&self, alt: u8) -> bool {
        self.alt_settings.iter().any(|(n, _)| *n == alt)
    }

    /// SET_INTERFACE: swap the active endpoint set.
    pub fn set_alternate(&mut self, alt: u8) -> UsbResult<()> {
        if !self.has_alt(alt) {
            return Err(UsbError::UnsupportedRequest { request: alt });
        }
        self.active_alt = alt;
        Ok(())
    }

    fn active_setting(&self) -> &AltSetting {
        self.alt_settings
            .iter()
            .find(|(n, _)| *n == self.active_alt)
            .map(|(_, s)| s)
            .expect("active_alt always refers to a present alt setting")
    }

    fn active_setting_mut(&mut self) -> &mut AltSetting {
        let active = self.active_alt;
        self.alt_settings
            .iter_mut()
            .find(|(n, _)| *n == active)
            .map(|(_, s)| s)
            .expect("active_alt always refers to a present alt setting")
    }

    pub fn active_endpoints(&self) -> &[Endpoint] {
        &self.active_setting().endpoints
    }

    /// The class-specific descriptor bytes registered for `descriptor_type`
    /// on the currently active alt setting, if any (HID's REPORT/HID
    /// descriptors being the motivating case).
    pub fn class_descriptor(&self, descriptor_type: u8) -> Option<&[u8]> {
        self.active_setting().class_descriptors.get(&descriptor_type).map(|v| v.as_slice())
    }

    pub fn find_endpoint_mut(&mut self, number: u8, direction: EndpointDirection) -> Option<&mut Endpoint> {
        self.active_setting_mut()
            .endpoints
            .iter_mut()
            .find(|ep| ep.number == number && ep.direction == direction)
    }

    pub fn num_endpoints_active(&self) -> u8 {
        self.active_setting().endpoints.len() as u8
    }

    /// Descriptor bytes for every alt setting of this interface, in
    /// ascending alt-number order, for embedding into the CONFIGURATION
    /// descriptor (4.C: "interfaces by (interface_number, alternate_setting)").
    pub fn to_descriptor_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (alt, setting) in &self.alt_settings {
            out.extend_from_slice(&setting.to_descriptor_bytes(self.interface_number, *alt));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usb::types::{SyncType, TransferType, UsageType};

    fn make_ep(number: u8, direction: EndpointDirection) -> Endpoint {
        Endpoint::new(number, direction, TransferType::Bulk, SyncType::NoSync, UsageType::Data, 64, 0)
    }

    #[test]
    fn set_alternate_swaps_active_endpoint_set() {
        let mut alt0 = AltSetting::new(0xff, 0, 0, 0);
        alt0.endpoints.push(make_ep(1, EndpointDirection::Out));
        let mut iface = Interface::new(0, alt0);

        let mut alt1 = AltSetting::new(0xff, 0, 0, 0);
        alt1.endpoints.push(make_ep(2, EndpointDirection::In));
        iface.add_alt_setting(1, alt1);

        assert_eq!(iface.active_endpoints().len(), 1);
        assert_eq!(iface.active_endpoints()[0].number, 1);

        iface.set_alternate(1).unwrap();
        assert_eq!(iface.active_endpoints()[0].number, 2);
    }

    #[test]
    fn set_alternate_rejects_unknown_alt() {
        let alt0 = AltSetting::new(0xff, 0, 0, 0);
        let mut iface = Interface::new(0, alt0);
        assert!(iface.set_alternate(5).is_err());
    }
}
