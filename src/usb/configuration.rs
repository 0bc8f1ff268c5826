//! Component D — a named set of interfaces plus power attributes.
use super::descriptor::ConfigurationDescriptor;
use super::interface::Interface;
use crate::error::UsbResult;

pub struct Configuration {
    pub index: u8,
    pub string_index: u8,
    pub attributes: u8,
    pub max_power: u8,
    pub interfaces: Vec<Interface>,
}

impl Configuration {
    pub fn new(index: u8, string_index: u8, attributes: u8, max_power: u8) -> Self {
        Self {
            index,
            string_index,
            attributes,
            max_power,
            interfaces: Vec::new(),
        }
    }

    pub fn add_interface(&mut self, interface: Interface) -> &mut Self {
        self.interfaces.push(interface);
        self
    }

    pub fn find_interface_mut(&mut self, interface_number: u8) -> Option<&mut Interface> {
        self.interfaces
            .iter_mut()
            .find(|i| i.interface_number == interface_number)
    }

    pub fn find_interface(&self, interface_number: u8) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.interface_number == interface_number)
    }

    /// Assemble the full CONFIGURATION descriptor response: the 9-byte
    /// header followed by every interface's (all-alt-settings) descriptor
    /// bytes, in `(interface_number, alternate_setting)` order, with
    /// `wTotalLength` computed from the actual concatenation — property 1.
    pub fn to_descriptor_bytes(&self) -> UsbResult<Vec<u8>> {
        let mut ordered: Vec<&Interface> = self.interfaces.iter().collect();
        ordered.sort_by_key(|i| i.interface_number);

        let mut body = Vec::new();
        for iface in &ordered {
            body.extend_from_slice(&iface.to_descriptor_bytes());
        }

        let header = ConfigurationDescriptor::new(
            self.index,
            self.string_index,
            ordered.len() as u8,
            self.attributes,
            self.max_power,
        );
        let mut total = packed_struct::PackedStructSlice::pack_to_vec(&header).unwrap();
        let total_length = (total.len() + body.len()) as u16;
        total[2..4].copy_from_slice(&total_length.to_le_bytes());
        total.extend_from_slice(&body);
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usb::endpoint::Endpoint;
    use crate::usb::interface::AltSetting;
    use crate::usb::types::{EndpointDirection, SyncType, TransferType, UsageType};

    #[test]
    fn w_total_length_matches_actual_serialized_bytes() {
        let mut alt0 = AltSetting::new(0x03, 1, 1, 0);
        alt0.endpoints.push(Endpoint::new(
            1,
            EndpointDirection::In,
            TransferType::Interrupt,
            SyncType::NoSync,
            UsageType::Data,
            8,
            10,
        ));
        let iface = Interface::new(0, alt0);

        let mut config = Configuration::new(1, 0, 0, 50);
        config.add_interface(iface);

        let bytes = config.to_descriptor_bytes().unwrap();
        let declared_total = u16::from_le_bytes([bytes[2], bytes[3]]) as usize;
        assert_eq!(declared_total, bytes.len());
    }
}
