//! Component E — the root entity and its state machine (4.E).
use super::bos::Bos;
use super::configuration::Configuration;
use super::descriptor::{DeviceDescriptor, DeviceQualifierDescriptor, StringSlot};
use super::types::LangId;
use crate::error::{UsbError, UsbResult};

/// 4.E's state table. `connect`/`disconnect`/bus-reset transitions are
/// driven by the emulation loop (J); `SET_ADDRESS`/`SET_CONFIGURATION`
/// transitions are driven by the request dispatcher (F).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeviceState {
    Attached,
    Powered,
    Default,
    Address,
    Configured,
}

pub struct Device {
    pub vendor_id: u16,
    pub product_id: u16,
    pub device_release: u16,
    pub usb_spec_version: u16,
    pub device_class: u8,
    pub device_subclass: u8,
    pub device_protocol: u8,
    pub max_packet_size_ep0: u8,
    /// Whether GET_DESCRIPTOR(DEVICE_QUALIFIER) should answer or stall.
    pub high_speed_capable: bool,
    pub configurations: Vec<Configuration>,
    pub strings: Vec<StringSlot>,
    pub bos: Option<Bos>,
    /// 0 = unconfigured, else 1-based index into `configurations`.
    pub active_configuration_index: u8,
    pub address: u8,
    pub state: DeviceState,
    pub manufacturer_string_index: u8,
    pub product_string_index: u8,
    pub serial_string_index: u8,
    on_configuration_occurred: Option<Box<dyn FnMut()>>,
    on_disconnect: Option<Box<dyn FnMut()>>,
}

impl Device {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
            device_release: 0x0100,
            usb_spec_version: 0x0200,
            device_class: 0x00,
            device_subclass: 0x00,
            device_protocol: 0x00,
            max_packet_size_ep0: 64,
            high_speed_capable: true,
            configurations: Vec::new(),
            strings: vec![StringSlot::LangIds(vec![LangId::ENGLISH_US.0])],
            bos: None,
            active_configuration_index: 0,
            address: 0,
            state: DeviceState::Attached,
            manufacturer_string_index: 0,
            product_string_index: 0,
            serial_string_index: 0,
            on_configuration_occurred: None,
            on_disconnect: None,
        }
    }

    pub fn set_on_configuration_occurred(&mut self, callback: Box<dyn FnMut()>) {
        self.on_configuration_occurred = Some(callback);
    }

    pub fn set_on_disconnect(&mut self, callback: Box<dyn FnMut()>) {
        self.on_disconnect = Some(callback);
    }

    /// Push a string slot, returning its 1-based descriptor index.
    pub fn push_string(&mut self, slot: StringSlot) -> u8 {
        self.strings.push(slot);
        (self.strings.len() - 1) as u8
    }

    pub fn string_slot(&self, index: u8) -> Option<&StringSlot> {
        self.strings.get(index as usize)
    }

    pub fn device_descriptor(&self) -> DeviceDescriptor {
        let mut desc = DeviceDescriptor::new(self.vendor_id, self.product_id);
        desc.bcd_usb = packed_struct::types::Integer::from_primitive(self.usb_spec_version);
        desc.bcd_device = packed_struct::types::Integer::from_primitive(self.device_release);
        desc.b_device_class = self.device_class;
        desc.b_device_sub_class = self.device_subclass;
        desc.b_device_protocol = self.device_protocol;
        desc.b_max_packet_size_0 = self.max_packet_size_ep0;
        desc.i_manufacturer = self.manufacturer_string_index;
        desc.i_product = self.product_string_index;
        desc.i_serial_number = self.serial_string_index;
        desc.b_num_configurations = self.configurations.len() as u8;
        desc
    }

    /// `None` means "stall" — the device is not high-speed capable.
    pub fn device_qualifier_descriptor(&self) -> Option<DeviceQualifierDescriptor> {
        if !self.high_speed_capable {
            return None;
        }
        Some(DeviceQualifierDescriptor::from_device(&self.device_descriptor()))
    }

    pub fn bos_bytes(&self) -> Option<Vec<u8>> {
        self.bos.as_ref().map(|b| b.to_bytes())
    }

    pub fn active_configuration(&self) -> Option<&Configuration> {
        if self.active_configuration_index == 0 {
            return None;
        }
        self.configurations.get(self.active_configuration_index as usize - 1)
    }

    pub fn active_configuration_mut(&mut self) -> Option<&mut Configuration> {
        if self.active_configuration_index == 0 {
            return None;
        }
        self.configurations.get_mut(self.active_configuration_index as usize - 1)
    }

    /// SET_ADDRESS standard request: DEFAULT -> ADDRESS on a nonzero value.
    pub fn set_address(&mut self, address: u8) {
        self.address = address;
        if self.state == DeviceState::Default && address != 0 {
            self.state = DeviceState::Address;
        }
    }

    /// SET_CONFIGURATION standard request. `value == 0` deconfigures
    /// (CONFIGURED -> ADDRESS); a nonzero value matching a known
    /// configuration's `bConfigurationValue` configures
    /// (ADDRESS -> CONFIGURED) and fires `on_configuration_occurred`.
    /// Property 3 holds structurally: the only place
    /// `active_configuration_index` becomes nonzero is this branch, and it
    /// is always paired with a transition into `Configured` in the same
    /// call.
    pub fn set_configuration(&mut self, value: u8) -> UsbResult<()> {
        if value == 0 {
            self.active_configuration_index = 0;
            if self.state == DeviceState::Configured {
                self.state = DeviceState::Address;
            }
            return Ok(());
        }
        let position = self
            .configurations
            .iter()
            .position(|c| c.index == value)
            .ok_or(UsbError::UnsupportedRequest { request: value })?;
        self.active_configuration_index = (position + 1) as u8;
        let was_configured = self.state == DeviceState::Configured;
        self.state = DeviceState::Configured;
        if !was_configured {
            if let Some(callback) = self.on_configuration_occurred.as_mut() {
                callback();
            }
        }
        Ok(())
    }

    pub fn current_configuration_value(&self) -> u8 {
        self.active_configuration()
            .map(|c| c.index)
            .unwrap_or(0)
    }

    /// phy.connect(): ATTACHED -> POWERED.
    pub fn on_connect(&mut self) {
        self.state = DeviceState::Powered;
    }

    /// Bus reset: POWERED -> DEFAULT, clearing address and configuration.
    pub fn on_bus_reset(&mut self) {
        self.state = DeviceState::Default;
        self.address = 0;
        self.active_configuration_index = 0;
    }

    /// phy.disconnect(): any state -> ATTACHED.
    pub fn on_disconnect(&mut self) {
        self.state = DeviceState::Attached;
        self.address = 0;
        self.active_configuration_index = 0;
        if let Some(callback) = self.on_disconnect.as_mut() {
            callback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_address_from_default_moves_to_address_state() {
        let mut dev = Device::new(0x1234, 0x5678);
        dev.state = DeviceState::Default;
        dev.set_address(7);
        assert_eq!(dev.address, 7);
        assert_eq!(dev.state, DeviceState::Address);
    }

    #[test]
    fn configured_state_never_has_zero_active_index() {
        let mut dev = Device::new(0x1234, 0x5678);
        dev.configurations.push(Configuration::new(1, 0, 0, 50));
        dev.state = DeviceState::Address;

        dev.set_configuration(1).unwrap();
        assert_eq!(dev.state, DeviceState::Configured);
        assert_ne!(dev.active_configuration_index, 0);

        dev.set_configuration(0).unwrap();
        assert_eq!(dev.state, DeviceState::Address);
        assert_eq!(dev.active_configuration_index, 0);
    }

    #[test]
    fn unknown_configuration_value_is_rejected() {
        let mut dev = Device::new(0x1234, 0x5678);
        dev.configurations.push(Configuration::new(1, 0, 0, 50));
        assert!(dev.set_configuration(2).is_err());
    }

    #[test]
    fn on_configuration_occurred_fires_once_on_address_to_configured_edge() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut dev = Device::new(0x1234, 0x5678);
        dev.configurations.push(Configuration::new(1, 0, 0, 50));
        dev.state = DeviceState::Address;

        let fired = Rc::new(RefCell::new(0));
        let fired_clone = fired.clone();
        dev.set_on_configuration_occurred(Box::new(move || {
            *fired_clone.borrow_mut() += 1;
        }));

        dev.set_configuration(1).unwrap();
        dev.set_configuration(1).unwrap(); // re-selecting should not refire
        assert_eq!(*fired.borrow(), 1);
    }
}
