//! Shared enums for setup packets and descriptors. Mirrors the Chapter 9
//! request/descriptor vocabulary of the USB 2.0 specification.
use packed_struct::prelude::*;

/// Data transfer direction encoded in bit 7 of bmRequestType.
#[derive(PrimitiveEnum_u8, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    HostToDevice = 0,
    DeviceToHost = 1,
}

/// Request type encoded in bits 6..5 of bmRequestType.
#[derive(PrimitiveEnum_u8, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RequestKind {
    Standard = 0,
    Class = 1,
    Vendor = 2,
    Reserved = 3,
}

/// Request recipient encoded in bits 4..0 of bmRequestType.
#[derive(PrimitiveEnum_u8, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Recipient {
    Device = 0,
    Interface = 1,
    Endpoint = 2,
    Other = 3,
}

/// Standard (chapter 9) request codes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StandardRequest {
    GetStatus,
    ClearFeature,
    SetFeature,
    SetAddress,
    GetDescriptor,
    SetDescriptor,
    GetConfiguration,
    SetConfiguration,
    GetInterface,
    SetInterface,
    SynchFrame,
    Unknown(u8),
}

impl StandardRequest {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0x00 => Self::GetStatus,
            0x01 => Self::ClearFeature,
            0x03 => Self::SetFeature,
            0x05 => Self::SetAddress,
            0x06 => Self::GetDescriptor,
            0x07 => Self::SetDescriptor,
            0x08 => Self::GetConfiguration,
            0x09 => Self::SetConfiguration,
            0x0a => Self::GetInterface,
            0x0b => Self::SetInterface,
            0x0c => Self::SynchFrame,
            other => Self::Unknown(other),
        }
    }

    /// Name used in the request log (`request_number_string`), matching the
    /// strings produced by the original Python `get_request_number_string()`.
    pub fn as_str(&self) -> String {
        match self {
            Self::GetStatus => "GET_STATUS".into(),
            Self::ClearFeature => "CLEAR_FEATURE".into(),
            Self::SetFeature => "SET_FEATURE".into(),
            Self::SetAddress => "SET_ADDRESS".into(),
            Self::GetDescriptor => "GET_DESCRIPTOR".into(),
            Self::SetDescriptor => "SET_DESCRIPTOR".into(),
            Self::GetConfiguration => "GET_CONFIGURATION".into(),
            Self::SetConfiguration => "SET_CONFIGURATION".into(),
            Self::GetInterface => "GET_INTERFACE".into(),
            Self::SetInterface => "SET_INTERFACE".into(),
            Self::SynchFrame => "SYNCH_FRAME".into(),
            Self::Unknown(n) => format!("unknown request {n}"),
        }
    }
}

/// Descriptor type, selected by the high byte of wValue in GET_DESCRIPTOR.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DescriptorType {
    Device,
    Configuration,
    String,
    Interface,
    Endpoint,
    DeviceQualifier,
    OtherSpeedConfiguration,
    InterfacePower,
    Bos,
    DeviceCapability,
    ClassSpecific(u8),
    Unknown(u8),
}

impl DescriptorType {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0x01 => Self::Device,
            0x02 => Self::Configuration,
            0x03 => Self::String,
            0x04 => Self::Interface,
            0x05 => Self::Endpoint,
            0x06 => Self::DeviceQualifier,
            0x07 => Self::OtherSpeedConfiguration,
            0x08 => Self::InterfacePower,
            0x0f => Self::Bos,
            0x10 => Self::DeviceCapability,
            0x21..=0x2f => Self::ClassSpecific(v),
            other => Self::Unknown(other),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Device => 0x01,
            Self::Configuration => 0x02,
            Self::String => 0x03,
            Self::Interface => 0x04,
            Self::Endpoint => 0x05,
            Self::DeviceQualifier => 0x06,
            Self::OtherSpeedConfiguration => 0x07,
            Self::InterfacePower => 0x08,
            Self::Bos => 0x0f,
            Self::DeviceCapability => 0x10,
            Self::ClassSpecific(v) | Self::Unknown(v) => *v,
        }
    }

    /// Name used in the request log (`descriptor_number_string`).
    pub fn as_str(&self) -> String {
        match self {
            Self::Device => "DEVICE".into(),
            Self::Configuration => "CONFIGURATION".into(),
            Self::String => "STRING".into(),
            Self::Interface => "INTERFACE".into(),
            Self::Endpoint => "ENDPOINT".into(),
            Self::DeviceQualifier => "DEVICE_QUALIFIER".into(),
            Self::OtherSpeedConfiguration => "OTHER_SPEED_CONFIGURATION".into(),
            Self::InterfacePower => "INTERFACE_POWER".into(),
            Self::Bos => "BOS".into(),
            Self::DeviceCapability => "DEVICE_CAPABILITY".into(),
            Self::ClassSpecific(v) => format!("class specific descriptor {v}"),
            Self::Unknown(v) => format!("unknown descriptor {v}"),
        }
    }
}

/// Commonly used USB-IF device/interface class codes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeviceClass {
    Unspecified = 0x00,
    Audio = 0x01,
    Cdc = 0x02,
    Hid = 0x03,
    Printer = 0x07,
    MassStorage = 0x08,
    Hub = 0x09,
    CdcData = 0x0a,
    Billboard = 0x11,
    VendorSpecific = 0xff,
}

/// Endpoint direction as encoded in bit 7 of bEndpointAddress.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EndpointDirection {
    Out,
    In,
}

/// Endpoint transfer type, bits 1..0 of bmAttributes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransferType {
    Control = 0b00,
    Isochronous = 0b01,
    Bulk = 0b10,
    Interrupt = 0b11,
}

/// Isochronous synchronization type, bits 3..2 of bmAttributes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SyncType {
    NoSync = 0b00,
    Async = 0b01,
    Adaptive = 0b10,
    Sync = 0b11,
}

/// Isochronous usage type, bits 5..4 of bmAttributes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UsageType {
    Data = 0b00,
    Feedback = 0b01,
    ImplicitFeedback = 0b10,
    Reserved = 0b11,
}

/// USB-IF standard language identifier. Only English (US) is needed by the
/// device templates in this crate, but the table is open-ended on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LangId(pub u16);

impl LangId {
    pub const ENGLISH_US: LangId = LangId(0x0409);
}

/// USB feature selectors used by (CLEAR|SET)_FEATURE.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Feature {
    EndpointHalt,
    DeviceRemoteWakeup,
    TestMode,
    Unknown(u16),
}

impl Feature {
    pub fn from_u16(v: u16) -> Self {
        match v {
            0 => Self::EndpointHalt,
            1 => Self::DeviceRemoteWakeup,
            2 => Self::TestMode,
            other => Self::Unknown(other),
        }
    }
}
