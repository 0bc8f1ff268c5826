//! The `usb` module implements components A through H and the request
//! dispatcher (F) that ties them together: the entity tree (Device ->
//! Configuration -> Interface -> Endpoint), its descriptor codec, the
//! class/vendor handler registries, and the BOS/Device Capability codec.

pub mod bos;
pub mod cdc;
pub mod configuration;
pub mod descriptor;
pub mod device;
pub mod dispatcher;
pub mod endpoint;
pub mod handlers;
pub mod hid;
pub mod interface;
pub mod scsi;
pub mod setup;
pub mod types;

pub use configuration::Configuration;
pub use descriptor::StringSlot;
pub use device::{Device, DeviceState};
pub use dispatcher::{Dispatcher, NullObserver, RequestObserver};
pub use endpoint::Endpoint;
pub use handlers::{identity_mutator, HandlerRegistry};
pub use interface::{AltSetting, Interface};
pub use setup::{RequestLogEntry, RequestOutcome, SetupPacket};
pub use types::{
    DescriptorType, Direction, EndpointDirection, Feature, LangId, Recipient, RequestKind,
    StandardRequest, SyncType, TransferType, UsageType,
};
