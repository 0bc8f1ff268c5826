//! Component I — the transport abstraction the emulation loop drives.
//! Two concrete transports (`serial`, `gadgetfs`) live alongside the trait;
//! neither is part of the contract itself.
use std::time::Duration;

use crate::error::UsbResult;
use crate::usb::setup::SetupPacket;

pub mod gadgetfs;
pub mod serial;

/// One observation surfaced by `poll()`.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    BusReset,
    Setup(SetupPacket),
    OutData(u8, Vec<u8>),
    InTokenReady(u8),
}

/// Everything the emulation loop (J) needs from a downstream controller.
pub trait Phy {
    fn connect(&mut self) -> UsbResult<()>;
    fn disconnect(&mut self) -> UsbResult<()>;
    /// Non-blocking beyond `timeout`; `Ok(None)` means nothing arrived.
    fn poll(&mut self, timeout: Duration) -> UsbResult<Option<Event>>;
    fn send_on_endpoint(&mut self, endpoint: u8, bytes: &[u8]) -> UsbResult<()>;
    fn stall_endpoint(&mut self, endpoint: u8) -> UsbResult<()>;
    fn ack_status_stage(&mut self) -> UsbResult<()>;
}

/// Parses the `-P phy` CLI flag (`fd:<path>` or `gadgetfs`) into a concrete
/// transport. Kept here rather than in `cli.rs` since it is the one place
/// that knows both transport constructors.
pub fn open(spec: &str) -> UsbResult<Box<dyn Phy>> {
    if let Some(path) = spec.strip_prefix("fd:") {
        Ok(Box::new(serial::SerialPhy::open(path)?))
    } else if spec == "gadgetfs" {
        Ok(Box::new(gadgetfs::GadgetFsPhy::open("/dev/gadget")?))
    } else {
        Err(crate::error::UsbError::Configuration(format!(
            "unknown phy spec '{spec}', expected 'fd:<path>' or 'gadgetfs'"
        )))
    }
}
