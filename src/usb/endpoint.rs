//! Component B — a single directional pipe.
use crate::error::UsbResult;

use super::descriptor::EndpointDescriptor;
use super::types::{EndpointDirection, SyncType, TransferType, UsageType};

/// Invoked when an OUT token with data arrives on this endpoint.
pub type OutDataHandler = Box<dyn FnMut(&[u8]) -> UsbResult<()>>;
/// Invoked when an IN endpoint is polled and has nothing queued; may push
/// a burst by returning it.
pub type InReadyHandler = Box<dyn FnMut() -> UsbResult<Option<Vec<u8>>>>;

pub struct Endpoint {
    pub number: u8,
    pub direction: EndpointDirection,
    pub transfer_type: TransferType,
    pub sync_type: SyncType,
    pub usage_type: UsageType,
    pub max_packet_size: u16,
    pub interval: u8,
    pub stalled: bool,
    queued: Vec<u8>,
    on_data: Option<OutDataHandler>,
    on_buffer_available: Option<InReadyHandler>,
}

impl Endpoint {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        number: u8,
        direction: EndpointDirection,
        transfer_type: TransferType,
        sync_type: SyncType,
        usage_type: UsageType,
        max_packet_size: u16,
        interval: u8,
    ) -> Self {
        assert!((1..=15).contains(&number), "endpoint number must be 1-15");
        Self {
            number,
            direction,
            transfer_type,
            sync_type,
            usage_type,
            max_packet_size,
            interval,
            stalled: false,
            queued: Vec::new(),
            on_data: None,
            on_buffer_available: None,
        }
    }

    pub fn with_on_data(mut self, handler: OutDataHandler) -> Self {
        self.on_data = Some(handler);
        self
    }

    pub fn with_on_buffer_available(mut self, handler: InReadyHandler) -> Self {
        self.on_buffer_available = Some(handler);
        self
    }

    /// The address byte as it appears in an EndpointDescriptor
    /// (bit 7 = direction, bits 3..0 = number).
    pub fn address(&self) -> u8 {
        let dir_bit = match self.direction {
            EndpointDirection::In => 0x80,
            EndpointDirection::Out => 0x00,
        };
        dir_bit | (self.number & 0x0f)
    }

    pub fn bm_attributes(&self) -> u8 {
        (self.transfer_type as u8) | ((self.sync_type as u8) << 2) | ((self.usage_type as u8) << 4)
    }

    pub fn to_descriptor(&self) -> EndpointDescriptor {
        EndpointDescriptor::new(
            self.address(),
            self.bm_attributes(),
            self.max_packet_size,
            self.interval,
        )
    }

    /// Enqueue bytes for the next IN token.
    pub fn write(&mut self, bytes: Vec<u8>) {
        self.queued = bytes;
    }

    /// Invoked by the emulation loop when an OUT token carrying data
    /// arrives.
    pub fn on_data(&mut self, data: &[u8]) -> UsbResult<()> {
        if let Some(handler) = self.on_data.as_mut() {
            handler(data)?;
        }
        Ok(())
    }

    /// Invoked by the emulation loop when an IN endpoint is polled with
    /// nothing queued.
    pub fn on_buffer_available(&mut self) -> UsbResult<Option<Vec<u8>>> {
        if !self.queued.is_empty() {
            return Ok(Some(std::mem::take(&mut self.queued)));
        }
        if let Some(handler) = self.on_buffer_available.as_mut() {
            return handler();
        }
        Ok(None)
    }

    /// CLEAR_FEATURE(ENDPOINT_HALT) clears the stall flag.
    pub fn clear_halt(&mut self) {
        self.stalled = false;
    }

    pub fn set_halt(&mut self) {
        self.stalled = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_combines_direction_and_number() {
        let ep = Endpoint::new(
            3,
            EndpointDirection::In,
            TransferType::Bulk,
            SyncType::NoSync,
            UsageType::Data,
            64,
            0,
        );
        assert_eq!(ep.address(), 0x83);
    }

    #[test]
    fn clear_halt_resets_stall_flag() {
        let mut ep = Endpoint::new(
            1,
            EndpointDirection::Out,
            TransferType::Bulk,
            SyncType::NoSync,
            UsageType::Data,
            64,
            0,
        );
        ep.set_halt();
        assert!(ep.stalled);
        ep.clear_halt();
        assert!(!ep.stalled);
    }
}
