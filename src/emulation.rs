//! Component J — the single-threaded cooperative emulation loop tying the
//! phy (I) to the device entity tree (E) and dispatcher (F).
use std::time::Duration;

use crate::error::{UsbError, UsbResult};
use crate::phy::{Event, Phy};
use crate::usb::device::Device;
use crate::usb::dispatcher::{Dispatcher, RequestObserver};
use crate::usb::setup::{RequestLogEntry, RequestOutcome};

const POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// Runs one device's emulation session against `phy` until `should_stop`
/// returns true or a transport error occurs. Returns the full request log
/// collected during the run (consumed by the fingerprint/scan harness).
pub fn run(
    device: &mut Device,
    phy: &mut dyn Phy,
    observer: &mut dyn RequestObserver,
    mut should_stop: impl FnMut(&Device, &[RequestLogEntry]) -> bool,
) -> UsbResult<Vec<RequestLogEntry>> {
    let mut log = Vec::new();

    phy.connect()?;
    device.on_connect();

    loop {
        let event = phy.poll(POLL_TIMEOUT)?;
        if let Some(event) = event {
            handle_event(device, phy, observer, event, &mut log)?;
        }
        if should_stop(device, &log) {
            phy.disconnect()?;
            device.on_disconnect();
            return Ok(log);
        }
    }
}

fn handle_event(
    device: &mut Device,
    phy: &mut dyn Phy,
    observer: &mut dyn RequestObserver,
    event: Event,
    log: &mut Vec<RequestLogEntry>,
) -> UsbResult<()> {
    match event {
        Event::BusReset => {
            device.on_bus_reset();
        }
        Event::Setup(setup) => {
            let w_length = setup.w_length;
            let entry = Dispatcher::dispatch(device, &setup, observer);
            let outcome = entry.outcome.clone();
            log.push(entry);
            match outcome {
                Some(RequestOutcome::Data(bytes)) => {
                    let mps = device.max_packet_size_ep0.max(1) as usize;
                    let limit = (w_length as usize).min(bytes.len());
                    for chunk in bytes[..limit].chunks(mps) {
                        phy.send_on_endpoint(0, chunk)?;
                    }
                    phy.ack_status_stage()?;
                }
                Some(RequestOutcome::NoData) => {
                    phy.ack_status_stage()?;
                }
                Some(RequestOutcome::Stall) | None => {
                    phy.stall_endpoint(0)?;
                }
            }
        }
        Event::OutData(endpoint, bytes) => {
            if endpoint == 0 {
                return Ok(());
            }
            let Some(config) = device.active_configuration_mut() else {
                return Err(UsbError::Transport(format!(
                    "OUT data on endpoint {endpoint} with no active configuration"
                )));
            };
            if let Some(ep) = config
                .interfaces
                .iter_mut()
                .find_map(|iface| iface.find_endpoint_mut(endpoint, crate::usb::types::EndpointDirection::Out))
            {
                ep.on_data(&bytes)?;
            }
        }
        Event::InTokenReady(endpoint) => {
            if endpoint == 0 {
                return Ok(());
            }
            let Some(config) = device.active_configuration_mut() else {
                return Ok(());
            };
            let ep = config
                .interfaces
                .iter_mut()
                .find_map(|iface| iface.find_endpoint_mut(endpoint, crate::usb::types::EndpointDirection::In));
            if let Some(ep) = ep {
                if let Some(data) = ep.on_buffer_available()? {
                    phy.send_on_endpoint(endpoint, &data)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usb::dispatcher::NullObserver;
    use std::collections::VecDeque;

    struct FakePhy {
        queued: VecDeque<Event>,
        sent: Vec<(u8, Vec<u8>)>,
        connected: bool,
    }

    impl Phy for FakePhy {
        fn connect(&mut self) -> UsbResult<()> {
            self.connected = true;
            Ok(())
        }
        fn disconnect(&mut self) -> UsbResult<()> {
            self.connected = false;
            Ok(())
        }
        fn poll(&mut self, _timeout: Duration) -> UsbResult<Option<Event>> {
            Ok(self.queued.pop_front())
        }
        fn send_on_endpoint(&mut self, endpoint: u8, bytes: &[u8]) -> UsbResult<()> {
            self.sent.push((endpoint, bytes.to_vec()));
            Ok(())
        }
        fn stall_endpoint(&mut self, _endpoint: u8) -> UsbResult<()> {
            Ok(())
        }
        fn ack_status_stage(&mut self) -> UsbResult<()> {
            Ok(())
        }
    }

    #[test]
    fn get_device_descriptor_is_chunked_and_acked() {
        let mut device = Device::new(0x1234, 0x5678);
        device.max_packet_size_ep0 = 8;
        let mut phy = FakePhy {
            queued: VecDeque::from([Event::Setup(crate::usb::setup::SetupPacket {
                bm_request_type: 0x80,
                b_request: 0x06,
                w_value: 0x0100,
                w_index: 0,
                w_length: 64,
                data: None,
            })]),
            sent: Vec::new(),
            connected: false,
        };
        let log = run(&mut device, &mut phy, &mut NullObserver, |_dev, log| !log.is_empty()).unwrap();
        assert_eq!(log.len(), 1);
        assert!(phy.sent.len() >= 3); // 18 bytes in chunks of 8
        assert!(!phy.connected); // disconnected on stop
    }
}
