//! GadgetFS transport: a mounted pseudo-filesystem where `ep0` is opened
//! once for control transfers and each bulk/interrupt endpoint gets its own
//! file under the mount point. Reuses the same reader-thread-plus-channel
//! shape as [`super::serial`], one reader per open endpoint file instead of
//! one shared framed stream, since GadgetFS already demultiplexes by path.
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crate::error::{UsbError, UsbResult};
use crate::phy::{Event, Phy};
use crate::usb::setup::SetupPacket;

/// GadgetFS ep0 read events: a bus reset is a zero-length read, a setup
/// packet is exactly 8 bytes, anything else is OUT data already addressed
/// to ep0.
fn classify_ep0_read(buf: &[u8]) -> UsbResult<Event> {
    match buf.len() {
        0 => Ok(Event::BusReset),
        8 => Ok(Event::Setup(SetupPacket::from_bytes(buf)?)),
        _ => Ok(Event::OutData(0, buf.to_vec())),
    }
}

struct EndpointReader {
    endpoint: u8,
    file: File,
    events: Sender<Event>,
}

impl EndpointReader {
    fn run(&mut self) {
        let mut buf = [0u8; 512];
        loop {
            match self.file.read(&mut buf) {
                Ok(n) => {
                    let event = if self.endpoint == 0 {
                        match classify_ep0_read(&buf[..n]) {
                            Ok(event) => event,
                            Err(err) => {
                                log::warn!("gadgetfs ep0 decode error: {err}");
                                continue;
                            }
                        }
                    } else if n == 0 {
                        Event::InTokenReady(self.endpoint)
                    } else {
                        Event::OutData(self.endpoint, buf[..n].to_vec())
                    };
                    if self.events.send(event).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    log::warn!("gadgetfs endpoint {} read error: {err}", self.endpoint);
                    return;
                }
            }
        }
    }
}

pub struct GadgetFsPhy {
    mount_point: PathBuf,
    events: Option<Receiver<Event>>,
    endpoint_files: Vec<(u8, File)>,
}

impl GadgetFsPhy {
    pub fn open(mount_point: &str) -> UsbResult<Self> {
        Ok(Self {
            mount_point: PathBuf::from(mount_point),
            events: None,
            endpoint_files: Vec::new(),
        })
    }

    fn endpoint_path(&self, endpoint: u8) -> PathBuf {
        if endpoint == 0 {
            self.mount_point.join("ep0")
        } else {
            self.mount_point.join(format!("ep{endpoint}"))
        }
    }

    fn open_endpoint(&self, endpoint: u8) -> UsbResult<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .open(self.endpoint_path(endpoint))
            .map_err(|e| UsbError::Transport(format!("opening {endpoint}: {e}")))
    }
}

impl Phy for GadgetFsPhy {
    fn connect(&mut self) -> UsbResult<()> {
        if !Path::new(&self.mount_point).exists() {
            return Err(UsbError::Transport(format!(
                "gadgetfs mount point {} does not exist",
                self.mount_point.display()
            )));
        }
        let ep0 = self.open_endpoint(0)?;
        let (tx, rx) = channel();
        let reader_file = ep0.try_clone().map_err(|e| UsbError::Transport(e.to_string()))?;
        let reader_tx = tx.clone();
        thread::spawn(move || {
            log::debug!("spawning gadgetfs ep0 reader");
            EndpointReader {
                endpoint: 0,
                file: reader_file,
                events: reader_tx,
            }
            .run();
        });
        self.endpoint_files.push((0, ep0));
        self.events = Some(rx);
        Ok(())
    }

    fn disconnect(&mut self) -> UsbResult<()> {
        self.events = None;
        self.endpoint_files.clear();
        Ok(())
    }

    fn poll(&mut self, timeout: Duration) -> UsbResult<Option<Event>> {
        let Some(events) = self.events.as_ref() else {
            return Err(UsbError::Transport("phy not connected".into()));
        };
        match events.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                Err(UsbError::Transport("gadgetfs reader thread stopped".into()))
            }
        }
    }

    fn send_on_endpoint(&mut self, endpoint: u8, bytes: &[u8]) -> UsbResult<()> {
        let file = match self.endpoint_files.iter_mut().find(|(ep, _)| *ep == endpoint) {
            Some((_, file)) => file,
            None => {
                let file = self.open_endpoint(endpoint)?;
                self.endpoint_files.push((endpoint, file));
                &mut self.endpoint_files.last_mut().unwrap().1
            }
        };
        file.write_all(bytes).map_err(|e| UsbError::Transport(e.to_string()))
    }

    fn stall_endpoint(&mut self, endpoint: u8) -> UsbResult<()> {
        // GadgetFS stalls an endpoint by writing a zero-length packet that
        // the kernel driver interprets as STALL when no data was requested.
        self.send_on_endpoint(endpoint, &[])
    }

    fn ack_status_stage(&mut self) -> UsbResult<()> {
        self.send_on_endpoint(0, &[])
    }
}
