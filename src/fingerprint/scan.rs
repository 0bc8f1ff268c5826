//! Scan harness (component K), grounded on
//! `original_source/numap/apps/scan.py`'s `NumapScanApp`: run each device
//! template for a timeout window and report which ones the host recognized
//! and/or configured.
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::cli::ScanOptions;
use crate::devices::{self, DeviceTemplate};
use crate::phy::Phy;
use crate::usb::dispatcher::RequestObserver;
use crate::usb::setup::SetupPacket;
use crate::usb::types::Recipient;

pub struct ScanResult {
    pub device_name: &'static str,
    /// Set once a class/vendor handler other than `handle_unknown` actually
    /// answered a request, i.e. the host drove this device's protocol
    /// rather than only enumerating it. Mirrors the original's
    /// `usb_function_supported(reason)` callback.
    pub supported: bool,
    /// Set once SET_CONFIGURATION completed — a weaker signal than
    /// `supported`: a host can configure a device without ever sending it a
    /// class-specific request.
    pub configured: bool,
    /// Handler names that triggered `supported`, deduplicated and in first-
    /// seen order, standing in for the original's `self.reasons` set.
    pub reasons: Vec<String>,
}

/// `stop_early` is shared with the `should_stop` closure passed to
/// `emulation::run` via `Rc<Cell<_>>` rather than read directly off this
/// struct, since the closure runs alongside a live `&mut dyn RequestObserver`
/// borrow of it and cannot also borrow it itself.
struct ScanObserver {
    supported: bool,
    configured: bool,
    reasons: Vec<String>,
    stop_early: Rc<Cell<bool>>,
}

impl RequestObserver for ScanObserver {
    fn on_setup(&mut self, _setup: &SetupPacket, _recipient: Recipient) {}
    fn on_configured(&mut self) {
        self.configured = true;
        self.stop_early.set(true);
    }
    fn on_supported(&mut self, reason: &str) {
        self.supported = true;
        self.stop_early.set(true);
        if !self.reasons.iter().any(|r| r == reason) {
            self.reasons.push(reason.to_string());
        }
    }
}

/// Run the scan sweep across the device templates `opts` selects, one
/// device at a time, per `scan.py`'s `for device_name in self.umap_classes`
/// loop. `-d`/`-i` narrow the template list; `-t`/`-T` control how long each
/// template runs and whether it keeps running past the point it is already
/// known to be supported or configured.
pub fn run(phy: &mut dyn Phy, opts: &ScanOptions) -> Vec<ScanResult> {
    let mut results = Vec::new();
    for template in selected_templates(opts) {
        log::info!("testing support: {}", template.name);
        let (mut device, name) = (template.build)();
        let stop_early = Rc::new(Cell::new(false));
        let mut observer = ScanObserver {
            supported: false,
            configured: false,
            reasons: Vec::new(),
            stop_early: Rc::clone(&stop_early),
        };
        let start = Instant::now();
        let outcome = crate::emulation::run(&mut device, phy, &mut observer, |_dev, _log| {
            let elapsed = start.elapsed();
            if elapsed > opts.timeout {
                return true;
            }
            !opts.always_timeout && stop_early.get()
        });
        if let Err(err) = outcome {
            log::error!("{name}: transport error during scan: {err}");
        }
        if observer.supported {
            log::info!("{name}: SUPPORTED ({})", observer.reasons.join(", "));
        }
        results.push(ScanResult {
            device_name: name,
            supported: observer.supported,
            configured: observer.configured,
            reasons: observer.reasons,
        });
        std::thread::sleep(Duration::from_secs(2));
    }
    results
}

fn selected_templates(opts: &ScanOptions) -> Vec<DeviceTemplate> {
    devices::all_templates()
        .into_iter()
        .filter(|t| opts.devices.is_empty() || opts.devices.iter().any(|name| name == t.name))
        .filter(|t| !opts.ignore.iter().any(|name| name == t.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_templates_honors_device_filter_and_ignore_list() {
        let mut opts = ScanOptions::default();
        opts.devices = vec!["keyboard".to_string(), "printer".to_string()];
        opts.ignore = vec!["printer".to_string()];
        let names: Vec<_> = selected_templates(&opts).iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["keyboard"]);
    }

    #[test]
    fn selected_templates_defaults_to_every_template_when_unfiltered() {
        let opts = ScanOptions::default();
        assert_eq!(selected_templates(&opts).len(), devices::all_templates().len());
    }
}
