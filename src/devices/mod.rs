//! Component P — concrete device assemblies. Each submodule exposes
//! `build()` (a `Device` plus its template name) and `string_locations()`
//! (the per-slot semantic labels the REPL, component L, shows the user).
//! Grounded one-for-one on `original_source/numap/dev/*.py`.
pub mod audio;
pub mod billboard;
pub mod bluetooth;
pub mod cdc_acm;
pub mod cdc_eem;
pub mod cdc_ncm;
pub mod keyboard;
pub mod mass_storage;
pub mod printer;
pub mod rndis;
pub mod wifi;

use crate::usb::device::Device;

pub struct DeviceTemplate {
    pub name: &'static str,
    pub build: fn() -> (Device, &'static str),
    pub string_locations: fn() -> &'static [(&'static str, usize)],
}

/// The fixed device-template list the scan and OS-detection harnesses
/// iterate over (`fingerprints.py`'s `DEVICES` plus the vendor-stub and
/// BOS templates that have no fingerprint rules of their own).
pub fn all_templates() -> Vec<DeviceTemplate> {
    vec![
        DeviceTemplate {
            name: "keyboard",
            build: keyboard::build,
            string_locations: keyboard::string_locations,
        },
        DeviceTemplate {
            name: "audio",
            build: audio::build,
            string_locations: audio::string_locations,
        },
        DeviceTemplate {
            name: "mass_storage",
            build: mass_storage::build,
            string_locations: mass_storage::string_locations,
        },
        DeviceTemplate {
            name: "printer",
            build: printer::build,
            string_locations: printer::string_locations,
        },
        DeviceTemplate {
            name: "cdc_acm",
            build: cdc_acm::build,
            string_locations: cdc_acm::string_locations,
        },
        DeviceTemplate {
            name: "rndis",
            build: rndis::build,
            string_locations: rndis::string_locations,
        },
        DeviceTemplate {
            name: "billboard",
            build: billboard::build,
            string_locations: billboard::string_locations,
        },
        DeviceTemplate {
            name: "cdc_eem",
            build: cdc_eem::build,
            string_locations: cdc_eem::string_locations,
        },
        DeviceTemplate {
            name: "cdc_ncm",
            build: cdc_ncm::build,
            string_locations: cdc_ncm::string_locations,
        },
        DeviceTemplate {
            name: "wifi_qualcomm",
            build: wifi::build_qualcomm,
            string_locations: wifi::string_locations,
        },
        DeviceTemplate {
            name: "wifi_realtek",
            build: wifi::build_realtek,
            string_locations: wifi::string_locations,
        },
        DeviceTemplate {
            name: "bluetooth",
            build: bluetooth::build,
            string_locations: bluetooth::string_locations,
        },
    ]
}

pub fn find_template(name: &str) -> Option<DeviceTemplate> {
    all_templates().into_iter().find(|t| t.name == name)
}

/// The fixed device list the OS-detection sweep runs, a strict subset of
/// `all_templates()` (the six templates `fingerprints.py` has rules for).
pub const OS_DETECTION_TEMPLATES: &[&str] =
    &["keyboard", "audio", "mass_storage", "printer", "cdc_acm", "rndis"];
