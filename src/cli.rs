//! Component O — hand-rolled CLI argument parsing. No arg-parsing crate
//! appears anywhere in the reference corpus, so each binary parses
//! `std::env::args()` itself, matching the plain `docopt` usage blocks of
//! `original_source/numap/apps/scan.py`, `detect_os.py`, `strings.py`.
//! `scan.py`'s own usage block only carries `-P/-q/-v`; the `-t`/`-T`/`-d`/
//! `-i` flags below have no Python original to translate and are designed
//! straight from the scan harness's needs (bounding how long a device
//! assembly runs and which templates it runs at all).
use std::time::Duration;

use crate::devices;
use crate::error::{UsbError, UsbResult};

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub phy: String,
    /// How long each device template runs before the sweep moves on, unless
    /// it is cut short early by `on_supported`/`on_configured` firing
    /// (see `always_timeout`).
    pub timeout: Duration,
    /// Run the full `timeout` window for every device even after it is
    /// recognized as supported, instead of moving on as soon as it is.
    pub always_timeout: bool,
    /// Restrict the sweep to these template names. Empty means run every
    /// template `devices::all_templates()` returns.
    pub devices: Vec<String>,
    /// Template names to skip even if they would otherwise be included.
    pub ignore: Vec<String>,
    pub quiet: bool,
    pub verbosity: u8,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            phy: "fd:/dev/ttyUSB0".to_string(),
            timeout: Duration::from_secs(5),
            always_timeout: false,
            devices: Vec::new(),
            ignore: Vec::new(),
            quiet: false,
            verbosity: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectOsOptions {
    pub phy: String,
    pub quiet: bool,
    pub verbosity: u8,
}

impl Default for DetectOsOptions {
    fn default() -> Self {
        Self { phy: "fd:/dev/ttyUSB0".to_string(), quiet: false, verbosity: 0 }
    }
}

#[derive(Debug, Clone)]
pub struct StringsOptions {
    pub phy: String,
    pub quiet: bool,
    pub verbosity: u8,
}

impl Default for StringsOptions {
    fn default() -> Self {
        Self { phy: "fd:/dev/ttyUSB0".to_string(), quiet: false, verbosity: 0 }
    }
}

pub const SCAN_USAGE: &str = "\
Scan device support in USB host

Usage:
    scan [-P PHY_INFO] [-t SECONDS] [-T] [-d DEVICE]... [-i DEVICE]... [-q] [-v ...]

Options:
    -P, --phy PHY_INFO     physical layer info, see list below
    -t, --timeout SECONDS  seconds to run each device template before moving on (default 5)
    -T, --always-timeout   keep running the full timeout even once a device is supported
    -d, --device DEVICE    only scan this device template (repeatable)
    -i, --ignore DEVICE    skip this device template (repeatable)
    -v, --verbose          increase verbosity (repeatable)
    -q, --quiet            quiet mode, only print warning/error messages

Physical layer:
    fd:<serial_port>      use a Facedancer-style board over a serial port
    gadgetfs              use gadgetfs (requires mounting beforehand)

Example:
    scan -P fd:/dev/ttyUSB0 -q";

pub const DETECT_OS_USAGE: &str = "\
Try to detect the host OS from its USB traffic.

Usage:
    detect-os [-P PHY_INFO] [-q] [-v ...]

Options:
    -P, --phy PHY_INFO    physical layer info, see list below
    -v, --verbose         increase verbosity (repeatable)
    -q, --quiet           quiet mode, only print warning/error messages

Physical layer:
    fd:<serial_port>      use a Facedancer-style board over a serial port
    gadgetfs              use gadgetfs (requires mounting beforehand)

Example:
    detect-os -P fd:/dev/ttyUSB0 -q";

pub const STRINGS_USAGE: &str = "\
Explore and modify USB string descriptors interactively.

Usage:
    strings [-P PHY_INFO] [-q] [-v ...]

Options:
    -P, --phy PHY_INFO    physical layer info, see list below
    -v, --verbose         increase verbosity (repeatable)
    -q, --quiet           quiet mode, only print warning/error messages

Physical layer:
    fd:<serial_port>      use a Facedancer-style board over a serial port
    gadgetfs              use gadgetfs (requires mounting beforehand)

Example:
    strings -P fd:/dev/ttyUSB0 -q";

/// Parses a flag common to all three binaries (`-P`/`-q`/`-v`). Returns
/// `Ok(true)` if `token` was one of these and has been applied, `Ok(false)`
/// if the caller should try its own binary-specific flags next.
fn parse_common_token(
    token: &str,
    args: &[String],
    i: &mut usize,
    phy: &mut String,
    quiet: &mut bool,
    verbosity: &mut u8,
) -> UsbResult<bool> {
    match token {
        "-P" | "--phy" => {
            *i += 1;
            let value = args
                .get(*i)
                .ok_or_else(|| UsbError::Configuration("-P/--phy requires a value".into()))?;
            *phy = value.clone();
            Ok(true)
        }
        "-q" | "--quiet" => {
            *quiet = true;
            Ok(true)
        }
        "-v" | "--verbose" => {
            *verbosity += 1;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Parses `scan`'s flags, including the timeout/filter set `scan.py` never
/// had. `-d`/`-i` are validated against `devices::find_template` so a typo'd
/// device name is caught here rather than silently scanning nothing.
pub fn parse_scan(args: &[String]) -> UsbResult<ScanOptions> {
    let mut opts = ScanOptions::default();
    let mut i = 0;
    while i < args.len() {
        let token = args[i].clone();
        if parse_common_token(&token, args, &mut i, &mut opts.phy, &mut opts.quiet, &mut opts.verbosity)? {
            i += 1;
            continue;
        }
        match token.as_str() {
            "-t" | "--timeout" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| UsbError::Configuration("-t/--timeout requires a value".into()))?;
                let secs: u64 = value
                    .parse()
                    .map_err(|_| UsbError::Configuration(format!("invalid timeout '{value}'")))?;
                opts.timeout = Duration::from_secs(secs);
            }
            "-T" | "--always-timeout" => opts.always_timeout = true,
            "-d" | "--device" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| UsbError::Configuration("-d/--device requires a value".into()))?;
                opts.devices.push(value.clone());
            }
            "-i" | "--ignore" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| UsbError::Configuration("-i/--ignore requires a value".into()))?;
                opts.ignore.push(value.clone());
            }
            other => return Err(UsbError::Configuration(format!("unrecognized flag '{other}'"))),
        }
        i += 1;
    }
    for name in opts.devices.iter().chain(opts.ignore.iter()) {
        if devices::find_template(name).is_none() {
            return Err(UsbError::Configuration(format!("unknown device name '{name}'")));
        }
    }
    Ok(opts)
}

pub fn parse_detect_os(args: &[String]) -> UsbResult<DetectOsOptions> {
    let mut opts = DetectOsOptions::default();
    let mut i = 0;
    while i < args.len() {
        let token = args[i].clone();
        if parse_common_token(&token, args, &mut i, &mut opts.phy, &mut opts.quiet, &mut opts.verbosity)? {
            i += 1;
            continue;
        }
        return Err(UsbError::Configuration(format!("unrecognized flag '{token}'")));
    }
    Ok(opts)
}

pub fn parse_strings(args: &[String]) -> UsbResult<StringsOptions> {
    let mut opts = StringsOptions::default();
    let mut i = 0;
    while i < args.len() {
        let token = args[i].clone();
        if parse_common_token(&token, args, &mut i, &mut opts.phy, &mut opts.quiet, &mut opts.verbosity)? {
            i += 1;
            continue;
        }
        return Err(UsbError::Configuration(format!("unrecognized flag '{token}'")));
    }
    Ok(opts)
}

/// The `log::LevelFilter` the binaries install `simple_logger` at, derived
/// from `-q`/`-v` exactly as the original's `NumapApp.logger` verbosity
/// gate.
pub fn log_level(quiet: bool, verbosity: u8) -> log::LevelFilter {
    if quiet {
        return log::LevelFilter::Warn;
    }
    match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scan_reads_phy_and_repeated_verbose_flags() {
        let args: Vec<String> =
            ["-P", "fd:/dev/ttyUSB0", "-v", "-v"].into_iter().map(String::from).collect();
        let opts = parse_scan(&args).unwrap();
        assert_eq!(opts.phy, "fd:/dev/ttyUSB0");
        assert_eq!(opts.verbosity, 2);
        assert!(!opts.quiet);
    }

    #[test]
    fn parse_scan_reads_timeout_and_device_filters() {
        let args: Vec<String> = ["-t", "10", "-T", "-d", "keyboard", "-i", "printer"]
            .into_iter()
            .map(String::from)
            .collect();
        let opts = parse_scan(&args).unwrap();
        assert_eq!(opts.timeout, Duration::from_secs(10));
        assert!(opts.always_timeout);
        assert_eq!(opts.devices, vec!["keyboard".to_string()]);
        assert_eq!(opts.ignore, vec!["printer".to_string()]);
    }

    #[test]
    fn parse_scan_rejects_unknown_device_name() {
        let args: Vec<String> = ["-d", "not-a-real-device"].into_iter().map(String::from).collect();
        assert!(parse_scan(&args).is_err());
    }

    #[test]
    fn parse_detect_os_rejects_unknown_flag() {
        let args: Vec<String> = ["--bogus".to_string()].to_vec();
        assert!(parse_detect_os(&args).is_err());
    }

    #[test]
    fn parse_strings_rejects_dangling_phy_flag() {
        let args: Vec<String> = ["-P".to_string()].to_vec();
        assert!(parse_strings(&args).is_err());
    }

    #[test]
    fn quiet_overrides_verbosity_for_log_level() {
        assert_eq!(log_level(true, 3), log::LevelFilter::Warn);
    }
}
