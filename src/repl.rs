//! Component L — the interactive string-editing REPL, grounded on
//! `original_source/numap/apps/strings.py`'s `NumapStringsApp.run()`: pick a
//! device template, list its strings with their semantic labels (drawn from
//! the template's `string_locations()`, the Rust analogue of
//! `STRING_LOCATIONS`), edit one in place, or start the emulation with the
//! edits applied.
use std::io::{BufRead, Write};

use crate::devices::{self, DeviceTemplate};
use crate::error::{UsbError, UsbResult};
use crate::phy::Phy;
use crate::usb::descriptor::StringSlot;
use crate::usb::dispatcher::NullObserver;
use crate::usb::setup::RequestLogEntry;

/// The printer's device ID answers through a channel separate from its
/// plain `strings` slot (see [`crate::devices::printer`]), so editing slot 4
/// here only changes what GET_DESCRIPTOR(STRING, 4) returns, not the live
/// GET_DEVICE_ID class-request response. The 255-byte STRING descriptor cap
/// is still waived for it, matching the original's "unlimited length"
/// carve-out for that one field.
const PRINTER_UNCAPPED_LABEL: &str = "device_id";

/// Parse either UTF-16 text or hex-encoded raw bytes into a `StringSlot`,
/// enforcing the 255-byte STRING descriptor limit unless `device_name` and
/// `label` are the printer's device ID exemption.
fn validate_string_edit(device_name: &str, label: &str, as_hex: bool, data: &str) -> UsbResult<StringSlot> {
    let uncapped = device_name == "printer" && label == PRINTER_UNCAPPED_LABEL;

    if as_hex {
        let bytes = parse_hex(data)?;
        if !uncapped && bytes.len() > 255 {
            return Err(UsbError::UserValidation(format!(
                "a string descriptor can be at most 0xff bytes long (got {})",
                bytes.len()
            )));
        }
        Ok(StringSlot::Bytes(bytes))
    } else {
        if !uncapped {
            let encoded_len = crate::usb::descriptor::encode_utf16le(data).len();
            if encoded_len > 255 {
                return Err(UsbError::UserValidation(format!(
                    "a string descriptor can be at most 0xff bytes long when encoded as UTF-16 (got {encoded_len})"
                )));
            }
        }
        Ok(StringSlot::Text(data.to_string()))
    }
}

fn parse_hex(data: &str) -> UsbResult<Vec<u8>> {
    let data = data.trim();
    if data.len() % 2 != 0 {
        return Err(UsbError::UserValidation("hex input must have an even number of digits".into()));
    }
    (0..data.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&data[i..i + 2], 16)
                .map_err(|_| UsbError::UserValidation(format!("invalid hex byte '{}'", &data[i..i + 2])))
        })
        .collect()
}

fn render_slot(slot: &StringSlot) -> String {
    match slot {
        StringSlot::LangIds(ids) => format!("{ids:?}"),
        StringSlot::Text(text) => text.clone(),
        StringSlot::Bytes(bytes) => bytes.iter().map(|b| format!("{b:02x}")).collect(),
    }
}

/// Runs the strings REPL against `phy` using real stdin/stdout, the entry
/// point `src/bin/strings.rs` calls.
pub fn run(phy: &mut dyn Phy) -> UsbResult<()> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut stdout = std::io::stdout();
    run_with_io(phy, &mut input, &mut stdout)
}

fn run_with_io(phy: &mut dyn Phy, input: &mut dyn BufRead, out: &mut dyn Write) -> UsbResult<()> {
    let templates = devices::all_templates();
    loop {
        writeln!(out, "Available devices:").ok();
        for (i, template) in templates.iter().enumerate() {
            writeln!(out, "{i} ({})", template.name).ok();
        }
        write!(out, "Select a device or \"e\" to exit: ").ok();
        out.flush().ok();
        let Some(line) = read_line(input) else {
            return Ok(());
        };
        if line.trim().eq_ignore_ascii_case("e") {
            return Ok(());
        }
        let Ok(index) = line.trim().parse::<usize>() else {
            writeln!(out, "Could not parse selection as integer.").ok();
            continue;
        };
        let Some(template) = templates.get(index) else {
            writeln!(out, "Selection is not valid.").ok();
            continue;
        };
        edit_device_session(template, phy, input, out)?;
    }
}

fn edit_device_session(
    template: &DeviceTemplate,
    phy: &mut dyn Phy,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> UsbResult<()> {
    let (mut device, device_name) = (template.build)();
    writeln!(out, "Loaded {device_name}").ok();
    let labels = (template.string_locations)();

    loop {
        writeln!(out, "Available strings:").ok();
        for (label, index) in labels {
            let value = device.string_slot(*index as u8).map(render_slot).unwrap_or_default();
            writeln!(out, "{index} {label}:\n\t\"{value}\"").ok();
        }
        write!(out, "Select string to edit, \"s\" to start the emulation, \"b\" to go back, or \"e\" to exit: ").ok();
        out.flush().ok();
        let Some(line) = read_line(input) else {
            return Ok(());
        };
        let selection = line.trim();
        if selection.eq_ignore_ascii_case("b") {
            return Ok(());
        }
        if selection.eq_ignore_ascii_case("e") {
            std::process::exit(0);
        }
        if selection.eq_ignore_ascii_case("s") {
            start_emulation(&mut device, phy, out)?;
            continue;
        }

        let Ok(index) = selection.parse::<usize>() else {
            writeln!(out, "Could not parse selection as integer.").ok();
            continue;
        };
        let Some(&(label, _)) = labels.iter().find(|(_, i)| *i == index) else {
            writeln!(out, "Selection is not valid.").ok();
            continue;
        };
        writeln!(out, "Selected {label}").ok();

        write!(out, "Input bytes as hex? Otherwise string will be converted to UTF-16 [y/N] ").ok();
        out.flush().ok();
        let Some(answer) = read_line(input) else {
            return Ok(());
        };
        let as_hex = match answer.trim().to_ascii_lowercase().as_str() {
            "" | "n" => false,
            "y" => true,
            _ => {
                writeln!(out, "Invalid selection.").ok();
                continue;
            }
        };

        write!(out, "Data: ").ok();
        out.flush().ok();
        let Some(data) = read_line(input) else {
            return Ok(());
        };

        match validate_string_edit(device_name, label, as_hex, &data) {
            Ok(slot) => {
                if let Some(existing) = device.strings.get_mut(index) {
                    *existing = slot;
                }
            }
            Err(err) => {
                writeln!(out, "{err}").ok();
            }
        }
    }
}

/// Starts the emulation loop with whatever edits have been applied so far,
/// running until the transport reports a disconnect (`strings.py`'s
/// `should_stop_phy` always returns `False`; there is no REPL-driven
/// timeout here).
fn start_emulation(device: &mut crate::usb::Device, phy: &mut dyn Phy, out: &mut dyn Write) -> UsbResult<()> {
    let mut observer = NullObserver;
    let log: Vec<RequestLogEntry> =
        crate::emulation::run(device, phy, &mut observer, |_dev, _log| false)?;
    writeln!(out, "Emulation session ended ({} requests observed).", log.len()).ok();
    Ok(())
}

fn read_line(input: &mut dyn BufRead) -> Option<String> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim_end_matches(['\n', '\r']).to_string()),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_text_over_255_utf16_bytes_is_rejected() {
        let long = "x".repeat(200);
        assert!(validate_string_edit("keyboard", "manufacturer", false, &long).is_err());
    }

    #[test]
    fn printer_device_id_is_exempt_from_the_length_cap() {
        let long = "x".repeat(400);
        assert!(validate_string_edit("printer", "device_id", false, &long).is_ok());
    }

    #[test]
    fn hex_input_is_parsed_into_raw_bytes() {
        let slot = validate_string_edit("keyboard", "serial", true, "deadbeef").unwrap();
        assert_eq!(slot, StringSlot::Bytes(vec![0xde, 0xad, 0xbe, 0xef]));
    }

    #[test]
    fn odd_length_hex_input_is_rejected() {
        assert!(validate_string_edit("keyboard", "serial", true, "abc").is_err());
    }

    #[test]
    fn render_slot_shows_text_verbatim() {
        assert_eq!(render_slot(&StringSlot::Text("hello".into())), "hello");
    }
}
