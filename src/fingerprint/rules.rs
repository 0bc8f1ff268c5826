//! Component K's fingerprint table, translated one-for-one from
//! `original_source/numap/apps/fingerprints.py`'s `FINGERPRINTS` dict. Each
//! rule is a pure predicate over the full request log and the prefix
//! captured before the SET_CONFIGURATION boundary.
use crate::usb::setup::RequestLogEntry;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Os {
    Unknown,
    Windows,
    Linux,
    MacOs,
    Ios,
}

/// A rule's device scope: either a fixed set of device-template names, or
/// every device (the Python dict's `'ANY'` key).
pub enum Scope {
    Named(&'static [&'static str]),
    Any,
}

impl Scope {
    fn matches(&self, device_name: &str) -> bool {
        match self {
            Scope::Named(names) => names.contains(&device_name),
            Scope::Any => true,
        }
    }
}

pub struct Rule {
    pub scope: Scope,
    pub description: &'static str,
    pub predicate: fn(&[RequestLogEntry], &[RequestLogEntry]) -> Vec<Os>,
}

fn count_matching<'a>(
    entries: impl Iterator<Item = &'a RequestLogEntry>,
    request: &str,
    descriptor: Option<&str>,
) -> usize {
    entries
        .filter(|e| {
            e.get_request_number_string() == request
                && descriptor.map(|d| e.get_descriptor_number_string() == Some(d)).unwrap_or(true)
        })
        .count()
}

fn windows_if_at_least_3_config_reads(_reqs: &[RequestLogEntry], conf_reqs: &[RequestLogEntry]) -> Vec<Os> {
    if count_matching(conf_reqs.iter(), "GET_DESCRIPTOR", Some("CONFIGURATION")) >= 3 {
        vec![Os::Windows]
    } else {
        vec![Os::Linux]
    }
}

fn linux_if_requests_manufacturer_string(reqs: &[RequestLogEntry], _conf_reqs: &[RequestLogEntry]) -> Vec<Os> {
    let requested = reqs.iter().any(|r| {
        r.get_request_number_string() == "GET_DESCRIPTOR"
            && r.get_descriptor_number_string() == Some("STRING")
            && (r.value & 0xff) == 0x01
    });
    if requested {
        vec![Os::Linux]
    } else {
        vec![Os::Windows]
    }
}

fn windows_if_requests_ms_os_descriptor(reqs: &[RequestLogEntry], _conf_reqs: &[RequestLogEntry]) -> Vec<Os> {
    let requested = reqs
        .iter()
        .any(|r| r.get_request_number_string() == "GET_DESCRIPTOR" && r.value == 0x03ee);
    if requested {
        vec![Os::Windows]
    } else {
        vec![Os::Unknown]
    }
}

fn linux_if_sets_audio_properties(reqs: &[RequestLogEntry], _conf_reqs: &[RequestLogEntry]) -> Vec<Os> {
    let set = reqs.iter().any(|r| {
        let name = r.get_request_number_string();
        name == "class request 4" || name == "class request 1"
    });
    if set {
        vec![Os::Linux]
    } else {
        vec![Os::Windows]
    }
}

fn windows_if_config_descriptor_read_after_configuration(
    reqs: &[RequestLogEntry],
    conf_reqs: &[RequestLogEntry],
) -> Vec<Os> {
    let boundary = conf_reqs.len().saturating_sub(1);
    let post_boundary = reqs.get(boundary..).unwrap_or(&[]);
    if count_matching(post_boundary.iter(), "GET_DESCRIPTOR", Some("CONFIGURATION")) > 1 {
        vec![Os::Windows]
    } else {
        vec![Os::Linux]
    }
}

fn windows_if_additional_class_requests(reqs: &[RequestLogEntry], _conf_reqs: &[RequestLogEntry]) -> Vec<Os> {
    let count = reqs
        .iter()
        .filter(|r| {
            let name = r.get_request_number_string();
            name.starts_with("class request ")
                && (name.ends_with("32") || name.ends_with("33") || name.ends_with("34"))
        })
        .count();
    if count > 1 {
        vec![Os::Windows]
    } else {
        vec![Os::Linux]
    }
}

/// The fixed fingerprint table, rebuilt fresh per call since function
/// pointers are cheap and there is no lazily-initialized static in the
/// reference corpus to borrow the pattern from.
pub fn fingerprints() -> Vec<Rule> {
    vec![
        Rule {
            scope: Scope::Named(&["keyboard", "cdc_acm", "rndis"]),
            description: ">3x Get Configuration Descriptor",
            predicate: windows_if_at_least_3_config_reads,
        },
        Rule {
            scope: Scope::Named(&["keyboard"]),
            description: "Request String 0x01 (Manufacturer String???)",
            predicate: linux_if_requests_manufacturer_string,
        },
        Rule {
            scope: Scope::Any,
            description: "Request Microsoft OS Descriptor",
            predicate: windows_if_requests_ms_os_descriptor,
        },
        Rule {
            scope: Scope::Named(&["audio"]),
            description: "Set Audio Properties",
            predicate: linux_if_sets_audio_properties,
        },
        Rule {
            scope: Scope::Named(&["printer"]),
            description: "Get Configuration Descriptor after Configuration",
            predicate: windows_if_config_descriptor_read_after_configuration,
        },
        Rule {
            scope: Scope::Named(&["cdc_acm", "rndis"]),
            description: "Additional Class Requests",
            predicate: windows_if_additional_class_requests,
        },
    ]
}

/// Evaluate every rule whose scope matches `device_name`, returning the
/// flattened votes across all matching rules.
pub fn evaluate(device_name: &str, all_requests: &[RequestLogEntry], pre_config_requests: &[RequestLogEntry]) -> Vec<Os> {
    fingerprints()
        .into_iter()
        .filter(|rule| rule.scope.matches(device_name))
        .flat_map(|rule| (rule.predicate)(all_requests, pre_config_requests))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usb::setup::{RequestOutcome, SetupPacket};
    use crate::usb::types::Recipient;
    use std::time::Duration;

    fn descriptor_read(descriptor: &str, value: u16) -> RequestLogEntry {
        RequestLogEntry {
            setup: SetupPacket {
                bm_request_type: 0x80,
                b_request: 0x06,
                w_value: value,
                w_index: 0,
                w_length: 64,
                data: None,
            },
            recipient: Recipient::Device,
            request_number_string: "GET_DESCRIPTOR".to_string(),
            descriptor_number_string: Some(descriptor.to_string()),
            value,
            outcome: Some(RequestOutcome::NoData),
            elapsed: Duration::from_millis(0),
        }
    }

    #[test]
    fn s5_windows_fingerprint_requires_four_config_reads() {
        let four: Vec<_> = (0..4).map(|_| descriptor_read("CONFIGURATION", 0x0200)).collect();
        let votes = windows_if_at_least_3_config_reads(&four, &four);
        assert_eq!(votes, vec![Os::Windows]);

        let two: Vec<_> = (0..2).map(|_| descriptor_read("CONFIGURATION", 0x0200)).collect();
        let votes = windows_if_at_least_3_config_reads(&two, &two);
        assert_eq!(votes, vec![Os::Linux]);
    }

    #[test]
    fn s6_ms_os_descriptor_rule() {
        let with_ms = vec![descriptor_read("DEVICE", 0x03ee)];
        assert_eq!(windows_if_requests_ms_os_descriptor(&with_ms, &[]), vec![Os::Windows]);
        assert_eq!(windows_if_requests_ms_os_descriptor(&[], &[]), vec![Os::Unknown]);
    }

    #[test]
    fn evaluate_skips_rules_outside_device_scope() {
        let votes = evaluate("mass_storage", &[], &[]);
        assert!(votes.contains(&Os::Unknown)); // only the ANY rule applies
        assert_eq!(votes.len(), 1);
    }
}
