//! OS-detection harness (component K), grounded on
//! `original_source/numap/apps/detect_os.py`'s `NumapDetectOSApp`: run each
//! OS-detection device template for an 8-second window, evaluate the
//! fingerprint rule table against the collected request log, and print a
//! running histogram of OS votes.
//!
//! The original wraps each handler dict in a `test()` closure built via dict
//! comprehension (`{i: test(fun) for (i, fun) in ...}`) rather than mutating
//! the handler table in place — the "copy before wrap" shape spec.md's Open
//! Question asks about. This port observes requests at the dispatcher
//! (`RequestObserver`) instead of wrapping individual handler closures, and
//! rebuilds every device template fresh from `devices::all_templates()` on
//! each run, so there is no shared, mutable handler table to protect from
//! cross-run leakage in the first place.
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::devices;
use crate::fingerprint::rules::{self, Os};
use crate::phy::Phy;
use crate::usb::dispatcher::RequestObserver;
use crate::usb::setup::{RequestLogEntry, SetupPacket};
use crate::usb::types::Recipient;

const DETECTION_WINDOW: Duration = Duration::from_secs(8);

/// Observer that records the boundary between pre-configuration and
/// post-configuration requests, per `self.configuration_finished` in the
/// original.
struct DetectObserver {
    configured: bool,
    pre_config_count: usize,
}

impl RequestObserver for DetectObserver {
    fn on_setup(&mut self, _setup: &SetupPacket, _recipient: Recipient) {
        if !self.configured {
            self.pre_config_count += 1;
        }
    }
    fn on_configured(&mut self) {
        self.configured = true;
    }
}

pub struct DeviceVotes {
    pub device_name: &'static str,
    pub rule_votes: Vec<(&'static str, Vec<Os>)>,
}

/// Run the OS-detection sweep across `devices::OS_DETECTION_TEMPLATES`,
/// printing per-device rule votes as they are produced (the original's
/// `print()` calls) and returning the full vote table for the caller to
/// aggregate into a final histogram.
pub fn run(phy: &mut dyn Phy) -> Vec<DeviceVotes> {
    println!("Devices sometimes hang during OS detection. Reconnect the transport to continue with the next device.");
    let mut all_votes = Vec::new();

    for name in devices::OS_DETECTION_TEMPLATES {
        let Some(template) = devices::find_template(name) else {
            continue;
        };
        println!("Testing {name}...");
        let (mut device, device_name) = (template.build)();
        let mut observer = DetectObserver { configured: false, pre_config_count: 0 };
        let start = Instant::now();
        let outcome = crate::emulation::run(&mut device, phy, &mut observer, |_dev, _log| {
            start.elapsed() > DETECTION_WINDOW
        });

        let requests = match outcome {
            Ok(requests) => requests,
            Err(err) => {
                println!("There was an error: {err}");
                println!("Please reconnect the transport. This device test may be incomplete.");
                Vec::new()
            }
        };

        if requests.is_empty() {
            println!("No requests received. Are you sure the host supports {device_name} devices?");
            all_votes.push(DeviceVotes { device_name, rule_votes: Vec::new() });
            std::thread::sleep(Duration::from_secs(2));
            continue;
        }

        let pre_config: Vec<RequestLogEntry> =
            requests.iter().take(observer.pre_config_count).cloned().collect();
        let rule_votes = rule_votes_for(device_name, &requests, &pre_config);
        for (description, votes) in &rule_votes {
            for os in votes {
                println!("{os:?} ({description})");
            }
        }
        println!("------------------------");
        all_votes.push(DeviceVotes { device_name, rule_votes });

        std::thread::sleep(Duration::from_secs(2));
    }

    print_overall_histogram(&all_votes);
    all_votes
}

/// Re-evaluate the rule table per-rule (rather than `rules::evaluate`'s
/// flattened vote list) so each rule's description can be printed next to
/// its own votes, matching the original's per-`FINGERPRINTS` entry loop.
fn rule_votes_for(
    device_name: &str,
    requests: &[RequestLogEntry],
    pre_config: &[RequestLogEntry],
) -> Vec<(&'static str, Vec<Os>)> {
    rules::fingerprints()
        .into_iter()
        .filter(|rule| match rule.scope {
            rules::Scope::Named(names) => names.contains(&device_name),
            rules::Scope::Any => true,
        })
        .map(|rule| (rule.description, (rule.predicate)(requests, pre_config)))
        .collect()
}

fn print_overall_histogram(all_votes: &[DeviceVotes]) {
    println!("------------------------");
    println!("Overall:");
    let mut counts: HashMap<String, u32> = HashMap::new();
    for device_votes in all_votes {
        for (_, votes) in &device_votes.rule_votes {
            for os in votes {
                *counts.entry(format!("{os:?}")).or_insert(0) += 1;
            }
        }
    }
    for (os, count) in counts {
        println!("{os} {count}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_votes_for_only_includes_scoped_rules() {
        let votes = rule_votes_for("mass_storage", &[], &[]);
        assert_eq!(votes.len(), 1); // only the ANY "Microsoft OS Descriptor" rule applies
    }
}
