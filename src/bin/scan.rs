use std::env;
use std::process::ExitCode;

use usbmimic::cli;
use usbmimic::fingerprint::scan;
use usbmimic::phy;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let opts = match cli::parse_scan(&args) {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("{err}\n\n{}", cli::SCAN_USAGE);
            return ExitCode::FAILURE;
        }
    };

    simple_logger::SimpleLogger::new().with_level(cli::log_level(opts.quiet, opts.verbosity)).init().unwrap();

    let mut phy = match phy::open(&opts.phy) {
        Ok(phy) => phy,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    log::info!("scanning host for supported devices");
    let results = scan::run(phy.as_mut(), &opts);

    let supported: Vec<_> = results.iter().filter(|r| r.supported).collect();
    if !supported.is_empty() {
        println!("---------------------------------");
        println!("Found {} supported device(s):", supported.len());
        for (i, result) in supported.iter().enumerate() {
            println!("{}. {} ({})", i + 1, result.device_name, result.reasons.join(", "));
        }
    }

    let configured_only: Vec<_> =
        results.iter().filter(|r| r.configured && !r.supported).map(|r| r.device_name).collect();
    if !configured_only.is_empty() {
        println!("---------------------------------");
        println!("Configured but no class/vendor request observed: {}", configured_only.join(", "));
    }

    ExitCode::SUCCESS
}
