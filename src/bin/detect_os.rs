use std::env;
use std::process::ExitCode;

use usbmimic::cli;
use usbmimic::fingerprint::detect_os;
use usbmimic::phy;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let opts = match cli::parse_detect_os(&args) {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("{err}\n\n{}", cli::DETECT_OS_USAGE);
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

    detect_os::run(phy.as_mut());
    ExitCode::SUCCESS
}
