use std::env;
use std::process::ExitCode;

use usbmimic::cli;
use usbmimic::phy;
use usbmimic::repl;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let opts = match cli::parse_strings(&args) {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("{err}\n\n{}", cli::STRINGS_USAGE);
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

    if let Err(err) = repl::run(phy.as_mut()) {
        log::error!("{err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
