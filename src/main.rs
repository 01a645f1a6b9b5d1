use std::process::ExitCode;

use bme280d::config::USAGE;
use bme280d::{logger, Command, Config, Error, PublishLoop, UsbBus};

fn run(config: &Config) -> bme280d::Result<()> {
    let bus = UsbBus::new().map_err(Error::NoAdapter)?;
    PublishLoop::from_config(bus, config)?.run()
}

fn main() -> ExitCode {
    if let Err(e) = logger::init() {
        eprintln!("can't install logger: {}", e);
    }
    log::info!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            println!("{}", USAGE);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            log::error!("{}", e.report());
            eprintln!("{}", USAGE);
            return ExitCode::FAILURE;
        }
    };

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e.report());
            ExitCode::FAILURE
        }
    }
}
