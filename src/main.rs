use std::io;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;

use winproxy::cli::{self, Cli};
use winproxy::store::RegistryStore;

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let store = RegistryStore::new();
    match cli::run(&cli, &store, &mut io::stdout().lock()) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            log::debug!("{:?}", e);
            eprintln!("winproxy: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
