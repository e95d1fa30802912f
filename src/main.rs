use std::process::ExitCode;

use clap::Parser;
use proc_watch::{Cli, WatchConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let config = match WatchConfig::try_from(cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to build runtime: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(proc_watch::run(config)) {
        Ok(report) => {
            println!("{}", report.output.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
