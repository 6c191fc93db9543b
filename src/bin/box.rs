use std::process::ExitCode;

use box_build::cli::{run_cli, Cli};
use box_build::otel;
use clap::Parser;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = otel::init_logging(cli.verbose()) {
        eprintln!("warning: {err:#}");
    }

    match run_cli(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
