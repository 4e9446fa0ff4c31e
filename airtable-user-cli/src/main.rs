//! airtable-user-info entry point.

use airtable_user_cli::cli::Cli;
use airtable_user_cli::{run, telemetry};
use clap::Parser;
use std::io;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = telemetry::init_tracing(cli.log_json) {
        eprintln!("{}", err);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run(cli, io::stdin(), &mut out).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
