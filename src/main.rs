mod cli;
mod config;
mod error;
mod export;
mod logging;
mod model;
mod providers;
mod util;

use std::process::ExitCode;

use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = cli::Cli::parse();
    logging::init(args.verbose);

    match cli::run(args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "run failed");
            eprintln!("\n✗ {e:#}");
            ExitCode::FAILURE
        }
    }
}
