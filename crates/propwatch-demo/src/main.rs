#![forbid(unsafe_code)]

//! propwatch demo binary entry point.

use std::process;
use std::time::Duration;

use propwatch_demo::cli;
use propwatch_demo::scenarios::{self, Transcript};
use tracing_subscriber::EnvFilter;

fn main() {
    let opts = cli::Opts::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&opts.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let out = Transcript::new(!opts.quiet);
    let delay = Duration::from_millis(opts.async_delay_ms);
    if let Err(err) = scenarios::run(opts.scenario, &out, delay) {
        tracing::error!(error = %err, scenario = opts.scenario.name(), "scenario failed");
        eprintln!("error: {err}");
        process::exit(1);
    }
    tracing::info!(lines = out.lines().len(), "done");
}
