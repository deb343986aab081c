mod catalog;
mod cli;
mod clock;
mod completion;
mod config;
mod engine;
mod error;
mod growth;
mod identity;
mod ledger;
mod lifecycle;
mod model;
mod schedule;
mod storage;

use std::{io, process};

use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    if let Err(e) = cli::run() {
        eprintln!("Error: {e}");
        process::exit(e.exit_code());
    }
}
