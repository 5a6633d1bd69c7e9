#![recursion_limit = "256"]

mod cli;
mod application;
mod domain;
mod data;
mod ml;
mod infra;

use anyhow::Result;
use cli::Cli;
use clap::Parser;
use tracing_subscriber::{filter::Directive, EnvFilter};

fn main() -> Result<()> {
    let default_level: Directive = "rnnlm=info".parse()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level))
        .init();

    let cli = Cli::parse();
    cli.run()
}
