use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod apply_cmd;
mod cli;
mod show_cmd;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Apply(args) => apply_cmd::run_apply(args),
        Command::Show(args) => show_cmd::run_show(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
