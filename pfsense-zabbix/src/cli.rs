use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use pfsense_zabbix::reload::DEFAULT_PHP_SHELL;

const DEFAULT_CONFIG: &str = "/cf/conf/config.xml";

#[derive(Parser, Debug)]
#[command(name = "pfsense-zabbix")]
#[command(about = "Manage the pfSense zabbix-agent package configuration")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Create or update the zabbix-agent entry and reload the agent on change.
    Apply(ApplyArgs),
    /// Show the current zabbix-agent settings as parameters.
    Show(ShowArgs),
}

#[derive(Parser, Debug)]
pub struct ApplyArgs {
    /// pfSense config.xml to edit.
    #[arg(long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
    /// TOML file whose top-level keys are parameter names.
    #[arg(long)]
    pub params: Option<PathBuf>,
    /// Set one parameter (name=value). Overrides --params.
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub set: Vec<String>,
    /// Report what would change without writing or reloading.
    #[arg(long)]
    pub check: bool,
    /// Write the config but do not reload the agent.
    #[arg(long)]
    pub no_reload: bool,
    /// pfSense PHP shell used for the reload.
    #[arg(long, default_value = DEFAULT_PHP_SHELL)]
    pub php_shell: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// pfSense config.xml to read.
    #[arg(long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
