use anyhow::{Context, Result};
use pfconfig_core::ConfigDocument;
use pfsense_zabbix::mapper::ZabbixAgentMapper;
use pfsense_zabbix::report::render_params;

use crate::cli::{OutputFormat, ShowArgs};

pub fn run_show(args: ShowArgs) -> Result<()> {
    let doc = ConfigDocument::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let params = ZabbixAgentMapper::new().read(&doc).with_context(|| {
        format!(
            "failed to read zabbix-agent settings from {}",
            args.config.display()
        )
    })?;

    match (args.format, params) {
        (OutputFormat::Text, Some(params)) => println!("{}", render_params(&params)),
        (OutputFormat::Text, None) => println!("zabbix-agent is not configured"),
        (OutputFormat::Json, params) => println!("{}", serde_json::to_string_pretty(&params)?),
    }
    Ok(())
}
