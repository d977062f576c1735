use anyhow::{bail, Context, Result};
use pfconfig_core::ConfigDocument;
use pfsense_zabbix::commit::{commit, CommitOptions};
use pfsense_zabbix::mapper::ZabbixAgentMapper;
use pfsense_zabbix::params::{load_params, parse_override, RawParams};
use pfsense_zabbix::reload::{PhpShellReloader, ServiceReloader};
use pfsense_zabbix::report::{render_apply_text, ApplyReport};

use crate::cli::{ApplyArgs, OutputFormat};

pub fn run_apply(args: ApplyArgs) -> Result<()> {
    let raw = collect_params(&args)?;

    let mut doc = ConfigDocument::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let outcome = ZabbixAgentMapper::new().run(&mut doc, raw).with_context(|| {
        format!(
            "failed to apply zabbix-agent settings to {}",
            args.config.display()
        )
    })?;

    let shell = PhpShellReloader::new(&args.php_shell);
    let reloader = (!args.no_reload).then_some(&shell as &dyn ServiceReloader);
    let opts = CommitOptions {
        check_mode: args.check,
    };
    let committed = commit(&mut doc, &outcome, reloader, opts)?;

    let report = ApplyReport::new(&outcome, committed, args.check);
    match args.format {
        OutputFormat::Text => println!("{}", render_apply_text(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn collect_params(args: &ApplyArgs) -> Result<RawParams> {
    let mut raw = match &args.params {
        Some(path) => load_params(path)?,
        None => RawParams::new(),
    };
    for entry in &args.set {
        let (name, value) = parse_override(entry)?;
        raw.insert(name, value);
    }
    if raw.is_empty() {
        bail!("no parameters given, use --params and/or --set");
    }
    Ok(raw)
}
