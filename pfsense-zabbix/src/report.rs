use colored::Colorize;
use pfconfig_core::{format_summary, format_text, FieldChange};
use serde::Serialize;

use crate::codec::ZABBIX_AGENT_FIELDS;
use crate::commit::CommitReport;
use crate::mapper::{Diff, Operation, Outcome};
use crate::params::ParamSet;

/// Machine-readable result of an `apply` run.
#[derive(Debug, Serialize)]
pub struct ApplyReport<'a> {
    pub changed: bool,
    pub operation: Operation,
    pub check_mode: bool,
    pub written: bool,
    pub reloaded: bool,
    pub diff: &'a Diff,
    pub changes: &'a [FieldChange],
    pub commands: &'a [String],
}

impl<'a> ApplyReport<'a> {
    pub fn new(outcome: &'a Outcome, commit: CommitReport, check_mode: bool) -> Self {
        Self {
            changed: outcome.changed(),
            operation: outcome.operation,
            check_mode,
            written: commit.written,
            reloaded: commit.reloaded,
            diff: &outcome.diff,
            changes: &outcome.changes,
            commands: &outcome.commands,
        }
    }
}

/// Render an `apply` result for the terminal.
pub fn render_apply_text(report: &ApplyReport<'_>) -> String {
    let mut out = Vec::new();
    out.push(
        format!(
            "changed={} operation={} check_mode={} written={} reloaded={}",
            report.changed,
            operation_name(report.operation),
            report.check_mode,
            report.written,
            report.reloaded
        )
        .cyan()
        .to_string(),
    );
    for command in report.commands {
        out.push(command.bold().to_string());
    }
    if !report.changes.is_empty() {
        out.push(format_summary(report.changes));
        out.push(render_changes(report.changes));
    }
    out.join("\n")
}

/// Color field changes the same way diff lines are colored elsewhere.
pub fn render_changes(changes: &[FieldChange]) -> String {
    format_text(changes)
        .lines()
        .map(|line| {
            if line.starts_with('+') {
                line.green().to_string()
            } else if line.starts_with('-') {
                line.red().to_string()
            } else if line.starts_with('~') {
                line.yellow().to_string()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render decoded parameters in field-table order, one `name=value` per line.
pub fn render_params(params: &ParamSet) -> String {
    ZABBIX_AGENT_FIELDS
        .iter()
        .filter_map(|codec| {
            params
                .get(codec.param)
                .map(|value| format!("{}={value}", codec.param))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn operation_name(op: Operation) -> &'static str {
    match op {
        Operation::Unchanged => "unchanged",
        Operation::Created => "created",
        Operation::Updated => "updated",
    }
}

#[cfg(test)]
mod tests {
    use super::{render_apply_text, render_params, ApplyReport};
    use crate::commit::CommitReport;
    use crate::mapper::{Diff, Operation, Outcome};
    use crate::params::{ParamSet, ParamValue};

    #[test]
    fn params_render_in_table_order() {
        let mut params = ParamSet::new();
        params.insert("timeout", ParamValue::Int(3));
        params.insert("enabled", ParamValue::Bool(true));
        params.insert("hostname", ParamValue::Str("fw1".into()));

        assert_eq!(render_params(&params), "hostname='fw1'\nenabled=True\ntimeout=3");
    }

    #[test]
    fn unchanged_report_is_a_single_status_line() {
        colored::control::set_override(false);
        let outcome = Outcome {
            operation: Operation::Unchanged,
            diff: Diff {
                before: Some(Default::default()),
                after: Default::default(),
            },
            changes: Vec::new(),
            commands: Vec::new(),
        };
        let report = ApplyReport::new(&outcome, CommitReport::default(), false);
        assert_eq!(
            render_apply_text(&report),
            "changed=false operation=unchanged check_mode=false written=false reloaded=false"
        );
    }
}
