use pfconfig_core::{ConfigDocument, DocumentError};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::mapper::Outcome;
use crate::reload::{ReloadError, ServiceReloader};

/// Recorded in `<revision><username>` for every write.
pub const REVISION_USER: &str = "pfsense-zabbix";

#[derive(Debug, Error)]
pub enum CommitError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("configuration written but reload failed: {0}")]
    Reload(#[from] ReloadError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitOptions {
    /// Report only; never write or reload.
    pub check_mode: bool,
}

/// What the commit step actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    pub written: bool,
    pub reloaded: bool,
}

/// Persist `doc` and reload the service when `outcome` changed something.
///
/// Passing no reloader writes the document without reloading.
pub fn commit(
    doc: &mut ConfigDocument,
    outcome: &Outcome,
    reloader: Option<&dyn ServiceReloader>,
    opts: CommitOptions,
) -> Result<CommitReport, CommitError> {
    if !outcome.changed() {
        return Ok(CommitReport::default());
    }
    if opts.check_mode {
        info!("check mode, not writing configuration");
        return Ok(CommitReport::default());
    }

    doc.save(&revision_description(outcome), REVISION_USER)?;
    let Some(reloader) = reloader else {
        return Ok(CommitReport {
            written: true,
            reloaded: false,
        });
    };
    reloader.reload()?;
    Ok(CommitReport {
        written: true,
        reloaded: true,
    })
}

fn revision_description(outcome: &Outcome) -> String {
    format!("{REVISION_USER}: {}", outcome.commands.join("; "))
}
