use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{debug, info};

/// Default location of the pfSense developer shell.
pub const DEFAULT_PHP_SHELL: &str = "/usr/local/sbin/pfSsh.php";

/// PHP run on the appliance to regenerate the agent config and restart it.
pub const RELOAD_SCRIPT: &str = "require_once(\"zabbix-agent.inc\");\nsync_package_zabbix_agent();";

#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("failed to start {shell}: {source}")]
    Spawn {
        shell: String,
        source: std::io::Error,
    },
    #[error("failed to talk to {shell}: {source}")]
    Io {
        shell: String,
        source: std::io::Error,
    },
    #[error("{shell} exited with {status}: {stderr}")]
    Failed {
        shell: String,
        status: String,
        stderr: String,
    },
}

/// Makes the managed service pick up a freshly written configuration.
pub trait ServiceReloader {
    fn reload(&self) -> Result<(), ReloadError>;
}

/// Feeds [`RELOAD_SCRIPT`] to `pfSsh.php` on stdin.
#[derive(Debug, Clone)]
pub struct PhpShellReloader {
    shell: PathBuf,
}

impl Default for PhpShellReloader {
    fn default() -> Self {
        Self::new(DEFAULT_PHP_SHELL)
    }
}

impl PhpShellReloader {
    pub fn new(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// Script text written to the shell's stdin.
    pub fn session_input() -> String {
        format!("{RELOAD_SCRIPT}\nexec\nexit\n")
    }
}

impl ServiceReloader for PhpShellReloader {
    fn reload(&self) -> Result<(), ReloadError> {
        let shell = self.shell.display().to_string();
        debug!(%shell, "starting php shell");

        let mut child = Command::new(&self.shell)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ReloadError::Spawn {
                shell: shell.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(Self::session_input().as_bytes())
                .map_err(|source| ReloadError::Io {
                    shell: shell.clone(),
                    source,
                })?;
        }

        let output = child.wait_with_output().map_err(|source| ReloadError::Io {
            shell: shell.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(ReloadError::Failed {
                shell,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!(%shell, "reloaded zabbix-agent");
        Ok(())
    }
}
