//! Manage the pfSense zabbix-agent package configuration.
//!
//! A flat set of parameters is validated against a declared schema
//! ([`schema`]), encoded field by field ([`codec`]) and written into the single
//! `installedpackages/zabbixagentlts` entry of a pfSense `config.xml`
//! ([`mapper`]). Runs are idempotent: applying the same parameters twice
//! reports no change the second time.
//!
//! # Workflow
//!
//! 1. Load the document with [`pfconfig_core::ConfigDocument::load`]
//! 2. Load parameters with [`params::load_params`] and overrides
//! 3. [`mapper::ZabbixAgentMapper::run`] creates, updates, or leaves the entry
//! 4. [`commit::commit`] writes the document and reloads the agent on change
//! 5. [`report`] renders the outcome as text or JSON
//!
//! ```ignore
//! use pfconfig_core::ConfigDocument;
//! use pfsense_zabbix::commit::{commit, CommitOptions};
//! use pfsense_zabbix::mapper::ZabbixAgentMapper;
//! use pfsense_zabbix::params::load_params;
//! use pfsense_zabbix::reload::PhpShellReloader;
//!
//! let mut doc = ConfigDocument::load("/cf/conf/config.xml".as_ref())?;
//! let raw = load_params("zabbix.toml".as_ref())?;
//! let outcome = ZabbixAgentMapper::new().run(&mut doc, raw)?;
//! commit(&mut doc, &outcome, &PhpShellReloader::default(), CommitOptions::default())?;
//! ```

pub mod codec;
pub mod commit;
pub mod mapper;
pub mod params;
pub mod reload;
pub mod report;
pub mod schema;
