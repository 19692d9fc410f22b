//! Typed settings aggregated from a config file plus environment overrides,
//! in the style of the `api/bin/chainflip-ingress-egress-tracker` settings
//! module elsewhere in this codebase: `config::Config` layered with a
//! `clap::Parser` source,
//! deserialized into a plain struct. Unlike that tracker, exitbook has no
//! node-specific CLI flags worth exposing per-setting — CLI command
//! registration and config-file parsing are both spec Non-goals (spec §1),
//! so this stays a thin, typed-default aggregation rather than a full
//! per-field flag surface.

use std::path::PathBuf;

use chrono::Datelike;
use config::{Config, ConfigError, Environment, File};
use exitbook_costbasis::{CostBasisConfig, Jurisdiction, LotMethod};
use exitbook_matcher::MatcherConfig;
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NodeSettings {
	/// Path to the SQLite database file. `:memory:`-style ephemeral runs
	/// are not supported here; use `exitbook_storage::Database::open_in_memory`
	/// directly in tests instead.
	pub database_path: PathBuf,
	/// Path to the append-only JSONL manual-override log (spec §3, §6).
	pub override_log_path: PathBuf,
	pub matching: MatcherConfig,
	pub cost_basis: CostBasisConfig,
}

impl Default for NodeSettings {
	fn default() -> Self {
		Self {
			database_path: PathBuf::from("exitbook.sqlite"),
			override_log_path: PathBuf::from("overrides.jsonl"),
			matching: MatcherConfig::default(),
			cost_basis: CostBasisConfig {
				method: LotMethod::Fifo,
				jurisdiction: Jurisdiction::Us,
				tax_year: chrono::Utc::now().year(),
				currency: "USD".to_string(),
				start_date: None,
				end_date: None,
			},
		}
	}
}

impl NodeSettings {
	/// Loads defaults, then an optional `config_path` file, then
	/// `EXITBOOK__`-prefixed environment overrides (double underscore as the
	/// nested-key separator, matching the `Environment::default()
	/// .separator("__")` convention used elsewhere in this codebase).
	pub fn load(config_path: Option<&PathBuf>) -> Result<Self, ConfigError> {
		let defaults = Self::default();
		let mut builder = Config::builder()
			.set_default("database_path", defaults.database_path.to_string_lossy().to_string())?
			.set_default(
				"override_log_path",
				defaults.override_log_path.to_string_lossy().to_string(),
			)?;
		if let Some(path) = config_path {
			builder = builder.add_source(File::from(path.as_path()).required(false));
		}
		builder
			.add_source(Environment::default().prefix("EXITBOOK").separator("__"))
			.build()?
			.try_deserialize()
	}
}
