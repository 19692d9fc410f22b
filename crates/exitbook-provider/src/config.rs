use std::{collections::HashMap, time::Duration};

use serde::{Deserialize, Serialize};

use crate::circuit::CircuitBreakerConfig;

/// Configuration surface recognized by the provider manager (spec §6).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderManagerConfig {
	pub circuit: CircuitBreakerConfig,
	/// Per-provider-name priority bonus override applied during scoring.
	pub priority_bonus: HashMap<String, i64>,
	pub default_cache_ttl_ms: u64,
	pub call_timeout_ms: u64,
	pub max_retries: u32,
}

impl Default for ProviderManagerConfig {
	fn default() -> Self {
		Self {
			circuit: CircuitBreakerConfig::default(),
			priority_bonus: HashMap::new(),
			default_cache_ttl_ms: 30_000,
			call_timeout_ms: 30_000,
			max_retries: 3,
		}
	}
}

impl ProviderManagerConfig {
	pub fn call_timeout(&self) -> Duration {
		Duration::from_millis(self.call_timeout_ms)
	}

	pub fn priority_bonus_for(&self, provider_name: &str) -> i64 {
		self.priority_bonus.get(provider_name).copied().unwrap_or(0)
	}
}
