use serde::{Deserialize, Serialize};

/// Configuration surface recognized by the transfer link matcher (spec §6
/// "matching.*").
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
	pub max_timing_window_hours: i64,
	pub min_amount_similarity: f64,
	pub min_confidence_score: f64,
	pub auto_confirm_threshold: f64,
}

impl Default for MatcherConfig {
	fn default() -> Self {
		Self {
			max_timing_window_hours: 48,
			min_amount_similarity: 0.95,
			min_confidence_score: 0.70,
			auto_confirm_threshold: 0.95,
		}
	}
}
