//! Error taxonomy shared across the core (spec §7). Kinds, not type names:
//! each crate downstream adds its own `thiserror` enum for crate-local detail
//! and converts into these kinds at its boundary via `#[from]`.

use thiserror::Error;

/// Errors intrinsic to the shared domain model (asset ids, decimals).
#[derive(Debug, Error)]
pub enum CoreError {
	#[error("invalid asset id: {0}")]
	InvalidAssetId(String),
	#[error("amount parse error: {0}")]
	AmountParse(String),
}

/// Up to this many example identifiers are cited on a data-integrity or
/// configuration error, per spec §7 ("surface with affected IDs (up to 5
/// examples)").
pub const MAX_CITED_EXAMPLES: usize = 5;

pub fn cite_examples<I, S>(ids: I) -> Vec<String>
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	ids.into_iter().map(Into::into).take(MAX_CITED_EXAMPLES).collect()
}
