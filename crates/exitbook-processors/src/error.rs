use thiserror::Error;

/// A single record's processing failure, kept alongside its siblings so
/// strict mode (spec §4.3) can report every failure in a batch at once
/// rather than stopping at the first one.
#[derive(Debug, Clone)]
pub struct RecordFailure {
	pub event_id: String,
	pub reason: String,
}

#[derive(Debug, Error)]
pub enum ProcessorError {
	/// Any record in the batch failed; the batch is not committed (spec §4.3
	/// "strict mode" — silent drops are forbidden).
	#[error("{} record(s) failed processing: {}", .0.len(), summarize(.0))]
	BatchFailed(Vec<RecordFailure>),

	#[error("missing token metadata for contract {0}")]
	MissingTokenMetadata(String),

	#[error("substrate asset {0} has no token_reference; refusing to guess identity")]
	UnresolvedSubstrateAsset(String),
}

fn summarize(failures: &[RecordFailure]) -> String {
	failures
		.iter()
		.take(5)
		.map(|f| format!("{}: {}", f.event_id, f.reason))
		.collect::<Vec<_>>()
		.join("; ")
}
