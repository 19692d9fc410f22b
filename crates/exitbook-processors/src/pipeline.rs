//! Common processor contract and strict-mode batch assembly (spec §4.3).

use async_trait::async_trait;
use exitbook_core::model::{RawTransactionRecord, UniversalTransaction};

use crate::error::{ProcessorError, RecordFailure};

#[derive(Debug, Default)]
pub struct ProcessedBatch {
	pub transactions: Vec<UniversalTransaction>,
	/// `event_id`s of the raw rows these transactions were derived from, in
	/// the same order — the caller marks these `processed` in the raw store.
	pub source_event_ids: Vec<String>,
}

#[async_trait]
pub trait Processor: Send + Sync {
	/// The `source` this processor produces transactions for (e.g.
	/// `"ethereum"`, `"near"`, `"kraken"`).
	fn source(&self) -> &str;

	async fn process_batch(
		&self,
		raw_records: Vec<RawTransactionRecord>,
	) -> Result<ProcessedBatch, ProcessorError>;
}

/// Folds per-record outcomes into a batch result under strict mode: any
/// failure at all aborts the whole batch with the full diagnostic list
/// rather than committing the records that happened to succeed (spec §4.3
/// "Strict mode").
pub fn assemble_strict(
	outcomes: Vec<(String, Result<UniversalTransaction, String>)>,
) -> Result<ProcessedBatch, ProcessorError> {
	let mut failures = Vec::new();
	let mut transactions = Vec::new();
	let mut source_event_ids = Vec::new();

	for (event_id, outcome) in outcomes {
		match outcome {
			Ok(tx) => {
				source_event_ids.push(event_id);
				transactions.push(tx);
			},
			Err(reason) => failures.push(RecordFailure { event_id, reason }),
		}
	}

	if !failures.is_empty() {
		return Err(ProcessorError::BatchFailed(failures));
	}

	Ok(ProcessedBatch { transactions, source_event_ids })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn one_failure_aborts_the_whole_batch() {
		let result = assemble_strict(vec![("evt-1".into(), Err("bad schema".into()))]);
		assert!(matches!(result, Err(ProcessorError::BatchFailed(failures)) if failures.len() == 1));
	}
}
