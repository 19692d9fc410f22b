//! The provider-facing streaming contract (spec §4.2). An [`Importer`] hides
//! per-blockchain/per-exchange pagination behind a single batch stream, fed
//! the caller's per-stream cursor map so it can resume exactly where the
//! last run left off.

use std::collections::HashMap;
use std::pin::Pin;

use async_trait::async_trait;
use exitbook_core::model::{CursorState, RawTransactionRecord};
use futures::Stream;

use crate::error::IngestionError;

/// One page of raw records for a single `operation_type` (e.g.
/// `"transactions"`, `"token_transfers"`, `"staking_rewards"`). `is_complete`
/// signals that this stream has been fully drained — some streams finish
/// before others within the same import run.
#[derive(Clone, Debug)]
pub struct ImportBatch {
	pub operation_type: String,
	pub raw_transactions: Vec<RawTransactionRecord>,
	pub cursor: CursorState,
	pub is_complete: bool,
}

pub type ImportBatchStream =
	Pin<Box<dyn Stream<Item = Result<ImportBatch, IngestionError>> + Send>>;

#[async_trait]
pub trait Importer: Send + Sync {
	/// Name used for provider-scoping, logging, and as the `provider_name`
	/// recorded on each raw row.
	fn name(&self) -> &str;

	/// Begin (or resume) streaming, given the cursor each `operation_type`
	/// stream last reached. A stream absent from the map starts from scratch.
	async fn import_streaming(
		&self,
		cursors: HashMap<String, CursorState>,
	) -> Result<ImportBatchStream, IngestionError>;
}

#[cfg(test)]
pub(crate) mod test_support {
	use super::*;
	use futures::stream;

	/// Deterministic two-batch importer used by the executor's own tests.
	pub struct FixedImporter {
		pub name: String,
		pub batches: Vec<ImportBatch>,
	}

	#[async_trait]
	impl Importer for FixedImporter {
		fn name(&self) -> &str {
			&self.name
		}

		async fn import_streaming(
			&self,
			_cursors: HashMap<String, CursorState>,
		) -> Result<ImportBatchStream, IngestionError> {
			let batches: Vec<_> = self.batches.clone().into_iter().map(Ok).collect();
			Ok(Box::pin(stream::iter(batches)))
		}
	}
}
