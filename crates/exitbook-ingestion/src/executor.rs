//! Streaming Import Executor (spec §4.2). Owns the import session lifecycle:
//! find-or-create the [`DataSource`], resume each stream from its last
//! cursor, drain the importer's batch stream, persist as it goes, and
//! finalize — `completed` on exhaustion, `failed` with the last
//! successfully-persisted cursor preserved on error.

use std::collections::HashMap;
use std::sync::Arc;

use exitbook_core::model::{Account, DataSource};
use futures::StreamExt;
use tracing::{info, warn};

use crate::error::IngestionError;
use crate::data_source_repo::DataSourceRepo;
use crate::importer::Importer;
use crate::raw_store::RawStore;
use crate::replay::apply_replay_window;

pub struct StreamingImportExecutor {
	raw_store: Arc<dyn RawStore>,
	data_source_repo: Arc<dyn DataSourceRepo>,
}

/// Outcome of a single `run` invocation, returned for the caller to persist
/// alongside the `Account` (whose `last_cursor` map this mutates in place).
#[derive(Debug)]
pub struct ImportRunOutcome {
	pub data_source: DataSource,
	pub total_fetched: u64,
	pub total_persisted: u64,
}

impl StreamingImportExecutor {
	pub fn new(raw_store: Arc<dyn RawStore>, data_source_repo: Arc<dyn DataSourceRepo>) -> Self {
		Self { raw_store, data_source_repo }
	}

	/// Run (or resume) an import for `account` using `importer`. `account` is
	/// mutated in place as each stream's cursor advances; the caller is
	/// responsible for persisting it once this returns.
	pub async fn run(
		&self,
		account: &mut Account,
		importer: Arc<dyn Importer>,
	) -> Result<ImportRunOutcome, IngestionError> {
		let mut data_source = match self.data_source_repo.find_resumable(account.id).await? {
			Some(existing) => {
				info!(account_id = %account.id, data_source_id = %existing.id, "resuming import session");
				existing
			},
			None => {
				let created = DataSource::new_started(account.id);
				info!(account_id = %account.id, data_source_id = %created.id, "starting new import session");
				created
			},
		};
		data_source.resume();
		self.data_source_repo.save(&data_source).await?;

		let cursors = self.resolve_resume_cursors(account, importer.as_ref());

		let mut stream = match importer.import_streaming(cursors).await {
			Ok(stream) => stream,
			Err(err) => {
				data_source.fail(err.to_string());
				self.data_source_repo.save(&data_source).await?;
				return Err(err);
			},
		};

		loop {
			match stream.next().await {
				None => break,
				Some(Ok(batch)) => {
					let batch_len = batch.raw_transactions.len() as u64;
					match self.raw_store.insert_batch(batch.raw_transactions).await {
						Ok(insert_outcome) => {
							data_source.total_fetched += batch_len;
							data_source.total_persisted += insert_outcome.inserted;
							account.set_cursor(batch.operation_type.clone(), batch.cursor);
							self.data_source_repo.save(&data_source).await?;
							info!(
								account_id = %account.id,
								operation_type = %batch.operation_type,
								fetched = batch_len,
								inserted = insert_outcome.inserted,
								duplicates = insert_outcome.duplicates_absorbed,
								"persisted import batch"
							);
						},
						Err(err) => {
							warn!(account_id = %account.id, error = %err, "aborting import: raw store rejected batch");
							data_source.fail(err.to_string());
							self.data_source_repo.save(&data_source).await?;
							return Err(err);
						},
					}
				},
				Some(Err(err)) => {
					warn!(account_id = %account.id, error = %err, "import stream failed, preserving last good cursor");
					data_source.fail(err.to_string());
					self.data_source_repo.save(&data_source).await?;
					return Err(err);
				},
			}
		}

		data_source.complete();
		self.data_source_repo.save(&data_source).await?;
		info!(
			account_id = %account.id,
			data_source_id = %data_source.id,
			total_fetched = data_source.total_fetched,
			total_persisted = data_source.total_persisted,
			"import session completed"
		);

		Ok(ImportRunOutcome {
			total_fetched: data_source.total_fetched,
			total_persisted: data_source.total_persisted,
			data_source,
		})
	}

	/// Per-stream cursors to hand the importer. A stream last advanced by a
	/// *different* provider than the one resuming gets its cursor rewound by
	/// the replay window (spec §4.2) to cover any reorg/eventual-consistency
	/// gap the prior provider's view might have left.
	fn resolve_resume_cursors(
		&self,
		account: &Account,
		importer: &dyn Importer,
	) -> HashMap<String, exitbook_core::model::CursorState> {
		account
			.last_cursor
			.iter()
			.map(|(stream_type, cursor)| {
				let mut cursor = cursor.clone();
				let same_provider = cursor.provider_name.as_deref() == Some(importer.name());
				if !same_provider {
					cursor.primary = apply_replay_window(cursor.primary);
				}
				(stream_type.clone(), cursor)
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data_source_repo::InMemoryDataSourceRepo;
	use crate::importer::test_support::FixedImporter;
	use crate::importer::ImportBatch;
	use crate::raw_store::InMemoryRawStore;
	use exitbook_core::model::{AccountType, CursorPrimary, CursorState, ProcessingStatus, RawTransactionRecord};
	use std::collections::HashMap;
	use uuid::Uuid;

	fn account() -> Account {
		Account {
			id: Uuid::new_v4(),
			user_id: Uuid::new_v4(),
			account_type: AccountType::Blockchain,
			source_name: "ethereum".into(),
			identifier: "0xabc".into(),
			last_cursor: HashMap::new(),
			credentials: HashMap::new(),
			parent_account_id: None,
			metadata: serde_json::Value::Null,
		}
	}

	fn raw(account_id: Uuid, event_id: &str) -> RawTransactionRecord {
		RawTransactionRecord {
			account_id,
			event_id: event_id.into(),
			stream_type: "transactions".into(),
			provider_name: "alchemy".into(),
			raw_payload: serde_json::json!({"hash": event_id}),
			normalized_payload: None,
			processing_status: ProcessingStatus::Pending,
			created_at: chrono::Utc::now(),
		}
	}

	#[tokio::test]
	async fn drains_all_batches_and_completes_session() {
		let mut acc = account();
		let importer: Arc<dyn Importer> = Arc::new(FixedImporter {
			name: "alchemy".into(),
			batches: vec![
				ImportBatch {
					operation_type: "transactions".into(),
					raw_transactions: vec![raw(acc.id, "evt-1"), raw(acc.id, "evt-2")],
					cursor: CursorState {
						primary: CursorPrimary::BlockNumber(100),
						last_transaction_id: Some("evt-2".into()),
						total_fetched: 2,
						provider_name: Some("alchemy".into()),
					},
					is_complete: false,
				},
				ImportBatch {
					operation_type: "transactions".into(),
					raw_transactions: vec![raw(acc.id, "evt-3")],
					cursor: CursorState {
						primary: CursorPrimary::BlockNumber(150),
						last_transaction_id: Some("evt-3".into()),
						total_fetched: 3,
						provider_name: Some("alchemy".into()),
					},
					is_complete: true,
				},
			],
		});

		let executor = StreamingImportExecutor::new(
			Arc::new(InMemoryRawStore::new()),
			Arc::new(InMemoryDataSourceRepo::new()),
		);

		let outcome = executor.run(&mut acc, importer).await.unwrap();
		assert_eq!(outcome.total_fetched, 3);
		assert_eq!(outcome.total_persisted, 3);
		assert_eq!(
			acc.cursor_for("transactions").unwrap().primary,
			CursorPrimary::BlockNumber(150)
		);
	}

	#[tokio::test]
	async fn resuming_under_a_different_provider_rewinds_the_cursor() {
		let mut acc = account();
		acc.set_cursor(
			"transactions",
			CursorState {
				primary: CursorPrimary::BlockNumber(200),
				last_transaction_id: Some("evt-old".into()),
				total_fetched: 10,
				provider_name: Some("alchemy".into()),
			},
		);

		let executor = StreamingImportExecutor::new(
			Arc::new(InMemoryRawStore::new()),
			Arc::new(InMemoryDataSourceRepo::new()),
		);

		let quicknode: Arc<dyn Importer> = Arc::new(FixedImporter { name: "quicknode".into(), batches: vec![] });
		let resolved = executor.resolve_resume_cursors(&acc, quicknode.as_ref());
		assert_eq!(resolved["transactions"].primary, CursorPrimary::BlockNumber(195));
	}
}
