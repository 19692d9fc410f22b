//! Append-only raw store (spec §3, §5). Primary key `(account_id,
//! event_id)`; inserts are idempotent — a repeat insert with an identical
//! payload is a silent no-op, one with a differing payload is a
//! data-integrity error, and the payload itself is never mutated once
//! written (only `processing_status` changes, via [`RawStore::mark_status`]).

use async_trait::async_trait;
use exitbook_core::model::{ProcessingStatus, RawTransactionRecord};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::IngestionError;

#[derive(Debug, Default)]
pub struct InsertOutcome {
	pub inserted: u64,
	pub duplicates_absorbed: u64,
}

#[async_trait]
pub trait RawStore: Send + Sync {
	async fn insert_batch(
		&self,
		records: Vec<RawTransactionRecord>,
	) -> Result<InsertOutcome, IngestionError>;

	async fn mark_status(
		&self,
		account_id: Uuid,
		event_id: &str,
		status: ProcessingStatus,
		normalized_payload: Option<serde_json::Value>,
	) -> Result<(), IngestionError>;

	async fn pending_for_account(
		&self,
		account_id: Uuid,
	) -> Result<Vec<RawTransactionRecord>, IngestionError>;
}

#[derive(Default)]
pub struct InMemoryRawStore {
	rows: Mutex<HashMap<(Uuid, String), RawTransactionRecord>>,
}

impl InMemoryRawStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl RawStore for InMemoryRawStore {
	async fn insert_batch(
		&self,
		records: Vec<RawTransactionRecord>,
	) -> Result<InsertOutcome, IngestionError> {
		let mut rows = self.rows.lock().await;
		let mut outcome = InsertOutcome::default();
		for record in records {
			let key = record.key();
			match rows.get(&key) {
				None => {
					rows.insert(key, record);
					outcome.inserted += 1;
				},
				Some(existing) => {
					if existing.raw_payload == record.raw_payload {
						outcome.duplicates_absorbed += 1;
					} else {
						return Err(IngestionError::DuplicateEventIdConflict {
							account_id: key.0,
							event_id: key.1,
						});
					}
				},
			}
		}
		Ok(outcome)
	}

	async fn mark_status(
		&self,
		account_id: Uuid,
		event_id: &str,
		status: ProcessingStatus,
		normalized_payload: Option<serde_json::Value>,
	) -> Result<(), IngestionError> {
		let mut rows = self.rows.lock().await;
		let key = (account_id, event_id.to_string());
		let record = rows.get_mut(&key).ok_or_else(|| {
			IngestionError::Store(format!("no raw record for {account_id}/{event_id}"))
		})?;
		record.processing_status = status;
		if normalized_payload.is_some() {
			record.normalized_payload = normalized_payload;
		}
		Ok(())
	}

	async fn pending_for_account(
		&self,
		account_id: Uuid,
	) -> Result<Vec<RawTransactionRecord>, IngestionError> {
		let rows = self.rows.lock().await;
		Ok(rows
			.values()
			.filter(|r| r.account_id == account_id && r.processing_status == ProcessingStatus::Pending)
			.cloned()
			.collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;

	fn record(account_id: Uuid, event_id: &str, payload: serde_json::Value) -> RawTransactionRecord {
		RawTransactionRecord {
			account_id,
			event_id: event_id.to_string(),
			stream_type: "transactions".into(),
			provider_name: "test-provider".into(),
			raw_payload: payload,
			normalized_payload: None,
			processing_status: ProcessingStatus::Pending,
			created_at: Utc::now(),
		}
	}

	#[tokio::test]
	async fn duplicate_insert_with_identical_payload_is_absorbed() {
		let store = InMemoryRawStore::new();
		let account = Uuid::new_v4();
		let r1 = record(account, "evt-1", serde_json::json!({"a": 1}));
		let r2 = record(account, "evt-1", serde_json::json!({"a": 1}));

		let first = store.insert_batch(vec![r1]).await.unwrap();
		assert_eq!(first.inserted, 1);
		let second = store.insert_batch(vec![r2]).await.unwrap();
		assert_eq!(second.inserted, 0);
		assert_eq!(second.duplicates_absorbed, 1);
	}

	#[tokio::test]
	async fn duplicate_key_with_differing_payload_is_an_error() {
		let store = InMemoryRawStore::new();
		let account = Uuid::new_v4();
		let r1 = record(account, "evt-1", serde_json::json!({"a": 1}));
		let r2 = record(account, "evt-1", serde_json::json!({"a": 2}));

		store.insert_batch(vec![r1]).await.unwrap();
		let result = store.insert_batch(vec![r2]).await;
		assert!(matches!(result, Err(IngestionError::DuplicateEventIdConflict { .. })));
	}
}
