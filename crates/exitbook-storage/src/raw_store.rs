//! SQLite backing for [`exitbook_ingestion::raw_store::RawStore`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exitbook_core::model::{ProcessingStatus, RawTransactionRecord};
use exitbook_ingestion::{
	error::IngestionError,
	raw_store::{InsertOutcome, RawStore},
};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::{db::Database, error::StorageError};

pub struct SqliteRawStore {
	db: Arc<Database>,
}

impl SqliteRawStore {
	pub fn new(db: Arc<Database>) -> Self {
		Self { db }
	}
}

fn status_to_str(status: ProcessingStatus) -> &'static str {
	match status {
		ProcessingStatus::Pending => "pending",
		ProcessingStatus::Processed => "processed",
		ProcessingStatus::Failed => "failed",
	}
}

fn status_from_str(s: &str) -> ProcessingStatus {
	match s {
		"processed" => ProcessingStatus::Processed,
		"failed" => ProcessingStatus::Failed,
		_ => ProcessingStatus::Pending,
	}
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawTransactionRecord> {
	let account_id: String = row.get("account_id")?;
	let raw_payload: String = row.get("raw_payload")?;
	let normalized_payload: Option<String> = row.get("normalized_payload")?;
	let status: String = row.get("processing_status")?;
	let created_at: String = row.get("created_at")?;

	let to_sql_err =
		|e: Box<dyn std::error::Error + Send + Sync>| {
			rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, e)
		};

	Ok(RawTransactionRecord {
		account_id: account_id.parse().map_err(|e: uuid::Error| to_sql_err(Box::new(e)))?,
		event_id: row.get("event_id")?,
		stream_type: row.get("stream_type")?,
		provider_name: row.get("provider_name")?,
		raw_payload: serde_json::from_str(&raw_payload).map_err(|e| to_sql_err(Box::new(e)))?,
		normalized_payload: normalized_payload
			.map(|p| serde_json::from_str(&p))
			.transpose()
			.map_err(|e| to_sql_err(Box::new(e)))?,
		processing_status: status_from_str(&status),
		created_at: DateTime::parse_from_rfc3339(&created_at)
			.map_err(|e| to_sql_err(Box::new(e)))?
			.with_timezone(&Utc),
	})
}

#[async_trait]
impl RawStore for SqliteRawStore {
	async fn insert_batch(
		&self,
		records: Vec<RawTransactionRecord>,
	) -> Result<InsertOutcome, IngestionError> {
		let conn = self.db.conn.lock().await;
		let mut outcome = InsertOutcome::default();
		for record in records {
			let existing: Option<String> = conn
				.query_row(
					"SELECT raw_payload FROM raw_transactions WHERE account_id = ?1 AND event_id = ?2",
					params![record.account_id.to_string(), record.event_id],
					|row| row.get(0),
				)
				.optional()
				.map_err(StorageError::from)?;

			let payload_json = serde_json::to_string(&record.raw_payload).map_err(StorageError::from)?;

			match existing {
				None => {
					let normalized_json = record
						.normalized_payload
						.as_ref()
						.map(serde_json::to_string)
						.transpose()
						.map_err(StorageError::from)?;
					conn.execute(
						"INSERT INTO raw_transactions
							(account_id, event_id, stream_type, provider_name, raw_payload,
							 normalized_payload, processing_status, created_at)
						 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
						params![
							record.account_id.to_string(),
							record.event_id,
							record.stream_type,
							record.provider_name,
							payload_json,
							normalized_json,
							status_to_str(record.processing_status),
							record.created_at.to_rfc3339(),
						],
					)
					.map_err(StorageError::from)?;
					outcome.inserted += 1;
				},
				Some(existing_payload) => {
					if existing_payload == payload_json {
						outcome.duplicates_absorbed += 1;
					} else {
						return Err(IngestionError::DuplicateEventIdConflict {
							account_id: record.account_id,
							event_id: record.event_id,
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
		let conn = self.db.conn.lock().await;
		let normalized_json =
			normalized_payload.as_ref().map(serde_json::to_string).transpose().map_err(StorageError::from)?;

		let updated = if normalized_json.is_some() {
			conn.execute(
				"UPDATE raw_transactions SET processing_status = ?1, normalized_payload = ?2
				 WHERE account_id = ?3 AND event_id = ?4",
				params![status_to_str(status), normalized_json, account_id.to_string(), event_id],
			)
		} else {
			conn.execute(
				"UPDATE raw_transactions SET processing_status = ?1
				 WHERE account_id = ?2 AND event_id = ?3",
				params![status_to_str(status), account_id.to_string(), event_id],
			)
		}
		.map_err(StorageError::from)?;

		if updated == 0 {
			return Err(IngestionError::Store(format!("no raw record for {account_id}/{event_id}")));
		}
		Ok(())
	}

	async fn pending_for_account(
		&self,
		account_id: Uuid,
	) -> Result<Vec<RawTransactionRecord>, IngestionError> {
		let conn = self.db.conn.lock().await;
		let mut stmt = conn
			.prepare(
				"SELECT account_id, event_id, stream_type, provider_name, raw_payload,
					normalized_payload, processing_status, created_at
				 FROM raw_transactions WHERE account_id = ?1 AND processing_status = 'pending'",
			)
			.map_err(StorageError::from)?;
		let rows = stmt.query_map(params![account_id.to_string()], row_to_record).map_err(StorageError::from)?;
		let mut records = Vec::new();
		for row in rows {
			records.push(row.map_err(StorageError::from)?);
		}
		Ok(records)
	}
}

#[cfg(test)]
mod tests {
	use chrono::Utc;

	use super::*;
	use crate::db::Database;

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
		let db = Arc::new(Database::open_in_memory().unwrap());
		let store = SqliteRawStore::new(db);
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
		let db = Arc::new(Database::open_in_memory().unwrap());
		let store = SqliteRawStore::new(db);
		let account = Uuid::new_v4();
		let r1 = record(account, "evt-1", serde_json::json!({"a": 1}));
		let r2 = record(account, "evt-1", serde_json::json!({"a": 2}));

		store.insert_batch(vec![r1]).await.unwrap();
		let result = store.insert_batch(vec![r2]).await;
		assert!(matches!(result, Err(IngestionError::DuplicateEventIdConflict { .. })));
	}

	#[tokio::test]
	async fn mark_status_updates_processing_status_and_pending_excludes_it() {
		let db = Arc::new(Database::open_in_memory().unwrap());
		let store = SqliteRawStore::new(db);
		let account = Uuid::new_v4();
		store.insert_batch(vec![record(account, "evt-1", serde_json::json!({"a": 1}))]).await.unwrap();

		store
			.mark_status(account, "evt-1", ProcessingStatus::Processed, Some(serde_json::json!({"norm": true})))
			.await
			.unwrap();

		let pending = store.pending_for_account(account).await.unwrap();
		assert!(pending.is_empty());
	}
}
