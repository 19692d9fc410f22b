use exitbook_ingestion::error::IngestionError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
	#[error("sqlite error: {0}")]
	Sqlite(#[from] rusqlite::Error),

	#[error("payload serialization error: {0}")]
	Serde(#[from] serde_json::Error),

	#[error("duplicate (account_id, event_id) with differing payload: account={account_id} event_id={event_id}")]
	DuplicateEventIdConflict { account_id: Uuid, event_id: String },

	#[error("no row for id {0}")]
	NotFound(Uuid),
}

/// Repositories backing `exitbook-ingestion`'s ports convert at this
/// boundary rather than leaking `rusqlite`/`serde_json` types across crates.
impl From<StorageError> for IngestionError {
	fn from(err: StorageError) -> Self {
		match err {
			StorageError::DuplicateEventIdConflict { account_id, event_id } => {
				IngestionError::DuplicateEventIdConflict { account_id, event_id }
			},
			other => IngestionError::Store(other.to_string()),
		}
	}
}
