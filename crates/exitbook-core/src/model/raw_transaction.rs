use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessingStatus {
	Pending,
	Processed,
	Failed,
}

/// Append-only raw record. Primary key is `(account_id, event_id)`; the raw
/// store must reject (not overwrite) a second insert with the same key
/// carrying a different payload (spec §7 data-integrity error kind).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawTransactionRecord {
	pub account_id: Uuid,
	pub event_id: String,
	pub stream_type: String,
	pub provider_name: String,
	pub raw_payload: serde_json::Value,
	pub normalized_payload: Option<serde_json::Value>,
	pub processing_status: ProcessingStatus,
	pub created_at: DateTime<Utc>,
}

impl RawTransactionRecord {
	pub fn key(&self) -> (Uuid, String) {
		(self.account_id, self.event_id.clone())
	}
}
