use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row per import attempt (spec §3 "DataSource (Import Session)").
/// The latest incomplete session for an account is resumed; completed
/// sessions are immutable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataSourceStatus {
	Started,
	Completed,
	Failed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataSource {
	pub id: Uuid,
	pub account_id: Uuid,
	pub status: DataSourceStatus,
	pub started_at: DateTime<Utc>,
	pub finished_at: Option<DateTime<Utc>>,
	pub total_fetched: u64,
	pub total_persisted: u64,
	pub error: Option<String>,
	pub import_result_metadata: serde_json::Value,
}

impl DataSource {
	pub fn new_started(account_id: Uuid) -> Self {
		Self {
			id: Uuid::new_v4(),
			account_id,
			status: DataSourceStatus::Started,
			started_at: Utc::now(),
			finished_at: None,
			total_fetched: 0,
			total_persisted: 0,
			error: None,
			import_result_metadata: serde_json::Value::Null,
		}
	}

	pub fn resume(&mut self) {
		self.status = DataSourceStatus::Started;
		self.finished_at = None;
		self.error = None;
	}

	pub fn is_resumable(&self) -> bool {
		matches!(self.status, DataSourceStatus::Started)
	}

	pub fn complete(&mut self) {
		self.status = DataSourceStatus::Completed;
		self.finished_at = Some(Utc::now());
	}

	pub fn fail(&mut self, error: impl Into<String>) {
		self.status = DataSourceStatus::Failed;
		self.finished_at = Some(Utc::now());
		self.error = Some(error.into());
	}
}
