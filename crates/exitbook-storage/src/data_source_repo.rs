//! SQLite backing for [`exitbook_ingestion::data_source_repo::DataSourceRepo`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exitbook_core::model::{DataSource, DataSourceStatus};
use exitbook_ingestion::{data_source_repo::DataSourceRepo, error::IngestionError};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::{db::Database, error::StorageError};

pub struct SqliteDataSourceRepo {
	db: Arc<Database>,
}

impl SqliteDataSourceRepo {
	pub fn new(db: Arc<Database>) -> Self {
		Self { db }
	}
}

fn status_to_str(status: DataSourceStatus) -> &'static str {
	match status {
		DataSourceStatus::Started => "started",
		DataSourceStatus::Completed => "completed",
		DataSourceStatus::Failed => "failed",
	}
}

fn status_from_str(s: &str) -> DataSourceStatus {
	match s {
		"completed" => DataSourceStatus::Completed,
		"failed" => DataSourceStatus::Failed,
		_ => DataSourceStatus::Started,
	}
}

fn row_to_data_source(row: &rusqlite::Row<'_>) -> rusqlite::Result<DataSource> {
	let id: String = row.get("id")?;
	let account_id: String = row.get("account_id")?;
	let status: String = row.get("status")?;
	let started_at: String = row.get("started_at")?;
	let finished_at: Option<String> = row.get("finished_at")?;
	let metadata: String = row.get("import_result_metadata")?;

	let to_sql_err = |e: Box<dyn std::error::Error + Send + Sync>| {
		rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, e)
	};

	Ok(DataSource {
		id: id.parse().map_err(|e: uuid::Error| to_sql_err(Box::new(e)))?,
		account_id: account_id.parse().map_err(|e: uuid::Error| to_sql_err(Box::new(e)))?,
		status: status_from_str(&status),
		started_at: DateTime::parse_from_rfc3339(&started_at)
			.map_err(|e| to_sql_err(Box::new(e)))?
			.with_timezone(&Utc),
		finished_at: finished_at
			.map(|s| DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc)))
			.transpose()
			.map_err(|e| to_sql_err(Box::new(e)))?,
		total_fetched: row.get::<_, i64>("total_fetched")? as u64,
		total_persisted: row.get::<_, i64>("total_persisted")? as u64,
		error: row.get("error")?,
		import_result_metadata: serde_json::from_str(&metadata).map_err(|e| to_sql_err(Box::new(e)))?,
	})
}

#[async_trait]
impl DataSourceRepo for SqliteDataSourceRepo {
	async fn find_resumable(&self, account_id: Uuid) -> Result<Option<DataSource>, IngestionError> {
		let conn = self.db.conn.lock().await;
		let mut stmt = conn
			.prepare(
				"SELECT id, account_id, status, started_at, finished_at, total_fetched,
					total_persisted, error, import_result_metadata
				 FROM data_sources
				 WHERE account_id = ?1 AND status = 'started'
				 ORDER BY started_at DESC LIMIT 1",
			)
			.map_err(StorageError::from)?;
		let found = stmt
			.query_row(params![account_id.to_string()], row_to_data_source)
			.optional()
			.map_err(StorageError::from)?;
		Ok(found)
	}

	async fn save(&self, data_source: &DataSource) -> Result<(), IngestionError> {
		let conn = self.db.conn.lock().await;
		let metadata_json =
			serde_json::to_string(&data_source.import_result_metadata).map_err(StorageError::from)?;
		conn.execute(
			"INSERT INTO data_sources
				(id, account_id, status, started_at, finished_at, total_fetched,
				 total_persisted, error, import_result_metadata)
			 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
			 ON CONFLICT (id) DO UPDATE SET
				status = excluded.status,
				finished_at = excluded.finished_at,
				total_fetched = excluded.total_fetched,
				total_persisted = excluded.total_persisted,
				error = excluded.error,
				import_result_metadata = excluded.import_result_metadata",
			params![
				data_source.id.to_string(),
				data_source.account_id.to_string(),
				status_to_str(data_source.status),
				data_source.started_at.to_rfc3339(),
				data_source.finished_at.map(|ts| ts.to_rfc3339()),
				data_source.total_fetched as i64,
				data_source.total_persisted as i64,
				data_source.error,
				metadata_json,
			],
		)
		.map_err(StorageError::from)?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn save_then_find_resumable_round_trips_started_session() {
		let db = Arc::new(Database::open_in_memory().unwrap());
		let repo = SqliteDataSourceRepo::new(db);
		let account = Uuid::new_v4();
		let session = DataSource::new_started(account);

		repo.save(&session).await.unwrap();
		let resumable = repo.find_resumable(account).await.unwrap();
		assert_eq!(resumable.unwrap().id, session.id);
	}

	#[tokio::test]
	async fn completed_session_is_not_resumable() {
		let db = Arc::new(Database::open_in_memory().unwrap());
		let repo = SqliteDataSourceRepo::new(db);
		let account = Uuid::new_v4();
		let mut session = DataSource::new_started(account);
		repo.save(&session).await.unwrap();

		session.complete();
		repo.save(&session).await.unwrap();

		assert!(repo.find_resumable(account).await.unwrap().is_none());
	}
}
