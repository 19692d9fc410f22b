//! Persistence seam for import sessions (spec §3 "DataSource"). Kept separate
//! from [`crate::raw_store::RawStore`] since the two have different
//! consistency needs: a `DataSource` row is mutated in place across the
//! life of one run, while raw rows are append-only.

use async_trait::async_trait;
use exitbook_core::model::DataSource;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::IngestionError;

#[async_trait]
pub trait DataSourceRepo: Send + Sync {
	/// The most recent still-`started` session for this account, if any —
	/// the one the executor should resume rather than starting fresh.
	async fn find_resumable(&self, account_id: Uuid) -> Result<Option<DataSource>, IngestionError>;

	async fn save(&self, data_source: &DataSource) -> Result<(), IngestionError>;
}

#[derive(Default)]
pub struct InMemoryDataSourceRepo {
	rows: Mutex<HashMap<Uuid, DataSource>>,
}

impl InMemoryDataSourceRepo {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl DataSourceRepo for InMemoryDataSourceRepo {
	async fn find_resumable(&self, account_id: Uuid) -> Result<Option<DataSource>, IngestionError> {
		let rows = self.rows.lock().await;
		Ok(rows
			.values()
			.filter(|d| d.account_id == account_id && d.is_resumable())
			.max_by_key(|d| d.started_at)
			.cloned())
	}

	async fn save(&self, data_source: &DataSource) -> Result<(), IngestionError> {
		let mut rows = self.rows.lock().await;
		rows.insert(data_source.id, data_source.clone());
		Ok(())
	}
}
