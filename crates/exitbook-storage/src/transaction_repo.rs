//! Universal transaction persistence (spec §3). Upserts key on
//! `(account_id, external_id)`, matching the uniqueness rule the processors
//! crate already assumes when merging re-imported records.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use exitbook_core::model::UniversalTransaction;
use rusqlite::{params, OptionalExtension};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{db::Database, error::StorageError};

#[async_trait]
pub trait TransactionRepository: Send + Sync {
	async fn upsert(&self, tx: &UniversalTransaction) -> Result<(), StorageError>;

	async fn upsert_batch(&self, txs: &[UniversalTransaction]) -> Result<(), StorageError> {
		for tx in txs {
			self.upsert(tx).await?;
		}
		Ok(())
	}

	async fn get(&self, id: Uuid) -> Result<Option<UniversalTransaction>, StorageError>;

	async fn list_for_account(&self, account_id: Uuid) -> Result<Vec<UniversalTransaction>, StorageError>;

	/// Every persisted transaction, ordered by timestamp — the input set the
	/// cost-basis engine runs a calculation over.
	async fn list_all(&self) -> Result<Vec<UniversalTransaction>, StorageError>;
}

pub struct SqliteTransactionRepository {
	db: Arc<Database>,
}

impl SqliteTransactionRepository {
	pub fn new(db: Arc<Database>) -> Self {
		Self { db }
	}
}

fn row_to_tx(row: &rusqlite::Row<'_>) -> rusqlite::Result<UniversalTransaction> {
	let payload: String = row.get("payload")?;
	serde_json::from_str(&payload).map_err(|e| {
		rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
	})
}

#[async_trait]
impl TransactionRepository for SqliteTransactionRepository {
	async fn upsert(&self, tx: &UniversalTransaction) -> Result<(), StorageError> {
		let conn = self.db.conn.lock().await;
		let payload = serde_json::to_string(tx)?;
		conn.execute(
			"INSERT INTO universal_transactions
				(id, external_id, account_id, source, source_type, timestamp, payload)
			 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
			 ON CONFLICT (account_id, external_id) DO UPDATE SET
				source = excluded.source,
				source_type = excluded.source_type,
				timestamp = excluded.timestamp,
				payload = excluded.payload",
			params![
				tx.id.to_string(),
				tx.external_id,
				tx.account_id.to_string(),
				tx.source,
				tx.source_type,
				tx.timestamp.to_rfc3339(),
				payload,
			],
		)?;
		Ok(())
	}

	async fn get(&self, id: Uuid) -> Result<Option<UniversalTransaction>, StorageError> {
		let conn = self.db.conn.lock().await;
		let tx = conn
			.query_row(
				"SELECT payload FROM universal_transactions WHERE id = ?1",
				params![id.to_string()],
				row_to_tx,
			)
			.optional()?;
		Ok(tx)
	}

	async fn list_for_account(&self, account_id: Uuid) -> Result<Vec<UniversalTransaction>, StorageError> {
		let conn = self.db.conn.lock().await;
		let mut stmt = conn.prepare(
			"SELECT payload FROM universal_transactions WHERE account_id = ?1 ORDER BY timestamp",
		)?;
		let rows = stmt.query_map(params![account_id.to_string()], row_to_tx)?;
		let mut txs = Vec::new();
		for row in rows {
			txs.push(row?);
		}
		Ok(txs)
	}

	async fn list_all(&self) -> Result<Vec<UniversalTransaction>, StorageError> {
		let conn = self.db.conn.lock().await;
		let mut stmt = conn.prepare("SELECT payload FROM universal_transactions ORDER BY timestamp")?;
		let rows = stmt.query_map([], row_to_tx)?;
		let mut txs = Vec::new();
		for row in rows {
			txs.push(row?);
		}
		Ok(txs)
	}
}

#[derive(Default)]
pub struct InMemoryTransactionRepository {
	rows: Mutex<HashMap<(Uuid, String), UniversalTransaction>>,
}

impl InMemoryTransactionRepository {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
	async fn upsert(&self, tx: &UniversalTransaction) -> Result<(), StorageError> {
		self.rows.lock().await.insert((tx.account_id, tx.external_id.clone()), tx.clone());
		Ok(())
	}

	async fn get(&self, id: Uuid) -> Result<Option<UniversalTransaction>, StorageError> {
		Ok(self.rows.lock().await.values().find(|t| t.id == id).cloned())
	}

	async fn list_for_account(&self, account_id: Uuid) -> Result<Vec<UniversalTransaction>, StorageError> {
		let mut txs: Vec<_> =
			self.rows.lock().await.values().filter(|t| t.account_id == account_id).cloned().collect();
		txs.sort_by_key(|t| t.timestamp);
		Ok(txs)
	}

	async fn list_all(&self) -> Result<Vec<UniversalTransaction>, StorageError> {
		let mut txs: Vec<_> = self.rows.lock().await.values().cloned().collect();
		txs.sort_by_key(|t: &UniversalTransaction| t.timestamp);
		Ok(txs)
	}
}

#[cfg(test)]
mod tests {
	use chrono::{DateTime, Utc};
	use exitbook_core::{
		asset::AssetId,
		decimal::Amount,
		model::{Movement, Movements, Operation, TransactionStatus},
	};

	use super::*;

	fn tx(account_id: Uuid, external_id: &str, timestamp: DateTime<Utc>) -> UniversalTransaction {
		UniversalTransaction {
			id: Uuid::new_v4(),
			external_id: external_id.into(),
			account_id,
			source: "kraken".into(),
			source_type: "exchange-api".into(),
			timestamp,
			status: TransactionStatus::Confirmed,
			from: None,
			to: None,
			movements: Movements {
				inflows: vec![Movement {
					asset_id: AssetId::blockchain_native("bitcoin"),
					asset_symbol: "BTC".into(),
					gross_amount: Amount::from(1),
					net_amount: Amount::from(1),
				}],
				outflows: vec![],
			},
			fees: vec![],
			operation: Operation::trade_buy(),
			blockchain: None,
			notes: None,
		}
	}

	#[tokio::test]
	async fn upsert_by_external_id_replaces_existing_row() {
		let db = Arc::new(Database::open_in_memory().unwrap());
		let repo = SqliteTransactionRepository::new(db);
		let account = Uuid::new_v4();
		let now = Utc::now();

		let mut first = tx(account, "ext-1", now);
		repo.upsert(&first).await.unwrap();
		first.notes = Some("updated".into());
		repo.upsert(&first).await.unwrap();

		let all = repo.list_for_account(account).await.unwrap();
		assert_eq!(all.len(), 1);
		assert_eq!(all[0].notes.as_deref(), Some("updated"));
	}

	#[tokio::test]
	async fn list_all_orders_by_timestamp() {
		let db = Arc::new(Database::open_in_memory().unwrap());
		let repo = SqliteTransactionRepository::new(db);
		let account = Uuid::new_v4();
		let t0 = Utc::now();

		repo.upsert(&tx(account, "ext-2", t0 + chrono::Duration::hours(2))).await.unwrap();
		repo.upsert(&tx(account, "ext-1", t0)).await.unwrap();

		let all = repo.list_all().await.unwrap();
		assert_eq!(all.len(), 2);
		assert_eq!(all[0].external_id, "ext-1");
	}
}
