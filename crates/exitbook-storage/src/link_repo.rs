//! Transfer-link persistence (spec §4.4). A suggested link is mutated into
//! `Confirmed`/`Rejected` in place rather than re-inserted.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use exitbook_core::model::{LinkStatus, TransactionLink};
use rusqlite::{params, OptionalExtension};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{db::Database, error::StorageError};

#[async_trait]
pub trait LinkRepository: Send + Sync {
	async fn insert_suggested(&self, link: &TransactionLink) -> Result<(), StorageError>;

	async fn set_status(&self, id: Uuid, status: LinkStatus) -> Result<(), StorageError>;

	async fn get(&self, id: Uuid) -> Result<Option<TransactionLink>, StorageError>;

	async fn list_by_status(&self, status: LinkStatus) -> Result<Vec<TransactionLink>, StorageError>;

	async fn list_confirmed(&self) -> Result<Vec<TransactionLink>, StorageError> {
		self.list_by_status(LinkStatus::Confirmed).await
	}
}

fn status_to_str(status: LinkStatus) -> &'static str {
	match status {
		LinkStatus::Suggested => "suggested",
		LinkStatus::Confirmed => "confirmed",
		LinkStatus::Rejected => "rejected",
	}
}

fn status_from_str(s: &str) -> LinkStatus {
	match s {
		"confirmed" => LinkStatus::Confirmed,
		"rejected" => LinkStatus::Rejected,
		_ => LinkStatus::Suggested,
	}
}

pub struct SqliteLinkRepository {
	db: Arc<Database>,
}

impl SqliteLinkRepository {
	pub fn new(db: Arc<Database>) -> Self {
		Self { db }
	}
}

fn row_to_link(row: &rusqlite::Row<'_>) -> rusqlite::Result<TransactionLink> {
	let payload: String = row.get("payload")?;
	serde_json::from_str(&payload).map_err(|e| {
		rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
	})
}

#[async_trait]
impl LinkRepository for SqliteLinkRepository {
	async fn insert_suggested(&self, link: &TransactionLink) -> Result<(), StorageError> {
		let conn = self.db.conn.lock().await;
		let payload = serde_json::to_string(link)?;
		conn.execute(
			"INSERT INTO transaction_links (id, source_tx_id, target_tx_id, status, payload)
			 VALUES (?1, ?2, ?3, ?4, ?5)",
			params![
				link.id.to_string(),
				link.source_tx_id.to_string(),
				link.target_tx_id.to_string(),
				status_to_str(link.status),
				payload,
			],
		)?;
		Ok(())
	}

	async fn set_status(&self, id: Uuid, status: LinkStatus) -> Result<(), StorageError> {
		let conn = self.db.conn.lock().await;
		let payload: Option<String> = conn
			.query_row(
				"SELECT payload FROM transaction_links WHERE id = ?1",
				params![id.to_string()],
				|row| row.get(0),
			)
			.optional()?;
		let Some(payload) = payload else {
			return Err(StorageError::NotFound(id));
		};
		let mut link: TransactionLink = serde_json::from_str(&payload)?;
		link.status = status;
		let updated_payload = serde_json::to_string(&link)?;
		conn.execute(
			"UPDATE transaction_links SET status = ?1, payload = ?2 WHERE id = ?3",
			params![status_to_str(status), updated_payload, id.to_string()],
		)?;
		Ok(())
	}

	async fn get(&self, id: Uuid) -> Result<Option<TransactionLink>, StorageError> {
		let conn = self.db.conn.lock().await;
		let link = conn
			.query_row(
				"SELECT payload FROM transaction_links WHERE id = ?1",
				params![id.to_string()],
				row_to_link,
			)
			.optional()?;
		Ok(link)
	}

	async fn list_by_status(&self, status: LinkStatus) -> Result<Vec<TransactionLink>, StorageError> {
		let conn = self.db.conn.lock().await;
		let mut stmt =
			conn.prepare("SELECT payload FROM transaction_links WHERE status = ?1")?;
		let rows = stmt.query_map(params![status_to_str(status)], row_to_link)?;
		let mut links = Vec::new();
		for row in rows {
			links.push(row?);
		}
		Ok(links)
	}
}

#[derive(Default)]
pub struct InMemoryLinkRepository {
	rows: Mutex<HashMap<Uuid, TransactionLink>>,
}

impl InMemoryLinkRepository {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
	async fn insert_suggested(&self, link: &TransactionLink) -> Result<(), StorageError> {
		self.rows.lock().await.insert(link.id, link.clone());
		Ok(())
	}

	async fn set_status(&self, id: Uuid, status: LinkStatus) -> Result<(), StorageError> {
		let mut rows = self.rows.lock().await;
		let link = rows.get_mut(&id).ok_or(StorageError::NotFound(id))?;
		link.status = status;
		Ok(())
	}

	async fn get(&self, id: Uuid) -> Result<Option<TransactionLink>, StorageError> {
		Ok(self.rows.lock().await.get(&id).cloned())
	}

	async fn list_by_status(&self, status: LinkStatus) -> Result<Vec<TransactionLink>, StorageError> {
		Ok(self.rows.lock().await.values().filter(|l| l.status == status).cloned().collect())
	}
}

#[cfg(test)]
mod tests {
	use exitbook_core::{asset::AssetId, decimal::Amount, model::{LinkType, MatchCriteria}};

	use super::*;

	fn link() -> TransactionLink {
		TransactionLink {
			id: Uuid::new_v4(),
			source_tx_id: Uuid::new_v4(),
			target_tx_id: Uuid::new_v4(),
			asset: AssetId::blockchain_native("bitcoin"),
			source_amount: Amount::from(1),
			target_amount: Amount::from(1),
			link_type: LinkType::ExchangeToChain,
			confidence_score: Amount::from(90),
			status: LinkStatus::Suggested,
			match_criteria: MatchCriteria {
				amount_similarity: Amount::from(1),
				timing_hours: Amount::from(1),
				timing_valid: true,
				address_match: None,
				asset_match: true,
			},
			metadata: serde_json::Value::Null,
		}
	}

	#[tokio::test]
	async fn confirming_a_suggested_link_updates_status_and_payload() {
		let db = Arc::new(Database::open_in_memory().unwrap());
		let repo = SqliteLinkRepository::new(db);
		let l = link();
		repo.insert_suggested(&l).await.unwrap();

		repo.set_status(l.id, LinkStatus::Confirmed).await.unwrap();

		let reloaded = repo.get(l.id).await.unwrap().unwrap();
		assert_eq!(reloaded.status, LinkStatus::Confirmed);
		assert!(repo.list_by_status(LinkStatus::Suggested).await.unwrap().is_empty());
		assert_eq!(repo.list_confirmed().await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn set_status_on_missing_link_is_not_found() {
		let db = Arc::new(Database::open_in_memory().unwrap());
		let repo = SqliteLinkRepository::new(db);
		let result = repo.set_status(Uuid::new_v4(), LinkStatus::Confirmed).await;
		assert!(matches!(result, Err(StorageError::NotFound(_))));
	}
}
