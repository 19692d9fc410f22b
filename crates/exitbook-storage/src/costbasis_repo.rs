//! Atomic persistence of a cost-basis run's output (spec §4.5, §7: "a run
//! either writes lots/disposals/transfers and the summary in one
//! transaction, or writes nothing at all").

use std::sync::Arc;

use async_trait::async_trait;
use exitbook_core::model::{AcquisitionLot, LotDisposal, LotTransfer};
use exitbook_costbasis::CalculationArtifacts;
use rusqlite::params;
use uuid::Uuid;

use crate::{db::Database, error::StorageError};

#[async_trait]
pub trait CostBasisRepository: Send + Sync {
	/// Persists every lot, disposal, transfer and the summary from one run
	/// inside a single SQLite transaction. Any failure rolls the whole batch
	/// back, leaving no partial calculation behind.
	async fn persist(&self, artifacts: &CalculationArtifacts) -> Result<(), StorageError>;

	async fn load_lots(&self, calculation_id: Uuid) -> Result<Vec<AcquisitionLot>, StorageError>;

	async fn load_disposals(&self, calculation_id: Uuid) -> Result<Vec<LotDisposal>, StorageError>;

	async fn load_transfers(&self, calculation_id: Uuid) -> Result<Vec<LotTransfer>, StorageError>;
}

pub struct SqliteCostBasisRepository {
	db: Arc<Database>,
}

impl SqliteCostBasisRepository {
	pub fn new(db: Arc<Database>) -> Self {
		Self { db }
	}
}

#[async_trait]
impl CostBasisRepository for SqliteCostBasisRepository {
	async fn persist(&self, artifacts: &CalculationArtifacts) -> Result<(), StorageError> {
		let mut conn = self.db.conn.lock().await;
		let tx = conn.transaction()?;

		let calculation_id = artifacts.summary.calculation_id;
		tx.execute(
			"INSERT INTO calculation_summaries (calculation_id, payload, created_at)
			 VALUES (?1, ?2, ?3)",
			params![
				calculation_id.to_string(),
				serde_json::to_string(&artifacts.summary)?,
				chrono::Utc::now().to_rfc3339(),
			],
		)?;

		for lot in &artifacts.lots {
			tx.execute(
				"INSERT INTO acquisition_lots (id, calculation_id, asset, payload)
				 VALUES (?1, ?2, ?3, ?4)",
				params![
					lot.id.to_string(),
					calculation_id.to_string(),
					lot.asset.as_str(),
					serde_json::to_string(lot)?,
				],
			)?;
		}

		for disposal in &artifacts.disposals {
			tx.execute(
				"INSERT INTO lot_disposals (id, calculation_id, lot_id, payload)
				 VALUES (?1, ?2, ?3, ?4)",
				params![
					disposal.id.to_string(),
					calculation_id.to_string(),
					disposal.lot_id.to_string(),
					serde_json::to_string(disposal)?,
				],
			)?;
		}

		for transfer in &artifacts.transfers {
			tx.execute(
				"INSERT INTO lot_transfers (id, calculation_id, link_id, payload)
				 VALUES (?1, ?2, ?3, ?4)",
				params![
					transfer.id.to_string(),
					calculation_id.to_string(),
					transfer.link_id.to_string(),
					serde_json::to_string(transfer)?,
				],
			)?;
		}

		tx.commit()?;
		Ok(())
	}

	async fn load_lots(&self, calculation_id: Uuid) -> Result<Vec<AcquisitionLot>, StorageError> {
		let conn = self.db.conn.lock().await;
		let mut stmt = conn.prepare("SELECT payload FROM acquisition_lots WHERE calculation_id = ?1")?;
		let rows = stmt.query_map(params![calculation_id.to_string()], |row| {
			let payload: String = row.get(0)?;
			serde_json::from_str(&payload).map_err(|e| {
				rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
			})
		})?;
		let mut lots = Vec::new();
		for row in rows {
			lots.push(row?);
		}
		Ok(lots)
	}

	async fn load_disposals(&self, calculation_id: Uuid) -> Result<Vec<LotDisposal>, StorageError> {
		let conn = self.db.conn.lock().await;
		let mut stmt = conn.prepare("SELECT payload FROM lot_disposals WHERE calculation_id = ?1")?;
		let rows = stmt.query_map(params![calculation_id.to_string()], |row| {
			let payload: String = row.get(0)?;
			serde_json::from_str(&payload).map_err(|e| {
				rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
			})
		})?;
		let mut disposals = Vec::new();
		for row in rows {
			disposals.push(row?);
		}
		Ok(disposals)
	}

	async fn load_transfers(&self, calculation_id: Uuid) -> Result<Vec<LotTransfer>, StorageError> {
		let conn = self.db.conn.lock().await;
		let mut stmt = conn.prepare("SELECT payload FROM lot_transfers WHERE calculation_id = ?1")?;
		let rows = stmt.query_map(params![calculation_id.to_string()], |row| {
			let payload: String = row.get(0)?;
			serde_json::from_str(&payload).map_err(|e| {
				rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
			})
		})?;
		let mut transfers = Vec::new();
		for row in rows {
			transfers.push(row?);
		}
		Ok(transfers)
	}
}

#[cfg(test)]
mod tests {
	use chrono::Utc;
	use exitbook_core::{asset::AssetId, decimal::Amount, model::LotMethod};
	use exitbook_costbasis::{CalculationStatus, CalculationSummary};

	use super::*;

	fn artifacts() -> CalculationArtifacts {
		let calculation_id = Uuid::new_v4();
		let lot = AcquisitionLot::new(
			calculation_id,
			Uuid::new_v4(),
			AssetId::blockchain_native("bitcoin"),
			Amount::from(1),
			Amount::from(100),
			Utc::now(),
			LotMethod::Fifo,
		);
		let mut summary = CalculationSummary::new(calculation_id);
		summary.lots_created = 1;
		summary.status = CalculationStatus::Completed;
		CalculationArtifacts { summary, lots: vec![lot], disposals: vec![], transfers: vec![] }
	}

	#[tokio::test]
	async fn persist_then_load_round_trips_lots() {
		let db = Arc::new(Database::open_in_memory().unwrap());
		let repo = SqliteCostBasisRepository::new(db);
		let a = artifacts();
		let calculation_id = a.summary.calculation_id;

		repo.persist(&a).await.unwrap();

		let lots = repo.load_lots(calculation_id).await.unwrap();
		assert_eq!(lots.len(), 1);
		assert_eq!(lots[0].id, a.lots[0].id);
	}

	#[tokio::test]
	async fn persisting_twice_for_the_same_calculation_id_fails_and_leaves_first_run_intact() {
		let db = Arc::new(Database::open_in_memory().unwrap());
		let repo = SqliteCostBasisRepository::new(db);
		let mut a = artifacts();
		repo.persist(&a).await.unwrap();

		// Same calculation_id, different lot id: the summary insert's
		// PRIMARY KEY collision should abort the whole transaction.
		a.lots[0].id = Uuid::new_v4();
		let result = repo.persist(&a).await;
		assert!(result.is_err());

		let lots = repo.load_lots(a.summary.calculation_id).await.unwrap();
		assert_eq!(lots.len(), 1);
	}
}
