use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{asset::AssetId, decimal::Amount};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotMethod {
	Fifo,
	Lifo,
	Hifo,
	Acb,
	SpecificId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotStatus {
	Open,
	PartiallyDisposed,
	FullyDisposed,
}

impl LotStatus {
	/// `status` is a pure function of `remaining_quantity` (spec §3 invariant).
	pub fn from_remaining(remaining: &Amount, quantity: &Amount) -> Self {
		if remaining.is_zero() {
			LotStatus::FullyDisposed
		} else if remaining == quantity {
			LotStatus::Open
		} else {
			LotStatus::PartiallyDisposed
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AcquisitionLot {
	pub id: Uuid,
	pub calculation_id: Uuid,
	pub acquisition_tx_id: Uuid,
	pub asset: AssetId,
	pub quantity: Amount,
	pub cost_basis_per_unit: Amount,
	pub total_cost_basis: Amount,
	pub acquisition_date: DateTime<Utc>,
	pub method: LotMethod,
	pub remaining_quantity: Amount,
	pub status: LotStatus,
}

impl AcquisitionLot {
	pub fn new(
		calculation_id: Uuid,
		acquisition_tx_id: Uuid,
		asset: AssetId,
		quantity: Amount,
		cost_basis_per_unit: Amount,
		acquisition_date: DateTime<Utc>,
		method: LotMethod,
	) -> Self {
		let total_cost_basis = &quantity * &cost_basis_per_unit;
		Self {
			id: Uuid::new_v4(),
			calculation_id,
			acquisition_tx_id,
			asset,
			remaining_quantity: quantity.clone(),
			status: LotStatus::Open,
			quantity,
			cost_basis_per_unit,
			total_cost_basis,
			acquisition_date,
			method,
		}
	}

	/// Reduces `remaining_quantity` by `qty` (disposal or transfer) and
	/// recomputes `status`, upholding the lot conservation invariant.
	pub fn reduce_remaining(&mut self, qty: &Amount) {
		self.remaining_quantity = &self.remaining_quantity - qty;
		self.status = LotStatus::from_remaining(&self.remaining_quantity, &self.quantity);
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxTreatmentCategory {
	ShortTerm,
	LongTerm,
	Superficial,
	DisallowedWash,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LotDisposal {
	pub id: Uuid,
	pub lot_id: Uuid,
	pub disposal_tx_id: Uuid,
	pub quantity_disposed: Amount,
	pub proceeds_per_unit: Amount,
	pub total_proceeds: Amount,
	pub cost_basis_per_unit: Amount,
	pub total_cost_basis: Amount,
	pub gain_loss: Amount,
	pub taxable_gain_loss: Amount,
	pub holding_period_days: i64,
	pub tax_treatment_category: TaxTreatmentCategory,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LotTransfer {
	pub id: Uuid,
	pub source_lot_id: Uuid,
	pub link_id: Uuid,
	pub quantity_transferred: Amount,
	pub cost_basis_per_unit: Amount,
	pub source_tx_id: Uuid,
	pub target_tx_id: Uuid,
	pub metadata: serde_json::Value,
}
