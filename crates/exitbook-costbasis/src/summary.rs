use std::collections::BTreeSet;

use exitbook_core::{asset::AssetId, decimal::Amount};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalculationStatus {
	Completed,
	Failed,
}

/// Output of a cost-basis run (spec §4.5 "Output"). A run either writes
/// lots/disposals/transfers and this summary in one transaction, or writes
/// nothing at all — there is no partial-success state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CalculationSummary {
	pub calculation_id: uuid::Uuid,
	pub lots_created: u64,
	pub disposals_processed: u64,
	pub assets_processed: Vec<AssetId>,
	pub total_capital_gain_loss: Amount,
	pub total_taxable_gain_loss: Amount,
	pub status: CalculationStatus,
}

impl CalculationSummary {
	pub fn new(calculation_id: uuid::Uuid) -> Self {
		Self {
			calculation_id,
			lots_created: 0,
			disposals_processed: 0,
			assets_processed: Vec::new(),
			total_capital_gain_loss: Amount::zero(),
			total_taxable_gain_loss: Amount::zero(),
			status: CalculationStatus::Completed,
		}
	}

	pub fn finalize_assets(&mut self, seen: BTreeSet<AssetId>) {
		self.assets_processed = seen.into_iter().collect();
	}
}
