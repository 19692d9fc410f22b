//! Acquisition path (spec §4.5 "Acquisition path"): builds a lot for an
//! inflow that isn't covered by an inbound `LotTransfer`.

use chrono::{DateTime, Utc};
use exitbook_core::{
	asset::AssetId,
	decimal::Amount,
	model::{AcquisitionLot, LotMethod},
};
use uuid::Uuid;

/// `unit_cost = price * quantity + allocated_fee_usd`, expressed per unit
/// by dividing back through `quantity` — the lot still stores a
/// per-unit figure so later disposals can multiply by whatever sub-quantity
/// they draw.
pub fn build_acquisition_lot(
	calculation_id: Uuid,
	acquisition_tx_id: Uuid,
	asset: AssetId,
	quantity: Amount,
	price_usd: &Amount,
	allocated_fee_usd: &Amount,
	acquisition_date: DateTime<Utc>,
	method: LotMethod,
) -> AcquisitionLot {
	let total_cost = (&quantity * price_usd) + allocated_fee_usd.clone();
	let unit_cost = if quantity.is_zero() { Amount::zero() } else { &total_cost / &quantity };
	AcquisitionLot::new(calculation_id, acquisition_tx_id, asset, quantity, unit_cost, acquisition_date, method)
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;

	#[test]
	fn unit_cost_folds_in_allocated_fee() {
		let lot = build_acquisition_lot(
			Uuid::new_v4(),
			Uuid::new_v4(),
			AssetId::blockchain_native("bitcoin"),
			Amount::from(1),
			&Amount::from(30_000),
			&Amount::from(50),
			Utc::now(),
			LotMethod::Fifo,
		);
		assert_eq!(lot.cost_basis_per_unit.to_string(), "30050");
		assert_eq!(lot.total_cost_basis.to_string(), "30050");
	}
}
