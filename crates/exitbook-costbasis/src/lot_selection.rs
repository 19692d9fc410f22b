//! Lot selection strategies (spec §4.5 "Lot selection method"). Each
//! non-ACB method is a pure ordering over an asset's currently open lots;
//! the engine then draws `remaining_quantity` off lots in that order until
//! the disposed/transferred quantity is satisfied.

use exitbook_core::{decimal::Amount, model::{AcquisitionLot, LotMethod}};
use uuid::Uuid;

/// Orders `open_lots` for consumption under `method`. `specific_lot_order`,
/// when present, takes precedence over the method entirely (spec
/// "specific_id"); lots it doesn't name are appended afterward in
/// acquisition order so a partial specific-id list still drains the asset
/// fully if the disposal needs more than the named lots provide.
pub fn ordered_lot_ids(
	open_lots: &[&AcquisitionLot],
	method: LotMethod,
	specific_lot_order: Option<&[Uuid]>,
) -> Vec<Uuid> {
	if let Some(order) = specific_lot_order {
		let named: Vec<Uuid> = order.iter().copied().filter(|id| open_lots.iter().any(|l| l.id == *id)).collect();
		let mut remainder: Vec<&AcquisitionLot> =
			open_lots.iter().filter(|l| !named.contains(&l.id)).copied().collect();
		remainder.sort_by(|a, b| a.acquisition_date.cmp(&b.acquisition_date));
		return named.into_iter().chain(remainder.into_iter().map(|l| l.id)).collect();
	}

	let mut sorted: Vec<&AcquisitionLot> = open_lots.to_vec();
	match method {
		LotMethod::Fifo | LotMethod::Acb => sorted.sort_by(|a, b| a.acquisition_date.cmp(&b.acquisition_date)),
		LotMethod::Lifo => sorted.sort_by(|a, b| b.acquisition_date.cmp(&a.acquisition_date)),
		LotMethod::Hifo => sorted.sort_by(|a, b| b.cost_basis_per_unit.cmp(&a.cost_basis_per_unit)),
		LotMethod::SpecificId => sorted.sort_by(|a, b| a.acquisition_date.cmp(&b.acquisition_date)),
	}
	sorted.into_iter().map(|l| l.id).collect()
}

/// Canada's ACB method (spec "acb"): cost basis per unit for a disposal is
/// the quantity-weighted average across *all* currently open lots for the
/// asset, not any single lot's own basis. The mechanical draw-down of
/// `remaining_quantity` still happens lot-by-lot (in [`ordered_lot_ids`]
/// order) so the ledger's lot rows stay meaningful, but the disposal's
/// `cost_basis_per_unit` comes from this pooled average.
pub fn weighted_average_cost(open_lots: &[&AcquisitionLot]) -> Amount {
	let mut total_qty = Amount::zero();
	let mut total_cost = Amount::zero();
	for lot in open_lots {
		total_qty = total_qty + lot.remaining_quantity.clone();
		total_cost = total_cost + (&lot.remaining_quantity * &lot.cost_basis_per_unit);
	}
	if total_qty.is_zero() {
		Amount::zero()
	} else {
		total_cost / total_qty
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, Utc};
	use exitbook_core::asset::AssetId;
	use uuid::Uuid;

	fn lot(days_ago: i64, cost: &str) -> AcquisitionLot {
		AcquisitionLot::new(
			Uuid::new_v4(),
			Uuid::new_v4(),
			AssetId::blockchain_native("bitcoin"),
			Amount::from(1),
			cost.parse().unwrap(),
			Utc::now() - Duration::days(days_ago),
			LotMethod::Fifo,
		)
	}

	#[test]
	fn fifo_orders_oldest_first() {
		let old = lot(10, "100");
		let new = lot(1, "200");
		let refs = vec![&new, &old];
		let order = ordered_lot_ids(&refs, LotMethod::Fifo, None);
		assert_eq!(order, vec![old.id, new.id]);
	}

	#[test]
	fn lifo_orders_newest_first() {
		let old = lot(10, "100");
		let new = lot(1, "200");
		let refs = vec![&old, &new];
		let order = ordered_lot_ids(&refs, LotMethod::Lifo, None);
		assert_eq!(order, vec![new.id, old.id]);
	}

	#[test]
	fn hifo_orders_highest_cost_first() {
		let cheap = lot(10, "100");
		let expensive = lot(1, "500");
		let refs = vec![&cheap, &expensive];
		let order = ordered_lot_ids(&refs, LotMethod::Hifo, None);
		assert_eq!(order, vec![expensive.id, cheap.id]);
	}

	#[test]
	fn weighted_average_blends_by_remaining_quantity() {
		let mut a = lot(10, "100");
		a.remaining_quantity = Amount::from(1);
		let mut b = lot(5, "300");
		b.remaining_quantity = Amount::from(3);
		let avg = weighted_average_cost(&[&a, &b]);
		// (1*100 + 3*300) / 4 = 250
		assert_eq!(avg.to_string(), "250");
	}
}
