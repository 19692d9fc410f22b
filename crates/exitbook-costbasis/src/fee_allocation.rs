//! Proportional fee allocation (spec §4.5 "Acquisition path": "platform
//! fees are allocated proportionally across multi-asset inflows (by USD
//! value)").

use std::collections::HashMap;

use exitbook_core::{asset::AssetId, decimal::Amount};

/// Splits `total_fee_usd` across `inflows_usd_value` in proportion to each
/// inflow's USD value. An asset with zero USD value gets zero allocation
/// regardless of its raw quantity.
pub fn allocate_proportionally(
	inflows_usd_value: &[(AssetId, Amount)],
	total_fee_usd: &Amount,
) -> HashMap<AssetId, Amount> {
	let total_value: Amount =
		inflows_usd_value.iter().fold(Amount::zero(), |acc, (_, v)| acc + v.clone());

	if total_value.is_zero() || total_fee_usd.is_zero() {
		return inflows_usd_value.iter().map(|(asset, _)| (asset.clone(), Amount::zero())).collect();
	}

	inflows_usd_value
		.iter()
		.map(|(asset, value)| {
			let share = (value * total_fee_usd) / &total_value;
			(asset.clone(), share)
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn splits_fee_proportionally_to_usd_value() {
		let inflows = vec![
			(AssetId::blockchain_native("bitcoin"), "100".parse().unwrap()),
			(AssetId::blockchain_native("ethereum"), "300".parse().unwrap()),
		];
		let allocation = allocate_proportionally(&inflows, &"40".parse().unwrap());
		assert_eq!(allocation[&AssetId::blockchain_native("bitcoin")].to_string(), "10");
		assert_eq!(allocation[&AssetId::blockchain_native("ethereum")].to_string(), "30");
	}

	#[test]
	fn zero_total_value_allocates_nothing() {
		let inflows = vec![(AssetId::blockchain_native("bitcoin"), Amount::zero())];
		let allocation = allocate_proportionally(&inflows, &"10".parse().unwrap());
		assert_eq!(allocation[&AssetId::blockchain_native("bitcoin")].to_string(), "0");
	}
}
