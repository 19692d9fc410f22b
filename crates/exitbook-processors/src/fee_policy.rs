//! Fee attribution (spec §4.3 step 4): a fee is only recorded against the
//! user if the user actually paid it.

use exitbook_core::asset::AssetId;
use exitbook_core::decimal::Amount;
use exitbook_core::model::{Fee, FeeScope, FeeSettlement};

use crate::fund_flow::Direction;

/// Decides whether `amount` should be recorded as a [`Fee`] against this
/// account. For outgoing transactions the user is the payer by definition;
/// for incoming transactions the fee belongs to the sender, never the
/// receiver, so nothing is attributed here (spec §4.3 step 4).
pub fn attribute_fee(
	direction: Direction,
	asset_id: AssetId,
	asset_symbol: impl Into<String>,
	amount: Amount,
	scope: FeeScope,
	settlement: FeeSettlement,
) -> Option<Fee> {
	match direction {
		Direction::Outflow => Some(Fee { asset_id, asset_symbol: asset_symbol.into(), amount, scope, settlement }),
		Direction::Inflow | Direction::Unrelated => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn outflow_fee_is_attributed_to_user() {
		let fee = attribute_fee(
			Direction::Outflow,
			AssetId::blockchain_native("ethereum"),
			"ETH",
			"0.002".parse().unwrap(),
			FeeScope::Network,
			FeeSettlement::OnChain,
		);
		assert!(fee.is_some());
	}

	#[test]
	fn inflow_fee_belongs_to_the_sender_not_the_user() {
		let fee = attribute_fee(
			Direction::Inflow,
			AssetId::blockchain_native("ethereum"),
			"ETH",
			"0.002".parse().unwrap(),
			FeeScope::Network,
			FeeSettlement::OnChain,
		);
		assert!(fee.is_none());
	}
}
