//! Fund-flow analysis (spec §4.3 step 2): classify a raw asset movement as
//! inflow or outflow relative to the user's addresses, and compute the net
//! amount after on-chain fee settlement.

use exitbook_core::{asset::AssetId, decimal::Amount};

use crate::user_context::UserContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
	Inflow,
	Outflow,
	/// Neither side of the movement belongs to the user; the event is
	/// irrelevant to this account and should be dropped before reaching the
	/// universal-transaction stage.
	Unrelated,
}

/// Classifies a single transfer leg `from -> to` relative to the addresses
/// `ctx` owns. A self-transfer between two owned addresses still resolves
/// to a direction (outflow from the sender's perspective) — the transfer
/// matcher, not fund-flow, is responsible for recognizing it as internal.
pub fn classify_direction(ctx: &UserContext, from: Option<&str>, to: Option<&str>) -> Direction {
	let from_owned = from.map(|a| ctx.owns(a)).unwrap_or(false);
	let to_owned = to.map(|a| ctx.owns(a)).unwrap_or(false);
	match (from_owned, to_owned) {
		(true, _) => Direction::Outflow,
		(false, true) => Direction::Inflow,
		(false, false) => Direction::Unrelated,
	}
}

/// Net amount after subtracting an on-chain-settled, same-asset fee from an
/// outflow's gross amount. Fees settled out of balance (`settlement =
/// balance`) or on a different asset never adjust the gross figure here.
pub fn net_after_onchain_fee(gross: &Amount, same_asset_onchain_fee: Option<&Amount>) -> Amount {
	match same_asset_onchain_fee {
		Some(fee) => gross - fee,
		None => gross.clone(),
	}
}

/// True when `a` and `b` name the same asset — the hard gate fund-flow and
/// later the transfer matcher both apply before any amount comparison.
pub fn same_asset(a: &AssetId, b: &AssetId) -> bool {
	a == b
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ctx() -> UserContext {
		UserContext::new("0xabc")
	}

	#[test]
	fn outflow_when_user_is_sender() {
		assert_eq!(classify_direction(&ctx(), Some("0xABC"), Some("0xdef")), Direction::Outflow);
	}

	#[test]
	fn inflow_when_user_is_receiver() {
		assert_eq!(classify_direction(&ctx(), Some("0xdef"), Some("0xABC")), Direction::Inflow);
	}

	#[test]
	fn unrelated_when_neither_side_is_owned() {
		assert_eq!(classify_direction(&ctx(), Some("0x111"), Some("0x222")), Direction::Unrelated);
	}

	#[test]
	fn net_subtracts_same_asset_onchain_fee() {
		let gross: Amount = "1.5".parse().unwrap();
		let fee: Amount = "0.01".parse().unwrap();
		assert_eq!(net_after_onchain_fee(&gross, Some(&fee)).to_string(), "1.49");
	}
}
