//! Operation classification (spec §4.3 step 3): `category/type` decided from
//! directionality, counterparty, and source hints.

use exitbook_core::model::Operation;

use crate::fund_flow::Direction;

/// Hints a processor can read off its source-specific payload to disambiguate
/// an otherwise-directional movement (e.g. an exchange ledger row tagged
/// `"stake_reward"` rather than a generic deposit).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceHint {
	None,
	Trade,
	Stake,
	Governance,
	Fee,
}

/// Whether the counterparty address is a recognized exchange hot wallet —
/// distinguishes `deposit`/`withdrawal` (exchange counterparty) from a plain
/// `transfer` (unknown or other on-chain counterparty).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Counterparty {
	Exchange,
	OnChainUnknown,
}

pub fn classify_operation(direction: Direction, counterparty: Counterparty, hint: SourceHint) -> Operation {
	match hint {
		SourceHint::Trade => match direction {
			Direction::Outflow => Operation::trade_sell(),
			Direction::Inflow => Operation::trade_buy(),
			Direction::Unrelated => Operation::transfer_internal(),
		},
		SourceHint::Stake => Operation { category: exitbook_core::model::OperationCategory::Stake, kind: "stake".into() },
		SourceHint::Governance => {
			Operation { category: exitbook_core::model::OperationCategory::Governance, kind: "vote".into() }
		},
		SourceHint::Fee => Operation::fee(),
		SourceHint::None => match (direction, counterparty) {
			(Direction::Outflow, Counterparty::Exchange) => Operation::transfer_withdrawal(),
			(Direction::Inflow, Counterparty::Exchange) => Operation::transfer_deposit(),
			_ => Operation::transfer_internal(),
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn outflow_to_unknown_chain_address_is_plain_transfer() {
		let op = classify_operation(Direction::Outflow, Counterparty::OnChainUnknown, SourceHint::None);
		assert_eq!(op.kind, "transfer");
	}

	#[test]
	fn outflow_to_exchange_is_withdrawal() {
		let op = classify_operation(Direction::Outflow, Counterparty::Exchange, SourceHint::None);
		assert_eq!(op.kind, "withdrawal");
	}

	#[test]
	fn trade_hint_overrides_directionality_into_buy_or_sell() {
		let sell = classify_operation(Direction::Outflow, Counterparty::OnChainUnknown, SourceHint::Trade);
		assert_eq!(sell.kind, "sell");
		let buy = classify_operation(Direction::Inflow, Counterparty::OnChainUnknown, SourceHint::Trade);
		assert_eq!(buy.kind, "buy");
	}
}
