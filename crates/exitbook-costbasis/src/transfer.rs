//! Transfer path (spec §4.5 "Transfer path" and "Target acquisition from
//! transfer"): moves basis between linked transactions instead of
//! realizing a disposal, honoring the jurisdiction's same-asset transfer
//! fee policy.

use chrono::{DateTime, Utc};
use exitbook_core::{
	asset::AssetId,
	decimal::Amount,
	model::{AcquisitionLot, LotMethod, LotTransfer},
};
use uuid::Uuid;

use crate::config::TransferFeePolicy;

/// One lot's contribution to a transfer: `quantity` of it moves to the
/// target, carrying its own `cost_basis_per_unit` forward unchanged.
pub struct TransferDraw {
	pub lot_id: Uuid,
	pub quantity: Amount,
	pub cost_basis_per_unit: Amount,
}

/// Splits `quantity_to_transfer` across lots in `ordered_lot_ids` order,
/// consuming `remaining_quantity` from each (spec §4.5 "Transfer path"
/// step 2). Lots are looked up by id in `open_lots`; the caller applies
/// the returned draws to its own mutable lot store.
pub fn draw_for_transfer(
	open_lots: &[&AcquisitionLot],
	ordered_lot_ids: &[Uuid],
	mut quantity_to_transfer: Amount,
) -> Vec<TransferDraw> {
	let mut draws = Vec::new();
	for lot_id in ordered_lot_ids {
		if quantity_to_transfer.is_zero() {
			break;
		}
		let Some(lot) = open_lots.iter().find(|l| l.id == *lot_id) else { continue };
		if lot.remaining_quantity.is_zero() {
			continue;
		}
		let draw_qty = if lot.remaining_quantity <= quantity_to_transfer {
			lot.remaining_quantity.clone()
		} else {
			quantity_to_transfer.clone()
		};
		quantity_to_transfer = &quantity_to_transfer - &draw_qty;
		draws.push(TransferDraw { lot_id: lot.id, quantity: draw_qty, cost_basis_per_unit: lot.cost_basis_per_unit.clone() });
	}
	draws
}

pub fn lot_transfers_from_draws(draws: &[TransferDraw], link_id: Uuid, source_tx_id: Uuid, target_tx_id: Uuid) -> Vec<LotTransfer> {
	draws
		.iter()
		.map(|draw| LotTransfer {
			id: Uuid::new_v4(),
			source_lot_id: draw.lot_id,
			link_id,
			quantity_transferred: draw.quantity.clone(),
			cost_basis_per_unit: draw.cost_basis_per_unit.clone(),
			source_tx_id,
			target_tx_id,
			metadata: serde_json::Value::Null,
		})
		.collect()
}

/// Applies the jurisdiction's same-asset transfer fee policy to an
/// outflow that is otherwise covered by a confirmed link (spec §4.5
/// "Transfer path" step 3). Returns the quantity that remains eligible
/// for [`draw_for_transfer`] after carving the fee out (`Disposal` policy)
/// or the full quantity unchanged plus the fee's USD value to fold into
/// the target's inherited basis (`AddToBasis` policy).
pub enum TransferFeeOutcome {
	/// Same-asset network fee quantity is a taxable disposal; only
	/// `transferable_quantity` continues through the transfer path.
	FeeIsDisposal { transferable_quantity: Amount, fee_quantity: Amount },
	/// Fee quantity stays with the transfer; its USD value is recorded for
	/// the target's inherited-basis calculation.
	FeeAddedToBasis { transferable_quantity: Amount, fee_usd_value: Amount },
}

pub fn apply_transfer_fee_policy(
	policy: TransferFeePolicy,
	gross_outflow_quantity: &Amount,
	same_asset_onchain_fee_quantity: &Amount,
	fee_price_usd: &Amount,
) -> TransferFeeOutcome {
	match policy {
		TransferFeePolicy::Disposal => TransferFeeOutcome::FeeIsDisposal {
			transferable_quantity: gross_outflow_quantity - same_asset_onchain_fee_quantity,
			fee_quantity: same_asset_onchain_fee_quantity.clone(),
		},
		TransferFeePolicy::AddToBasis => TransferFeeOutcome::FeeAddedToBasis {
			transferable_quantity: gross_outflow_quantity.clone(),
			fee_usd_value: same_asset_onchain_fee_quantity * fee_price_usd,
		},
	}
}

/// Builds the target's inherited lot from the sum of `LotTransfer` rows
/// for a link plus any priced fiat fees from source and target (spec §4.5
/// "Target acquisition from transfer").
pub fn target_lot_from_transfers(
	calculation_id: Uuid,
	target_tx_id: Uuid,
	asset: AssetId,
	transfers: &[LotTransfer],
	additional_fiat_fees_usd: &Amount,
	acquisition_date: DateTime<Utc>,
) -> AcquisitionLot {
	let total_quantity = transfers.iter().fold(Amount::zero(), |acc, t| acc + t.quantity_transferred.clone());
	let total_basis = transfers
		.iter()
		.fold(Amount::zero(), |acc, t| acc + (&t.quantity_transferred * &t.cost_basis_per_unit));
	let total_basis_with_fees = &total_basis + additional_fiat_fees_usd;
	let unit_cost = if total_quantity.is_zero() {
		Amount::zero()
	} else {
		&total_basis_with_fees / &total_quantity
	};

	AcquisitionLot::new(
		calculation_id,
		target_tx_id,
		asset,
		total_quantity,
		unit_cost,
		acquisition_date,
		LotMethod::Fifo,
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, Utc};

	fn lot(qty: &str, cost: &str) -> AcquisitionLot {
		AcquisitionLot::new(
			Uuid::new_v4(),
			Uuid::new_v4(),
			AssetId::blockchain_native("bitcoin"),
			qty.parse().unwrap(),
			cost.parse().unwrap(),
			Utc::now() - Duration::days(10),
			LotMethod::Fifo,
		)
	}

	#[test]
	fn draws_split_across_multiple_lots_in_order() {
		let a = lot("0.5", "20000");
		let b = lot("1.0", "25000");
		let refs = vec![&a, &b];
		let order = vec![a.id, b.id];
		let draws = draw_for_transfer(&refs, &order, "0.8".parse().unwrap());
		assert_eq!(draws.len(), 2);
		assert_eq!(draws[0].quantity.to_string(), "0.5");
		assert_eq!(draws[1].quantity.to_string(), "0.3");
	}

	#[test]
	fn disposal_fee_policy_carves_fee_out_of_transferable_quantity() {
		let outcome = apply_transfer_fee_policy(
			TransferFeePolicy::Disposal,
			&"1.5".parse().unwrap(),
			&"0.002".parse().unwrap(),
			&"40000".parse().unwrap(),
		);
		match outcome {
			TransferFeeOutcome::FeeIsDisposal { transferable_quantity, .. } => {
				assert_eq!(transferable_quantity.to_string(), "1.498");
			},
			_ => panic!("expected FeeIsDisposal"),
		}
	}

	#[test]
	fn add_to_basis_policy_keeps_full_quantity() {
		let outcome = apply_transfer_fee_policy(
			TransferFeePolicy::AddToBasis,
			&"1.5".parse().unwrap(),
			&"0.002".parse().unwrap(),
			&"40000".parse().unwrap(),
		);
		match outcome {
			TransferFeeOutcome::FeeAddedToBasis { transferable_quantity, fee_usd_value } => {
				assert_eq!(transferable_quantity.to_string(), "1.5");
				assert_eq!(fee_usd_value.to_string(), "80");
			},
			_ => panic!("expected FeeAddedToBasis"),
		}
	}

	#[test]
	fn target_lot_inherits_weighted_basis_plus_fees() {
		let transfers = vec![LotTransfer {
			id: Uuid::new_v4(),
			source_lot_id: Uuid::new_v4(),
			link_id: Uuid::new_v4(),
			quantity_transferred: Amount::from(1),
			cost_basis_per_unit: Amount::from(30_000),
			source_tx_id: Uuid::new_v4(),
			target_tx_id: Uuid::new_v4(),
			metadata: serde_json::Value::Null,
		}];
		let target_lot = target_lot_from_transfers(
			Uuid::new_v4(),
			Uuid::new_v4(),
			AssetId::blockchain_native("bitcoin"),
			&transfers,
			&Amount::from(50),
			Utc::now(),
		);
		assert_eq!(target_lot.quantity.to_string(), "1");
		assert_eq!(target_lot.cost_basis_per_unit.to_string(), "30050");
	}
}
