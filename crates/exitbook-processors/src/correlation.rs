//! Multi-stream correlation (spec §4.3 step 7): chains like NEAR and
//! Substrate emit several independent event streams per on-chain
//! transaction (the transaction itself, one receipt per cross-contract
//! hop, a balance-change row per affected account). These helpers are
//! chain-agnostic; the per-chain processor supplies the grouping key and
//! the event shapes.

use exitbook_core::decimal::Amount;
use std::collections::HashMap;
use tracing::warn;

/// Groups records sharing a parent transaction hash together so a processor
/// can fold them into one Universal Transaction instead of one per receipt.
pub fn group_by_transaction_hash<T: Clone>(
	records: &[T],
	transaction_hash_of: impl Fn(&T) -> String,
) -> HashMap<String, Vec<T>> {
	let mut groups: HashMap<String, Vec<T>> = HashMap::new();
	for record in records {
		groups.entry(transaction_hash_of(record)).or_default().push(record.clone());
	}
	groups
}

/// One observed absolute balance for an account+asset at a given sequence
/// position within a transaction group (receipt order, not wall-clock time —
/// multiple receipts can share a timestamp).
#[derive(Clone, Debug)]
pub struct AbsoluteBalanceSample {
	pub sequence: u64,
	pub balance: Amount,
}

/// Derives a net delta from a run of absolute balance snapshots when the
/// source API gives balances-after rather than a transfer amount. Emits a
/// warning for every derived delta — this is a fallback, never a silent
/// guess, per spec §4.3 step 7.
pub fn derive_deltas_from_absolutes(
	account_id: &str,
	asset: &str,
	mut samples: Vec<AbsoluteBalanceSample>,
) -> Vec<Amount> {
	samples.sort_by_key(|s| s.sequence);
	let mut deltas = Vec::with_capacity(samples.len().saturating_sub(1));
	for pair in samples.windows(2) {
		let delta = &pair[1].balance - &pair[0].balance;
		warn!(account_id, asset, delta = %delta, "derived balance delta from consecutive absolutes; no explicit amount in source event");
		deltas.push(delta);
	}
	deltas
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn groups_records_sharing_a_transaction_hash() {
		let records = vec![("r1".to_string(), "tx-1".to_string()), ("r2".to_string(), "tx-1".to_string()), ("r3".to_string(), "tx-2".to_string())];
		let groups = group_by_transaction_hash(&records, |(_, tx)| tx.clone());
		assert_eq!(groups["tx-1"].len(), 2);
		assert_eq!(groups["tx-2"].len(), 1);
	}

	#[test]
	fn derives_deltas_from_sorted_absolute_samples() {
		let samples = vec![
			AbsoluteBalanceSample { sequence: 2, balance: "10".parse().unwrap() },
			AbsoluteBalanceSample { sequence: 1, balance: "5".parse().unwrap() },
		];
		let deltas = derive_deltas_from_absolutes("alice.near", "near", samples);
		assert_eq!(deltas.len(), 1);
		assert_eq!(deltas[0].to_string(), "5");
	}
}
