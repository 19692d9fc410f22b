//! Transaction ordering (spec §4.5 "Ordering"): sort by `(timestamp,
//! external_id)`, then adjust for confirmed-link dependencies so a link's
//! source transaction always precedes its target even under clock skew.
//! Implemented as a topological sort (Kahn's algorithm) with the natural
//! `(timestamp, external_id)` rank as the deterministic tie-break among
//! otherwise-unconstrained transactions.

use std::{
	cmp::Reverse,
	collections::{BinaryHeap, HashMap},
};

use exitbook_core::model::{LinkStatus, TransactionLink, UniversalTransaction};
use uuid::Uuid;

use crate::error::CostBasisError;

pub fn order_transactions(
	transactions: &[UniversalTransaction],
	confirmed_links: &[TransactionLink],
) -> Result<Vec<Uuid>, CostBasisError> {
	let mut natural: Vec<&UniversalTransaction> = transactions.iter().collect();
	natural.sort_by(|a, b| (a.timestamp, &a.external_id).cmp(&(b.timestamp, &b.external_id)));

	let rank: HashMap<Uuid, usize> =
		natural.iter().enumerate().map(|(i, tx)| (tx.id, i)).collect();
	let present: std::collections::HashSet<Uuid> = rank.keys().copied().collect();

	let mut indegree: HashMap<Uuid, usize> = present.iter().map(|id| (*id, 0)).collect();
	let mut adjacency: HashMap<Uuid, Vec<Uuid>> = HashMap::new();

	for link in confirmed_links {
		if link.status != LinkStatus::Confirmed {
			continue;
		}
		if !present.contains(&link.source_tx_id) || !present.contains(&link.target_tx_id) {
			continue;
		}
		adjacency.entry(link.source_tx_id).or_default().push(link.target_tx_id);
		*indegree.entry(link.target_tx_id).or_insert(0) += 1;
	}

	let mut heap: BinaryHeap<Reverse<(usize, Uuid)>> = BinaryHeap::new();
	for id in &present {
		if indegree[id] == 0 {
			heap.push(Reverse((rank[id], *id)));
		}
	}

	let mut ordered = Vec::with_capacity(present.len());
	while let Some(Reverse((_, id))) = heap.pop() {
		ordered.push(id);
		if let Some(targets) = adjacency.get(&id) {
			for target in targets {
				let entry = indegree.get_mut(target).unwrap();
				*entry -= 1;
				if *entry == 0 {
					heap.push(Reverse((rank[target], *target)));
				}
			}
		}
	}

	if ordered.len() != present.len() {
		let stuck_link = confirmed_links
			.iter()
			.find(|l| l.status == LinkStatus::Confirmed && indegree.get(&l.target_tx_id).copied().unwrap_or(0) > 0);
		return match stuck_link {
			Some(l) => Err(CostBasisError::OrderingViolation {
				link_id: l.id,
				source_tx_id: l.source_tx_id,
				target_tx_id: l.target_tx_id,
			}),
			None => Err(CostBasisError::OrderingViolation {
				link_id: Uuid::nil(),
				source_tx_id: Uuid::nil(),
				target_tx_id: Uuid::nil(),
			}),
		};
	}

	Ok(ordered)
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, Utc};
	use exitbook_core::{
		asset::AssetId,
		decimal::Amount,
		model::{LinkType, MatchCriteria, Movements, Operation, TransactionStatus},
	};

	fn tx(id: Uuid, ts: chrono::DateTime<Utc>, external_id: &str) -> UniversalTransaction {
		UniversalTransaction {
			id,
			external_id: external_id.to_string(),
			account_id: Uuid::new_v4(),
			source: "test".into(),
			source_type: "blockchain".into(),
			timestamp: ts,
			status: TransactionStatus::Confirmed,
			from: None,
			to: None,
			movements: Movements::default(),
			fees: vec![],
			operation: Operation::transfer_internal(),
			blockchain: None,
			notes: None,
		}
	}

	fn link(source: Uuid, target: Uuid) -> TransactionLink {
		TransactionLink {
			id: Uuid::new_v4(),
			source_tx_id: source,
			target_tx_id: target,
			asset: AssetId::blockchain_native("bitcoin"),
			source_amount: Amount::from(1),
			target_amount: Amount::from(1),
			link_type: LinkType::ChainToChain,
			confidence_score: Amount::from(1),
			status: LinkStatus::Confirmed,
			match_criteria: MatchCriteria {
				amount_similarity: Amount::from(1),
				timing_hours: Amount::from(0),
				timing_valid: true,
				address_match: None,
				asset_match: true,
			},
			metadata: serde_json::Value::Null,
		}
	}

	#[test]
	fn sorts_by_timestamp_when_no_links() {
		let now = Utc::now();
		let a = tx(Uuid::new_v4(), now + Duration::seconds(10), "b");
		let b = tx(Uuid::new_v4(), now, "a");
		let ordered = order_transactions(&[a.clone(), b.clone()], &[]).unwrap();
		assert_eq!(ordered, vec![b.id, a.id]);
	}

	#[test]
	fn link_dependency_overrides_clock_skew() {
		let now = Utc::now();
		// target has an earlier wall-clock timestamp than source, but the
		// confirmed link still forces source-before-target.
		let source = tx(Uuid::new_v4(), now, "src");
		let target = tx(Uuid::new_v4(), now - Duration::seconds(5), "tgt");
		let l = link(source.id, target.id);

		let ordered = order_transactions(&[source.clone(), target.clone()], &[l]).unwrap();
		let source_pos = ordered.iter().position(|id| *id == source.id).unwrap();
		let target_pos = ordered.iter().position(|id| *id == target.id).unwrap();
		assert!(source_pos < target_pos);
	}
}
