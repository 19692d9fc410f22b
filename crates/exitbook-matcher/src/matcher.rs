//! Transfer link matcher orchestration (spec §4.4): pairs each outflow
//! candidate against each inflow candidate across the user's accounts,
//! scores the pair, applies the internal-blockchain fast path, and folds
//! in manual overrides last.

use chrono::{DateTime, Utc};
use exitbook_core::{
	asset::AssetId,
	decimal::Amount,
	model::{LinkStatus, LinkType, MatchCriteria, TransactionLink, UniversalTransaction},
};
use uuid::Uuid;

use crate::{confidence, config::MatcherConfig, criteria, fast_path, override_store::OverrideStore};

/// One side of a candidate pairing, with just the fields the matcher needs
/// — callers project from [`UniversalTransaction`] plus an account/source
/// tag the transaction itself doesn't carry.
#[derive(Clone, Debug)]
pub struct Candidate {
	pub tx_id: Uuid,
	pub account_id: Uuid,
	pub source_type: String,
	pub timestamp: DateTime<Utc>,
	pub amount: Amount,
	pub asset_id: AssetId,
	pub asset_symbol: String,
	pub counterparty_address: Option<String>,
	pub tx_hash: Option<String>,
}

impl Candidate {
	/// Projects the outflow side of a transaction, `None` if it has no
	/// outflow movement (spec §4.4 "Skip transactions with no movements").
	pub fn from_outflow(tx: &UniversalTransaction, account_id: Uuid, source_type: &str) -> Option<Self> {
		let m = tx.primary_outflow()?;
		Some(Self {
			tx_id: tx.id,
			account_id,
			source_type: source_type.to_string(),
			timestamp: tx.timestamp,
			amount: m.gross_amount.clone(),
			asset_id: m.asset_id.clone(),
			asset_symbol: m.asset_symbol.clone(),
			counterparty_address: tx.to.clone(),
			tx_hash: tx.blockchain.as_ref().map(|b| b.tx_hash.clone()),
		})
	}

	pub fn from_inflow(tx: &UniversalTransaction, account_id: Uuid, source_type: &str) -> Option<Self> {
		let m = tx.primary_inflow()?;
		Some(Self {
			tx_id: tx.id,
			account_id,
			source_type: source_type.to_string(),
			timestamp: tx.timestamp,
			amount: m.gross_amount.clone(),
			asset_id: m.asset_id.clone(),
			asset_symbol: m.asset_symbol.clone(),
			counterparty_address: tx.from.clone(),
			tx_hash: tx.blockchain.as_ref().map(|b| b.tx_hash.clone()),
		})
	}
}

fn link_type_for(source_type: &str, target_type: &str) -> LinkType {
	let source_is_chain = source_type == "blockchain";
	let target_is_chain = target_type == "blockchain";
	match (source_is_chain, target_is_chain) {
		(false, true) => LinkType::ExchangeToChain,
		(true, false) => LinkType::ChainToExchange,
		(true, true) => LinkType::ChainToChain,
		(false, false) => LinkType::ExchangeToExchange,
	}
}

/// One suggested or auto-confirmed pairing before it's persisted.
pub struct MatchResult {
	pub link: TransactionLink,
}

/// Scores every `(source, target)` pair across accounts and returns the
/// suggestions passing `min_confidence_score`, sorted by confidence
/// descending (spec §4.4). Candidates from the same account are never
/// paired — a self-transfer is, by definition, between two different
/// accounts.
pub fn find_candidates(
	outflows: &[Candidate],
	inflows: &[Candidate],
	config: &MatcherConfig,
) -> Vec<MatchResult> {
	let min_confidence: Amount = Amount::try_from(config.min_confidence_score.to_string()).unwrap();
	let auto_confirm_threshold: Amount =
		Amount::try_from(config.auto_confirm_threshold.to_string()).unwrap();

	let mut results = Vec::new();

	for s in outflows {
		for t in inflows {
			if s.account_id == t.account_id {
				continue;
			}
			if t.timestamp < s.timestamp {
				continue;
			}
			let asset_match = s.asset_symbol.eq_ignore_ascii_case(&t.asset_symbol);

			// Internal-blockchain fast path takes priority over scored matching.
			if let (Some(sh), Some(th)) = (&s.tx_hash, &t.tx_hash) {
				if asset_match && fast_path::same_onchain_transaction(sh, th) {
					results.push(MatchResult {
						link: build_link(
							s,
							t,
							Amount::from(1),
							MatchCriteria {
								amount_similarity: Amount::from(1),
								timing_hours: Amount::from(criteria::timing_hours(s.timestamp, t.timestamp)),
								timing_valid: true,
								address_match: None,
								asset_match: true,
							},
							LinkStatus::Confirmed,
						),
					});
					continue;
				}
			}

			let inputs = criteria::CandidateInputs {
				source_amount: &s.amount,
				target_amount: &t.amount,
				source_ts: s.timestamp,
				target_ts: t.timestamp,
				source_to_address: s.counterparty_address.as_deref(),
				target_from_address: t.counterparty_address.as_deref(),
				asset_match,
				max_timing_window_hours: config.max_timing_window_hours,
			};
			let mc = criteria::build_match_criteria(&inputs);
			let conf = confidence::score(&mc);

			if conf < min_confidence {
				continue;
			}

			let status = if confidence::should_auto_confirm(&conf, &auto_confirm_threshold, &s.amount, &t.amount) {
				LinkStatus::Confirmed
			} else {
				LinkStatus::Suggested
			};

			results.push(MatchResult { link: build_link(s, t, conf, mc, status) });
		}
	}

	results.sort_by(|a, b| b.link.confidence_score.cmp(&a.link.confidence_score));
	results
}

fn build_link(
	s: &Candidate,
	t: &Candidate,
	confidence: Amount,
	criteria: MatchCriteria,
	status: LinkStatus,
) -> TransactionLink {
	TransactionLink {
		id: Uuid::new_v4(),
		source_tx_id: s.tx_id,
		target_tx_id: t.tx_id,
		asset: s.asset_id.clone(),
		source_amount: s.amount.clone(),
		target_amount: t.amount.clone(),
		link_type: link_type_for(&s.source_type, &t.source_type),
		confidence_score: confidence,
		status,
		match_criteria: criteria,
		metadata: serde_json::Value::Null,
	}
}

/// Applies manual overrides from the log over a set of freshly-computed
/// suggestions (spec §4.4 "Override store", §9 "Override precedence"):
/// suggestions are re-derived first, then overrides authoritatively replace
/// the status for any pair they name.
pub async fn apply_overrides(
	mut suggestions: Vec<TransactionLink>,
	store: &dyn OverrideStore,
) -> Result<Vec<TransactionLink>, crate::error::MatcherError> {
	use exitbook_core::model::OverridePayload;

	let overrides = store.read_all().await?;
	for event in overrides {
		let Ok(OverridePayload::Link { source_tx_id, target_tx_id, confirmed }) =
			serde_json::from_value::<OverridePayload>(event.payload.clone())
		else {
			continue;
		};
		for link in suggestions.iter_mut() {
			if link.source_tx_id == source_tx_id && link.target_tx_id == target_tx_id {
				link.status = if confirmed { LinkStatus::Confirmed } else { LinkStatus::Rejected };
			}
		}
	}
	Ok(suggestions)
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;

	fn candidate(tx_id: Uuid, account_id: Uuid, ts: DateTime<Utc>, amount: &str, symbol: &str) -> Candidate {
		Candidate {
			tx_id,
			account_id,
			source_type: "blockchain".into(),
			timestamp: ts,
			amount: amount.parse().unwrap(),
			asset_id: AssetId::blockchain_native(symbol),
			asset_symbol: symbol.into(),
			counterparty_address: None,
			tx_hash: None,
		}
	}

	#[test]
	fn self_transfer_scenario_is_found_but_not_auto_confirmed() {
		let now = Utc::now();
		let source_account = Uuid::new_v4();
		let target_account = Uuid::new_v4();
		let s = candidate(Uuid::new_v4(), source_account, now, "1.5", "BTC");
		let t = candidate(Uuid::new_v4(), target_account, now + Duration::minutes(2), "1.498", "BTC");

		let config = MatcherConfig::default();
		let results = find_candidates(&[s], &[t], &config);
		assert_eq!(results.len(), 1);
		assert_eq!(results[0].link.status, LinkStatus::Suggested);
	}

	#[test]
	fn same_account_candidates_are_never_paired() {
		let now = Utc::now();
		let account = Uuid::new_v4();
		let s = candidate(Uuid::new_v4(), account, now, "1", "ETH");
		let t = candidate(Uuid::new_v4(), account, now, "1", "ETH");
		let results = find_candidates(&[s], &[t], &MatcherConfig::default());
		assert!(results.is_empty());
	}

	#[test]
	fn tx_hash_fast_path_auto_confirms_at_full_confidence() {
		let now = Utc::now();
		let mut s = candidate(Uuid::new_v4(), Uuid::new_v4(), now, "1", "ETH");
		s.tx_hash = Some("0xabc:0".into());
		let mut t = candidate(Uuid::new_v4(), Uuid::new_v4(), now, "1", "ETH");
		t.tx_hash = Some("0xABC:2".into());

		let results = find_candidates(&[s], &[t], &MatcherConfig::default());
		assert_eq!(results.len(), 1);
		assert_eq!(results[0].link.status, LinkStatus::Confirmed);
		assert_eq!(results[0].link.confidence_score.to_string(), "1");
	}

	#[test]
	fn target_earlier_than_source_is_never_a_candidate() {
		let now = Utc::now();
		let s = candidate(Uuid::new_v4(), Uuid::new_v4(), now, "1", "ETH");
		let t = candidate(Uuid::new_v4(), Uuid::new_v4(), now - Duration::minutes(5), "1", "ETH");
		let results = find_candidates(&[s], &[t], &MatcherConfig::default());
		assert!(results.is_empty());
	}
}
