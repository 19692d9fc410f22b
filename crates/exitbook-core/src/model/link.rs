use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{asset::AssetId, decimal::Amount};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkStatus {
	Suggested,
	Confirmed,
	Rejected,
}

/// `source_type/target_type` combination, determines the link's semantic
/// flavor (spec §4.4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkType {
	ExchangeToChain,
	ChainToExchange,
	ExchangeToExchange,
	ChainToChain,
}

/// Raw inputs the confidence scorer consumes; kept distinct from the score
/// itself so scoring stays a pure function of `MatchCriteria` (spec §8:
/// "Confidence score is deterministic: same criteria -> same score").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchCriteria {
	pub amount_similarity: Amount,
	pub timing_hours: Amount,
	pub timing_valid: bool,
	pub address_match: Option<bool>,
	pub asset_match: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionLink {
	pub id: Uuid,
	pub source_tx_id: Uuid,
	pub target_tx_id: Uuid,
	pub asset: AssetId,
	pub source_amount: Amount,
	pub target_amount: Amount,
	pub link_type: LinkType,
	pub confidence_score: Amount,
	pub status: LinkStatus,
	pub match_criteria: MatchCriteria,
	pub metadata: serde_json::Value,
}
