use exitbook_core::{asset::AssetId, error::cite_examples};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CostBasisError {
	#[error("reporting currency {0} is not USD; cross-fiat conversion is out of scope")]
	NonUsdCurrency(String),

	#[error("missing USD price for {} transaction(s), e.g. {:?}", .transaction_ids.len(), .transaction_ids)]
	MissingPrice { transaction_ids: Vec<String> },

	#[error("target transaction {target_tx_id} on confirmed link {link_id} has no LotTransfer rows")]
	MissingLotTransfer { link_id: Uuid, target_tx_id: Uuid },

	#[error("outflow on transaction {tx_id} has no open lots for asset {asset}")]
	InsufficientLots { tx_id: Uuid, asset: AssetId },

	#[error(
		"variance {variance_pct}% on transaction {tx_id} from source {source} exceeds error threshold {threshold_pct}%"
	)]
	VarianceExceeded { tx_id: Uuid, source: String, variance_pct: String, threshold_pct: String },

	#[error("dependency ordering violation: link {link_id} requires {source_tx_id} before {target_tx_id}, but a cycle or missing transaction prevents it")]
	OrderingViolation { link_id: Uuid, source_tx_id: Uuid, target_tx_id: Uuid },

	#[error("unknown jurisdiction rule for {0}")]
	UnknownJurisdiction(String),
}

impl CostBasisError {
	pub fn missing_price(ids: impl IntoIterator<Item = Uuid>) -> Self {
		Self::MissingPrice { transaction_ids: cite_examples(ids.into_iter().map(|id| id.to_string())) }
	}
}
