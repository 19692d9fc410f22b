//! Configuration surface recognized by the cost-basis engine (spec §6
//! "cost_basis.*" and "jurisdiction_rules.*").

use chrono::{DateTime, Utc};
use exitbook_core::decimal::Amount;
use serde::{Deserialize, Serialize};

pub use exitbook_core::model::LotMethod;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Jurisdiction {
	Us,
	Ca,
	Uk,
	Eu,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CostBasisConfig {
	pub method: LotMethod,
	pub jurisdiction: Jurisdiction,
	pub tax_year: i32,
	#[serde(default = "default_currency")]
	pub currency: String,
	pub start_date: Option<DateTime<Utc>>,
	pub end_date: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
	"USD".to_string()
}

/// Whether a same-asset network fee on a linked transfer is itself a
/// taxable disposal, or rolled into the target's inherited basis (spec
/// §4.5 "Transfer path" step 3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferFeePolicy {
	Disposal,
	AddToBasis,
}

/// Per-jurisdiction policy knobs (spec §6 "jurisdiction_rules.*"). Built
/// from a small fixed table rather than loaded from external data — the
/// jurisdictions this engine must support are closed-world per spec §4.5.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JurisdictionRules {
	pub same_asset_transfer_fee_policy: TransferFeePolicy,
	/// Fraction of a capital gain/loss that is taxable: 1.0 in the US,
	/// 0.5 in Canada (50% inclusion rate).
	pub inclusion_rate: Amount,
	/// `None` for jurisdictions with no short/long split (Canada).
	pub short_term_threshold_days: Option<i64>,
	pub wash_sale_window_days: i64,
	pub superficial_loss_window_days: i64,
}

impl JurisdictionRules {
	pub fn for_jurisdiction(jurisdiction: Jurisdiction) -> Self {
		match jurisdiction {
			Jurisdiction::Us => Self {
				same_asset_transfer_fee_policy: TransferFeePolicy::Disposal,
				inclusion_rate: Amount::from(1),
				short_term_threshold_days: Some(365),
				wash_sale_window_days: 30,
				superficial_loss_window_days: 30,
			},
			Jurisdiction::Ca => Self {
				same_asset_transfer_fee_policy: TransferFeePolicy::AddToBasis,
				inclusion_rate: "0.5".parse().unwrap(),
				short_term_threshold_days: None,
				wash_sale_window_days: 30,
				superficial_loss_window_days: 30,
			},
			Jurisdiction::Uk | Jurisdiction::Eu => Self {
				same_asset_transfer_fee_policy: TransferFeePolicy::Disposal,
				inclusion_rate: Amount::from(1),
				short_term_threshold_days: Some(365),
				wash_sale_window_days: 30,
				superficial_loss_window_days: 30,
			},
		}
	}

	/// US-style wash sale applies only where `wash_sale_window_days > 0`
	/// and the jurisdiction has a short/long split; Canada instead applies
	/// [`Self::has_superficial_loss_rule`].
	pub fn has_wash_sale_rule(&self, jurisdiction: Jurisdiction) -> bool {
		matches!(jurisdiction, Jurisdiction::Us | Jurisdiction::Uk | Jurisdiction::Eu)
	}

	pub fn has_superficial_loss_rule(&self, jurisdiction: Jurisdiction) -> bool {
		matches!(jurisdiction, Jurisdiction::Ca)
	}
}
