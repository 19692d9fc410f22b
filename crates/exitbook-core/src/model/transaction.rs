use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{asset::AssetId, decimal::Amount};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionStatus {
	Pending,
	Confirmed,
	Failed,
}

/// A single asset movement in or out of the user, net of on-chain fees
/// already subtracted where `Fee::settlement == OnChain` (spec §4.3 step 2).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Movement {
	pub asset_id: AssetId,
	pub asset_symbol: String,
	pub gross_amount: Amount,
	pub net_amount: Amount,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeeScope {
	Network,
	Platform,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeeSettlement {
	Balance,
	OnChain,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Fee {
	pub asset_id: AssetId,
	pub asset_symbol: String,
	pub amount: Amount,
	pub scope: FeeScope,
	pub settlement: FeeSettlement,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Movements {
	pub inflows: Vec<Movement>,
	pub outflows: Vec<Movement>,
}

/// Operation classification: `category/type`, e.g. `trade/buy`,
/// `transfer/withdrawal`, `fee/fee`, `stake/*`, `governance/*` (spec §4.3 step 3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationCategory {
	Trade,
	Transfer,
	Fee,
	Stake,
	Governance,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
	pub category: OperationCategory,
	#[serde(rename = "type")]
	pub kind: String,
}

impl Operation {
	pub fn trade_buy() -> Self {
		Self { category: OperationCategory::Trade, kind: "buy".into() }
	}
	pub fn trade_sell() -> Self {
		Self { category: OperationCategory::Trade, kind: "sell".into() }
	}
	pub fn transfer_deposit() -> Self {
		Self { category: OperationCategory::Transfer, kind: "deposit".into() }
	}
	pub fn transfer_withdrawal() -> Self {
		Self { category: OperationCategory::Transfer, kind: "withdrawal".into() }
	}
	pub fn transfer_internal() -> Self {
		Self { category: OperationCategory::Transfer, kind: "transfer".into() }
	}
	pub fn fee() -> Self {
		Self { category: OperationCategory::Fee, kind: "fee".into() }
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockchainContext {
	pub name: String,
	pub block_height: Option<u64>,
	pub tx_hash: String,
	pub confirmed: bool,
}

/// The Universal Transaction (spec §3). `external_id` uniquely identifies
/// the transaction within its `source`; processors upsert by
/// `(account_id, external_id)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UniversalTransaction {
	pub id: Uuid,
	pub external_id: String,
	pub account_id: Uuid,
	pub source: String,
	pub source_type: String,
	pub timestamp: DateTime<Utc>,
	pub status: TransactionStatus,
	pub from: Option<String>,
	pub to: Option<String>,
	pub movements: Movements,
	pub fees: Vec<Fee>,
	pub operation: Operation,
	pub blockchain: Option<BlockchainContext>,
	pub notes: Option<String>,
}

impl UniversalTransaction {
	/// Net per-asset direction used by the transfer matcher: one inflow, one
	/// outflow dominate for a simple transfer; callers needing finer detail
	/// consult `movements` directly.
	pub fn primary_outflow(&self) -> Option<&Movement> {
		self.movements.outflows.first()
	}

	pub fn primary_inflow(&self) -> Option<&Movement> {
		self.movements.inflows.first()
	}

	pub fn has_movements(&self) -> bool {
		!self.movements.inflows.is_empty() || !self.movements.outflows.is_empty()
	}
}
