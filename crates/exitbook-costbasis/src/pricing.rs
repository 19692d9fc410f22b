//! Pricing is assumed to be served by an external collaborator (spec §1
//! Non-goals: "Real-time pricing discovery"). The engine only consumes
//! already-resolved USD prices at a transaction's timestamp; it never
//! fetches or discovers them itself.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exitbook_core::{asset::AssetId, decimal::Amount};

#[async_trait]
pub trait PriceOracle: Send + Sync {
	/// USD price for one unit of `asset` at `timestamp`. `None` means no
	/// price is known — the engine treats this as a hard failure for any
	/// non-fiat movement or participating fee (spec §4.5 Preconditions).
	async fn price_usd_at(&self, asset: &AssetId, timestamp: DateTime<Utc>) -> Option<Amount>;
}

/// Exact-timestamp lookup table, used in tests and for small fixed price
/// sets resolved ahead of time by the caller.
#[derive(Default)]
pub struct InMemoryPriceOracle {
	prices: HashMap<(AssetId, DateTime<Utc>), Amount>,
}

impl InMemoryPriceOracle {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, asset: AssetId, timestamp: DateTime<Utc>, price_usd: Amount) {
		self.prices.insert((asset, timestamp), price_usd);
	}
}

#[async_trait]
impl PriceOracle for InMemoryPriceOracle {
	async fn price_usd_at(&self, asset: &AssetId, timestamp: DateTime<Utc>) -> Option<Amount> {
		self.prices.get(&(asset.clone(), timestamp)).cloned()
	}
}
