//! Scam detection hook (spec §4.3 step 6). Deferred and batched: processors
//! collect every contract address seen in a batch first, then ask the
//! detector once, rather than making one lookup per record.

use std::collections::HashMap;

use async_trait::async_trait;

#[async_trait]
pub trait ScamDetector: Send + Sync {
	/// Returns, for each address queried, whether it is a known scam token
	/// contract. Addresses absent from the result are treated as unknown
	/// (not scam) rather than erroring the batch.
	async fn check_contracts(&self, contract_addresses: &[String]) -> HashMap<String, bool>;
}

/// Default used where no scam-list collaborator is wired up: never flags.
pub struct NoopScamDetector;

#[async_trait]
impl ScamDetector for NoopScamDetector {
	async fn check_contracts(&self, _contract_addresses: &[String]) -> HashMap<String, bool> {
		HashMap::new()
	}
}

#[cfg(test)]
pub(crate) struct DenylistScamDetector {
	pub denylist: Vec<String>,
}

#[cfg(test)]
#[async_trait]
impl ScamDetector for DenylistScamDetector {
	async fn check_contracts(&self, contract_addresses: &[String]) -> HashMap<String, bool> {
		contract_addresses
			.iter()
			.map(|addr| (addr.clone(), self.denylist.contains(addr)))
			.collect()
	}
}
