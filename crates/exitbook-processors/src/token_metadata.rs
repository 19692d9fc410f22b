//! Token metadata service (spec §2 "Scam Detection + Token Metadata
//! Service"): resolves a contract address to the symbol a `Movement`/`Fee`
//! should display. Processors fail the record (not the batch) when metadata
//! is unavailable for a contract they've never seen rather than guessing a
//! symbol.

use std::collections::HashMap;

use async_trait::async_trait;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenMetadata {
	pub symbol: String,
	pub decimals: u8,
}

#[async_trait]
pub trait TokenMetadataService: Send + Sync {
	async fn lookup(&self, chain: &str, contract_address: &str) -> Option<TokenMetadata>;
}

/// Static table used in tests and for chains whose token list is small
/// enough to hold in memory.
#[derive(Default)]
pub struct InMemoryTokenMetadataService {
	table: HashMap<(String, String), TokenMetadata>,
}

impl InMemoryTokenMetadataService {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, chain: impl Into<String>, contract_address: impl Into<String>, metadata: TokenMetadata) {
		self.table.insert((chain.into(), contract_address.into().to_lowercase()), metadata);
	}
}

#[async_trait]
impl TokenMetadataService for InMemoryTokenMetadataService {
	async fn lookup(&self, chain: &str, contract_address: &str) -> Option<TokenMetadata> {
		self.table.get(&(chain.to_string(), contract_address.to_lowercase())).cloned()
	}
}
