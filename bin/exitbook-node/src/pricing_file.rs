//! Loads a fixed, pre-resolved set of USD prices from a JSON file into an
//! [`InMemoryPriceOracle`]. Real-time pricing discovery is an explicit spec
//! Non-goal (spec §1) — this is the thin file-backed stand-in for whatever
//! pricing collaborator a deployment actually wires in.

use std::path::Path;

use anyhow::Context;
use exitbook_core::asset::AssetId;
use exitbook_costbasis::InMemoryPriceOracle;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PriceEntry {
	asset: AssetId,
	timestamp: chrono::DateTime<chrono::Utc>,
	price_usd: String,
}

pub fn load_price_oracle(path: &Path) -> anyhow::Result<InMemoryPriceOracle> {
	let raw = std::fs::read_to_string(path)
		.with_context(|| format!("reading price file {}", path.display()))?;
	let entries: Vec<PriceEntry> =
		serde_json::from_str(&raw).context("parsing price file as a JSON array")?;

	let mut oracle = InMemoryPriceOracle::new();
	for entry in entries {
		let price: exitbook_core::decimal::Amount = entry
			.price_usd
			.parse()
			.with_context(|| format!("parsing price_usd {:?} for {:?}", entry.price_usd, entry.asset))?;
		oracle.insert(entry.asset, entry.timestamp, price);
	}
	Ok(oracle)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn loads_entries_into_the_oracle() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(
			file,
			r#"[{{"asset": "blockchain:bitcoin:native", "timestamp": "2023-01-01T00:00:00Z", "price_usd": "30000"}}]"#
		)
		.unwrap();

		let oracle = load_price_oracle(file.path()).expect("should parse");
		let _ = oracle;
	}
}
