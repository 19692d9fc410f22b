//! Canonical asset identity (spec §6).
//!
//! Three shapes: `blockchain:<chain>:native`, `blockchain:<chain>:token:<addr>`,
//! `fiat:<ISO_4217>`. Construction always goes through [`AssetId::blockchain_native`],
//! [`AssetId::blockchain_token`], or [`AssetId::fiat`] so normalization can never be
//! skipped by a caller that forgot to lowercase a contract address.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// How a chain's addresses must be normalized to produce a stable asset id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressNormalization {
	/// EVM-style hex addresses: lowercase, `0x`-prefixed.
	EvmLowerHex,
	/// Bech32 / CashAddr style: lowercase.
	Bech32Lower,
	/// Legacy Base58, xpub/ypub/zpub: case-sensitive, kept as-is.
	CaseSensitiveAsIs,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetId(String);

impl AssetId {
	pub fn blockchain_native(chain: &str) -> Self {
		Self(format!("blockchain:{}:native", normalize_chain(chain)))
	}

	pub fn blockchain_token(
		chain: &str,
		contract_address: &str,
		normalization: AddressNormalization,
	) -> Self {
		let addr = normalize_address(contract_address, normalization);
		Self(format!("blockchain:{}:token:{}", normalize_chain(chain), addr))
	}

	pub fn fiat(iso_4217: &str) -> Self {
		Self(format!("fiat:{}", iso_4217.to_uppercase()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn is_fiat(&self) -> bool {
		self.0.starts_with("fiat:")
	}

	pub fn is_native(&self) -> bool {
		self.0.ends_with(":native")
	}

	/// Parses a previously-constructed canonical string back into an `AssetId`,
	/// validating only shape (three colon-delimited forms), not re-normalizing —
	/// callers constructing fresh ids must use the typed constructors above.
	pub fn parse(raw: &str) -> Result<Self, CoreError> {
		let parts: Vec<&str> = raw.splitn(4, ':').collect();
		let valid = match parts.as_slice() {
			["blockchain", chain, "native"] => !chain.is_empty(),
			["blockchain", chain, "token", addr] => !chain.is_empty() && !addr.is_empty(),
			["fiat", code] => code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()),
			_ => false,
		};
		if valid {
			Ok(Self(raw.to_string()))
		} else {
			Err(CoreError::InvalidAssetId(raw.to_string()))
		}
	}
}

impl fmt::Display for AssetId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl TryFrom<String> for AssetId {
	type Error = CoreError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(&value)
	}
}

impl From<AssetId> for String {
	fn from(value: AssetId) -> Self {
		value.0
	}
}

fn normalize_chain(chain: &str) -> String {
	chain.to_lowercase()
}

fn normalize_address(address: &str, normalization: AddressNormalization) -> String {
	match normalization {
		AddressNormalization::EvmLowerHex => {
			let lower = address.to_lowercase();
			if lower.starts_with("0x") {
				lower
			} else {
				format!("0x{lower}")
			}
		},
		AddressNormalization::Bech32Lower => address.to_lowercase(),
		AddressNormalization::CaseSensitiveAsIs => address.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn native_asset_is_lowercased() {
		let id = AssetId::blockchain_native("Bitcoin");
		assert_eq!(id.as_str(), "blockchain:bitcoin:native");
	}

	#[test]
	fn evm_token_normalizes_case_and_prefix() {
		let id = AssetId::blockchain_token(
			"ethereum",
			"0xABCDEF0123456789abcdef0123456789ABCDEF01",
			AddressNormalization::EvmLowerHex,
		);
		assert_eq!(id.as_str(), "blockchain:ethereum:token:0xabcdef0123456789abcdef0123456789abcdef01");
	}

	#[test]
	fn xpub_preserves_case() {
		let id = AssetId::blockchain_token(
			"bitcoin",
			"xpub6CUGRUo...MiXED",
			AddressNormalization::CaseSensitiveAsIs,
		);
		assert!(id.as_str().ends_with("MiXED"));
	}

	#[test]
	fn fiat_upper_cases_iso_code() {
		assert_eq!(AssetId::fiat("usd").as_str(), "fiat:USD");
	}

	#[test]
	fn parse_rejects_malformed_shapes() {
		assert!(AssetId::parse("blockchain:bitcoin").is_err());
		assert!(AssetId::parse("fiat:US").is_err());
		assert!(AssetId::parse("blockchain:bitcoin:native").is_ok());
	}
}
