//! Deterministic `event_id` derivation (spec §4.2). Every derivation is a
//! pure function of intrinsic fields only — no timestamps, no
//! pending-vs-confirmed state — so re-importing the same underlying event
//! always yields the same id and the raw store's `(account_id, event_id)`
//! uniqueness constraint absorbs the duplicate.

use sha2::{Digest, Sha256};

fn digest_hex(parts: &[&str]) -> String {
	let mut hasher = Sha256::new();
	for (i, part) in parts.iter().enumerate() {
		if i > 0 {
			hasher.update(b"\0");
		}
		hasher.update(part.as_bytes());
	}
	hex::encode(hasher.finalize())
}

/// EVM-style chains: keyed by transaction hash + log index.
pub fn evm_event_id(tx_hash: &str, log_index: u64) -> String {
	digest_hex(&["evm", &tx_hash.to_lowercase(), &log_index.to_string()])
}

/// Solana: the transaction signature alone is already a stable, unique id.
pub fn solana_event_id(signature: &str) -> String {
	digest_hex(&["solana", signature])
}

/// NEAR FT transfers: `receipt_id` + `transaction_hash`, since a single
/// transaction can fan out into multiple receipts each carrying a transfer.
pub fn near_event_id(receipt_id: &str, transaction_hash: &str) -> String {
	digest_hex(&["near", receipt_id, transaction_hash])
}

/// Exchange ledger rows: the exchange's own ledger/transaction id is already
/// stable; we still namespace-hash it so ids from different sources never
/// collide in the raw store.
pub fn exchange_event_id(source_name: &str, ledger_id: &str) -> String {
	digest_hex(&["exchange", source_name, ledger_id])
}
