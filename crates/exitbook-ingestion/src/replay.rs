//! Replay window applied when resuming under a *different* provider than the
//! one that produced the last cursor (spec §4.2): moves the cursor backward
//! by a small delta to cover reorg / eventual-consistency gaps. Duplicates
//! this produces are silently absorbed by the raw store's uniqueness
//! guarantee on `(account_id, event_id)`.

use exitbook_core::model::CursorPrimary;

/// Default backward delta applied to block-number / offset cursors when the
/// resuming provider differs from the one that last advanced the cursor.
pub const DEFAULT_REPLAY_BLOCKS: u64 = 5;
pub const DEFAULT_REPLAY_SECONDS: i64 = 30;

pub fn apply_replay_window(primary: CursorPrimary) -> CursorPrimary {
	match primary {
		CursorPrimary::BlockNumber(n) => CursorPrimary::BlockNumber(n.saturating_sub(DEFAULT_REPLAY_BLOCKS)),
		CursorPrimary::Offset(n) => CursorPrimary::Offset(n.saturating_sub(DEFAULT_REPLAY_BLOCKS)),
		CursorPrimary::Timestamp(ts) => CursorPrimary::Timestamp(ts - DEFAULT_REPLAY_SECONDS),
		// Signature-based cursors (Solana) have no meaningful "earlier by N"
		// step; the provider itself re-walks recent signatures on resume.
		CursorPrimary::Signature(sig) => CursorPrimary::Signature(sig),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn block_number_moves_backward() {
		assert_eq!(apply_replay_window(CursorPrimary::BlockNumber(100)), CursorPrimary::BlockNumber(95));
	}

	#[test]
	fn block_number_does_not_underflow() {
		assert_eq!(apply_replay_window(CursorPrimary::BlockNumber(2)), CursorPrimary::BlockNumber(0));
	}

	#[test]
	fn timestamp_moves_backward() {
		assert_eq!(apply_replay_window(CursorPrimary::Timestamp(1000)), CursorPrimary::Timestamp(970));
	}
}
