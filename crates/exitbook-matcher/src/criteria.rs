//! Computes [`MatchCriteria`] for a candidate `(source outflow, target
//! inflow)` pair (spec §4.4). Scoring itself lives in [`crate::confidence`];
//! this module only derives the raw observations.

use chrono::{DateTime, Utc};
use exitbook_core::{decimal::Amount, model::MatchCriteria};

/// Amount-similarity tolerance for rounding noise between a source's
/// outflow and a target's inflow that is marginally larger than it (spec
/// §4.4: "within 0.1% (rounding) -> 0.99").
const ROUNDING_TOLERANCE_BPS: i64 = 10; // 0.1% = 10 basis points

/// `t.amount / s.amount` if `t <= s`, else 0 unless within the rounding
/// tolerance (then 0.99). Clamped to `[0, 1]`.
pub fn amount_similarity(source_amount: &Amount, target_amount: &Amount) -> Amount {
	if source_amount.is_zero() {
		return Amount::zero();
	}
	if target_amount <= source_amount {
		return (target_amount / source_amount).clamp_unit();
	}
	let diff = target_amount - source_amount;
	let scaled = &diff * &Amount::from(10_000);
	let excess_bps = &scaled / source_amount;
	if excess_bps <= Amount::from(ROUNDING_TOLERANCE_BPS) {
		"0.99".parse().expect("valid literal")
	} else {
		Amount::zero()
	}
}

pub fn timing_hours(source_ts: DateTime<Utc>, target_ts: DateTime<Utc>) -> i64 {
	(target_ts - source_ts).num_seconds() / 3600
}

pub fn timing_valid(hours: i64, max_timing_window_hours: i64) -> bool {
	(0..=max_timing_window_hours).contains(&hours)
}

/// Case-insensitive address equality; `None` when either side lacks an
/// address (spec §4.4 "else undefined").
pub fn address_match(source_to: Option<&str>, target_from: Option<&str>) -> Option<bool> {
	match (source_to, target_from) {
		(Some(a), Some(b)) => Some(a.eq_ignore_ascii_case(b)),
		_ => None,
	}
}

pub struct CandidateInputs<'a> {
	pub source_amount: &'a Amount,
	pub target_amount: &'a Amount,
	pub source_ts: DateTime<Utc>,
	pub target_ts: DateTime<Utc>,
	pub source_to_address: Option<&'a str>,
	pub target_from_address: Option<&'a str>,
	pub asset_match: bool,
	pub max_timing_window_hours: i64,
}

pub fn build_match_criteria(inputs: &CandidateInputs<'_>) -> MatchCriteria {
	let similarity = amount_similarity(inputs.source_amount, inputs.target_amount);
	let hours = timing_hours(inputs.source_ts, inputs.target_ts);
	MatchCriteria {
		amount_similarity: similarity,
		timing_hours: Amount::from(hours),
		timing_valid: timing_valid(hours, inputs.max_timing_window_hours),
		address_match: address_match(inputs.source_to_address, inputs.target_from_address),
		asset_match: inputs.asset_match,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn amt(s: &str) -> Amount {
		s.parse().unwrap()
	}

	#[test]
	fn equal_amounts_have_full_similarity() {
		assert_eq!(amount_similarity(&amt("1.5"), &amt("1.5")).to_string(), "1");
	}

	#[test]
	fn target_exceeding_by_more_than_tolerance_is_zero_similarity() {
		assert_eq!(amount_similarity(&amt("1.5"), &amt("1.6")).to_string(), "0");
	}

	#[test]
	fn target_within_rounding_tolerance_snaps_to_0_99() {
		// 1.5005 / 1.5 exceeds by ~0.033% — within the 0.1% tolerance.
		assert_eq!(amount_similarity(&amt("1.5"), &amt("1.5005")).to_string(), "0.99");
	}

	#[test]
	fn timing_zero_is_valid() {
		assert!(timing_valid(0, 48));
		assert!(timing_valid(48, 48));
		assert!(!timing_valid(49, 48));
		assert!(!timing_valid(-1, 48));
	}

	#[test]
	fn address_match_is_case_insensitive_when_both_present() {
		assert_eq!(address_match(Some("0xABC"), Some("0xabc")), Some(true));
		assert_eq!(address_match(Some("0xABC"), Some("0xdef")), Some(false));
		assert_eq!(address_match(None, Some("0xdef")), None);
	}
}
