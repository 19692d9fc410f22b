//! Deterministic confidence scoring over a [`MatchCriteria`] (spec §4.4).
//! A pure function of its inputs — spec §8: "Confidence score is
//! deterministic: same criteria -> same score."

use exitbook_core::{decimal::Amount, model::MatchCriteria};

pub fn score(criteria: &MatchCriteria) -> Amount {
	if !criteria.asset_match {
		return Amount::zero();
	}
	if criteria.address_match == Some(false) {
		return Amount::zero();
	}

	let mut total = "0.30".parse::<Amount>().unwrap();
	total = total + (&"0.40".parse::<Amount>().unwrap() * &criteria.amount_similarity);

	if criteria.timing_valid {
		total = total + "0.20".parse::<Amount>().unwrap();
		if criteria.timing_hours <= Amount::from(1) {
			total = total + "0.05".parse::<Amount>().unwrap();
		}
	}

	if criteria.address_match == Some(true) {
		total = total + "0.10".parse::<Amount>().unwrap();
	}

	total.clamp_unit()
}

/// Variance guard applied before auto-confirmation regardless of confidence
/// (spec §3 invariant, §4.4 "Auto-confirm ... target_amount <= source_amount
/// with variance <= 10%").
pub fn within_auto_confirm_variance(source_amount: &Amount, target_amount: &Amount) -> bool {
	if target_amount <= source_amount {
		return true;
	}
	let diff = target_amount - source_amount;
	let scaled = &diff * &Amount::from(100);
	let variance_pct = &scaled / source_amount;
	variance_pct <= Amount::from(10)
}

pub fn should_auto_confirm(
	confidence: &Amount,
	auto_confirm_threshold: &Amount,
	source_amount: &Amount,
	target_amount: &Amount,
) -> bool {
	confidence >= auto_confirm_threshold
		&& within_auto_confirm_variance(source_amount, target_amount)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn amt(s: &str) -> Amount {
		s.parse().unwrap()
	}

	fn criteria(
		amount_similarity: Amount,
		timing_valid: bool,
		timing_hours: Amount,
		address_match: Option<bool>,
		asset_match: bool,
	) -> MatchCriteria {
		MatchCriteria { amount_similarity, timing_hours, timing_valid, address_match, asset_match }
	}

	#[test]
	fn asset_mismatch_zeroes_the_score() {
		let c = criteria(amt("1"), true, amt("0"), Some(true), false);
		assert_eq!(score(&c).to_string(), "0");
	}

	#[test]
	fn address_mismatch_zeroes_the_score() {
		let c = criteria(amt("1"), true, amt("0"), Some(false), true);
		assert_eq!(score(&c).to_string(), "0");
	}

	#[test]
	fn self_transfer_scenario_from_spec_example_3() {
		// Kraken -> chain, amount_similarity ~0.9987, timing ~2 minutes, no address evidence.
		let c = criteria(amt("0.9987"), true, amt("0"), None, true);
		let s = score(&c);
		// 0.30 + 0.40*0.9987 + 0.20 + 0.05 = 0.94948
		assert_eq!(s.to_string(), "0.94948");
	}

	#[test]
	fn full_match_with_address_evidence_can_reach_1() {
		let c = criteria(amt("1"), true, amt("0"), Some(true), true);
		assert_eq!(score(&c).to_string(), "1.05".parse::<Amount>().unwrap().clamp_unit().to_string());
	}
}
