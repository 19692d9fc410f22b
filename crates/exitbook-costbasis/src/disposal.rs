//! Disposal path (spec §4.5 "Disposal path"): per-lot proceeds/gain-loss
//! computation, holding-period classification, and jurisdiction wash-sale
//! / superficial-loss adjustment.

use chrono::{DateTime, Utc};
use exitbook_core::{
	asset::AssetId,
	decimal::Amount,
	model::{LotDisposal, TaxTreatmentCategory},
};
use uuid::Uuid;

use crate::config::{Jurisdiction, JurisdictionRules};

pub struct DisposalInputs<'a> {
	pub lot_id: Uuid,
	pub disposal_tx_id: Uuid,
	pub quantity_disposed: Amount,
	pub proceeds_per_unit: Amount,
	pub cost_basis_per_unit: Amount,
	pub acquisition_date: DateTime<Utc>,
	pub disposal_date: DateTime<Utc>,
	pub jurisdiction: Jurisdiction,
	pub rules: &'a JurisdictionRules,
}

pub fn holding_period_days(acquisition_date: DateTime<Utc>, disposal_date: DateTime<Utc>) -> i64 {
	(disposal_date - acquisition_date).num_milliseconds() / 86_400_000
}

/// Classifies the holding period before any wash/superficial adjustment.
/// Canada has no short/long split (spec §4.5 step 3) — callers in a
/// no-split jurisdiction get [`TaxTreatmentCategory::ShortTerm`] back as a
/// schema placeholder; what actually drives CA taxation is the
/// jurisdiction's `inclusion_rate`, not this label.
pub fn classify_holding_period(days: i64, rules: &JurisdictionRules) -> TaxTreatmentCategory {
	match rules.short_term_threshold_days {
		Some(threshold) if days < threshold => TaxTreatmentCategory::ShortTerm,
		Some(_) => TaxTreatmentCategory::LongTerm,
		None => TaxTreatmentCategory::ShortTerm,
	}
}

/// An acquisition of `asset` at `timestamp` and quantity, used by the
/// wash-sale/superficial-loss scan to find a disqualifying reacquisition.
pub struct ReacquisitionWindow<'a> {
	pub asset: &'a AssetId,
	pub acquisitions: &'a [(DateTime<Utc>, Uuid)],
	pub still_open_at: &'a dyn Fn(Uuid, DateTime<Utc>) -> bool,
}

/// Builds the disposal, applying wash-sale (US/UK/EU) or superficial-loss
/// (Canada) rules when the disposal is a loss and a same-asset
/// reacquisition falls inside the window (spec §4.5 step 4).
pub fn build_disposal(
	inputs: DisposalInputs<'_>,
	reacquisition: Option<&ReacquisitionWindow<'_>>,
) -> LotDisposal {
	let total_proceeds = &inputs.quantity_disposed * &inputs.proceeds_per_unit;
	let total_cost_basis = &inputs.quantity_disposed * &inputs.cost_basis_per_unit;
	let gain_loss = &total_proceeds - &total_cost_basis;
	let days = holding_period_days(inputs.acquisition_date, inputs.disposal_date);
	let mut category = classify_holding_period(days, inputs.rules);

	let mut taxable_gain_loss = &gain_loss * &inputs.rules.inclusion_rate;

	if gain_loss.is_negative() {
		let has_wash = inputs.rules.has_wash_sale_rule(inputs.jurisdiction);
		let has_superficial = inputs.rules.has_superficial_loss_rule(inputs.jurisdiction);

		if (has_wash || has_superficial) && reacquisition.is_some() {
			let window = reacquisition.unwrap();
			let window_days = if has_superficial {
				inputs.rules.superficial_loss_window_days
			} else {
				inputs.rules.wash_sale_window_days
			};

			let disqualifying = window.acquisitions.iter().any(|(ts, lot_id)| {
				let delta_days = (*ts - inputs.disposal_date).num_milliseconds().abs() / 86_400_000;
				if delta_days > window_days {
					return false;
				}
				if has_superficial {
					let window_end = inputs.disposal_date + chrono::Duration::days(window_days);
					(window.still_open_at)(*lot_id, window_end)
				} else {
					true
				}
			});

			if disqualifying {
				taxable_gain_loss = Amount::zero();
				category =
					if has_superficial { TaxTreatmentCategory::Superficial } else { TaxTreatmentCategory::DisallowedWash };
			}
		}
	}

	LotDisposal {
		id: Uuid::new_v4(),
		lot_id: inputs.lot_id,
		disposal_tx_id: inputs.disposal_tx_id,
		quantity_disposed: inputs.quantity_disposed,
		proceeds_per_unit: inputs.proceeds_per_unit,
		total_proceeds,
		cost_basis_per_unit: inputs.cost_basis_per_unit,
		total_cost_basis,
		gain_loss,
		taxable_gain_loss,
		holding_period_days: days,
		tax_treatment_category: category,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;

	fn rules_us() -> JurisdictionRules {
		JurisdictionRules::for_jurisdiction(Jurisdiction::Us)
	}

	fn rules_ca() -> JurisdictionRules {
		JurisdictionRules::for_jurisdiction(Jurisdiction::Ca)
	}

	#[test]
	fn fifo_gain_is_short_term_and_fully_taxable_in_us() {
		let acquisition = Utc::now() - Duration::days(150);
		let disposal = Utc::now();
		let rules = rules_us();
		let d = build_disposal(
			DisposalInputs {
				lot_id: Uuid::new_v4(),
				disposal_tx_id: Uuid::new_v4(),
				quantity_disposed: "0.5".parse().unwrap(),
				proceeds_per_unit: "40000".parse().unwrap(),
				cost_basis_per_unit: "30000".parse().unwrap(),
				acquisition_date: acquisition,
				disposal_date: disposal,
				jurisdiction: Jurisdiction::Us,
				rules: &rules,
			},
			None,
		);
		assert_eq!(d.gain_loss.to_string(), "5000");
		assert_eq!(d.taxable_gain_loss.to_string(), "5000");
		assert_eq!(d.tax_treatment_category, TaxTreatmentCategory::ShortTerm);
	}

	#[test]
	fn canada_applies_fifty_percent_inclusion() {
		let acquisition = Utc::now() - Duration::days(400);
		let disposal = Utc::now();
		let rules = rules_ca();
		let d = build_disposal(
			DisposalInputs {
				lot_id: Uuid::new_v4(),
				disposal_tx_id: Uuid::new_v4(),
				quantity_disposed: Amount::from(10),
				proceeds_per_unit: Amount::from(2500),
				cost_basis_per_unit: Amount::from(2000),
				acquisition_date: acquisition,
				disposal_date: disposal,
				jurisdiction: Jurisdiction::Ca,
				rules: &rules,
			},
			None,
		);
		assert_eq!(d.gain_loss.to_string(), "5000");
		assert_eq!(d.taxable_gain_loss.to_string(), "2500");
	}

	#[test]
	fn wash_sale_disallows_loss_on_reacquisition() {
		let acquisition = Utc::now() - Duration::days(60);
		let disposal = Utc::now();
		let rebuy = disposal + Duration::days(14);
		let rules = rules_us();

		let window = ReacquisitionWindow {
			asset: &AssetId::blockchain_native("bitcoin"),
			acquisitions: &[(rebuy, Uuid::new_v4())],
			still_open_at: &|_, _| true,
		};

		let d = build_disposal(
			DisposalInputs {
				lot_id: Uuid::new_v4(),
				disposal_tx_id: Uuid::new_v4(),
				quantity_disposed: Amount::from(1),
				proceeds_per_unit: "29900".parse().unwrap(),
				cost_basis_per_unit: Amount::from(50_000),
				acquisition_date: acquisition,
				disposal_date: disposal,
				jurisdiction: Jurisdiction::Us,
				rules: &rules,
			},
			Some(&window),
		);

		assert_eq!(d.gain_loss.to_string(), "-20100");
		assert_eq!(d.taxable_gain_loss.to_string(), "0");
		assert_eq!(d.tax_treatment_category, TaxTreatmentCategory::DisallowedWash);
	}

	#[test]
	fn superficial_loss_requires_reacquired_lot_still_open_at_window_end() {
		let acquisition = Utc::now() - Duration::days(60);
		let disposal = Utc::now();
		let rebuy = disposal + Duration::days(10);
		let rules = rules_ca();

		// The reacquired lot was itself fully disposed before the window ends,
		// so it doesn't disqualify the original loss.
		let window = ReacquisitionWindow {
			asset: &AssetId::blockchain_native("bitcoin"),
			acquisitions: &[(rebuy, Uuid::new_v4())],
			still_open_at: &|_, _| false,
		};

		let d = build_disposal(
			DisposalInputs {
				lot_id: Uuid::new_v4(),
				disposal_tx_id: Uuid::new_v4(),
				quantity_disposed: Amount::from(1),
				proceeds_per_unit: Amount::from(1800),
				cost_basis_per_unit: Amount::from(2000),
				acquisition_date: acquisition,
				disposal_date: disposal,
				jurisdiction: Jurisdiction::Ca,
				rules: &rules,
			},
			Some(&window),
		);

		assert_eq!(d.gain_loss.to_string(), "-200");
		assert_ne!(d.tax_treatment_category, TaxTreatmentCategory::Superficial);
	}
}
