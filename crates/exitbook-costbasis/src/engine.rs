//! Cost-basis engine orchestration (spec §4.5): the single entry point
//! that turns an ordered transaction stream plus confirmed transfer links
//! into lots, disposals, and lot transfers under a jurisdiction + method
//! policy. Calculations are all-or-nothing — any error discards every
//! locally-accumulated lot/disposal/transfer rather than persisting a
//! partial result (spec §7 "Cost-basis engine rolls back the entire
//! calculation on any error").

use std::{
	collections::{BTreeSet, HashMap},
	sync::Arc,
};

use chrono::{DateTime, Utc};
use exitbook_core::{
	asset::AssetId,
	decimal::Amount,
	model::{
		AcquisitionLot, Fee, FeeScope, FeeSettlement, LinkStatus, LotDisposal, LotMethod, LotTransfer,
		Movement, TransactionLink, UniversalTransaction,
	},
};
use tracing::info;
use uuid::Uuid;

use crate::{
	acquisition::build_acquisition_lot,
	config::{CostBasisConfig, JurisdictionRules},
	disposal::{build_disposal, DisposalInputs, ReacquisitionWindow},
	error::CostBasisError,
	fee_allocation::allocate_proportionally,
	lot_selection::{ordered_lot_ids, weighted_average_cost},
	ordering::order_transactions,
	pricing::PriceOracle,
	summary::{CalculationStatus, CalculationSummary},
	transfer::{apply_transfer_fee_policy, draw_for_transfer, lot_transfers_from_draws, target_lot_from_transfers, TransferFeeOutcome},
	variance::{self, VarianceOutcome},
};

pub struct CostBasisEngine {
	price_oracle: Arc<dyn PriceOracle>,
}

pub struct CalculationArtifacts {
	pub summary: CalculationSummary,
	pub lots: Vec<AcquisitionLot>,
	pub disposals: Vec<LotDisposal>,
	pub transfers: Vec<LotTransfer>,
}

impl CostBasisEngine {
	pub fn new(price_oracle: Arc<dyn PriceOracle>) -> Self {
		Self { price_oracle }
	}

	pub async fn run(
		&self,
		transactions: &[UniversalTransaction],
		confirmed_links: &[TransactionLink],
		config: &CostBasisConfig,
	) -> Result<CalculationArtifacts, CostBasisError> {
		if config.currency.to_uppercase() != "USD" {
			return Err(CostBasisError::NonUsdCurrency(config.currency.clone()));
		}

		self.validate_pricing(transactions).await?;

		let rules = JurisdictionRules::for_jurisdiction(config.jurisdiction);
		let calculation_id = Uuid::new_v4();
		let ordered_ids = order_transactions(transactions, confirmed_links)?;
		let tx_by_id: HashMap<Uuid, &UniversalTransaction> = transactions.iter().map(|t| (t.id, t)).collect();

		let confirmed: Vec<&TransactionLink> =
			confirmed_links.iter().filter(|l| l.status == LinkStatus::Confirmed).collect();
		let links_by_source: HashMap<Uuid, &TransactionLink> =
			confirmed.iter().map(|l| (l.source_tx_id, *l)).collect();
		let links_by_target: HashMap<Uuid, &TransactionLink> =
			confirmed.iter().map(|l| (l.target_tx_id, *l)).collect();

		let mut state = RunState::default();

		for tx_id in &ordered_ids {
			let tx = tx_by_id[tx_id];

			for outflow in &tx.movements.outflows {
				self.process_outflow(tx, outflow, &links_by_source, &rules, config.method, calculation_id, &mut state)
					.await?;
			}
			for inflow in &tx.movements.inflows {
				let transfers_snapshot = state.transfers_by_link.clone();
				self.process_inflow(tx, inflow, &links_by_target, &transfers_snapshot, config.method, calculation_id, &mut state)
					.await?;
			}
		}

		self.apply_wash_and_superficial_rules(&mut state, &rules, config.jurisdiction);

		let mut summary = CalculationSummary::new(calculation_id);
		summary.lots_created = state.lots.len() as u64;
		summary.disposals_processed = state.disposals.len() as u64;
		summary.finalize_assets(state.assets_seen.clone());
		summary.total_capital_gain_loss =
			state.disposals.iter().fold(Amount::zero(), |acc, d| acc + d.gain_loss.clone());
		summary.total_taxable_gain_loss =
			state.disposals.iter().fold(Amount::zero(), |acc, d| acc + d.taxable_gain_loss.clone());
		summary.status = CalculationStatus::Completed;

		info!(
			calculation_id = %calculation_id,
			lots = summary.lots_created,
			disposals = summary.disposals_processed,
			total_capital_gain_loss = %summary.total_capital_gain_loss,
			"cost-basis calculation completed"
		);

		Ok(CalculationArtifacts {
			summary,
			lots: state.lots.into_values().collect(),
			disposals: state.disposals,
			transfers: state.transfers_by_link.into_values().flatten().collect(),
		})
	}

	async fn validate_pricing(&self, transactions: &[UniversalTransaction]) -> Result<(), CostBasisError> {
		let mut missing = Vec::new();
		for tx in transactions {
			let movements = tx.movements.inflows.iter().chain(tx.movements.outflows.iter());
			for movement in movements {
				if movement.asset_id.is_fiat() {
					continue;
				}
				if self.price_oracle.price_usd_at(&movement.asset_id, tx.timestamp).await.is_none() {
					missing.push(tx.id);
					break;
				}
			}
			for fee in &tx.fees {
				if fee.asset_id.is_fiat() {
					continue;
				}
				if self.price_oracle.price_usd_at(&fee.asset_id, tx.timestamp).await.is_none() {
					missing.push(tx.id);
					break;
				}
			}
		}
		if missing.is_empty() {
			Ok(())
		} else {
			Err(CostBasisError::missing_price(missing))
		}
	}

	#[allow(clippy::too_many_arguments)]
	async fn process_outflow(
		&self,
		tx: &UniversalTransaction,
		outflow: &Movement,
		links_by_source: &HashMap<Uuid, &TransactionLink>,
		rules: &JurisdictionRules,
		method: LotMethod,
		calculation_id: Uuid,
		state: &mut RunState,
	) -> Result<(), CostBasisError> {
		let price = self.price_for(outflow.asset_id.clone(), tx.timestamp).await;
		let onchain_fee_qty = same_asset_fee_quantity(&tx.fees, &outflow.asset_id, FeeSettlement::OnChain);

		match variance::check(&tx.source, tx.id, &outflow.gross_amount, &outflow.net_amount, &onchain_fee_qty) {
			VarianceOutcome::Exceeded => {
				return Err(CostBasisError::VarianceExceeded {
					tx_id: tx.id,
					source: tx.source.clone(),
					variance_pct: "exceeded".into(),
					threshold_pct: "n/a".into(),
				})
			},
			_ => {},
		}

		state.assets_seen.insert(outflow.asset_id.clone());

		if let Some(link) = links_by_source.get(&tx.id).copied().filter(|l| l.asset == outflow.asset_id) {
			self.transfer_outflow(tx, outflow, link, rules, method, calculation_id, price, onchain_fee_qty, state)
				.await
		} else {
			self.disposal_outflow(tx, outflow, rules, method, calculation_id, price, state)
		}
	}

	#[allow(clippy::too_many_arguments)]
	async fn transfer_outflow(
		&self,
		tx: &UniversalTransaction,
		outflow: &Movement,
		link: &TransactionLink,
		rules: &JurisdictionRules,
		method: LotMethod,
		calculation_id: Uuid,
		price: Amount,
		onchain_fee_qty: Amount,
		state: &mut RunState,
	) -> Result<(), CostBasisError> {
		let outcome = apply_transfer_fee_policy(rules.same_asset_transfer_fee_policy, &outflow.gross_amount, &onchain_fee_qty, &price);

		let (transferable_qty, fee_disposal_qty, fee_usd_for_target) = match outcome {
			TransferFeeOutcome::FeeIsDisposal { transferable_quantity, fee_quantity } => {
				(transferable_quantity, Some(fee_quantity), Amount::zero())
			},
			TransferFeeOutcome::FeeAddedToBasis { transferable_quantity, fee_usd_value } => {
				(transferable_quantity, None, fee_usd_value)
			},
		};

		let open_refs: Vec<&AcquisitionLot> = state.open_lots_for(&outflow.asset_id);
		let order = ordered_lot_ids(&open_refs, method, None);
		let avg_cost = if method == LotMethod::Acb { Some(weighted_average_cost(&open_refs)) } else { None };
		let mut draws = draw_for_transfer(&open_refs, &order, transferable_qty.clone());
		if let Some(avg) = &avg_cost {
			for d in draws.iter_mut() {
				d.cost_basis_per_unit = avg.clone();
			}
		}
		if draws.iter().fold(Amount::zero(), |acc, d| acc + d.quantity.clone()) < transferable_qty {
			return Err(CostBasisError::InsufficientLots { tx_id: tx.id, asset: outflow.asset_id.clone() });
		}

		for d in &draws {
			state.reduce_lot(d.lot_id, &d.quantity);
		}

		let lot_transfers = lot_transfers_from_draws(&draws, link.id, tx.id, link.target_tx_id);
		state.transfers_by_link.entry(link.id).or_default().extend(lot_transfers);
		state.transfer_fee_usd_by_link.insert(link.id, fee_usd_for_target);

		if let Some(fee_qty) = fee_disposal_qty {
			if !fee_qty.is_zero() {
				let fee_open_refs = state.open_lots_for(&outflow.asset_id);
				let fee_order = ordered_lot_ids(&fee_open_refs, method, None);
				let fee_avg = if method == LotMethod::Acb { Some(weighted_average_cost(&fee_open_refs)) } else { None };
				let mut fee_draws = draw_for_transfer(&fee_open_refs, &fee_order, fee_qty.clone());
				if let Some(avg) = &fee_avg {
					for d in fee_draws.iter_mut() {
						d.cost_basis_per_unit = avg.clone();
					}
				}
				for d in &fee_draws {
					state.reduce_lot(d.lot_id, &d.quantity);
					let disposal = build_disposal(
						DisposalInputs {
							lot_id: d.lot_id,
							disposal_tx_id: tx.id,
							quantity_disposed: d.quantity.clone(),
							proceeds_per_unit: price.clone(),
							cost_basis_per_unit: d.cost_basis_per_unit.clone(),
							acquisition_date: state.lots[&d.lot_id].acquisition_date,
							disposal_date: tx.timestamp,
							jurisdiction: rules_jurisdiction_placeholder(),
							rules,
						},
						None,
					);
					state.push_disposal(disposal, tx.timestamp);
				}
			}
		}

		Ok(())
	}

	#[allow(clippy::too_many_arguments)]
	fn disposal_outflow(
		&self,
		tx: &UniversalTransaction,
		outflow: &Movement,
		rules: &JurisdictionRules,
		method: LotMethod,
		_calculation_id: Uuid,
		price: Amount,
		state: &mut RunState,
	) -> Result<(), CostBasisError> {
		let platform_fee = same_asset_fee_quantity(&tx.fees, &outflow.asset_id, FeeSettlement::Balance)
			+ same_platform_fee(&tx.fees, &outflow.asset_id);
		let fee_per_unit = if outflow.gross_amount.is_zero() {
			Amount::zero()
		} else {
			&platform_fee / &outflow.gross_amount
		};
		let proceeds_per_unit = &price - &fee_per_unit;

		let open_refs = state.open_lots_for(&outflow.asset_id);
		if open_refs.is_empty() {
			return Err(CostBasisError::InsufficientLots { tx_id: tx.id, asset: outflow.asset_id.clone() });
		}
		let order = ordered_lot_ids(&open_refs, method, None);
		let avg_cost = if method == LotMethod::Acb { Some(weighted_average_cost(&open_refs)) } else { None };
		let mut draws = draw_for_transfer(&open_refs, &order, outflow.gross_amount.clone());
		if let Some(avg) = &avg_cost {
			for d in draws.iter_mut() {
				d.cost_basis_per_unit = avg.clone();
			}
		}
		if draws.iter().fold(Amount::zero(), |acc, d| acc + d.quantity.clone()) < outflow.gross_amount {
			return Err(CostBasisError::InsufficientLots { tx_id: tx.id, asset: outflow.asset_id.clone() });
		}

		for d in &draws {
			let acquisition_date = state.lots[&d.lot_id].acquisition_date;
			state.reduce_lot(d.lot_id, &d.quantity);
			let disposal = build_disposal(
				DisposalInputs {
					lot_id: d.lot_id,
					disposal_tx_id: tx.id,
					quantity_disposed: d.quantity.clone(),
					proceeds_per_unit: proceeds_per_unit.clone(),
					cost_basis_per_unit: d.cost_basis_per_unit.clone(),
					acquisition_date,
					disposal_date: tx.timestamp,
					jurisdiction: rules_jurisdiction_placeholder(),
					rules,
				},
				None,
			);
			state.push_disposal(disposal, tx.timestamp);
		}

		Ok(())
	}

	#[allow(clippy::too_many_arguments)]
	async fn process_inflow(
		&self,
		tx: &UniversalTransaction,
		inflow: &Movement,
		links_by_target: &HashMap<Uuid, &TransactionLink>,
		transfers_by_link: &HashMap<Uuid, Vec<LotTransfer>>,
		method: LotMethod,
		calculation_id: Uuid,
		state: &mut RunState,
	) -> Result<(), CostBasisError> {
		state.assets_seen.insert(inflow.asset_id.clone());

		if let Some(link) = links_by_target.get(&tx.id).copied().filter(|l| l.asset == inflow.asset_id) {
			let transfers = transfers_by_link.get(&link.id).cloned().unwrap_or_default();
			if transfers.is_empty() {
				return Err(CostBasisError::MissingLotTransfer { link_id: link.id, target_tx_id: tx.id });
			}
			let extra_fee_usd = state.transfer_fee_usd_by_link.get(&link.id).cloned().unwrap_or_else(Amount::zero);
			let priced_fiat_fees = fiat_fee_usd_value(&tx.fees);
			let total_fee_usd = &extra_fee_usd + &priced_fiat_fees;

			let lot = target_lot_from_transfers(
				calculation_id,
				tx.id,
				inflow.asset_id.clone(),
				&transfers,
				&total_fee_usd,
				tx.timestamp,
			);
			state.insert_lot(lot, tx.timestamp, false);
			Ok(())
		} else {
			let price = self.price_for(inflow.asset_id.clone(), tx.timestamp).await;
			let mut inflows_usd_value: Vec<(AssetId, Amount)> = Vec::with_capacity(tx.movements.inflows.len());
			for m in &tx.movements.inflows {
				let asset_price = self.price_for(m.asset_id.clone(), tx.timestamp).await;
				inflows_usd_value.push((m.asset_id.clone(), &m.gross_amount * &asset_price));
			}
			let total_platform_fee = same_platform_fee_sum(&tx.fees);
			let allocation = allocate_proportionally(&inflows_usd_value, &total_platform_fee);
			let allocated_fee = allocation.get(&inflow.asset_id).cloned().unwrap_or_else(Amount::zero);

			let lot = build_acquisition_lot(
				calculation_id,
				tx.id,
				inflow.asset_id.clone(),
				inflow.gross_amount.clone(),
				&price,
				&allocated_fee,
				tx.timestamp,
				method,
			);
			state.insert_lot(lot, tx.timestamp, true);
			Ok(())
		}
	}

	async fn price_for(&self, asset: AssetId, timestamp: DateTime<Utc>) -> Amount {
		if asset.is_fiat() {
			return Amount::from(1);
		}
		self.price_oracle.price_usd_at(&asset, timestamp).await.unwrap_or_else(Amount::zero)
	}

	fn apply_wash_and_superficial_rules(
		&self,
		state: &mut RunState,
		rules: &JurisdictionRules,
		jurisdiction: crate::config::Jurisdiction,
	) {
		if !rules.has_wash_sale_rule(jurisdiction) && !rules.has_superficial_loss_rule(jurisdiction) {
			return;
		}

		// Earliest disposal timestamp seen against each lot — a reacquired
		// lot counts as "still open at window end" if it has no disposal at
		// or before that point.
		let mut earliest_disposal_by_lot: HashMap<Uuid, DateTime<Utc>> = HashMap::new();
		for d in &state.disposals {
			let Some(ts) = state.disposal_timestamps.get(&d.id).copied() else { continue };
			earliest_disposal_by_lot
				.entry(d.lot_id)
				.and_modify(|existing| {
					if ts < *existing {
						*existing = ts;
					}
				})
				.or_insert(ts);
		}

		let still_open_at = |lot_id: Uuid, window_end: DateTime<Utc>| -> bool {
			match earliest_disposal_by_lot.get(&lot_id) {
				Some(ts) => *ts > window_end,
				None => true,
			}
		};

		let disposal_timestamps = state.disposal_timestamps.clone();
		for d in state.disposals.iter_mut() {
			if !d.gain_loss.is_negative() {
				continue;
			}
			let asset = match state.lots.get(&d.lot_id) {
				Some(lot) => lot.asset.clone(),
				None => continue,
			};
			let disposal_ts = match disposal_timestamps.get(&d.id) {
				Some(ts) => *ts,
				None => continue,
			};
			// Exclude the lot being disposed (its own acquisition is not a
			// replacement purchase) and transfer-target lots (basis moved in
			// from a linked account, not a market reacquisition) from the
			// candidate window — spec §4.5 step 4 requires a *subsequent*
			// purchase, not the disposed lot or an inbound transfer.
			let reacquisitions: Vec<(DateTime<Utc>, Uuid)> = state
				.acquisitions_by_asset
				.get(&asset)
				.map(|acqs| {
					acqs.iter()
						.filter(|(_, lot_id)| {
							*lot_id != d.lot_id && !state.transfer_target_lot_ids.contains(lot_id)
						})
						.cloned()
						.collect()
				})
				.unwrap_or_default();
			let window = ReacquisitionWindow { asset: &asset, acquisitions: &reacquisitions, still_open_at: &still_open_at };

			let rebuilt = build_disposal(
				DisposalInputs {
					lot_id: d.lot_id,
					disposal_tx_id: d.disposal_tx_id,
					quantity_disposed: d.quantity_disposed.clone(),
					proceeds_per_unit: d.proceeds_per_unit.clone(),
					cost_basis_per_unit: d.cost_basis_per_unit.clone(),
					acquisition_date: state.lots.get(&d.lot_id).map(|l| l.acquisition_date).unwrap_or(disposal_ts),
					disposal_date: disposal_ts,
					jurisdiction,
					rules,
				},
				Some(&window),
			);
			*d = rebuilt;
		}
	}
}

fn rules_jurisdiction_placeholder() -> crate::config::Jurisdiction {
	// `build_disposal` only consults `jurisdiction` to pick which window
	// applies when a `ReacquisitionWindow` is present; the first pass never
	// supplies one, so the concrete value is immaterial here. Real
	// wash/superficial adjustment happens in `apply_wash_and_superficial_rules`,
	// which threads the actual configured jurisdiction through.
	crate::config::Jurisdiction::Us
}

fn same_asset_fee_quantity(fees: &[Fee], asset: &AssetId, settlement: FeeSettlement) -> Amount {
	fees.iter()
		.filter(|f| &f.asset_id == asset && f.settlement == settlement && f.scope == FeeScope::Network)
		.fold(Amount::zero(), |acc, f| acc + f.amount.clone())
}

fn same_platform_fee(fees: &[Fee], asset: &AssetId) -> Amount {
	fees.iter()
		.filter(|f| &f.asset_id == asset && f.scope == FeeScope::Platform)
		.fold(Amount::zero(), |acc, f| acc + f.amount.clone())
}

fn same_platform_fee_sum(fees: &[Fee]) -> Amount {
	fees.iter().filter(|f| f.scope == FeeScope::Platform).fold(Amount::zero(), |acc, f| acc + f.amount.clone())
}

fn fiat_fee_usd_value(fees: &[Fee]) -> Amount {
	fees.iter().filter(|f| f.asset_id.is_fiat()).fold(Amount::zero(), |acc, f| acc + f.amount.clone())
}

#[derive(Default)]
struct RunState {
	lots: HashMap<Uuid, AcquisitionLot>,
	open_lot_ids_by_asset: HashMap<AssetId, Vec<Uuid>>,
	disposals: Vec<LotDisposal>,
	disposal_timestamps: HashMap<Uuid, DateTime<Utc>>,
	transfers_by_link: HashMap<Uuid, Vec<LotTransfer>>,
	transfer_fee_usd_by_link: HashMap<Uuid, Amount>,
	assets_seen: BTreeSet<AssetId>,
	acquisitions_by_asset: HashMap<AssetId, Vec<(DateTime<Utc>, Uuid)>>,
	transfer_target_lot_ids: BTreeSet<Uuid>,
}

impl RunState {
	fn open_lots_for(&self, asset: &AssetId) -> Vec<&AcquisitionLot> {
		self.open_lot_ids_by_asset
			.get(asset)
			.map(|ids| ids.iter().filter_map(|id| self.lots.get(id)).filter(|l| !l.remaining_quantity.is_zero()).collect())
			.unwrap_or_default()
	}

	/// `is_market_acquisition` marks whether this lot is a genuine purchase
	/// (counts as a wash-sale/superficial-loss reacquisition) as opposed to a
	/// transfer-target lot inheriting basis from a linked source (spec §4.5
	/// step 4: only a *replacement purchase* disqualifies a loss).
	fn insert_lot(&mut self, lot: AcquisitionLot, acquisition_timestamp: DateTime<Utc>, is_market_acquisition: bool) {
		self.acquisitions_by_asset.entry(lot.asset.clone()).or_default().push((acquisition_timestamp, lot.id));
		if !is_market_acquisition {
			self.transfer_target_lot_ids.insert(lot.id);
		}
		self.open_lot_ids_by_asset.entry(lot.asset.clone()).or_default().push(lot.id);
		self.lots.insert(lot.id, lot);
	}

	fn reduce_lot(&mut self, lot_id: Uuid, qty: &Amount) {
		if let Some(lot) = self.lots.get_mut(&lot_id) {
			lot.reduce_remaining(qty);
		}
	}

	fn push_disposal(&mut self, disposal: LotDisposal, disposal_timestamp: DateTime<Utc>) {
		self.disposal_timestamps.insert(disposal.id, disposal_timestamp);
		self.disposals.push(disposal);
	}
}
