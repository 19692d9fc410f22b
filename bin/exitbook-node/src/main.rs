//! Thin wiring for the exitbook core (spec §1: CLI command registration is
//! explicitly out of scope, so this stays a small fixed set of
//! subcommands rather than a full command tree). Each subcommand opens the
//! SQLite store, wires the relevant crate's public entry point, and writes
//! the result back — the same small-binary-does-the-wiring shape used by
//! the runner and API binaries elsewhere in this codebase, at exitbook's
//! scale.
//!
//! Provider adapters and the streaming import executor are deliberately not
//! wired here: provider-specific wire schemas (Helius, Etherscan, ...) live
//! outside this core per spec §1, so there is no concrete `Importer` to run
//! without one. What's left — matching and cost-basis calculation — runs
//! entirely off data already persisted by some external ingestion run.

mod pricing_file;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use exitbook_costbasis::{CalculationStatus, CostBasisEngine};
use exitbook_core::model::{LinkStatus, OverrideEvent, OverridePayload, OverrideScope};
use exitbook_matcher::{apply_overrides, find_candidates, Candidate, JsonlOverrideStore};
use exitbook_storage::{
	CostBasisRepository, Database, LinkRepository, SqliteCostBasisRepository, SqliteLinkRepository,
	SqliteTransactionRepository, TransactionRepository,
};
use tracing::info;
use uuid::Uuid;

use settings::NodeSettings;

#[derive(Parser, Debug)]
#[command(name = "exitbook-node", version, about = "Exitbook ledger core: matching and cost-basis runs")]
struct Cli {
	/// Optional config file (TOML/YAML/JSON, auto-detected by extension)
	/// layered under environment overrides (spec §6 "Configuration surface").
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Re-run transfer-link matching over every persisted transaction and
	/// fold in the manual-override log (spec §4.4).
	Match,
	/// Run a cost-basis calculation over every persisted transaction and
	/// confirmed link, pricing movements from a JSON price file (spec §4.5).
	Calculate {
		/// Path to a JSON array of `{asset, timestamp, price_usd}` entries.
		#[arg(long)]
		price_file: PathBuf,
	},
	/// Append a manual link-confirmation override (spec §4.4 "Override store").
	OverrideLink {
		#[arg(long)]
		source_tx_id: Uuid,
		#[arg(long)]
		target_tx_id: Uuid,
		#[arg(long)]
		confirmed: bool,
		#[arg(long, default_value = "operator")]
		actor: String,
		#[arg(long)]
		reason: Option<String>,
	},
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.init();

	let cli = Cli::parse();
	let settings = NodeSettings::load(cli.config.as_ref()).context("loading settings")?;

	let db = Arc::new(Database::open(&settings.database_path).context("opening database")?);
	let transactions = Arc::new(SqliteTransactionRepository::new(db.clone()));
	let links = Arc::new(SqliteLinkRepository::new(db.clone()));
	let override_store = Arc::new(JsonlOverrideStore::new(&settings.override_log_path));

	match cli.command {
		Command::Match => run_match(transactions, links, override_store, &settings).await,
		Command::Calculate { price_file } => {
			let costbasis_repo = Arc::new(SqliteCostBasisRepository::new(db.clone()));
			run_calculate(transactions, links, costbasis_repo, &price_file, &settings).await
		},
		Command::OverrideLink { source_tx_id, target_tx_id, confirmed, actor, reason } => {
			append_link_override(override_store, source_tx_id, target_tx_id, confirmed, actor, reason)
				.await
		},
	}
}

/// Builds matcher candidates from every persisted transaction's primary
/// inflow/outflow, scores every cross-account pair, folds in overrides, and
/// persists the result (spec §4.4). The candidate's `source_type` comes
/// straight off the transaction, which already carries it (spec §3
/// `UniversalTransaction.source_type`) — no account lookup is needed.
async fn run_match(
	transactions: Arc<SqliteTransactionRepository>,
	links: Arc<SqliteLinkRepository>,
	override_store: Arc<JsonlOverrideStore>,
	settings: &NodeSettings,
) -> anyhow::Result<()> {
	let all = transactions.list_all().await.context("loading transactions")?;

	let outflows: Vec<Candidate> = all
		.iter()
		.filter_map(|tx| Candidate::from_outflow(tx, tx.account_id, &tx.source_type))
		.collect();
	let inflows: Vec<Candidate> = all
		.iter()
		.filter_map(|tx| Candidate::from_inflow(tx, tx.account_id, &tx.source_type))
		.collect();

	let suggestions = find_candidates(&outflows, &inflows, &settings.matching);
	info!(count = suggestions.len(), "matcher produced suggestions");

	let suggested_links: Vec<_> = suggestions.into_iter().map(|r| r.link).collect();
	let final_links = apply_overrides(suggested_links, override_store.as_ref())
		.await
		.context("applying overrides")?;

	let mut confirmed = 0usize;
	for link in &final_links {
		links.insert_suggested(link).await.context("persisting link")?;
		if link.status == LinkStatus::Confirmed {
			confirmed += 1;
		}
	}
	info!(total = final_links.len(), confirmed, "persisted transfer links");
	Ok(())
}

async fn run_calculate(
	transactions: Arc<SqliteTransactionRepository>,
	links: Arc<SqliteLinkRepository>,
	costbasis_repo: Arc<SqliteCostBasisRepository>,
	price_file: &PathBuf,
	settings: &NodeSettings,
) -> anyhow::Result<()> {
	let all = transactions.list_all().await.context("loading transactions")?;
	let confirmed = links.list_confirmed().await.context("loading confirmed links")?;
	let price_oracle = Arc::new(pricing_file::load_price_oracle(price_file).context("loading price file")?);

	let engine = CostBasisEngine::new(price_oracle);
	let artifacts = engine.run(&all, &confirmed, &settings.cost_basis).await.context("running calculation")?;

	let status = artifacts.summary.status;
	costbasis_repo.persist(&artifacts).await.context("persisting calculation")?;

	info!(
		calculation_id = %artifacts.summary.calculation_id,
		lots = artifacts.summary.lots_created,
		disposals = artifacts.summary.disposals_processed,
		capital_gain_loss = %artifacts.summary.total_capital_gain_loss,
		taxable_gain_loss = %artifacts.summary.total_taxable_gain_loss,
		"cost-basis calculation completed"
	);
	anyhow::ensure!(status == CalculationStatus::Completed, "calculation finished with non-completed status");
	Ok(())
}

async fn append_link_override(
	override_store: Arc<JsonlOverrideStore>,
	source_tx_id: Uuid,
	target_tx_id: Uuid,
	confirmed: bool,
	actor: String,
	reason: Option<String>,
) -> anyhow::Result<()> {
	use exitbook_matcher::OverrideStore;

	let event = OverrideEvent {
		id: Uuid::new_v4(),
		created_at: Utc::now(),
		actor,
		source: "exitbook-node".to_string(),
		scope: OverrideScope::Link,
		payload: serde_json::to_value(OverridePayload::Link { source_tx_id, target_tx_id, confirmed })?,
		reason,
	};
	override_store.append(event).await.context("appending override event")?;
	info!(%source_tx_id, %target_tx_id, confirmed, "appended manual link override");
	Ok(())
}
