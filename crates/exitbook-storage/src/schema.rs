//! Schema migrations, tracked via SQLite's `user_version` pragma (spec §6
//! "Persistence layer": "relational store with the tables implied by §3").
//! Migrations are a flat ordered list of `CREATE TABLE IF NOT EXISTS`
//! statements rather than a dependency on an external migration framework —
//! the quoter database elsewhere in this codebase bootstraps its schema the
//! same way (`Database::new` running a fixed set of statements before first
//! use).

use rusqlite::Connection;

use crate::error::StorageError;

const MIGRATIONS: &[&str] = &[
	r#"
	CREATE TABLE IF NOT EXISTS accounts (
		id TEXT PRIMARY KEY,
		user_id TEXT NOT NULL,
		account_type TEXT NOT NULL,
		source_name TEXT NOT NULL,
		identifier TEXT NOT NULL,
		parent_account_id TEXT,
		last_cursor TEXT NOT NULL,
		credentials TEXT NOT NULL,
		metadata TEXT NOT NULL,
		UNIQUE (user_id, account_type, source_name, identifier)
	);
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS data_sources (
		id TEXT PRIMARY KEY,
		account_id TEXT NOT NULL,
		status TEXT NOT NULL,
		started_at TEXT NOT NULL,
		finished_at TEXT,
		total_fetched INTEGER NOT NULL,
		total_persisted INTEGER NOT NULL,
		error TEXT,
		import_result_metadata TEXT NOT NULL
	);
	CREATE INDEX IF NOT EXISTS idx_data_sources_account ON data_sources (account_id, started_at);
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS raw_transactions (
		account_id TEXT NOT NULL,
		event_id TEXT NOT NULL,
		stream_type TEXT NOT NULL,
		provider_name TEXT NOT NULL,
		raw_payload TEXT NOT NULL,
		normalized_payload TEXT,
		processing_status TEXT NOT NULL,
		created_at TEXT NOT NULL,
		PRIMARY KEY (account_id, event_id)
	);
	CREATE INDEX IF NOT EXISTS idx_raw_transactions_pending
		ON raw_transactions (account_id, processing_status);
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS universal_transactions (
		id TEXT PRIMARY KEY,
		external_id TEXT NOT NULL,
		account_id TEXT NOT NULL,
		source TEXT NOT NULL,
		source_type TEXT NOT NULL,
		timestamp TEXT NOT NULL,
		payload TEXT NOT NULL,
		UNIQUE (account_id, external_id)
	);
	CREATE INDEX IF NOT EXISTS idx_universal_transactions_account_ts
		ON universal_transactions (account_id, timestamp);
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS transaction_links (
		id TEXT PRIMARY KEY,
		source_tx_id TEXT NOT NULL,
		target_tx_id TEXT NOT NULL,
		status TEXT NOT NULL,
		payload TEXT NOT NULL
	);
	CREATE INDEX IF NOT EXISTS idx_transaction_links_source ON transaction_links (source_tx_id);
	CREATE INDEX IF NOT EXISTS idx_transaction_links_target ON transaction_links (target_tx_id);
	CREATE INDEX IF NOT EXISTS idx_transaction_links_status ON transaction_links (status);
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS calculation_summaries (
		calculation_id TEXT PRIMARY KEY,
		payload TEXT NOT NULL,
		created_at TEXT NOT NULL
	);
	CREATE TABLE IF NOT EXISTS acquisition_lots (
		id TEXT PRIMARY KEY,
		calculation_id TEXT NOT NULL,
		asset TEXT NOT NULL,
		payload TEXT NOT NULL
	);
	CREATE INDEX IF NOT EXISTS idx_acquisition_lots_calc ON acquisition_lots (calculation_id);
	CREATE TABLE IF NOT EXISTS lot_disposals (
		id TEXT PRIMARY KEY,
		calculation_id TEXT NOT NULL,
		lot_id TEXT NOT NULL,
		payload TEXT NOT NULL
	);
	CREATE INDEX IF NOT EXISTS idx_lot_disposals_calc ON lot_disposals (calculation_id);
	CREATE TABLE IF NOT EXISTS lot_transfers (
		id TEXT PRIMARY KEY,
		calculation_id TEXT NOT NULL,
		link_id TEXT NOT NULL,
		payload TEXT NOT NULL
	);
	CREATE INDEX IF NOT EXISTS idx_lot_transfers_calc ON lot_transfers (calculation_id);
	"#,
];

/// Applies every migration past the database's current `user_version` in
/// one transaction. Safe to call on every startup (spec §6 persistence
/// layer is schema-aware, not a fresh-install-only concern).
pub fn migrate(conn: &mut Connection) -> Result<(), StorageError> {
	let current_version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
	let tx = conn.transaction()?;
	for (index, statement) in MIGRATIONS.iter().enumerate() {
		if (index as i64) < current_version {
			continue;
		}
		tx.execute_batch(statement)?;
	}
	tx.execute_batch(&format!("PRAGMA user_version = {}", MIGRATIONS.len()))?;
	tx.commit()?;
	Ok(())
}
