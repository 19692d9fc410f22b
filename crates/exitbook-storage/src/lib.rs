//! SQLite-backed persistence (spec §4.2, §4.5, §7): accounts, the raw
//! append-only store, import sessions, universal transactions, transfer
//! links, and cost-basis calculation artifacts. Repositories for ports
//! already defined upstream (`exitbook_ingestion::raw_store::RawStore`,
//! `exitbook_ingestion::data_source_repo::DataSourceRepo`) implement those
//! traits directly; everything else defines its own trait here, each with
//! an in-memory test double in the style of `exitbook-ingestion`'s.

pub mod account_repo;
pub mod costbasis_repo;
pub mod data_source_repo;
pub mod db;
pub mod error;
pub mod link_repo;
pub mod raw_store;
pub mod schema;
pub mod transaction_repo;

pub use account_repo::{AccountRepository, InMemoryAccountRepository, SqliteAccountRepository};
pub use costbasis_repo::{CostBasisRepository, SqliteCostBasisRepository};
pub use data_source_repo::SqliteDataSourceRepo;
pub use db::Database;
pub use error::StorageError;
pub use link_repo::{InMemoryLinkRepository, LinkRepository, SqliteLinkRepository};
pub use raw_store::SqliteRawStore;
pub use transaction_repo::{
	InMemoryTransactionRepository, SqliteTransactionRepository, TransactionRepository,
};
